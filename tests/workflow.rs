use anyhow::Result;
use std::fs;
use std::path::PathBuf;

use rnaseq_varcall::Arguments;
use rnaseq_varcall::config::defs::{PipelineError, RESULTS_FILENAME, RunConfig, ToolSettings};
use rnaseq_varcall::pipelines::workflow::{Workflow, WorkflowKind, run_timed};

fn test_config(work_dir: PathBuf) -> RunConfig {
    RunConfig {
        cwd: work_dir.clone(),
        work_dir,
        args: Arguments::default(),
        tools: ToolSettings::default(),
    }
}

struct NoopStage;

impl Workflow for NoopStage {
    fn kind(&self) -> WorkflowKind {
        WorkflowKind::VariantCalling
    }

    async fn run_stage(&self, _config: &RunConfig) -> Result<(), PipelineError> {
        Ok(())
    }
}

struct FailingStage;

impl Workflow for FailingStage {
    fn kind(&self) -> WorkflowKind {
        WorkflowKind::LncRnaDiscovery
    }

    async fn run_stage(&self, _config: &RunConfig) -> Result<(), PipelineError> {
        Err(PipelineError::InvalidConfig("stage exploded".to_string()))
    }
}

#[tokio::test]
async fn completed_stage_writes_parseable_elapsed_time() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let config = test_config(dir.path().to_path_buf());

    let summary = run_timed(&NoopStage, &config, dir.path()).await?;
    assert_eq!(summary.kind, WorkflowKind::VariantCalling);
    assert_eq!(summary.results_path, dir.path().join(RESULTS_FILENAME));

    let contents = fs::read_to_string(&summary.results_path)?;
    let mut lines = contents.lines();
    let version = lines.next().expect("version line");
    assert!(version.starts_with("rnaseq-varcall: version "));

    let elapsed_line = lines.next().expect("elapsed line");
    let elapsed: f64 = elapsed_line
        .strip_suffix('s')
        .expect("seconds unit")
        .parse()?;
    assert!(elapsed >= 0.0);
    Ok(())
}

#[tokio::test]
async fn failed_stage_surfaces_the_error_and_writes_nothing() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let config = test_config(dir.path().to_path_buf());

    let result = run_timed(&FailingStage, &config, dir.path()).await;
    match result {
        Err(PipelineError::InvalidConfig(msg)) => assert_eq!(msg, "stage exploded"),
        other => panic!("expected the stage error back, got {:?}", other.map(|s| s.kind)),
    }
    assert!(!dir.path().join(RESULTS_FILENAME).exists());
    Ok(())
}

// src/pipelines/workflow.rs: Timed execution of a pipeline stage

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use log::info;

use crate::config::defs::{PipelineError, RESULTS_FILENAME, RunConfig};
use crate::pipelines::{bam_prep, known_sites, realign, recalibrate, variants};

pub const VERSION_LABEL: &str = concat!("rnaseq-varcall: version ", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WorkflowKind {
    VariantCalling,
    LncRnaDiscovery,
}

/// What a completed run reports back to the caller.
#[derive(Debug)]
pub struct WorkflowSummary {
    pub kind: WorkflowKind,
    pub elapsed: Duration,
    pub results_path: PathBuf,
}

/// A pipeline stage body. `run_timed` supplies the timing and the result
/// summary around it.
#[allow(async_fn_in_trait)]
pub trait Workflow {
    fn kind(&self) -> WorkflowKind;
    async fn run_stage(&self, config: &RunConfig) -> Result<(), PipelineError>;
}

/// Runs a stage under a wall-clock timer. On success a result summary file
/// (version label plus elapsed time) lands in `out_dir` and the summary is
/// returned; on failure the stage error comes back untranslated and no
/// result file is written, leaving logging and reporting policy to the
/// caller.
pub async fn run_timed<W: Workflow>(
    workflow: &W,
    config: &RunConfig,
    out_dir: &Path,
) -> Result<WorkflowSummary, PipelineError> {
    let started = Instant::now();
    workflow.run_stage(config).await?;
    let elapsed = started.elapsed();

    let results_path = out_dir.join(RESULTS_FILENAME);
    let mut file = File::create(&results_path).map_err(PipelineError::io)?;
    writeln!(file, "{}", VERSION_LABEL).map_err(PipelineError::io)?;
    writeln!(file, "{:.3}s", elapsed.as_secs_f64()).map_err(PipelineError::io)?;

    Ok(WorkflowSummary {
        kind: workflow.kind(),
        elapsed,
        results_path,
    })
}

/// The RNA-Seq variant-calling stage: known sites, BAM preparation, indel
/// realignment, base recalibration, then HaplotypeCaller.
pub struct VariantCallingWorkflow {
    pub bam: PathBuf,
    pub genome_fasta: PathBuf,
}

impl Workflow for VariantCallingWorkflow {
    fn kind(&self) -> WorkflowKind {
        WorkflowKind::VariantCalling
    }

    async fn run_stage(&self, config: &RunConfig) -> Result<(), PipelineError> {
        let dbsnp = if config.args.download_known_sites {
            known_sites::download_known_sites(
                config,
                &config.work_dir,
                config.args.common_only,
                config.args.genome_build,
                &self.genome_fasta,
            )
            .await?
        } else {
            match &config.args.known_sites {
                Some(path) => PathBuf::from(path),
                None => {
                    return Err(PipelineError::InvalidConfig(
                        "variant calling needs --known-sites or --download-known-sites".to_string(),
                    ));
                }
            }
        };

        let prepared = bam_prep::prepare_bam(config, &self.bam, &self.genome_fasta).await?;
        info!("Prepared BAM: {}", prepared.display());

        let realigned =
            realign::realign_indels(config, &self.genome_fasta, &prepared, Some(&dbsnp)).await?;
        info!("Realigned BAM: {}", realigned.display());

        let recal_table =
            recalibrate::base_recalibration(config, &self.genome_fasta, &realigned, Some(&dbsnp))
                .await?;
        info!("Recalibration table: {}", recal_table.display());

        let vcf = variants::call_variants(config, &self.genome_fasta, &realigned, &dbsnp).await?;
        info!("Variant calls: {}", vcf.display());

        Ok(())
    }
}

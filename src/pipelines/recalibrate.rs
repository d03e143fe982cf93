// src/pipelines/recalibrate.rs: Base quality score recalibration

use std::path::{Path, PathBuf};

use crate::config::defs::{GATK_TAG, PipelineError, RunConfig};
use crate::utils::command::gatk::GatkCommand;
use crate::utils::command::{change_dir, genome_index_commands};
use crate::utils::file::replace_extension;
use crate::utils::script::generate_and_run_script;

/// Builds the base-call recalibration table for a BAM. Returns the
/// `.recaltable` path BaseRecalibrator is expected to produce.
pub async fn base_recalibration(
    config: &RunConfig,
    genome_fasta: &Path,
    bam: &Path,
    known_sites: Option<&Path>,
) -> Result<PathBuf, PipelineError> {
    let recalibration_table = replace_extension(bam, "recaltable");

    let mut commands = vec![change_dir(&config.work_dir)];
    commands.extend(
        genome_index_commands(genome_fasta, &config.tools)
            .map_err(|e| PipelineError::tool(GATK_TAG, e))?,
    );
    commands.push(
        GatkCommand::BaseRecalibrator {
            reference: genome_fasta.to_path_buf(),
            input: bam.to_path_buf(),
            known_sites: known_sites.map(Path::to_path_buf),
            output: recalibration_table.clone(),
        }
        .render(&config.tools)
        .map_err(|e| PipelineError::tool(GATK_TAG, e))?,
    );

    let script = config.script_path("base_recalibration.bash");
    let mut child = generate_and_run_script(&config.tools, &script, &commands)
        .map_err(|e| PipelineError::tool(GATK_TAG, e))?;
    child.wait().await.map_err(PipelineError::io)?;

    Ok(recalibration_table)
}

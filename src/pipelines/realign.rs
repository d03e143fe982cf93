// src/pipelines/realign.rs: Local realignment around indels

use std::path::{Path, PathBuf};

use crate::config::defs::{GATK_TAG, PipelineError, RunConfig};
use crate::utils::command::gatk::GatkCommand;
use crate::utils::command::{change_dir, genome_index_commands};
use crate::utils::file::replace_extension;
use crate::utils::script::generate_and_run_script;

/// Realigns reads around indels: RealignerTargetCreator finds the candidate
/// intervals, IndelRealigner rewrites the reads over them. Returns the
/// `.realigned.bam` path the second walker is expected to produce.
pub async fn realign_indels(
    config: &RunConfig,
    genome_fasta: &Path,
    bam: &Path,
    known_sites: Option<&Path>,
) -> Result<PathBuf, PipelineError> {
    let realigner_table = replace_extension(bam, "forIndelRealigner.intervals");
    let new_bam = replace_extension(bam, "realigned.bam");

    let mut commands = vec![change_dir(&config.work_dir)];
    commands.extend(
        genome_index_commands(genome_fasta, &config.tools)
            .map_err(|e| PipelineError::tool(GATK_TAG, e))?,
    );
    commands.push(
        GatkCommand::RealignerTargetCreator {
            threads: config.args.threads,
            reference: genome_fasta.to_path_buf(),
            input: bam.to_path_buf(),
            known_sites: known_sites.map(Path::to_path_buf),
            output: realigner_table.clone(),
        }
        .render(&config.tools)
        .map_err(|e| PipelineError::tool(GATK_TAG, e))?,
    );
    commands.push(
        GatkCommand::IndelRealigner {
            reference: genome_fasta.to_path_buf(),
            input: bam.to_path_buf(),
            known_sites: known_sites.map(Path::to_path_buf),
            target_intervals: realigner_table,
            output: new_bam.clone(),
        }
        .render(&config.tools)
        .map_err(|e| PipelineError::tool(GATK_TAG, e))?,
    );

    let script = config.script_path("realign_indels.bash");
    let mut child = generate_and_run_script(&config.tools, &script, &commands)
        .map_err(|e| PipelineError::tool(GATK_TAG, e))?;
    child.wait().await.map_err(PipelineError::io)?;

    Ok(new_bam)
}

// src/pipelines/variants.rs: Per-sample variant calling

use std::path::{Path, PathBuf};

use crate::config::defs::{GATK_TAG, PipelineError, RunConfig};
use crate::utils::command::gatk::GatkCommand;
use crate::utils::command::{change_dir, genome_index_commands};
use crate::utils::file::replace_extension;
use crate::utils::script::generate_and_run_script;

/// HaplotypeCaller over one RNA-Seq BAM. Returns the `.vcf` path the caller
/// is expected to produce.
pub async fn call_variants(
    config: &RunConfig,
    genome_fasta: &Path,
    bam: &Path,
    dbsnp: &Path,
) -> Result<PathBuf, PipelineError> {
    let new_vcf = replace_extension(bam, "vcf");

    let mut commands = vec![change_dir(&config.work_dir)];
    commands.extend(
        genome_index_commands(genome_fasta, &config.tools)
            .map_err(|e| PipelineError::tool(GATK_TAG, e))?,
    );
    commands.push(
        GatkCommand::HaplotypeCaller {
            threads: config.args.threads,
            reference: genome_fasta.to_path_buf(),
            input: bam.to_path_buf(),
            dbsnp: dbsnp.to_path_buf(),
            output: new_vcf.clone(),
        }
        .render(&config.tools)
        .map_err(|e| PipelineError::tool(GATK_TAG, e))?,
    );

    let script = config.script_path("variant_calling.bash");
    let mut child = generate_and_run_script(&config.tools, &script, &commands)
        .map_err(|e| PipelineError::tool(GATK_TAG, e))?;
    child.wait().await.map_err(PipelineError::io)?;

    Ok(new_vcf)
}

/// Extracts the reads overlapping one genome region into a new BAM.
pub async fn subset_bam(
    config: &RunConfig,
    bam: &Path,
    genome_fasta: &Path,
    genome_region: &str,
    output_bam: &Path,
) -> Result<PathBuf, PipelineError> {
    let commands = vec![
        change_dir(&config.work_dir),
        GatkCommand::SubsetBam {
            threads: config.args.threads,
            reference: genome_fasta.to_path_buf(),
            input: bam.to_path_buf(),
            region: genome_region.to_string(),
            output: output_bam.to_path_buf(),
        }
        .render(&config.tools)
        .map_err(|e| PipelineError::tool(GATK_TAG, e))?,
    ];

    let script = config.script_path("subset_bam.bash");
    let mut child = generate_and_run_script(&config.tools, &script, &commands)
        .map_err(|e| PipelineError::tool(GATK_TAG, e))?;
    child.wait().await.map_err(PipelineError::io)?;

    Ok(output_bam.to_path_buf())
}

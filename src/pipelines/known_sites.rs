// src/pipelines/known_sites.rs: dbSNP known-sites download and remapping

use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use crate::cli::args::GenomeBuild;
use crate::config::defs::{PICARD_TAG, PipelineError, RunConfig, WGET_TAG, known_sites_url};
use crate::utils::command::picard::PicardCommand;
use crate::utils::command::{change_dir, fetch, genome_index_commands};
use crate::utils::file::{is_nonempty_file, load_chromosome_map, remap_chromosomes, replace_extension};
use crate::utils::script::generate_and_run_script;

fn archive_name(url: &str) -> &str {
    url.rsplit('/').next().unwrap_or(url)
}

/// Fetches the dbSNP known-sites VCF for a genome build, rewrites its UCSC
/// chromosome names to Ensembl convention, and sorts it against the genome
/// dictionary. The remapped file is cached by name: when it already exists
/// in the target directory nothing is downloaded. Presence on disk is the
/// only check performed; no checksum or version validation.
pub async fn download_known_sites(
    config: &RunConfig,
    target_dir: &Path,
    common_only: bool,
    build: GenomeBuild,
    genome_fasta: &Path,
) -> Result<PathBuf, PipelineError> {
    let url = known_sites_url(build, common_only);
    let gz_name = archive_name(url);
    let vcf_name = gz_name.trim_end_matches(".gz");
    let ensembl_name = format!(
        "{}.ensembl.vcf",
        vcf_name.trim_end_matches(".vcf")
    );

    let raw_vcf = target_dir.join(vcf_name);
    let ensembl_vcf = target_dir.join(&ensembl_name);

    if ensembl_vcf.exists() {
        info!("Known sites already present: {}", ensembl_vcf.display());
        return Ok(ensembl_vcf);
    }

    let download_commands = vec![
        change_dir(target_dir),
        fetch::wget(url).map_err(|e| PipelineError::tool(WGET_TAG, e))?,
        fetch::gunzip(gz_name).map_err(|e| PipelineError::tool(WGET_TAG, e))?,
        fetch::remove(gz_name).map_err(|e| PipelineError::tool(WGET_TAG, e))?,
    ];
    let download_script = config.script_path("download_known_variants.bash");
    let mut child = generate_and_run_script(&config.tools, &download_script, &download_commands)
        .map_err(|e| PipelineError::tool(WGET_TAG, e))?;
    child.wait().await.map_err(PipelineError::io)?;

    // UCSC -> Ensembl chromosome naming, per-build mapping table
    let mapping_table = config
        .tools
        .chromosome_mappings_dir
        .join(format!("{}_UCSC2ensembl.txt", build));
    let map = load_chromosome_map(&mapping_table).map_err(PipelineError::io)?;
    remap_chromosomes(&map, &raw_vcf, &ensembl_vcf).map_err(PipelineError::io)?;

    let sorted_vcf = replace_extension(&ensembl_vcf, "sorted.vcf");
    let mut sort_commands = vec![change_dir(&config.work_dir)];
    sort_commands.extend(
        genome_index_commands(genome_fasta, &config.tools)
            .map_err(|e| PipelineError::tool(PICARD_TAG, e))?,
    );
    sort_commands.push(
        PicardCommand::SortVcf {
            input: ensembl_vcf.clone(),
            output: sorted_vcf,
            sequence_dictionary: replace_extension(genome_fasta, "dict"),
        }
        .render(&config.tools)
        .map_err(|e| PipelineError::tool(PICARD_TAG, e))?,
    );
    let sort_script = config.script_path("sort_known_variants.bash");
    let mut child = generate_and_run_script(&config.tools, &sort_script, &sort_commands)
        .map_err(|e| PipelineError::tool(PICARD_TAG, e))?;
    child.wait().await.map_err(PipelineError::io)?;

    // The unmapped download is only discarded once its successor exists.
    if is_nonempty_file(&ensembl_vcf) {
        let _ = fs::remove_file(&raw_vcf);
    }

    Ok(ensembl_vcf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::defs::{ALL_GRCH37_URL, COMMON_GRCH38_URL};

    #[test]
    fn archive_name_is_last_url_segment() {
        assert_eq!(archive_name(ALL_GRCH37_URL), "All_20170710.vcf.gz");
        assert_eq!(archive_name(COMMON_GRCH38_URL), "common_all_20170710.vcf.gz");
    }

    #[test]
    fn url_selection_covers_build_and_scope() {
        assert!(known_sites_url(GenomeBuild::GRCh37, false).contains("GRCh37p13/VCF/GATK/All_"));
        assert!(known_sites_url(GenomeBuild::GRCh37, true).contains("GRCh37p13/VCF/GATK/common_all_"));
        assert!(known_sites_url(GenomeBuild::GRCh38, false).contains("GRCh38p7/VCF/GATK/All_"));
        assert!(known_sites_url(GenomeBuild::GRCh38, true).contains("GRCh38p7/VCF/GATK/common_all_"));
    }
}

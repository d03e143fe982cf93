use std::path::PathBuf;
use thiserror::Error;

use crate::cli::args::{Arguments, GenomeBuild};

// External software
pub const SAMTOOLS_TAG: &str = "samtools";
pub const PICARD_TAG: &str = "picard-tools";
pub const GATK_TAG: &str = "gatk";
pub const WGET_TAG: &str = "wget";
pub const GUNZIP_TAG: &str = "gunzip";

pub const GATK_JAR: &str = "GenomeAnalysisTK.jar";
pub const PICARD_JAR: &str = "picard.jar";
pub const PICARD_RELEASE_URL: &str =
    "https://github.com/broadinstitute/picard/releases/download/2.15.0/picard.jar";
pub const CHROMOSOME_MAPPINGS_REPO: &str = "https://github.com/dpryan79/ChromosomeMappings.git";
pub const CHROMOSOME_MAPPINGS_DIR: &str = "ChromosomeMappings";

// Known-sites reference data (NCBI dbSNP b150, GATK-ready naming)
pub const ALL_GRCH37_URL: &str =
    "ftp://ftp.ncbi.nih.gov/snp/organisms/human_9606_b150_GRCh37p13/VCF/GATK/All_20170710.vcf.gz";
pub const COMMON_GRCH37_URL: &str =
    "ftp://ftp.ncbi.nih.gov/snp/organisms/human_9606_b150_GRCh37p13/VCF/GATK/common_all_20170710.vcf.gz";
pub const ALL_GRCH38_URL: &str =
    "ftp://ftp.ncbi.nih.gov/snp/organisms/human_9606_b150_GRCh38p7/VCF/GATK/All_20170710.vcf.gz";
pub const COMMON_GRCH38_URL: &str =
    "ftp://ftp.ncbi.nih.gov/snp/organisms/human_9606_b150_GRCh38p7/VCF/GATK/common_all_20170710.vcf.gz";

// Static Parameters
pub const MIN_CALL_CONFIDENCE: usize = 20;
pub const DEFAULT_JAVA_HEAP_GB: usize = 20;

// Fixed read-group tags required by Picard AddOrReplaceReadGroups
pub const READ_GROUP_PLATFORM_UNIT: &str = "platform";
pub const READ_GROUP_PLATFORM: &str = "illumina";
pub const READ_GROUP_SAMPLE: &str = "sample";
pub const READ_GROUP_LIBRARY: &str = "library";

// Static Filenames
pub const SCRIPTS_SUBDIR: &str = "scripts";
pub const RESULTS_FILENAME: &str = "results.txt";
pub const HEADER_SORTED_MARKER: &str = "header_sorted.txt";
pub const HEADER_GROUPED_MARKER: &str = "header_readgrouped.txt";

/// Selects the dbSNP archive for a genome build.
pub fn known_sites_url(build: GenomeBuild, common_only: bool) -> &'static str {
    match (build, common_only) {
        (GenomeBuild::GRCh37, true) => COMMON_GRCH37_URL,
        (GenomeBuild::GRCh37, false) => ALL_GRCH37_URL,
        (GenomeBuild::GRCh38, true) => COMMON_GRCH38_URL,
        (GenomeBuild::GRCh38, false) => ALL_GRCH38_URL,
    }
}

/// Invocation settings for the external tools, with documented defaults.
/// Passed in at construction instead of read from process-wide statics.
#[derive(Debug, Clone)]
pub struct ToolSettings {
    /// Shell interpreter used to launch generated scripts. Default: `/bin/bash`.
    pub shell_path: PathBuf,
    /// GATK jar, resolved relative to the working directory the scripts cd into.
    pub gatk_jar: PathBuf,
    /// Picard jar, used where the `picard-tools` front-end is not available.
    pub picard_jar: PathBuf,
    /// Java heap ceiling for the GATK/Picard jars, in GiB. Default: 20.
    pub java_heap_gb: usize,
    /// Directory holding the UCSC-to-Ensembl chromosome mapping tables.
    pub chromosome_mappings_dir: PathBuf,
}

impl Default for ToolSettings {
    fn default() -> Self {
        ToolSettings {
            shell_path: PathBuf::from("/bin/bash"),
            gatk_jar: PathBuf::from(GATK_JAR),
            picard_jar: PathBuf::from(PICARD_JAR),
            java_heap_gb: DEFAULT_JAVA_HEAP_GB,
            chromosome_mappings_dir: PathBuf::from(CHROMOSOME_MAPPINGS_DIR),
        }
    }
}

pub struct RunConfig {
    pub cwd: PathBuf,
    /// Directory the generated scripts cd into; holds `scripts/` and the jars.
    pub work_dir: PathBuf,
    pub args: Arguments,
    pub tools: ToolSettings,
}

impl RunConfig {
    pub fn script_path(&self, name: &str) -> PathBuf {
        self.work_dir.join(SCRIPTS_SUBDIR).join(name)
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Failed to run {tool}: {error}")]
    ToolExecution { tool: String, error: String },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("I/O error: {0}")]
    IOError(String),
}

impl PipelineError {
    pub fn tool(tag: &str, error: impl ToString) -> Self {
        PipelineError::ToolExecution {
            tool: tag.to_string(),
            error: error.to_string(),
        }
    }

    pub fn io(error: impl ToString) -> Self {
        PipelineError::IOError(error.to_string())
    }
}

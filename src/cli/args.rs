use std::fmt;

use clap::{Parser, ValueEnum};

#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq)]
pub enum GenomeBuild {
    #[default]
    #[value(name = "grch37")]
    GRCh37,
    #[value(name = "grch38")]
    GRCh38,
}

impl fmt::Display for GenomeBuild {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenomeBuild::GRCh37 => write!(f, "GRCh37"),
            GenomeBuild::GRCh38 => write!(f, "GRCh38"),
        }
    }
}

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "rnaseq-varcall", version)]
pub struct Arguments {
    #[arg(short, long, help = "Pipeline module to run: call-variants, prepare-bam, subset-bam, download-known-sites, install-deps, install-gatk")]
    pub module: String,

    #[arg(short = 'v', long = "verbose", action)]
    pub verbose: bool,

    #[arg(short = 'b', long = "bam")]
    pub bam: Option<String>,

    #[arg(short = 'g', long = "genome-fasta")]
    pub genome_fasta: Option<String>,

    #[arg(short = 'o', long = "out", help = "Working directory for generated scripts and artifacts. Defaults to the current directory.")]
    pub out_dir: Option<String>,

    #[arg(long, default_value_t = 8)]
    pub threads: usize,

    #[arg(long = "genome-build", default_value = "grch37", value_enum)]
    pub genome_build: GenomeBuild,

    #[arg(long, default_value_t = false, help = "Fetch the common-variants dbSNP archive instead of the full set")]
    pub common_only: bool,

    #[arg(long = "known-sites", help = "Pre-downloaded known-sites VCF; skips the dbSNP download")]
    pub known_sites: Option<String>,

    #[arg(long, default_value_t = false)]
    pub download_known_sites: bool,

    #[arg(long = "genome-region", help = "Region for BAM subsetting, e.g. chr1:1-1000000")]
    pub genome_region: Option<String>,

    #[arg(long, default_value_t = 20, help = "Java heap ceiling for GATK/Picard jars, in GiB")]
    pub java_heap_gb: usize,

    #[arg(long, default_value = "/bin/bash", help = "Shell interpreter used to launch generated scripts")]
    pub shell: String,
}

/// Typed builders for the external tool command lines. Each tool gets a
/// config enum whose `render` validates required arguments and produces the
/// literal script line, so a missing path is a value-level error instead of a
/// silently wrong flag string.

use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};

use crate::config::defs::ToolSettings;
use crate::utils::path::path_to_shell;

/// Rejects empty required paths at render time; returns the shell form.
fn require_path(path: &Path, tool: &str, what: &str) -> Result<String> {
    if path.as_os_str().is_empty() {
        return Err(anyhow!("{}: missing required {}", tool, what));
    }
    Ok(path_to_shell(path))
}

pub fn change_dir(dir: &Path) -> String {
    format!("cd {}", path_to_shell(dir))
}

/// `if [ -f guard ]; then rm ...; fi` - deletes intermediates only once their
/// successor is confirmed on disk, so a stage that never produced output
/// keeps its input.
pub fn remove_if_exists(guard: &Path, targets: &[&Path]) -> String {
    let list = targets
        .iter()
        .map(|t| path_to_shell(t))
        .collect::<Vec<_>>()
        .join(" ");
    format!(
        "if [ -f {} ]; then rm -f {}; fi",
        path_to_shell(guard),
        list
    )
}

/// `if [ ! -f guard ]; then cmd; fi` - reruns a command only when its
/// expected output is absent.
pub fn run_if_missing(guard: &Path, cmd: &str) -> String {
    format!("if [ ! -f {} ]; then {}; fi", path_to_shell(guard), cmd)
}

pub mod gatk {
    use std::path::PathBuf;

    use anyhow::{Result, anyhow};

    use super::require_path;
    use crate::config::defs::{GATK_TAG, MIN_CALL_CONFIDENCE, ToolSettings};
    use crate::utils::path::path_to_shell;

    /// One GATK engine invocation. Thread flags appear only on the walkers
    /// that accept them.
    #[derive(Debug, Clone)]
    pub enum GatkCommand {
        SplitNCigarReads {
            reference: PathBuf,
            input: PathBuf,
            output: PathBuf,
            fix_misencoded_quals: bool,
        },
        ReassignMappingQuality {
            reference: PathBuf,
            input: PathBuf,
            output: PathBuf,
        },
        RealignerTargetCreator {
            threads: usize,
            reference: PathBuf,
            input: PathBuf,
            known_sites: Option<PathBuf>,
            output: PathBuf,
        },
        IndelRealigner {
            reference: PathBuf,
            input: PathBuf,
            known_sites: Option<PathBuf>,
            target_intervals: PathBuf,
            output: PathBuf,
        },
        BaseRecalibrator {
            reference: PathBuf,
            input: PathBuf,
            known_sites: Option<PathBuf>,
            output: PathBuf,
        },
        HaplotypeCaller {
            threads: usize,
            reference: PathBuf,
            input: PathBuf,
            dbsnp: PathBuf,
            output: PathBuf,
        },
        SubsetBam {
            threads: usize,
            reference: PathBuf,
            input: PathBuf,
            region: String,
            output: PathBuf,
        },
    }

    fn engine(tools: &ToolSettings) -> String {
        format!(
            "java -Xmx{}G -jar {}",
            tools.java_heap_gb,
            path_to_shell(&tools.gatk_jar)
        )
    }

    impl GatkCommand {
        pub fn render(&self, tools: &ToolSettings) -> Result<String> {
            match self {
                GatkCommand::SplitNCigarReads {
                    reference,
                    input,
                    output,
                    fix_misencoded_quals,
                } => {
                    let mut cmd = format!(
                        "{} -T SplitNCigarReads -R {} -I {} -o {} -U ALLOW_N_CIGAR_READS",
                        engine(tools),
                        require_path(reference, GATK_TAG, "reference")?,
                        require_path(input, GATK_TAG, "input BAM")?,
                        require_path(output, GATK_TAG, "output BAM")?,
                    );
                    if *fix_misencoded_quals {
                        cmd.push_str(" -fixMisencodedQuals");
                    }
                    Ok(cmd)
                }
                GatkCommand::ReassignMappingQuality {
                    reference,
                    input,
                    output,
                } => Ok(format!(
                    // RNA-Seq aligners emit MAPQ values HaplotypeCaller rejects
                    "{} -T PrintReads -R {} -I {} -o {} -rf ReassignMappingQuality",
                    engine(tools),
                    require_path(reference, GATK_TAG, "reference")?,
                    require_path(input, GATK_TAG, "input BAM")?,
                    require_path(output, GATK_TAG, "output BAM")?,
                )),
                GatkCommand::RealignerTargetCreator {
                    threads,
                    reference,
                    input,
                    known_sites,
                    output,
                } => {
                    let mut cmd = format!(
                        "{} -T RealignerTargetCreator --num_threads {} -R {} -I {}",
                        engine(tools),
                        threads,
                        require_path(reference, GATK_TAG, "reference")?,
                        require_path(input, GATK_TAG, "input BAM")?,
                    );
                    if let Some(known) = known_sites {
                        cmd.push_str(&format!(
                            " -known {}",
                            require_path(known, GATK_TAG, "known sites VCF")?
                        ));
                    }
                    cmd.push_str(&format!(
                        " -o {}",
                        require_path(output, GATK_TAG, "intervals output")?
                    ));
                    Ok(cmd)
                }
                GatkCommand::IndelRealigner {
                    reference,
                    input,
                    known_sites,
                    target_intervals,
                    output,
                } => {
                    // IndelRealigner cannot run threaded
                    let mut cmd = format!(
                        "{} -T IndelRealigner -R {} -I {}",
                        engine(tools),
                        require_path(reference, GATK_TAG, "reference")?,
                        require_path(input, GATK_TAG, "input BAM")?,
                    );
                    if let Some(known) = known_sites {
                        cmd.push_str(&format!(
                            " -known {}",
                            require_path(known, GATK_TAG, "known sites VCF")?
                        ));
                    }
                    cmd.push_str(&format!(
                        " -targetIntervals {} -o {}",
                        require_path(target_intervals, GATK_TAG, "target intervals")?,
                        require_path(output, GATK_TAG, "output BAM")?,
                    ));
                    Ok(cmd)
                }
                GatkCommand::BaseRecalibrator {
                    reference,
                    input,
                    known_sites,
                    output,
                } => {
                    // BaseRecalibrator does not support threaded runs
                    let mut cmd = format!(
                        "{} -T BaseRecalibrator -R {} -I {}",
                        engine(tools),
                        require_path(reference, GATK_TAG, "reference")?,
                        require_path(input, GATK_TAG, "input BAM")?,
                    );
                    if let Some(known) = known_sites {
                        cmd.push_str(&format!(
                            " -knownSites {}",
                            require_path(known, GATK_TAG, "known sites VCF")?
                        ));
                    }
                    cmd.push_str(&format!(
                        " -o {}",
                        require_path(output, GATK_TAG, "recalibration table")?
                    ));
                    Ok(cmd)
                }
                GatkCommand::HaplotypeCaller {
                    threads,
                    reference,
                    input,
                    dbsnp,
                    output,
                } => Ok(format!(
                    "{} -T HaplotypeCaller -nct {} -R {} -I {} --standard_min_confidence_threshold_for_calling {} --dbsnp {} -o {}",
                    engine(tools),
                    threads,
                    require_path(reference, GATK_TAG, "reference")?,
                    require_path(input, GATK_TAG, "input BAM")?,
                    MIN_CALL_CONFIDENCE,
                    require_path(dbsnp, GATK_TAG, "dbSNP VCF")?,
                    require_path(output, GATK_TAG, "output VCF")?,
                )),
                GatkCommand::SubsetBam {
                    threads,
                    reference,
                    input,
                    region,
                    output,
                } => {
                    if region.is_empty() {
                        return Err(anyhow!("{}: missing required genome region", GATK_TAG));
                    }
                    Ok(format!(
                        "{} --num_threads {} -R {} -I {} -o {} -L {}",
                        engine(tools),
                        threads,
                        require_path(reference, GATK_TAG, "reference")?,
                        require_path(input, GATK_TAG, "input BAM")?,
                        require_path(output, GATK_TAG, "output BAM")?,
                        region,
                    ))
                }
            }
        }
    }
}

pub mod picard {
    use std::path::PathBuf;

    use anyhow::Result;

    use super::require_path;
    use crate::config::defs::{
        PICARD_TAG, READ_GROUP_LIBRARY, READ_GROUP_PLATFORM, READ_GROUP_PLATFORM_UNIT,
        READ_GROUP_SAMPLE, ToolSettings,
    };
    use crate::utils::path::path_to_shell;

    #[derive(Debug, Clone)]
    pub enum PicardCommand {
        /// Adds the fixed platform/library/sample read-group tags; sorts by
        /// coordinate in the same pass when requested.
        AddOrReplaceReadGroups {
            input: PathBuf,
            output: PathBuf,
            sort_coordinate: bool,
        },
        SortSam {
            input: PathBuf,
            output: PathBuf,
        },
        MarkDuplicates {
            input: PathBuf,
            output: PathBuf,
            metrics: PathBuf,
        },
        CreateSequenceDictionary {
            reference: PathBuf,
            output: PathBuf,
        },
        /// Runs through the jar rather than the `picard-tools` front-end;
        /// SortVcf is absent from older front-end packages.
        SortVcf {
            input: PathBuf,
            output: PathBuf,
            sequence_dictionary: PathBuf,
        },
    }

    impl PicardCommand {
        pub fn render(&self, tools: &ToolSettings) -> Result<String> {
            match self {
                PicardCommand::AddOrReplaceReadGroups {
                    input,
                    output,
                    sort_coordinate,
                } => {
                    let mut cmd = format!(
                        "{} AddOrReplaceReadGroups PU={} PL={} SM={} LB={} I={} O={}",
                        PICARD_TAG,
                        READ_GROUP_PLATFORM_UNIT,
                        READ_GROUP_PLATFORM,
                        READ_GROUP_SAMPLE,
                        READ_GROUP_LIBRARY,
                        require_path(input, PICARD_TAG, "input BAM")?,
                        require_path(output, PICARD_TAG, "output BAM")?,
                    );
                    if *sort_coordinate {
                        cmd.push_str(" SO=coordinate");
                    }
                    Ok(cmd)
                }
                PicardCommand::SortSam { input, output } => Ok(format!(
                    "{} SortSam SO=coordinate I={} O={}",
                    PICARD_TAG,
                    require_path(input, PICARD_TAG, "input BAM")?,
                    require_path(output, PICARD_TAG, "output BAM")?,
                )),
                PicardCommand::MarkDuplicates {
                    input,
                    output,
                    metrics,
                } => Ok(format!(
                    // AS=true: inputs are already coordinate-sorted
                    "{} MarkDuplicates I={} O={} M={} AS=true",
                    PICARD_TAG,
                    require_path(input, PICARD_TAG, "input BAM")?,
                    require_path(output, PICARD_TAG, "output BAM")?,
                    require_path(metrics, PICARD_TAG, "metrics file")?,
                )),
                PicardCommand::CreateSequenceDictionary { reference, output } => Ok(format!(
                    "{} CreateSequenceDictionary R={} O={}",
                    PICARD_TAG,
                    require_path(reference, PICARD_TAG, "reference FASTA")?,
                    require_path(output, PICARD_TAG, "dictionary output")?,
                )),
                PicardCommand::SortVcf {
                    input,
                    output,
                    sequence_dictionary,
                } => Ok(format!(
                    "java -Xmx{}G -jar {} SortVcf I={} O={} SEQUENCE_DICTIONARY={}",
                    tools.java_heap_gb,
                    path_to_shell(&tools.picard_jar),
                    require_path(input, PICARD_TAG, "input VCF")?,
                    require_path(output, PICARD_TAG, "output VCF")?,
                    require_path(sequence_dictionary, PICARD_TAG, "sequence dictionary")?,
                )),
            }
        }
    }
}

pub mod samtools {
    use std::path::PathBuf;

    use anyhow::Result;

    use super::require_path;
    use crate::config::defs::SAMTOOLS_TAG;

    #[derive(Debug, Clone)]
    pub enum SamtoolsCommand {
        /// Greps the BAM header into a marker file whose size encodes the
        /// probe result.
        HeaderProbe {
            input: PathBuf,
            pattern: String,
            marker: PathBuf,
        },
        Faidx {
            reference: PathBuf,
        },
        Index {
            input: PathBuf,
        },
    }

    impl SamtoolsCommand {
        pub fn render(&self) -> Result<String> {
            match self {
                SamtoolsCommand::HeaderProbe {
                    input,
                    pattern,
                    marker,
                } => Ok(format!(
                    "{} view -H {} | grep {} > {}",
                    SAMTOOLS_TAG,
                    require_path(input, SAMTOOLS_TAG, "input BAM")?,
                    pattern,
                    require_path(marker, SAMTOOLS_TAG, "marker file")?,
                )),
                SamtoolsCommand::Faidx { reference } => Ok(format!(
                    "{} faidx {}",
                    SAMTOOLS_TAG,
                    require_path(reference, SAMTOOLS_TAG, "reference FASTA")?,
                )),
                SamtoolsCommand::Index { input } => Ok(format!(
                    "{} index {}",
                    SAMTOOLS_TAG,
                    require_path(input, SAMTOOLS_TAG, "input BAM")?,
                )),
            }
        }
    }
}

pub mod fetch {
    use anyhow::{Result, anyhow};

    use crate::config::defs::{GUNZIP_TAG, WGET_TAG};

    pub fn wget(url: &str) -> Result<String> {
        if url.is_empty() {
            return Err(anyhow!("{}: missing required URL", WGET_TAG));
        }
        Ok(format!("{} {}", WGET_TAG, url))
    }

    pub fn gunzip(file: &str) -> Result<String> {
        if file.is_empty() {
            return Err(anyhow!("{}: missing required file name", GUNZIP_TAG));
        }
        Ok(format!("{} {}", GUNZIP_TAG, file))
    }

    pub fn remove(file: &str) -> Result<String> {
        if file.is_empty() {
            return Err(anyhow!("rm: missing required file name"));
        }
        Ok(format!("rm {}", file))
    }
}

/// Index commands for a reference FASTA, emitted only when the `.fai` or
/// `.dict` companion is absent on disk at script-generation time.
pub fn genome_index_commands(genome_fasta: &Path, tools: &ToolSettings) -> Result<Vec<String>> {
    use crate::utils::file::replace_extension;

    let mut commands = Vec::new();

    let fai = {
        let mut s = genome_fasta.as_os_str().to_os_string();
        s.push(".fai");
        PathBuf::from(s)
    };
    if !fai.exists() {
        commands.push(
            samtools::SamtoolsCommand::Faidx {
                reference: genome_fasta.to_path_buf(),
            }
            .render()?,
        );
    }

    let dict = replace_extension(genome_fasta, "dict");
    if !dict.exists() {
        commands.push(
            picard::PicardCommand::CreateSequenceDictionary {
                reference: genome_fasta.to_path_buf(),
                output: dict,
            }
            .render(tools)?,
        );
    }

    Ok(commands)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::defs::ToolSettings;
    use std::path::PathBuf;

    fn settings() -> ToolSettings {
        ToolSettings::default()
    }

    #[test]
    fn haplotype_caller_carries_confidence_threshold_and_dbsnp() {
        let cmd = gatk::GatkCommand::HaplotypeCaller {
            threads: 4,
            reference: PathBuf::from("/data/genome.fa"),
            input: PathBuf::from("/data/sample.bam"),
            dbsnp: PathBuf::from("/data/dbsnp.vcf"),
            output: PathBuf::from("/data/sample.vcf"),
        }
        .render(&settings())
        .unwrap();
        assert!(cmd.starts_with("java -Xmx20G -jar GenomeAnalysisTK.jar -T HaplotypeCaller"));
        assert!(cmd.contains("-nct 4"));
        assert!(cmd.contains("--standard_min_confidence_threshold_for_calling 20"));
        assert!(cmd.contains("--dbsnp /data/dbsnp.vcf"));
    }

    #[test]
    fn missing_required_path_is_a_render_error() {
        let err = gatk::GatkCommand::ReassignMappingQuality {
            reference: PathBuf::new(),
            input: PathBuf::from("/data/sample.bam"),
            output: PathBuf::from("/data/out.bam"),
        }
        .render(&settings())
        .unwrap_err();
        assert!(err.to_string().contains("reference"));
    }

    #[test]
    fn read_groups_use_fixed_tags_and_optional_sort() {
        let grouped_only = picard::PicardCommand::AddOrReplaceReadGroups {
            input: PathBuf::from("/data/sample.bam"),
            output: PathBuf::from("/data/sample.grouped.bam"),
            sort_coordinate: false,
        }
        .render(&settings())
        .unwrap();
        assert!(grouped_only.contains("PU=platform PL=illumina SM=sample LB=library"));
        assert!(!grouped_only.contains("SO=coordinate"));

        let group_and_sort = picard::PicardCommand::AddOrReplaceReadGroups {
            input: PathBuf::from("/data/sample.bam"),
            output: PathBuf::from("/data/sample.sorted.grouped.bam"),
            sort_coordinate: true,
        }
        .render(&settings())
        .unwrap();
        assert!(group_and_sort.ends_with("SO=coordinate"));
    }

    #[test]
    fn windows_paths_are_translated_in_rendered_commands() {
        let cmd = samtools::SamtoolsCommand::Index {
            input: PathBuf::from(r"C:\data\sample.bam"),
        }
        .render()
        .unwrap();
        assert_eq!(cmd, "samtools index /mnt/c/data/sample.bam");
    }

    #[test]
    fn guarded_delete_and_rerun_lines() {
        let guard = PathBuf::from("/data/out.bam");
        let stale = PathBuf::from("/data/in.bam");
        assert_eq!(
            remove_if_exists(&guard, &[&stale]),
            "if [ -f /data/out.bam ]; then rm -f /data/in.bam; fi"
        );
        assert_eq!(
            run_if_missing(&guard, "echo retry"),
            "if [ ! -f /data/out.bam ]; then echo retry; fi"
        );
    }

    #[test]
    fn wget_rejects_empty_url() {
        assert!(fetch::wget("").is_err());
        assert_eq!(
            fetch::wget("ftp://example/known.vcf.gz").unwrap(),
            "wget ftp://example/known.vcf.gz"
        );
    }
}

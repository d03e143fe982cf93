// src/utils/install.rs: One-time environment setup scripts

use std::path::Path;

use anyhow::Result;

use crate::config::defs::{
    CHROMOSOME_MAPPINGS_DIR, CHROMOSOME_MAPPINGS_REPO, GATK_JAR, PICARD_JAR, PICARD_RELEASE_URL,
};
use crate::utils::command::change_dir;

/// System packages required by the pipeline tools, installed through apt.
pub const APT_DEPENDENCIES: &[&str] = &[
    // installers
    "gcc",
    "g++",
    "make",
    "cmake",
    "build-essential",
    // file compression
    "zlib1g-dev",
    // bioinformatics
    "samtools",
    "picard-tools",
    "tophat",
    "cufflinks",
    // commandline tools
    "gawk",
    "git",
    "python",
    "python-dev",
    "python-setuptools",
    "libpython2.7-dev",
];

/// Script lines that check for and install the system packages, the python
/// stack used by RSeQC, and a Java 8 runtime.
pub fn dependency_setup_commands() -> Vec<String> {
    let mut commands = vec![
        "echo \"Checking for updates and installing any missing dependencies. Please enter your password for this step:\"".to_string(),
        "sudo apt-get -y update".to_string(),
        "sudo apt-get -y upgrade".to_string(),
    ];

    for dependency in APT_DEPENDENCIES {
        commands.push(format!(
            "if command -v {dep} > /dev/null 2>&1 ; then\n  echo found\nelse\n  sudo apt-get -y install {dep}\nfi",
            dep = dependency
        ));
    }

    // python setup
    commands.push("sudo easy_install pip".to_string());
    commands.push("sudo pip install --upgrade virtualenv".to_string());
    commands.push("pip install --upgrade pip".to_string());
    commands.push(
        "sudo pip install --upgrade qc bitsets cython bx-python pysam RSeQC numpy".to_string(),
    );

    // java8 setup
    commands.push(
        [
            "version=$(java -version 2>&1 | awk -F '\"' '/version/ {print $2}')",
            "if [[ \"$version\" > \"1.5\" ]]; then",
            "  echo found",
            "else",
            "  sudo add-apt-repository ppa:webupd8team/java",
            "  sudo apt-get -y update",
            "  sudo apt-get -y install oracle-java8-installer",
            "fi",
        ]
        .join("\n"),
    );

    commands
}

/// Script lines that stage the GATK jar (manual download, license-gated),
/// clone the chromosome mapping tables, and fetch the Picard jar.
pub fn gatk_install_commands(work_dir: &Path) -> Result<Vec<String>> {
    use crate::utils::command::fetch;
    use crate::utils::path::path_to_shell;

    let shell_dir = path_to_shell(work_dir);
    Ok(vec![
        change_dir(work_dir),
        format!("while [ ! -f {}/GenomeAnalysisTK* ]", shell_dir),
        "do".to_string(),
        format!(
            "  echo \"Genome Analysis Toolkit (GATK) not found. Please download GATK from https://software.broadinstitute.org/gatk/download/ and place the .tar.bz2 file in {}\"",
            shell_dir
        ),
        "  read -n 1 -s -r -p \"Press any key to continue\"".to_string(),
        "done".to_string(),
        format!("if [ ! -f {jar} ]; then tar -jxvf GenomeAnalysisTK-*.tar.bz2; fi", jar = GATK_JAR),
        format!("if [ ! -f {jar} ]; then rm GenomeAnalysisTK-*.tar.bz2; fi", jar = GATK_JAR),
        format!("if [ ! -f {jar} ]; then mv GenomeAnalysisTK-*/{jar} .; fi", jar = GATK_JAR),
        format!("if [ -f {jar} ]; then rm -r GenomeAnalysisTK-*; fi", jar = GATK_JAR),
        format!(
            "if [ ! -d {} ]; then git clone {}; fi",
            CHROMOSOME_MAPPINGS_DIR, CHROMOSOME_MAPPINGS_REPO
        ),
        format!(
            "if [ ! -f {} ]; then {}; fi",
            PICARD_JAR,
            fetch::wget(PICARD_RELEASE_URL)?
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn every_apt_package_is_guarded_by_a_presence_check() {
        let commands = dependency_setup_commands();
        for dependency in APT_DEPENDENCIES {
            let guard = format!("if command -v {}", dependency);
            let install = format!("sudo apt-get -y install {}", dependency);
            assert!(
                commands.iter().any(|c| c.contains(&guard) && c.contains(&install)),
                "no guarded install for {}",
                dependency
            );
        }
    }

    #[test]
    fn gatk_install_stages_jar_mappings_and_picard() {
        let commands = gatk_install_commands(&PathBuf::from("/opt/pipeline")).unwrap();
        assert_eq!(commands[0], "cd /opt/pipeline");
        let joined = commands.join("\n");
        assert!(joined.contains("tar -jxvf GenomeAnalysisTK-*.tar.bz2"));
        assert!(joined.contains("git clone https://github.com/dpryan79/ChromosomeMappings.git"));
        assert!(joined.contains("wget https://github.com/broadinstitute/picard/releases/download/2.15.0/picard.jar"));
    }
}

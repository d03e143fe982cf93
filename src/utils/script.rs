// src/utils/script.rs: Script generation and launch

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use anyhow::{Result, anyhow};
use tokio::process::{Child, Command};

use crate::config::defs::ToolSettings;
use crate::utils::path::path_to_shell;

// Cosmetic banner echoed at the top of every generated script.
const BANNER: &[&str] = &[
    r"__________________________________________________",
    r"                                                  ",
    r" ____  _   _    _        ____  _____ ___          ",
    r"|  _ \| \ | |  / \      / ___|| ____/ _ \         ",
    r"| |_) |  \| | / _ \ ____\___ \|  _|| | | |        ",
    r"|  _ <| |\  |/ ___ \_____|__) | |__| |_| |        ",
    r"|_| \_\_| \_/_/   \_\   |____/|_____\__\_\        ",
    r"                                                  ",
    r"          variant calling wrappers                ",
    r"__________________________________________________",
];

fn banner_lines() -> Vec<String> {
    BANNER
        .iter()
        .map(|line| format!("echo \"{}\"", line))
        .collect()
}

/// Serializes commands to a script file: missing parent directories are
/// created, the destination is overwritten, and the banner is followed by one
/// command per line. No shebang and no exit-code trapping; a failing line
/// does not stop the lines after it.
///
/// # Arguments
///
/// * `script_path` - Destination file; parents created as needed.
/// * `commands` - Ordered command lines, written verbatim.
pub fn generate_script(script_path: &Path, commands: &[String]) -> Result<()> {
    if let Some(parent) = script_path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| anyhow!("Failed to create {}: {}", parent.display(), e))?;
    }
    let mut file = File::create(script_path)
        .map_err(|e| anyhow!("Failed to create {}: {}", script_path.display(), e))?;
    for line in banner_lines() {
        writeln!(file, "{}", line)?;
    }
    for cmd in commands {
        writeln!(file, "{}", cmd)?;
    }
    Ok(())
}

/// Launches the configured shell interpreter on an already-written script and
/// returns the child process. Callers own the wait; no exit-code inspection
/// happens here.
pub fn run_script(tools: &ToolSettings, script_path: &Path) -> Result<Child> {
    let shell_script = path_to_shell(script_path);
    Command::new(&tools.shell_path)
        .arg("-c")
        .arg(format!("bash {}", shell_script))
        .spawn()
        .map_err(|e| {
            anyhow!(
                "Failed to spawn {}: {}. Is bash installed?",
                tools.shell_path.display(),
                e
            )
        })
}

/// Writes the script and launches it in one step.
pub fn generate_and_run_script(
    tools: &ToolSettings,
    script_path: &Path,
    commands: &[String],
) -> Result<Child> {
    generate_script(script_path, commands)?;
    run_script(tools, script_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_has_banner_then_commands_in_order() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let script = dir.path().join("scripts").join("test.bash");
        let commands = vec!["echo one".to_string(), "echo two".to_string()];
        generate_script(&script, &commands)?;

        let contents = fs::read_to_string(&script)?;
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), BANNER.len() + 2);
        assert!(lines[0].starts_with("echo \""));
        assert_eq!(lines[BANNER.len()], "echo one");
        assert_eq!(lines[BANNER.len() + 1], "echo two");
        Ok(())
    }

    #[test]
    fn regeneration_overwrites_previous_script() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let script = dir.path().join("test.bash");
        generate_script(&script, &["echo first".to_string()])?;
        generate_script(&script, &["echo second".to_string()])?;

        let contents = fs::read_to_string(&script)?;
        assert!(!contents.contains("echo first"));
        assert!(contents.contains("echo second"));
        Ok(())
    }
}

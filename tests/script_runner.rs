use anyhow::Result;
use std::fs;

use rnaseq_varcall::config::defs::ToolSettings;
use rnaseq_varcall::utils::script::{generate_and_run_script, generate_script};

#[tokio::test]
async fn generated_script_runs_through_the_shell() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let witness = dir.path().join("witness.txt");
    let script = dir.path().join("scripts").join("touch.bash");

    let commands = vec![format!("touch {}", witness.display())];
    let mut child = generate_and_run_script(&ToolSettings::default(), &script, &commands)?;
    child.wait().await?;

    assert!(witness.exists());
    assert!(script.exists());
    Ok(())
}

#[tokio::test]
async fn failing_line_does_not_stop_later_lines() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let witness = dir.path().join("after_failure.txt");
    let script = dir.path().join("scripts").join("failing.bash");

    // No error trapping in generated scripts: a missing tool on one line
    // must not prevent the next line from running.
    let commands = vec![
        "definitely_not_an_installed_tool --flag".to_string(),
        format!("touch {}", witness.display()),
    ];
    let mut child = generate_and_run_script(&ToolSettings::default(), &script, &commands)?;
    child.wait().await?;

    assert!(witness.exists());
    Ok(())
}

#[tokio::test]
async fn script_is_regenerated_not_appended() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let script = dir.path().join("scripts").join("regen.bash");

    generate_script(&script, &["echo run-one".to_string()])?;
    let first_len = fs::metadata(&script)?.len();
    generate_script(&script, &["echo run-two".to_string()])?;
    let second_len = fs::metadata(&script)?.len();

    assert_eq!(first_len, second_len);
    assert!(fs::read_to_string(&script)?.contains("echo run-two"));
    Ok(())
}

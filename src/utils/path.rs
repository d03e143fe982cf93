// src/utils/path.rs: Host-to-shell path translation

use std::path::Path;

use lazy_static::lazy_static;
use regex::Regex;

/// Mount point the execution shell exposes host drives under.
pub const MOUNT_PREFIX: &str = "/mnt/";

lazy_static! {
    static ref DRIVE_LETTER: Regex = Regex::new(r"^([A-Za-z]):").unwrap();
}

/// Rewrites a host-style path into the syntax the execution shell expects.
///
/// A leading drive letter becomes a lower-cased directory under the mount
/// prefix and backslashes become forward slashes. Paths already under the
/// mount prefix, and paths with neither a drive letter nor backslashes, pass
/// through unchanged, so the translation is idempotent. Malformed input is
/// not rejected; it surfaces when the downstream shell command fails.
///
/// # Arguments
///
/// * `path` - Host-style path string; may already be in shell form.
///
/// # Returns
/// The translated path string. Empty input yields empty output.
pub fn to_shell_path(path: &str) -> String {
    if path.is_empty() {
        return String::new();
    }
    if path.starts_with(MOUNT_PREFIX) {
        return path.to_string();
    }
    let normalized = path.replace('\\', "/");
    match DRIVE_LETTER.captures(&normalized) {
        Some(caps) => {
            let letter = caps[1].to_ascii_lowercase();
            let rest = &normalized[caps[0].len()..];
            format!("{}{}{}", MOUNT_PREFIX, letter, rest)
        }
        None => normalized,
    }
}

/// `to_shell_path` for filesystem path types.
pub fn path_to_shell(path: &Path) -> String {
    to_shell_path(&path.to_string_lossy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn drive_letter_is_lowered_under_mount_prefix() {
        assert_eq!(to_shell_path(r"C:\data\sample.bam"), "/mnt/c/data/sample.bam");
        assert_eq!(to_shell_path(r"d:\work"), "/mnt/d/work");
    }

    #[test]
    fn shell_form_is_a_fixed_point() {
        let inputs = [
            r"C:\data\sample.bam",
            "/mnt/c/data/sample.bam",
            "/home/user/genome.fa",
            "relative/path.vcf",
        ];
        for input in inputs {
            let once = to_shell_path(input);
            assert_eq!(to_shell_path(&once), once, "not idempotent for {}", input);
        }
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert_eq!(to_shell_path(""), "");
    }

    #[test]
    fn unix_paths_pass_through() {
        assert_eq!(to_shell_path("/home/user/genome.fa"), "/home/user/genome.fa");
    }

    #[test]
    fn backslashes_are_normalized_without_drive_letter() {
        assert_eq!(to_shell_path(r"data\sub\file.txt"), "data/sub/file.txt");
    }

    #[test]
    fn path_types_translate_too() {
        let p = PathBuf::from("/mnt/c/already/there");
        assert_eq!(path_to_shell(&p), "/mnt/c/already/there");
    }
}

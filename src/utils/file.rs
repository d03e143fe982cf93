use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};

/// Derives a stage output name from its input: the final extension is
/// stripped and `.{suffix}` appended, e.g. `sample.bam` + `marked.bam` ->
/// `sample.marked.bam`. Suffix chaining keeps every stage's output name
/// distinct for the same input.
pub fn replace_extension(path: &Path, suffix: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            parent.join(format!("{}.{}", stem, suffix))
        }
        _ => PathBuf::from(format!("{}.{}", stem, suffix)),
    }
}

/// The only existence check performed on artifacts: present and non-zero
/// size. No checksum or version validation.
pub fn is_nonempty_file(path: &Path) -> bool {
    fs::metadata(path).map(|m| m.len() > 0).unwrap_or(false)
}

/// Loads a two-column tab-separated mapping table, first column to second.
pub fn load_chromosome_map(path: &Path) -> Result<HashMap<String, String>> {
    let file = File::open(path)
        .map_err(|e| anyhow!("Failed to open mapping table {}: {}", path.display(), e))?;
    let mut map = HashMap::new();
    for line in BufReader::new(file).lines() {
        let line = line?;
        if let Some((from, to)) = line.split_once('\t') {
            map.insert(from.to_string(), to.to_string());
        }
    }
    Ok(map)
}

/// Rewrites the first tab-delimited field of every record line through the
/// mapping table. Lines whose first field has no entry pass through
/// unchanged; newlines are normalized to `\n`.
pub fn remap_chromosomes(
    map: &HashMap<String, String>,
    input: &Path,
    output: &Path,
) -> Result<()> {
    let reader = BufReader::new(
        File::open(input).map_err(|e| anyhow!("Failed to open {}: {}", input.display(), e))?,
    );
    let mut writer = BufWriter::new(
        File::create(output)
            .map_err(|e| anyhow!("Failed to create {}: {}", output.display(), e))?,
    );
    for line in reader.lines() {
        let line = line?;
        match line.split_once('\t') {
            Some((first, rest)) => match map.get(first) {
                Some(mapped) => writeln!(writer, "{}\t{}", mapped, rest)?,
                None => writeln!(writer, "{}", line)?,
            },
            None => match map.get(line.as_str()) {
                Some(mapped) => writeln!(writer, "{}", mapped)?,
                None => writeln!(writer, "{}", line)?,
            },
        }
    }
    writer.flush()?;
    Ok(())
}

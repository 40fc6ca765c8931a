use anyhow::{Context, Result};
use std::io::{BufRead, Write};
use std::path::PathBuf;

pub const ROOT_PROMPT: &str = "Enter location you'd like to search for Drawing Metadata in: ";

/// Ask for the folder to search and read one line of input.
///
/// Surrounding whitespace and one pair of surrounding double quotes
/// (as left by "Copy as path" on Windows) are removed.
pub fn read_root<R: BufRead, W: Write>(mut input: R, mut output: W) -> Result<PathBuf> {
    write!(output, "{ROOT_PROMPT}").context("Failed to write prompt")?;
    output.flush().context("Failed to write prompt")?;

    let mut line = String::new();
    input
        .read_line(&mut line)
        .context("Failed to read folder path")?;

    let trimmed = line.trim();
    let path = trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(trimmed)
        .trim();

    if path.is_empty() {
        anyhow::bail!("No folder path entered");
    }

    Ok(PathBuf::from(path))
}

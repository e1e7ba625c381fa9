//! JSON Lines files: one JSON object per line, newline-delimited.

use miette::Diagnostic;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum JsonlError {
    #[error("IO error: {0}")]
    #[diagnostic(code(homeboard::backup::jsonl::io))]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    #[diagnostic(code(homeboard::backup::jsonl::serialize))]
    Serialize(#[from] serde_json::Error),

    #[error("Invalid JSONL line {line}: {error}")]
    #[diagnostic(code(homeboard::backup::jsonl::invalid_line))]
    InvalidLine { line: usize, error: String },
}

/// Write each item as a single line, replacing the file.
pub fn write_jsonl<T: Serialize>(path: &Path, items: &[T]) -> Result<(), JsonlError> {
    let mut writer = BufWriter::new(File::create(path)?);
    for item in items {
        let json = serde_json::to_string(item)?;
        writeln!(writer, "{}", json)?;
    }
    writer.flush()?;
    Ok(())
}

/// Read every non-blank line of a file. Line numbers in errors are 1-based.
pub fn read_jsonl<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, JsonlError> {
    let reader = BufReader::new(File::open(path)?);
    let mut items = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let item = serde_json::from_str(&line).map_err(|e| JsonlError::InvalidLine {
            line: index + 1,
            error: e.to_string(),
        })?;
        items.push(item);
    }

    Ok(items)
}

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::AppError;

/// Page headers inserted by the OCR step, matched case-insensitively at line start.
const PAGE_MARKER: &str = "página";

/// An OCR transcript and its cleaned, single-line form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub path: PathBuf,
    pub raw: String,
    pub cleaned: String,
}

/// Read a UTF-8 transcript from disk. A missing file is fatal and never retryable.
pub fn load_document(path: &Path) -> Result<Document, AppError> {
    if !path.exists() {
        return Err(
            AppError::new("INGEST_INPUT_NOT_FOUND", "Input transcript not found")
                .with_details(format!("path={}", path.display())),
        );
    }
    if path.is_dir() {
        return Err(
            AppError::new("INGEST_INPUT_INVALID", "Input transcript must be a file")
                .with_details(format!("path={}", path.display())),
        );
    }
    let raw = fs::read_to_string(path).map_err(|e| {
        AppError::new("INGEST_INPUT_READ_FAILED", "Failed to read input transcript")
            .with_details(format!("path={}; err={}", path.display(), e))
    })?;
    let cleaned = clean_text(&raw);

    tracing::info!(
        path = %path.display(),
        raw_chars = raw.chars().count(),
        cleaned_chars = cleaned.chars().count(),
        "loaded transcript"
    );

    Ok(Document {
        path: path.to_path_buf(),
        raw,
        cleaned,
    })
}

/// Drop page-marker lines, separator rules and blank lines; join the rest with single spaces.
pub fn clean_text(raw: &str) -> String {
    raw.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .filter(|l| !is_page_marker(l))
        .filter(|l| !is_separator_rule(l))
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_page_marker(line: &str) -> bool {
    line.to_lowercase().starts_with(PAGE_MARKER)
}

fn is_separator_rule(line: &str) -> bool {
    if line.starts_with("___") {
        return true;
    }
    // Rules like "-----" or "=====" also come out of OCR page breaks.
    line.chars().count() >= 3 && line.chars().all(|c| matches!(c, '-' | '_' | '=' | '*'))
}

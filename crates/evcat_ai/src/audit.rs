use std::fs;
use std::path::{Path, PathBuf};

use evcat_core::error::AppError;

/// Verbatim per-chunk prompt and reply files, for tracing a row back to what was sent.
///
/// Files are named `chunk_<NNN>_prompt.txt` / `chunk_<NNN>_reply.txt` with a zero-padded
/// ordinal; a rerun overwrites them.
#[derive(Debug, Clone)]
pub struct AuditLog {
    dir: PathBuf,
}

impl AuditLog {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn prompt_path(&self, ordinal: usize) -> PathBuf {
        self.dir.join(format!("chunk_{ordinal:03}_prompt.txt"))
    }

    pub fn reply_path(&self, ordinal: usize) -> PathBuf {
        self.dir.join(format!("chunk_{ordinal:03}_reply.txt"))
    }

    pub fn record_prompt(&self, ordinal: usize, prompt: &str) -> Result<PathBuf, AppError> {
        let path = self.prompt_path(ordinal);
        self.write(&path, prompt)?;
        Ok(path)
    }

    pub fn record_reply(&self, ordinal: usize, reply: &str) -> Result<PathBuf, AppError> {
        let path = self.reply_path(ordinal);
        self.write(&path, reply)?;
        Ok(path)
    }

    fn write(&self, path: &Path, text: &str) -> Result<(), AppError> {
        fs::create_dir_all(&self.dir).map_err(|e| {
            AppError::new("AUDIT_WRITE_FAILED", "Failed to create audit directory")
                .with_details(format!("path={}; err={}", self.dir.display(), e))
        })?;
        fs::write(path, text).map_err(|e| {
            AppError::new("AUDIT_WRITE_FAILED", "Failed to write audit artifact")
                .with_details(format!("path={}; err={}", path.display(), e))
        })
    }
}

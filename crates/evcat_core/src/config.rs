use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::table::TableFormat;

pub const DEFAULT_CHUNK_BUDGET: usize = 80_000;
pub const DEFAULT_INPUT_PATH: &str = "entrada/processo.txt";
pub const DEFAULT_TABLE_PATH: &str = "saida/evidencias_extraidas.csv";
pub const DEFAULT_AUDIT_DIR: &str = "logs";

/// Everything a pipeline run needs, passed explicitly into the orchestrator.
///
/// Every field has a default, so a config file only needs to list what it overrides.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PipelineConfig {
    pub input_path: PathBuf,
    pub table_path: PathBuf,
    /// Directory for per-chunk prompt/reply artifacts. `None` disables them.
    pub audit_dir: Option<PathBuf>,
    /// Maximum characters per chunk.
    pub chunk_budget: usize,
    /// Instruction block prepended to every chunk. `None` uses the built-in one.
    pub preamble: Option<String>,
    pub generator: GeneratorConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from(DEFAULT_INPUT_PATH),
            table_path: PathBuf::from(DEFAULT_TABLE_PATH),
            audit_dir: Some(PathBuf::from(DEFAULT_AUDIT_DIR)),
            chunk_budget: DEFAULT_CHUNK_BUDGET,
            preamble: None,
            generator: GeneratorConfig::default(),
        }
    }
}

/// Which text-generation service answers the per-chunk prompts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "provider", rename_all = "snake_case")]
pub enum GeneratorConfig {
    Ollama {
        base_url: String,
        model: String,
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
    },
    Gemini {
        base_url: String,
        model: String,
        /// Name of the environment variable holding the API key. The key itself never
        /// lives in the config file.
        #[serde(default = "default_api_key_env")]
        api_key_env: String,
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
    },
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig::Gemini {
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            model: "gemini-2.0-flash".to_string(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl GeneratorConfig {
    pub fn model(&self) -> &str {
        match self {
            GeneratorConfig::Ollama { model, .. } | GeneratorConfig::Gemini { model, .. } => model,
        }
    }

    pub fn provider(&self) -> &'static str {
        match self {
            GeneratorConfig::Ollama { .. } => "ollama",
            GeneratorConfig::Gemini { .. } => "gemini",
        }
    }
}

fn default_timeout_secs() -> u64 {
    300
}

fn default_api_key_env() -> String {
    "GOOGLE_API_KEY".to_string()
}

impl PipelineConfig {
    /// Read, decode and validate a JSON config file.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let raw = fs::read_to_string(path).map_err(|e| {
            AppError::new("CONFIG_READ_FAILED", "Failed to read config file")
                .with_details(format!("path={}; err={}", path.display(), e))
        })?;
        let cfg: PipelineConfig = serde_json::from_str(&raw).map_err(|e| {
            AppError::new("CONFIG_INVALID", "Failed to decode config file")
                .with_details(format!("path={}; err={}", path.display(), e))
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.chunk_budget == 0 {
            return Err(AppError::new(
                "CONFIG_INVALID",
                "chunk_budget must be greater than zero",
            ));
        }
        TableFormat::from_path(&self.table_path)?;
        if self.generator.model().trim().is_empty() {
            return Err(AppError::new("CONFIG_INVALID", "Generator model is required")
                .with_details(format!("provider={}", self.generator.provider())));
        }
        if matches!(self.preamble.as_deref(), Some(p) if p.trim().is_empty()) {
            return Err(AppError::new(
                "CONFIG_INVALID",
                "preamble must not be blank when provided",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_file_keeps_defaults() {
        let cfg: PipelineConfig = serde_json::from_str(
            r#"{ "chunk_budget": 1000, "generator": { "provider": "ollama", "base_url": "http://127.0.0.1:11434", "model": "llama3" } }"#,
        )
        .expect("decode");
        assert_eq!(cfg.chunk_budget, 1000);
        assert_eq!(cfg.table_path, PathBuf::from(DEFAULT_TABLE_PATH));
        assert_eq!(cfg.generator.provider(), "ollama");
        assert_eq!(cfg.generator.model(), "llama3");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn rejects_zero_budget_and_unknown_table_extension() {
        let mut cfg = PipelineConfig {
            chunk_budget: 0,
            ..PipelineConfig::default()
        };
        assert_eq!(cfg.validate().unwrap_err().code, "CONFIG_INVALID");

        cfg.chunk_budget = 10;
        cfg.table_path = PathBuf::from("saida/evidencias.xlsx");
        assert_eq!(cfg.validate().unwrap_err().code, "CONFIG_INVALID");
    }
}

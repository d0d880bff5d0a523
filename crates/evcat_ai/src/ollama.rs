use std::time::Duration;

use evcat_core::error::AppError;

use crate::llm::normalize_base_url;

#[derive(Debug, Clone)]
pub struct OllamaClient {
    base_url: String,
}

impl OllamaClient {
    /// Create a client for an Ollama server at `http(s)://host[:port]`.
    pub fn new(base_url: &str) -> Result<Self, AppError> {
        Ok(Self {
            base_url: normalize_base_url(base_url)?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn health_check(&self) -> Result<(), AppError> {
        let url = format!("{}/api/tags", self.base_url);
        let resp = ureq::get(&url).timeout(Duration::from_millis(800)).call();

        match resp {
            Ok(r) if r.status() == 200 => Ok(()),
            Ok(r) => Err(
                AppError::new("LLM_UNHEALTHY", "Ollama health check failed")
                    .with_details(format!("status={}", r.status())),
            ),
            Err(ureq::Error::Status(status, _)) => Err(
                AppError::new("LLM_UNHEALTHY", "Ollama health check failed")
                    .with_details(format!("status={status}")),
            ),
            Err(e) => Err(AppError::new("LLM_UNREACHABLE", "Failed to reach Ollama")
                .with_details(format!("base_url={}; err={}", self.base_url, e))
                .with_retryable(true)),
        }
    }
}

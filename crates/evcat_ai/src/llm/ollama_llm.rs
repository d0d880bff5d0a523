use std::time::Duration;

use evcat_core::error::AppError;
use serde::{Deserialize, Serialize};

use super::{request_failed, Llm};
use crate::ollama::OllamaClient;

#[derive(Debug, Clone)]
pub struct OllamaLlm {
    client: OllamaClient,
    timeout: Duration,
}

impl OllamaLlm {
    pub fn new(client: OllamaClient) -> Self {
        Self {
            client,
            timeout: Duration::from_secs(300),
        }
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }
}

#[derive(Debug, Clone, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Clone, Deserialize)]
struct GenerateResponse {
    response: String,
}

impl Llm for OllamaLlm {
    fn generate(&self, model: &str, prompt: &str) -> Result<String, AppError> {
        let url = format!("{}/api/generate", self.client.base_url());
        let req = GenerateRequest {
            model,
            prompt,
            stream: false,
        };

        let resp = ureq::post(&url)
            .timeout(self.timeout)
            .send_json(serde_json::to_value(req).map_err(|e| {
                AppError::new("LLM_REQUEST_FAILED", "Failed to encode generation request")
                    .with_details(e.to_string())
            })?)
            .map_err(|e| request_failed("ollama", e))?;

        let v: GenerateResponse = resp.into_json().map_err(|e| {
            AppError::new("LLM_REQUEST_FAILED", "Failed to decode generation response")
                .with_details(format!("provider=ollama; err={e}"))
        })?;
        let text = v.response.trim();
        if text.is_empty() {
            return Err(AppError::new("LLM_RESPONSE_EMPTY", "Generation response was empty")
                .with_details("provider=ollama"));
        }
        Ok(text.to_string())
    }
}

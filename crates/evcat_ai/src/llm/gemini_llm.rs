use std::time::Duration;

use evcat_core::error::AppError;
use serde::{Deserialize, Serialize};

use super::{normalize_base_url, request_failed, Llm};

/// Google Generative Language `generateContent` client.
#[derive(Clone)]
pub struct GeminiLlm {
    base_url: String,
    api_key: String,
    timeout: Duration,
}

impl std::fmt::Debug for GeminiLlm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiLlm")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl GeminiLlm {
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Result<Self, AppError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(AppError::new("LLM_API_KEY_MISSING", "Gemini API key is empty"));
        }
        Ok(Self {
            base_url: normalize_base_url(base_url)?,
            api_key,
            timeout: Duration::from_secs(300),
        })
    }

    /// Read the key from `api_key_env`. The key is never part of the config file.
    pub fn from_env(base_url: &str, api_key_env: &str) -> Result<Self, AppError> {
        let key = std::env::var(api_key_env).map_err(|_| {
            AppError::new("LLM_API_KEY_MISSING", "Gemini API key is not set")
                .with_details(format!("env={api_key_env}"))
        })?;
        Self::new(base_url, key)
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    pub fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: [RequestContent<'a>; 1],
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: [RequestPart<'a>; 1],
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

fn reply_text(resp: GenerateContentResponse) -> String {
    resp.candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| {
            c.parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<String>()
        })
        .unwrap_or_default()
}

impl Llm for GeminiLlm {
    fn generate(&self, model: &str, prompt: &str) -> Result<String, AppError> {
        let req = GenerateContentRequest {
            contents: [RequestContent {
                parts: [RequestPart { text: prompt }],
            }],
        };
        let body = serde_json::to_value(req).map_err(|e| {
            AppError::new("LLM_REQUEST_FAILED", "Failed to encode generation request")
                .with_details(e.to_string())
        })?;

        let resp = ureq::post(&self.endpoint(model))
            .timeout(self.timeout)
            .set("x-goog-api-key", &self.api_key)
            .send_json(body)
            .map_err(|e| request_failed("gemini", e))?;

        let decoded: GenerateContentResponse = resp.into_json().map_err(|e| {
            AppError::new("LLM_REQUEST_FAILED", "Failed to decode generation response")
                .with_details(format!("provider=gemini; err={e}"))
        })?;

        let text = reply_text(decoded);
        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::new("LLM_RESPONSE_EMPTY", "Generation response was empty")
                .with_details(format!("provider=gemini; model={model}")));
        }
        Ok(text.to_string())
    }
}

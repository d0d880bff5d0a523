use evcat_core::config::GeneratorConfig;
use evcat_core::error::AppError;

use crate::ollama::OllamaClient;

pub mod gemini_llm;
pub mod ollama_llm;

pub use gemini_llm::GeminiLlm;
pub use ollama_llm::OllamaLlm;

/// Text in, text out. One call per chunk; implementations never retry.
pub trait Llm {
    fn generate(&self, model: &str, prompt: &str) -> Result<String, AppError>;
}

/// Build the configured generation client.
pub fn build_llm(config: &GeneratorConfig) -> Result<Box<dyn Llm>, AppError> {
    match config {
        GeneratorConfig::Ollama {
            base_url,
            timeout_secs,
            ..
        } => {
            let client = OllamaClient::new(base_url)?;
            Ok(Box::new(OllamaLlm::new(client).with_timeout_secs(*timeout_secs)))
        }
        GeneratorConfig::Gemini {
            base_url,
            api_key_env,
            timeout_secs,
            ..
        } => {
            let llm = GeminiLlm::from_env(base_url, api_key_env)?.with_timeout_secs(*timeout_secs);
            Ok(Box::new(llm))
        }
    }
}

/// Trim a trailing slash and accept only `http(s)://host[:port]` with no path or userinfo.
pub(crate) fn normalize_base_url(base_url: &str) -> Result<String, AppError> {
    let trimmed = base_url.trim().trim_end_matches('/');
    let invalid = || {
        AppError::new("LLM_ENDPOINT_INVALID", "Generator base URL must be http(s)://host[:port]")
            .with_details(format!("base_url={trimmed}"))
    };

    let authority = trimmed
        .strip_prefix("http://")
        .or_else(|| trimmed.strip_prefix("https://"))
        .ok_or_else(invalid)?;
    if authority.is_empty() || authority.contains(&['/', '@', '?', '#'][..]) {
        return Err(invalid());
    }
    // A ':' inside brackets belongs to an IPv6 host, not a port.
    let (host, port) = match authority.rfind(':') {
        Some(i) if !authority[i..].contains(']') => (&authority[..i], Some(&authority[i + 1..])),
        _ => (authority, None),
    };
    if host.is_empty() {
        return Err(invalid());
    }
    if let Some(port) = port {
        if !matches!(port.parse::<u16>(), Ok(p) if p > 0) {
            return Err(invalid());
        }
    }
    Ok(trimmed.to_string())
}

/// Map a ureq failure to the shared error shape. 429 and 5xx are marked retryable so a
/// caller can decide; the pipeline itself never retries.
pub(crate) fn request_failed(provider: &str, err: ureq::Error) -> AppError {
    match err {
        ureq::Error::Status(status, _) => {
            AppError::new("LLM_REQUEST_FAILED", "Generation request was rejected")
                .with_details(format!("provider={provider}; status={status}"))
                .with_retryable(status == 429 || status >= 500)
        }
        ureq::Error::Transport(t) => {
            AppError::new("LLM_REQUEST_FAILED", "Failed to call generation endpoint")
                .with_details(format!("provider={provider}; err={t}"))
                .with_retryable(true)
        }
    }
}

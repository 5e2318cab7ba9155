use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::AdvisoryError;

/// Default Ollama endpoint.
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "llama3.1";

/// Language model client abstraction (allows mocking).
pub trait LlmClient: Send + Sync {
    fn generate(&self, model: &str, prompt: &str, system: &str) -> Result<String, AdvisoryError>;

    fn is_model_available(&self, model: &str) -> Result<bool, AdvisoryError>;

    fn list_models(&self) -> Result<Vec<String>, AdvisoryError>;
}

/// Ollama HTTP client.
pub struct OllamaClient {
    base_url: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl OllamaClient {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, AdvisoryError> {
        let client = reqwest::blocking::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| AdvisoryError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            timeout_secs,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn map_send_error(&self, e: reqwest::Error) -> AdvisoryError {
        if e.is_connect() {
            AdvisoryError::Unavailable(self.base_url.clone())
        } else if e.is_timeout() {
            AdvisoryError::Timeout(self.timeout_secs)
        } else {
            AdvisoryError::HttpClient(e.to_string())
        }
    }
}

/// Request body for Ollama /api/generate
#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    system: &'a str,
    stream: bool,
    format: &'a str,
}

/// Response body from Ollama /api/generate
#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}

/// Response body from Ollama /api/tags
#[derive(Deserialize)]
struct OllamaTagsResponse {
    models: Vec<OllamaModel>,
}

#[derive(Deserialize)]
struct OllamaModel {
    name: String,
}

impl LlmClient for OllamaClient {
    fn generate(&self, model: &str, prompt: &str, system: &str) -> Result<String, AdvisoryError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = OllamaGenerateRequest {
            model,
            prompt,
            system,
            stream: false,
            format: "json",
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(AdvisoryError::ModelError {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: OllamaGenerateResponse = response
            .json()
            .map_err(|e| AdvisoryError::Malformed(e.to_string()))?;

        Ok(parsed.response)
    }

    fn is_model_available(&self, model: &str) -> Result<bool, AdvisoryError> {
        let models = self.list_models()?;
        Ok(models.iter().any(|m| model_matches(m, model)))
    }

    fn list_models(&self) -> Result<Vec<String>, AdvisoryError> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(AdvisoryError::ModelError {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: OllamaTagsResponse = response
            .json()
            .map_err(|e| AdvisoryError::Malformed(e.to_string()))?;

        Ok(parsed.models.into_iter().map(|m| m.name).collect())
    }
}

/// Mock LLM client for testing. Returns a configured reply, or fails as an
/// unreachable model would.
pub struct MockLlmClient {
    response: Option<String>,
    available_models: Vec<String>,
}

impl MockLlmClient {
    pub fn new(response: &str) -> Self {
        Self {
            response: Some(response.to_string()),
            available_models: vec![format!("{DEFAULT_MODEL}:latest")],
        }
    }

    /// A client whose every call fails with `Unavailable`.
    pub fn unreachable() -> Self {
        Self {
            response: None,
            available_models: Vec::new(),
        }
    }

    pub fn with_models(mut self, models: Vec<String>) -> Self {
        self.available_models = models;
        self
    }
}

impl LlmClient for MockLlmClient {
    fn generate(&self, _model: &str, _prompt: &str, _system: &str) -> Result<String, AdvisoryError> {
        self.response
            .clone()
            .ok_or_else(|| AdvisoryError::Unavailable("mock".into()))
    }

    fn is_model_available(&self, model: &str) -> Result<bool, AdvisoryError> {
        Ok(self.list_models()?.iter().any(|m| model_matches(m, model)))
    }

    fn list_models(&self) -> Result<Vec<String>, AdvisoryError> {
        if self.response.is_none() {
            return Err(AdvisoryError::Unavailable("mock".into()));
        }
        Ok(self.available_models.clone())
    }
}

/// Whether an installed model name satisfies the configured one. A
/// configured name without a `:tag` accepts any tag of that model.
fn model_matches(installed: &str, configured: &str) -> bool {
    if configured.contains(':') {
        installed == configured
    } else {
        installed.split(':').next() == Some(configured)
    }
}

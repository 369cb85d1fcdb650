use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use secrecy::ExposeSecret;
use serde_json::Value;
use thiserror::Error;

use calorizz_core::config::{LlmConfig, LlmProvider};

pub mod gemini;
pub mod openai;
#[cfg(any(test, feature = "test-support"))]
mod scripted;

pub use gemini::GeminiClient;
pub use openai::OpenAiCompatibleClient;
#[cfg(any(test, feature = "test-support"))]
pub use scripted::ScriptedLlmClient;

static APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    User,
    Model,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self { role: Role::User, text: text.into() }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self { role: Role::Model, text: text.into() }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CompletionRequest {
    pub turns: Vec<Turn>,
    pub temperature: Option<f32>,
}

impl CompletionRequest {
    pub fn new(turns: Vec<Turn>) -> Self {
        Self { turns, temperature: None }
    }

    pub fn single(prompt: impl Into<String>) -> Self {
        Self::new(vec![Turn::user(prompt)])
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("provider quota exhausted: {0}")]
    QuotaExceeded(String),
    #[error("provider request timed out")]
    Timeout,
    #[error("provider transport failure: {0}")]
    Transport(String),
    #[error("provider returned {status}: {message}")]
    Provider { status: u16, message: String },
    #[error("provider returned no text")]
    EmptyResponse,
    #[error("could not decode provider response: {0}")]
    Decode(String),
    #[error("llm client misconfigured: {0}")]
    Configuration(String),
}

impl LlmError {
    pub fn is_quota(&self) -> bool {
        matches!(self, Self::QuotaExceeded(_))
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else if error.is_decode() {
            Self::Decode(error.to_string())
        } else {
            Self::Transport(error.to_string())
        }
    }
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    fn provider_name(&self) -> &'static str;

    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError>;
}

/// Builds the provider client selected in configuration.
pub fn client_from_config(config: &LlmConfig) -> Result<Arc<dyn LlmClient>, LlmError> {
    let base_url = config.endpoint_base();
    let timeout = Duration::from_secs(config.timeout_secs);
    let api_key = config.api_key.as_ref().map(|key| key.expose_secret().to_string());

    match config.provider {
        LlmProvider::Gemini => {
            let api_key = api_key.ok_or_else(|| {
                LlmError::Configuration("gemini provider requires an api key".to_string())
            })?;
            let http = http_client(Some(("x-goog-api-key", api_key)), timeout)?;
            Ok(Arc::new(GeminiClient::new(http, base_url, config.model.clone())))
        }
        LlmProvider::OpenAi => {
            let api_key = api_key.ok_or_else(|| {
                LlmError::Configuration("openai provider requires an api key".to_string())
            })?;
            let http = http_client(Some(("authorization", format!("Bearer {api_key}"))), timeout)?;
            Ok(Arc::new(OpenAiCompatibleClient::new(http, base_url, config.model.clone())))
        }
        LlmProvider::Ollama => {
            let auth = api_key.map(|key| ("authorization", format!("Bearer {key}")));
            let http = http_client(auth, timeout)?;
            Ok(Arc::new(OpenAiCompatibleClient::new(http, base_url, config.model.clone())))
        }
    }
}

pub(crate) fn http_client(
    auth: Option<(&'static str, String)>,
    timeout: Duration,
) -> Result<reqwest::Client, LlmError> {
    let mut headers = HeaderMap::new();

    if let Some((name, value)) = auth {
        let mut value = HeaderValue::from_str(&value).map_err(|_| {
            LlmError::Configuration("api key contains invalid header characters".to_string())
        })?;
        value.set_sensitive(true);
        headers.insert(HeaderName::from_static(name), value);
    }

    reqwest::Client::builder()
        .user_agent(APP_USER_AGENT)
        .default_headers(headers)
        .timeout(timeout)
        .build()
        .map_err(|error| LlmError::Configuration(format!("could not build http client: {error}")))
}

/// Turns a non-2xx provider response into an [`LlmError`].
///
/// Both Gemini (`error.status`) and OpenAI-style (`error.code` / `error.type`)
/// envelopes are understood; quota exhaustion gets its own variant.
pub(crate) fn classify_failure(status: u16, body: &str) -> LlmError {
    let envelope = serde_json::from_str::<Value>(body).ok();
    let error = envelope.as_ref().and_then(|value| value.get("error"));

    let message = error
        .and_then(|error| error.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| body.trim().chars().take(200).collect());

    let codes = ["status", "code", "type"]
        .iter()
        .filter_map(|key| error.and_then(|error| error.get(*key)).and_then(Value::as_str))
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>();

    let quota_code = codes.iter().any(|code| {
        matches!(code.as_str(), "resource_exhausted" | "insufficient_quota" | "rate_limit_exceeded")
    });

    if status == 429 || quota_code {
        LlmError::QuotaExceeded(message)
    } else {
        LlmError::Provider { status, message }
    }
}

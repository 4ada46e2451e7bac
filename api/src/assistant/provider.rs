use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};

const GROQ_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

/// Upper bound on any single provider call. The pipeline makes up to three
/// of these per request; an unbounded hang here would pin the whole handler.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        ChatMessage {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        ChatMessage {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// Wire format of one completion call. Guards and the final answer use the
/// same request shape and differ only in model, prompts and budgets.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Groq request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// Non-success status; carries the provider's own message when it sent one
    #[error("{0}")]
    Api(String),
    #[error("Groq: empty response")]
    EmptyResponse,
}

/// Seam between the pipeline and the text-completion backend. Production
/// uses [`GroqClient`]; tests substitute scripted implementations.
pub trait CompletionProvider: Send + Sync {
    fn chat(&self, req: ChatRequest) -> impl Future<Output = Result<String, ProviderError>> + Send;
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatCompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChoice {
    message: ChatCompletionMessage,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// Groq chat-completions client. One instance lives in `AppState`; absent
/// credentials mean the state holds `None` instead.
pub struct GroqClient {
    http: reqwest::Client,
    api_key: String,
    url: String,
}

impl GroqClient {
    /// Build from `GROQ_API_KEY` (and optional `GROQ_BASE_URL` override).
    /// Returns `None` when the key is missing or blank.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("GROQ_API_KEY")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())?;

        let url = std::env::var("GROQ_BASE_URL")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| GROQ_URL.to_string());

        Some(GroqClient {
            http: reqwest::Client::new(),
            api_key,
            url,
        })
    }
}

impl CompletionProvider for GroqClient {
    fn chat(&self, req: ChatRequest) -> impl Future<Output = Result<String, ProviderError>> + Send {
        async move {
            let response = self
                .http
                .post(&self.url)
                .timeout(REQUEST_TIMEOUT)
                .bearer_auth(&self.api_key)
                .json(&req)
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                let message = response
                    .json::<ErrorEnvelope>()
                    .await
                    .ok()
                    .and_then(|envelope| envelope.error)
                    .and_then(|body| body.message)
                    .unwrap_or_else(|| format!("Groq error ({})", status.as_u16()));
                return Err(ProviderError::Api(message));
            }

            let data: ChatCompletionResponse = response.json().await?;
            data.choices
                .into_iter()
                .next()
                .and_then(|choice| choice.message.content)
                .filter(|content| !content.is_empty())
                .ok_or(ProviderError::EmptyResponse)
        }
    }
}

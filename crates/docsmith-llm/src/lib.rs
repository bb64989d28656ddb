//! LLM integration for Docsmith
//!
//! This crate provides:
//! - LLM client for OpenAI, Groq and Anthropic APIs, implementing [`Generator`]
//! - Prompt templates for class and function docstrings
//! - API key lookup through an ordered chain of sources
//! - Server-sent event decoding for streamed responses

mod credentials;
mod prompts;
mod sse;

pub use credentials::*;
pub use prompts::{build_user_prompt, system_prompt};
pub use sse::{parse_delta, text_stream, Delta, SseDecoder};

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use docsmith_docstring::{DocKind, Generation, Generator, GeneratorError};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Sampling temperature for every request
pub const TEMPERATURE: f32 = 0.0;

/// Response length cap for every request
pub const MAX_TOKENS: u32 = 1000;

/// LLM API client for generating docstrings
pub struct LlmClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    provider: Provider,
    stream: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenAI,
    Groq,
    Anthropic,
}

impl Provider {
    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::OpenAI => "gpt-3.5-turbo",
            Provider::Groq => "llama-3.1-8b-instant",
            Provider::Anthropic => "claude-3-5-haiku-latest",
        }
    }

    /// Provider-specific environment variable holding the API key
    pub fn key_variable(&self) -> &'static str {
        match self {
            Provider::OpenAI => "OPENAI_API_KEY",
            Provider::Groq => "GROQ_API_KEY",
            Provider::Anthropic => "ANTHROPIC_API_KEY",
        }
    }

    fn endpoint(&self) -> &'static str {
        match self {
            Provider::OpenAI => "https://api.openai.com/v1/chat/completions",
            Provider::Groq => "https://api.groq.com/openai/v1/chat/completions",
            Provider::Anthropic => "https://api.anthropic.com/v1/messages",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::OpenAI => write!(f, "openai"),
            Provider::Groq => write!(f, "groq"),
            Provider::Anthropic => write!(f, "anthropic"),
        }
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "openai" => Ok(Provider::OpenAI),
            "groq" => Ok(Provider::Groq),
            "anthropic" => Ok(Provider::Anthropic),
            other => Err(format!(
                "unknown provider '{other}' (expected openai, groq or anthropic)"
            )),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    system: String,
    messages: Vec<Message>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
}

#[derive(Debug, Deserialize)]
struct AnthropicContent {
    #[serde(default)]
    text: String,
}

/// Error type for LLM operations
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{provider} returned {status}: {message}")]
    Status {
        provider: Provider,
        status: u16,
        message: String,
    },
    #[error("JSON parse error: {0}")]
    Json(String),
    #[error("No response from LLM")]
    NoResponse,
}

impl From<LlmError> for GeneratorError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Status { status, message, .. } => GeneratorError::Service { status, message },
            LlmError::Json(message) => GeneratorError::Malformed(message),
            LlmError::NoResponse => GeneratorError::Malformed("empty choice list".to_string()),
            other => GeneratorError::Transport(other.to_string()),
        }
    }
}

impl LlmClient {
    /// Create a client, looking the API key up through the standard chain
    pub fn new(provider: Provider, explicit_key: Option<String>) -> Result<Self, LlmError> {
        let api_key = CredentialChain::standard(provider, explicit_key).resolve()?;
        Ok(Self::with_config(provider, api_key, None))
    }

    /// Create a client with explicit configuration
    pub fn with_config(provider: Provider, api_key: String, model: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model: model.unwrap_or_else(|| provider.default_model().to_string()),
            provider,
            stream: false,
        }
    }

    /// Use a specific model instead of the provider default
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Request streamed (SSE) responses
    pub fn with_streaming(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    /// Get the provider being used
    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn call(&self, system: &str, user: &str) -> Result<Generation, LlmError> {
        let request = match self.provider {
            Provider::OpenAI | Provider::Groq => self
                .client
                .post(self.provider.endpoint())
                .header("Authorization", format!("Bearer {}", self.api_key))
                .json(&ChatRequest {
                    model: self.model.clone(),
                    messages: vec![
                        Message {
                            role: "system".to_string(),
                            content: system.to_string(),
                        },
                        Message {
                            role: "user".to_string(),
                            content: user.to_string(),
                        },
                    ],
                    temperature: TEMPERATURE,
                    max_tokens: MAX_TOKENS,
                    stream: self.stream,
                }),
            Provider::Anthropic => self
                .client
                .post(self.provider.endpoint())
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", "2023-06-01")
                .header("content-type", "application/json")
                .json(&AnthropicRequest {
                    model: self.model.clone(),
                    system: system.to_string(),
                    messages: vec![Message {
                        role: "user".to_string(),
                        content: user.to_string(),
                    }],
                    temperature: TEMPERATURE,
                    max_tokens: MAX_TOKENS,
                    stream: self.stream,
                }),
        };

        debug!(provider = %self.provider, model = %self.model, stream = self.stream, "sending request");
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "failed to read error response".to_string());
            return Err(LlmError::Status {
                provider: self.provider,
                status: status.as_u16(),
                message,
            });
        }

        if self.stream {
            let bytes = response
                .bytes_stream()
                .map(|chunk| {
                    chunk
                        .map(|b| b.to_vec())
                        .map_err(|e| GeneratorError::Transport(e.to_string()))
                })
                .boxed();
            return Ok(Generation::Stream(text_stream(self.provider, bytes)));
        }

        let text = match self.provider {
            Provider::OpenAI | Provider::Groq => {
                let response: ChatResponse = response
                    .json()
                    .await
                    .map_err(|e| LlmError::Json(e.to_string()))?;
                response
                    .choices
                    .into_iter()
                    .next()
                    .map(|c| c.message.content)
                    .ok_or(LlmError::NoResponse)?
            }
            Provider::Anthropic => {
                let response: AnthropicResponse = response
                    .json()
                    .await
                    .map_err(|e| LlmError::Json(e.to_string()))?;
                if response.content.is_empty() {
                    return Err(LlmError::NoResponse);
                }
                response.content.into_iter().map(|c| c.text).collect()
            }
        };
        Ok(Generation::Complete(text))
    }
}

#[async_trait]
impl Generator for LlmClient {
    async fn generate(&self, fragment: &str, kind: DocKind) -> Result<Generation, GeneratorError> {
        let user = build_user_prompt(fragment, kind);
        Ok(self.call(system_prompt(kind), &user).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_parsing() {
        assert_eq!("OpenAI".parse::<Provider>().unwrap(), Provider::OpenAI);
        assert_eq!("groq".parse::<Provider>().unwrap(), Provider::Groq);
        assert!("azure".parse::<Provider>().is_err());
        assert_eq!(Provider::Anthropic.to_string(), "anthropic");
    }

    #[test]
    fn test_client_defaults() {
        let client = LlmClient::with_config(Provider::Groq, "key".to_string(), None);
        assert_eq!(client.model(), "llama-3.1-8b-instant");
        let client = client.with_model("mixtral").with_streaming(true);
        assert_eq!(client.model(), "mixtral");
        assert!(client.stream);
    }

    #[test]
    fn test_request_body_shape() {
        let body = serde_json::to_value(ChatRequest {
            model: "gpt-3.5-turbo".to_string(),
            messages: vec![],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
            stream: true,
        })
        .unwrap();
        assert_eq!(body["max_tokens"], 1000);
        assert_eq!(body["temperature"], 0.0);
        assert_eq!(body["stream"], true);
    }

    #[test]
    fn test_status_errors_map_to_service_errors() {
        let err: GeneratorError = LlmError::Status {
            provider: Provider::OpenAI,
            status: 429,
            message: "slow down".to_string(),
        }
        .into();
        assert!(matches!(err, GeneratorError::Service { status: 429, .. }));
    }
}

//! OpenAI-compatible chat completions (OpenAI or Groq).
//!
//! # Example
//!
//! ```rust,ignore
//! use market_research::ai::{LlmProvider, OpenAILanguageModel};
//! use market_research::security::ModelCredentials;
//!
//! let creds = ModelCredentials::new("gsk-...", LlmProvider::Groq.default_model());
//! let llm = OpenAILanguageModel::new(LlmProvider::Groq, &creds);
//! ```

use async_trait::async_trait;
use openai_client::{ChatRequest, Message, OpenAIClient, OpenAIError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

use crate::error::{ServiceError, ServiceResult};
use crate::security::ModelCredentials;
use crate::traits::llm::{CompletionRequest, LanguageModel};

/// Sampling temperature for every task.
const TEMPERATURE: f32 = 0.2;

/// Hosted model provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[default]
    Groq,
    OpenAI,
}

impl LlmProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Groq => "groq",
            Self::OpenAI => "openai",
        }
    }

    /// Environment variable holding this provider's API key.
    pub fn api_key_var(&self) -> &'static str {
        match self {
            Self::Groq => "GROQ_API_KEY",
            Self::OpenAI => "OPENAI_API_KEY",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Self::Groq => "llama-3.3-70b-versatile",
            Self::OpenAI => "gpt-4o",
        }
    }

    /// Completion token limit per call.
    pub fn max_tokens(&self) -> u32 {
        match self {
            Self::Groq => 1200,
            Self::OpenAI => 3000,
        }
    }

    fn client(&self, api_key: &str) -> OpenAIClient {
        match self {
            Self::Groq => OpenAIClient::groq(api_key),
            Self::OpenAI => OpenAIClient::new(api_key),
        }
    }
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LlmProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "groq" => Ok(Self::Groq),
            "openai" => Ok(Self::OpenAI),
            other => Err(format!("unknown LLM provider '{}' (expected groq or openai)", other)),
        }
    }
}

/// `LanguageModel` backed by an OpenAI-compatible chat endpoint.
#[derive(Clone)]
pub struct OpenAILanguageModel {
    client: OpenAIClient,
    provider: LlmProvider,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAILanguageModel {
    pub fn new(provider: LlmProvider, credentials: &ModelCredentials) -> Self {
        let mut client = provider.client(credentials.api_key.expose());
        if let Some(url) = &credentials.base_url {
            client = client.with_base_url(url.as_str());
        }

        Self {
            client,
            provider,
            model: credentials.model.clone(),
            temperature: TEMPERATURE,
            max_tokens: provider.max_tokens(),
        }
    }

    /// Fail calls that take longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = self.client.with_timeout(timeout);
        self
    }

    pub fn provider(&self) -> LlmProvider {
        self.provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl LanguageModel for OpenAILanguageModel {
    async fn complete(&self, request: CompletionRequest) -> ServiceResult<String> {
        let chat = ChatRequest::new(&self.model)
            .message(Message::system(request.system))
            .message(Message::user(request.user))
            .temperature(self.temperature)
            .token_limit(self.max_tokens);

        let response = self.client.chat_completion(chat).await?;

        if let Some(usage) = &response.usage {
            debug!(
                task = ?request.task,
                provider = %self.provider,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Completion usage"
            );
        }
        Ok(response.content)
    }
}

impl From<OpenAIError> for ServiceError {
    fn from(err: OpenAIError) -> Self {
        match err {
            OpenAIError::Config(msg) | OpenAIError::Auth(msg) => Self::Auth(msg),
            OpenAIError::Timeout(msg) => Self::Timeout(msg),
            OpenAIError::Network(msg) => Self::Network(msg),
            OpenAIError::Api { status, message } => Self::Api { status, message },
            OpenAIError::Parse(msg) => Self::Malformed(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_presets() {
        assert_eq!(LlmProvider::default(), LlmProvider::Groq);
        assert_eq!(LlmProvider::Groq.default_model(), "llama-3.3-70b-versatile");
        assert_eq!(LlmProvider::OpenAI.max_tokens(), 3000);
        assert_eq!(LlmProvider::OpenAI.api_key_var(), "OPENAI_API_KEY");
    }

    #[test]
    fn test_provider_from_str() {
        assert_eq!("OpenAI".parse::<LlmProvider>().unwrap(), LlmProvider::OpenAI);
        assert_eq!(" groq ".parse::<LlmProvider>().unwrap(), LlmProvider::Groq);
        assert!("claude".parse::<LlmProvider>().is_err());
    }

    #[test]
    fn test_groq_model_uses_groq_endpoint() {
        let creds = ModelCredentials::new("gsk-test", "llama-3.3-70b-versatile");
        let llm = OpenAILanguageModel::new(LlmProvider::Groq, &creds);
        assert_eq!(llm.client.base_url(), openai_client::GROQ_BASE_URL);
        assert_eq!(llm.max_tokens, 1200);
    }

    #[test]
    fn test_base_url_override() {
        let creds = ModelCredentials::new("sk-test", "gpt-4o").with_base_url("http://localhost:9000/v1/");
        let llm = OpenAILanguageModel::new(LlmProvider::OpenAI, &creds);
        assert_eq!(llm.client.base_url(), "http://localhost:9000/v1");
    }

    #[test]
    fn test_error_mapping() {
        assert_eq!(
            ServiceError::from(OpenAIError::Auth("bad key".into())),
            ServiceError::Auth("bad key".into())
        );
        assert!(matches!(
            ServiceError::from(OpenAIError::Parse("eof".into())),
            ServiceError::Malformed(_)
        ));
        assert!(matches!(
            ServiceError::from(OpenAIError::Api { status: 429, message: "slow down".into() }),
            ServiceError::Api { status: 429, .. }
        ));
    }
}

//! API keys held in `secrecy` boxes.
//!
//! `Debug` and `Display` print a fixed placeholder, so a `Config` or
//! `ModelCredentials` can be logged whole.

use secrecy::{ExposeSecret, SecretBox};
use std::fmt;

const REDACTED: &str = "[REDACTED]";

/// Provider API key.
pub struct SecretString(SecretBox<str>);

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self(SecretBox::new(value.into().into_boxed_str()))
    }

    /// Raw key, for the `Authorization` header only.
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    pub fn is_blank(&self) -> bool {
        self.expose().trim().is_empty()
    }
}

impl Clone for SecretString {
    fn clone(&self) -> Self {
        Self::new(self.expose())
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

/// Everything `OpenAILanguageModel` needs to reach a provider.
#[derive(Clone)]
pub struct ModelCredentials {
    pub api_key: SecretString,
    pub model: String,
    /// Replaces the provider's default `/v1` root when set.
    pub base_url: Option<String>,
}

impl ModelCredentials {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::new(api_key),
            model: model.into(),
            base_url: None,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }
}

impl fmt::Debug for ModelCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}", self.model, self.api_key)?;
        if let Some(url) = &self.base_url {
            write!(f, " via {}", url)?;
        }
        f.write_str(")")
    }
}

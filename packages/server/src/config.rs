use anyhow::{bail, Context, Result};
use dotenvy::dotenv;
use market_research::ai::LlmProvider;
use market_research::security::{ModelCredentials, SecretString};
use market_research::ResearchConfig;
use std::env;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub provider: LlmProvider,
    pub api_key: SecretString,
    pub model: String,
    pub llm_timeout: Duration,
    pub wikipedia_lang: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub research: ResearchConfig,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`, which returns a variable's value
    /// if it is set.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let provider: LlmProvider = match lookup("LLM_PROVIDER") {
            Some(value) => value
                .parse()
                .map_err(anyhow::Error::msg)
                .context("LLM_PROVIDER must be groq or openai")?,
            None => LlmProvider::default(),
        };

        let key_var = provider.api_key_var();
        let api_key = SecretString::new(
            lookup(key_var).with_context(|| format!("{} must be set", key_var))?,
        );
        if api_key.is_blank() {
            bail!("{} must not be empty", key_var);
        }

        let llm_timeout_secs: u64 = lookup("LLM_TIMEOUT_SECS")
            .unwrap_or_else(|| "60".to_string())
            .parse()
            .context("LLM_TIMEOUT_SECS must be a whole number of seconds")?;

        let extract_financials = match lookup("EXTRACT_FINANCIALS") {
            Some(value) => parse_flag(&value).context("EXTRACT_FINANCIALS must be true or false")?,
            None => true,
        };

        Ok(Self {
            provider,
            api_key,
            model: lookup("LLM_MODEL")
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| provider.default_model().to_string()),
            llm_timeout: Duration::from_secs(llm_timeout_secs),
            wikipedia_lang: lookup("WIKIPEDIA_LANG").unwrap_or_else(|| "en".to_string()),
            port: lookup("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            allowed_origins: lookup("ALLOWED_ORIGINS")
                .map(|origins| {
                    origins
                        .split(',')
                        .map(|o| o.trim().to_string())
                        .filter(|o| !o.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            research: ResearchConfig::default().with_financials(extract_financials),
        })
    }

    /// Credentials for the configured provider.
    pub fn credentials(&self) -> ModelCredentials {
        ModelCredentials {
            api_key: self.api_key.clone(),
            model: self.model.clone(),
            base_url: None,
        }
    }
}

fn parse_flag(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("invalid flag value '{}'", other),
    }
}

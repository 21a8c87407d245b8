use thiserror::Error;

pub type Result<T> = std::result::Result<T, WikipediaError>;

#[derive(Debug, Error)]
pub enum WikipediaError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Wikipedia API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The API answered 200 with an `error` object (bad parameters, throttling).
    #[error("Wikipedia rejected the request: {code}: {info}")]
    Rejected { code: String, info: String },
}

impl WikipediaError {
    /// Whether the failure was the request timing out.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout(),
            Self::Api { status, .. } => *status == 408 || *status == 504,
            Self::Rejected { .. } => false,
        }
    }
}

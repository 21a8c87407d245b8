//! Wikipedia as the pipeline's encyclopedia.

use async_trait::async_trait;
use std::time::Duration;
use wikipedia_client::{WikipediaClient, WikipediaError};

use crate::error::{ServiceError, ServiceResult};
use crate::traits::encyclopedia::{Article, Encyclopedia, SearchHit};

/// `Encyclopedia` backed by the MediaWiki Action API.
#[derive(Clone, Default)]
pub struct WikipediaEncyclopedia {
    client: WikipediaClient,
}

impl WikipediaEncyclopedia {
    /// Wikipedia in `language` ("en", "de", ...).
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            client: WikipediaClient::new(language),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = self.client.with_timeout(timeout);
        self
    }

    pub fn language(&self) -> &str {
        self.client.language()
    }
}

#[async_trait]
impl Encyclopedia for WikipediaEncyclopedia {
    async fn search(&self, query: &str, max_results: usize) -> ServiceResult<Vec<SearchHit>> {
        let hits = self.client.search(query, max_results).await?;
        Ok(hits
            .into_iter()
            .map(|hit| SearchHit::new(hit.title, hit.snippet))
            .collect())
    }

    async fn fetch(&self, title: &str) -> ServiceResult<Option<Article>> {
        let page = self.client.fetch(title).await?;
        Ok(page.map(|page| Article {
            title: page.title,
            url: page.url,
            text: page.extract,
        }))
    }
}

impl From<WikipediaError> for ServiceError {
    fn from(err: WikipediaError) -> Self {
        if err.is_timeout() {
            return Self::Timeout(err.to_string());
        }
        match err {
            WikipediaError::Http(e) if e.is_decode() => Self::Malformed(e.to_string()),
            WikipediaError::Http(e) => Self::Network(e.to_string()),
            WikipediaError::Api { status, message } => Self::Api { status, message },
            WikipediaError::Rejected { code, info } => Self::Api {
                status: 200,
                message: format!("{}: {}", code, info),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_maps_status() {
        let err = ServiceError::from(WikipediaError::Api {
            status: 503,
            message: "unavailable".into(),
        });
        assert_eq!(
            err,
            ServiceError::Api {
                status: 503,
                message: "unavailable".into()
            }
        );
    }

    #[test]
    fn test_gateway_timeout_maps_to_timeout() {
        let err = ServiceError::from(WikipediaError::Api {
            status: 504,
            message: "gateway".into(),
        });
        assert!(matches!(err, ServiceError::Timeout(_)));
    }

    #[test]
    fn test_rejection_keeps_code() {
        let err = ServiceError::from(WikipediaError::Rejected {
            code: "maxlag".into(),
            info: "Waiting for replica".into(),
        });
        assert_eq!(
            err,
            ServiceError::Api {
                status: 200,
                message: "maxlag: Waiting for replica".into()
            }
        );
    }

    #[test]
    fn test_language_passthrough() {
        assert_eq!(WikipediaEncyclopedia::new("de").language(), "de");
    }
}

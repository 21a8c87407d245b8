//! Encyclopedia trait for source discovery and retrieval.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;

use crate::error::ServiceResult;

/// A keyword search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub title: String,
    pub snippet: String,
}

impl SearchHit {
    pub fn new(title: impl Into<String>, snippet: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            snippet: snippet.into(),
        }
    }
}

/// A fetched article body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Article {
    pub title: String,
    pub url: String,
    pub text: String,
}

/// Keyword search plus fetch-by-title.
#[async_trait]
pub trait Encyclopedia: Send + Sync {
    /// Search for articles. Returns at most `max_results` hits in ranking
    /// order; an empty list is a valid answer.
    async fn search(&self, query: &str, max_results: usize) -> ServiceResult<Vec<SearchHit>>;

    /// Fetch an article by exact title. `Ok(None)` when it does not exist.
    async fn fetch(&self, title: &str) -> ServiceResult<Option<Article>>;
}

#[async_trait]
impl<T: Encyclopedia + ?Sized> Encyclopedia for Arc<T> {
    async fn search(&self, query: &str, max_results: usize) -> ServiceResult<Vec<SearchHit>> {
        (**self).search(query, max_results).await
    }

    async fn fetch(&self, title: &str) -> ServiceResult<Option<Article>> {
        (**self).fetch(title).await
    }
}

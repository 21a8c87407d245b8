//! Retrieved and judged sources.

use serde::Serialize;

use crate::traits::encyclopedia::Article;
use crate::types::query::SearchQuery;

/// An encyclopedia article found by search, before relevance judgment.
///
/// Titles are unique within one retrieval pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceCandidate {
    pub title: String,
    pub snippet: String,

    /// Plain-text body, filled in by the fetch step.
    pub full_text: Option<String>,

    /// Article URL, filled in by the fetch step.
    pub url: Option<String>,

    /// The query that first produced this title.
    pub origin_query: SearchQuery,
}

impl SourceCandidate {
    pub fn new(
        title: impl Into<String>,
        snippet: impl Into<String>,
        origin_query: SearchQuery,
    ) -> Self {
        Self {
            title: title.into(),
            snippet: snippet.into(),
            full_text: None,
            url: None,
            origin_query,
        }
    }

    /// Attach the fetched article body.
    pub fn with_article(mut self, article: Article) -> Self {
        self.full_text = Some(article.text);
        self.url = Some(article.url);
        self
    }

    pub fn is_fetched(&self) -> bool {
        self.full_text.is_some()
    }

    /// Best available text: full body if fetched, else the snippet.
    pub fn text(&self) -> &str {
        self.full_text.as_deref().unwrap_or(&self.snippet)
    }
}

/// Relevance decision for one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// The model judged it relevant.
    Kept,

    /// No usable verdict; kept anyway (fail-open).
    KeptByDefault,

    /// The model judged it irrelevant.
    Dropped,
}

impl Decision {
    pub fn is_kept(&self) -> bool {
        !matches!(self, Self::Dropped)
    }
}

/// A candidate together with its relevance decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilteredSource {
    pub candidate: SourceCandidate,
    pub decision: Decision,
    pub rationale: Option<String>,
}

impl FilteredSource {
    pub fn title(&self) -> &str {
        &self.candidate.title
    }
}

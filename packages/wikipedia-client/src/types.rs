use serde::Deserialize;

/// One keyword search hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub title: String,
    /// Plain-text snippet with the search-match markup removed.
    pub snippet: String,
}

/// A fetched article as plain text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub title: String,
    pub url: String,
    pub extract: String,
}

/// Wrapper for Action API responses (`formatversion=2`).
#[derive(Debug, Deserialize)]
pub(crate) struct ApiResponse<T> {
    pub query: Option<T>,
    pub error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    pub code: String,
    #[serde(default)]
    pub info: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchQuery {
    #[serde(default)]
    pub search: Vec<RawSearchHit>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawSearchHit {
    pub title: String,
    #[serde(default)]
    pub snippet: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PagesQuery {
    #[serde(default)]
    pub pages: Vec<RawPage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawPage {
    pub title: String,
    #[serde(default)]
    pub missing: bool,
    #[serde(default)]
    pub invalid: bool,
    pub extract: Option<String>,
    pub fullurl: Option<String>,
}

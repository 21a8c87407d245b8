//! Pure Wikipedia (MediaWiki Action API) client.
//!
//! Two calls cover everything the research pipeline needs: keyword search
//! returning titles and snippets, and a plain-text fetch of one article.
//!
//! # Example
//!
//! ```rust,ignore
//! use wikipedia_client::WikipediaClient;
//!
//! let client = WikipediaClient::new("en");
//!
//! let hits = client.search("semiconductor industry", 4).await?;
//! if let Some(page) = client.fetch(&hits[0].title).await? {
//!     println!("{} ({} chars)", page.url, page.extract.len());
//! }
//! ```

pub mod error;
pub mod types;

pub use error::{Result, WikipediaError};
pub use types::{Page, SearchHit};

use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use serde::de::DeserializeOwned;
use types::{ApiResponse, PagesQuery, SearchQuery};

const USER_AGENT: &str = concat!("wikipedia-client/", env!("CARGO_PKG_VERSION"));

#[derive(Clone)]
pub struct WikipediaClient {
    client: reqwest::Client,
    language: String,
    endpoint: String,
    timeout: Option<Duration>,
}

impl WikipediaClient {
    /// Client for the given language edition ("en", "de", ...).
    pub fn new(language: impl Into<String>) -> Self {
        let language = language.into();
        Self {
            client: reqwest::Client::new(),
            endpoint: format!("https://{}.wikipedia.org/w/api.php", language),
            language,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Keyword search. Returns at most `limit` hits in ranking order.
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>> {
        let limit = limit.to_string();
        let params = [
            ("action", "query"),
            ("list", "search"),
            ("srsearch", query),
            ("srlimit", limit.as_str()),
            ("srprop", "snippet"),
            ("format", "json"),
            ("formatversion", "2"),
        ];

        let response: ApiResponse<SearchQuery> = self.get(&params).await?;
        let hits = into_hits(response)?;
        tracing::debug!(query, count = hits.len(), "Wikipedia search");
        Ok(hits)
    }

    /// Fetch the plain-text body of an article. `Ok(None)` when no page has
    /// that title. Redirects are followed.
    pub async fn fetch(&self, title: &str) -> Result<Option<Page>> {
        let params = [
            ("action", "query"),
            ("prop", "extracts|info"),
            ("explaintext", "1"),
            ("inprop", "url"),
            ("redirects", "1"),
            ("titles", title),
            ("format", "json"),
            ("formatversion", "2"),
        ];

        let response: ApiResponse<PagesQuery> = self.get(&params).await?;
        let page = into_page(response, &self.language)?;
        if page.is_none() {
            tracing::debug!(title, "Wikipedia page missing");
        }
        Ok(page)
    }

    async fn get<T: DeserializeOwned>(&self, params: &[(&str, &str)]) -> Result<T> {
        let mut request = self
            .client
            .get(&self.endpoint)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .query(params);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let resp = request.send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(WikipediaError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(resp.json().await?)
    }
}

impl Default for WikipediaClient {
    fn default() -> Self {
        Self::new("en")
    }
}

fn into_hits(response: ApiResponse<SearchQuery>) -> Result<Vec<SearchHit>> {
    if let Some(error) = response.error {
        return Err(WikipediaError::Rejected {
            code: error.code,
            info: error.info,
        });
    }

    Ok(response
        .query
        .map(|q| q.search)
        .unwrap_or_default()
        .into_iter()
        .map(|hit| SearchHit {
            title: hit.title,
            snippet: clean_snippet(&hit.snippet),
        })
        .collect())
}

fn into_page(response: ApiResponse<PagesQuery>, language: &str) -> Result<Option<Page>> {
    if let Some(error) = response.error {
        return Err(WikipediaError::Rejected {
            code: error.code,
            info: error.info,
        });
    }

    let page = response
        .query
        .and_then(|q| q.pages.into_iter().next())
        .filter(|p| !p.missing && !p.invalid);

    Ok(page.map(|p| Page {
        url: p
            .fullurl
            .unwrap_or_else(|| article_url(language, &p.title)),
        extract: p.extract.unwrap_or_default(),
        title: p.title,
    }))
}

/// Canonical article URL for a title.
pub fn article_url(language: &str, title: &str) -> String {
    format!(
        "https://{}.wikipedia.org/wiki/{}",
        language,
        title.replace(' ', "_")
    )
}

/// Strip search-match markup and the handful of entities the API emits.
fn clean_snippet(snippet: &str) -> String {
    static TAGS: OnceLock<Regex> = OnceLock::new();
    let tags = TAGS.get_or_init(|| Regex::new(r"<[^>]*>").expect("static regex"));

    tags.replace_all(snippet, "")
        .replace("&quot;", "\"")
        .replace("&#039;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
        .trim()
        .to_string()
}

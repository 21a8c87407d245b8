//! Testing utilities including mock implementations.
//!
//! These let applications and tests drive the full pipeline without
//! making real model or encyclopedia calls.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::error::{ServiceError, ServiceResult};
use crate::traits::{
    encyclopedia::{Article, Encyclopedia, SearchHit},
    llm::{CompletionRequest, LanguageModel, Task},
};

/// Synthesis answer used when no response is scripted.
pub const DEFAULT_REPORT: &str = "## Industry Overview & Market Value\n\n\
The industry is described in the provided sources [SOURCE 1].\n\n\
## Industry Outlook\n\n\
No numerical market size data provided in sources.";

type Responder = Arc<dyn Fn(&CompletionRequest) -> ServiceResult<String> + Send + Sync>;

/// A mock language model for testing.
///
/// Responses are scripted per [`Task`]. Unscripted tasks get a default
/// answer that keeps the pipeline moving: every input is a valid industry,
/// the filter gives no verdicts (so everything is kept), no financial
/// figures, and a two-section report.
#[derive(Default)]
pub struct MockLanguageModel {
    responders: RwLock<HashMap<Task, Responder>>,

    /// Call tracking for assertions
    calls: RwLock<Vec<CompletionRequest>>,
}

impl MockLanguageModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always answer `task` with `text`.
    pub fn reply(self, task: Task, text: impl Into<String>) -> Self {
        let text = text.into();
        self.respond_with(task, move |_| Ok(text.clone()))
    }

    /// Always fail `task` with `error`.
    pub fn fail(self, task: Task, error: ServiceError) -> Self {
        self.respond_with(task, move |_| Err(error.clone()))
    }

    /// Answer `task` by calling `responder` with the request.
    pub fn respond_with<F>(self, task: Task, responder: F) -> Self
    where
        F: Fn(&CompletionRequest) -> ServiceResult<String> + Send + Sync + 'static,
    {
        self.responders
            .write()
            .unwrap()
            .insert(task, Arc::new(responder));
        self
    }

    /// All requests received, in order.
    pub fn calls(&self) -> Vec<CompletionRequest> {
        self.calls.read().unwrap().clone()
    }

    pub fn calls_for(&self, task: Task) -> Vec<CompletionRequest> {
        self.calls
            .read()
            .unwrap()
            .iter()
            .filter(|c| c.task == task)
            .cloned()
            .collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.read().unwrap().len()
    }

    fn default_reply(task: Task) -> String {
        match task {
            Task::Validate => r#"{"valid": true}"#.to_string(),
            Task::Filter => "[]".to_string(),
            Task::ExtractFigures => "None".to_string(),
            Task::Synthesize => DEFAULT_REPORT.to_string(),
        }
    }
}

#[async_trait]
impl LanguageModel for MockLanguageModel {
    async fn complete(&self, request: CompletionRequest) -> ServiceResult<String> {
        self.calls.write().unwrap().push(request.clone());

        let responder = self.responders.read().unwrap().get(&request.task).cloned();
        match responder {
            Some(respond) => respond(&request),
            None => Ok(Self::default_reply(request.task)),
        }
    }
}

/// Record of a call made to the mock encyclopedia.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncyclopediaCall {
    Search { query: String, max_results: usize },
    Fetch { title: String },
}

/// A mock encyclopedia for testing.
///
/// Queries without scripted hits return no results. Every title added via
/// [`with_hits`](Self::with_hits) gets a generated article unless one is
/// set explicitly or the title is marked missing.
#[derive(Default)]
pub struct MockEncyclopedia {
    hits: RwLock<HashMap<String, Vec<SearchHit>>>,

    /// `None` marks a title as not found
    articles: RwLock<HashMap<String, Option<Article>>>,

    search_failures: RwLock<HashMap<String, ServiceError>>,
    fetch_failures: RwLock<HashMap<String, ServiceError>>,
    calls: RwLock<Vec<EncyclopediaCall>>,
}

impl MockEncyclopedia {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add search results for a query, by title.
    pub fn with_hits(self, query: &str, titles: &[&str]) -> Self {
        let hits: Vec<SearchHit> = titles
            .iter()
            .map(|t| SearchHit::new(*t, format!("Overview of {}", t)))
            .collect();
        self.with_search_results(query, hits)
    }

    /// Add full search hits for a query.
    pub fn with_search_results(self, query: &str, hits: Vec<SearchHit>) -> Self {
        {
            let mut articles = self.articles.write().unwrap();
            for hit in &hits {
                articles
                    .entry(hit.title.clone())
                    .or_insert_with(|| Some(generated_article(&hit.title)));
            }
        }
        self.hits.write().unwrap().insert(query.to_string(), hits);
        self
    }

    /// Set the article body for a title.
    pub fn with_article(self, title: &str, text: impl Into<String>) -> Self {
        let article = Article {
            title: title.to_string(),
            url: article_url(title),
            text: text.into(),
        };
        self.articles
            .write()
            .unwrap()
            .insert(title.to_string(), Some(article));
        self
    }

    /// Make `fetch(title)` report the article as not found.
    pub fn missing_article(self, title: &str) -> Self {
        self.articles.write().unwrap().insert(title.to_string(), None);
        self
    }

    pub fn failing_search(self, query: &str, error: ServiceError) -> Self {
        self.search_failures
            .write()
            .unwrap()
            .insert(query.to_string(), error);
        self
    }

    pub fn failing_fetch(self, title: &str, error: ServiceError) -> Self {
        self.fetch_failures
            .write()
            .unwrap()
            .insert(title.to_string(), error);
        self
    }

    /// Get all calls made to this mock.
    pub fn calls(&self) -> Vec<EncyclopediaCall> {
        self.calls.read().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.read().unwrap().len()
    }
}

#[async_trait]
impl Encyclopedia for MockEncyclopedia {
    async fn search(&self, query: &str, max_results: usize) -> ServiceResult<Vec<SearchHit>> {
        self.calls.write().unwrap().push(EncyclopediaCall::Search {
            query: query.to_string(),
            max_results,
        });

        if let Some(error) = self.search_failures.read().unwrap().get(query) {
            return Err(error.clone());
        }

        let mut hits = self
            .hits
            .read()
            .unwrap()
            .get(query)
            .cloned()
            .unwrap_or_default();
        hits.truncate(max_results);
        Ok(hits)
    }

    async fn fetch(&self, title: &str) -> ServiceResult<Option<Article>> {
        self.calls.write().unwrap().push(EncyclopediaCall::Fetch {
            title: title.to_string(),
        });

        if let Some(error) = self.fetch_failures.read().unwrap().get(title) {
            return Err(error.clone());
        }

        Ok(self
            .articles
            .read()
            .unwrap()
            .get(title)
            .cloned()
            .flatten())
    }
}

fn generated_article(title: &str) -> Article {
    Article {
        title: title.to_string(),
        url: article_url(title),
        text: format!(
            "{} is a subject of economic activity. This article describes {} in detail.",
            title, title
        ),
    }
}

fn article_url(title: &str) -> String {
    format!("https://en.wikipedia.org/wiki/{}", title.replace(' ', "_"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_llm_defaults_and_recording() {
        let llm = MockLanguageModel::new().reply(Task::Validate, "scripted");

        let validated = llm
            .complete(CompletionRequest::new(Task::Validate, "sys", "a"))
            .await
            .unwrap();
        let filtered = llm
            .complete(CompletionRequest::new(Task::Filter, "sys", "b"))
            .await
            .unwrap();

        assert_eq!(validated, "scripted");
        assert_eq!(filtered, "[]");
        assert_eq!(llm.call_count(), 2);
        assert_eq!(llm.calls_for(Task::Filter)[0].user, "b");
    }

    #[tokio::test]
    async fn test_mock_encyclopedia_truncates_and_generates_articles() {
        let encyclopedia = MockEncyclopedia::new().with_hits("tea", &["Tea", "Oolong", "Matcha"]);

        let hits = encyclopedia.search("tea", 2).await.unwrap();
        assert_eq!(hits.len(), 2);

        let article = encyclopedia.fetch("Oolong").await.unwrap().unwrap();
        assert_eq!(article.url, "https://en.wikipedia.org/wiki/Oolong");
        assert!(encyclopedia.fetch("Unknown").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_missing_article_wins_over_generated() {
        let encyclopedia = MockEncyclopedia::new()
            .missing_article("Tea")
            .with_hits("tea", &["Tea"]);
        assert!(encyclopedia.fetch("Tea").await.unwrap().is_none());
    }
}

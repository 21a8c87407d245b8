//! Retrieval Aggregator: search, dedupe, fetch.
//!
//! Searches for all queries run concurrently; their results are merged
//! only after every search has returned, in query priority order. Article
//! fetches then run with bounded concurrency, preserving that order.
//! Failures of individual searches or fetches are logged and skipped.

use futures::{future::join_all, stream, StreamExt};
use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::error::{PipelineError, Result, Stage};
use crate::traits::encyclopedia::{Encyclopedia, SearchHit};
use crate::types::config::ResearchConfig;
use crate::types::query::SearchQuery;
use crate::types::source::SourceCandidate;

/// Search every query and fetch the surviving candidates.
pub async fn retrieve<E: Encyclopedia + ?Sized>(
    encyclopedia: &E,
    queries: &[SearchQuery],
    config: &ResearchConfig,
) -> Result<Vec<SourceCandidate>> {
    let candidates = collect_candidates(encyclopedia, queries, config).await?;
    fetch_texts(encyclopedia, candidates, config).await
}

/// Run all searches and merge their hits into a deduplicated candidate
/// list. Fails only when no query produced any hit.
pub async fn collect_candidates<E: Encyclopedia + ?Sized>(
    encyclopedia: &E,
    queries: &[SearchQuery],
    config: &ResearchConfig,
) -> Result<Vec<SourceCandidate>> {
    let cap = config.results_per_query.max(1);

    let searches = queries.iter().map(|query| async move {
        match encyclopedia.search(query.as_str(), cap).await {
            Ok(hits) => {
                if hits.is_empty() {
                    debug!(query = %query, "Search returned no results");
                }
                hits
            }
            Err(e) => {
                warn!(query = %query, error = %e, "Search failed, skipping query");
                Vec::new()
            }
        }
    });

    // Merge barrier: every search has finished before dedup starts.
    let results: Vec<Vec<SearchHit>> = join_all(searches).await;
    let candidates = merge_results(queries, results, cap);

    if candidates.is_empty() {
        return Err(PipelineError::no_data(Stage::Retrieval, "no sources found"));
    }

    info!(
        queries = queries.len(),
        candidates = candidates.len(),
        "Search results merged"
    );
    Ok(candidates)
}

/// Dedupe hits by title across queries. First occurrence wins and keeps
/// the query that produced it; at most `cap` hits are taken per query.
pub fn merge_results(
    queries: &[SearchQuery],
    results: Vec<Vec<SearchHit>>,
    cap: usize,
) -> Vec<SourceCandidate> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut candidates = Vec::new();

    for (query, hits) in queries.iter().zip(results) {
        for hit in hits.into_iter().take(cap) {
            if hit.title.trim().is_empty() || !seen.insert(hit.title.clone()) {
                continue;
            }
            candidates.push(SourceCandidate::new(hit.title, hit.snippet, query.clone()));
        }
    }

    candidates
}

/// Fetch full text for each candidate. Candidates whose fetch fails or
/// finds nothing are dropped; order is preserved.
pub async fn fetch_texts<E: Encyclopedia + ?Sized>(
    encyclopedia: &E,
    candidates: Vec<SourceCandidate>,
    config: &ResearchConfig,
) -> Result<Vec<SourceCandidate>> {
    let requested = candidates.len();

    let fetched: Vec<Option<SourceCandidate>> = stream::iter(candidates)
        .map(|candidate| async move {
            match encyclopedia.fetch(&candidate.title).await {
                Ok(Some(article)) if !article.text.trim().is_empty() => {
                    Some(candidate.with_article(article))
                }
                Ok(Some(_)) => {
                    warn!(title = %candidate.title, "Fetched article is empty, dropping");
                    None
                }
                Ok(None) => {
                    warn!(title = %candidate.title, "Article not found, dropping");
                    None
                }
                Err(e) => {
                    warn!(title = %candidate.title, error = %e, "Fetch failed, dropping");
                    None
                }
            }
        })
        .buffered(config.fetch_concurrency.max(1))
        .collect()
        .await;

    let sources: Vec<SourceCandidate> = fetched.into_iter().flatten().collect();

    if sources.is_empty() {
        return Err(PipelineError::no_data(
            Stage::Retrieval,
            "no sources could be fetched",
        ));
    }

    info!(
        requested,
        fetched = sources.len(),
        "Article texts retrieved"
    );
    Ok(sources)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use crate::testing::{EncyclopediaCall, MockEncyclopedia};

    fn queries(texts: &[&str]) -> Vec<SearchQuery> {
        texts.iter().map(|t| SearchQuery::new(*t)).collect()
    }

    #[test]
    fn test_merge_dedupes_first_wins() {
        let qs = queries(&["a", "b"]);
        let results = vec![
            vec![SearchHit::new("Tea", "1"), SearchHit::new("Tea trade", "2")],
            vec![SearchHit::new("Tea", "3"), SearchHit::new("Oolong", "4")],
        ];
        let merged = merge_results(&qs, results, 5);
        let titles: Vec<_> = merged.iter().map(|c| c.title.as_str()).collect();

        assert_eq!(titles, vec!["Tea", "Tea trade", "Oolong"]);
        assert_eq!(merged[0].snippet, "1");
        assert_eq!(merged[0].origin_query.as_str(), "a");
        assert_eq!(merged[2].origin_query.as_str(), "b");
    }

    #[test]
    fn test_merge_applies_cap() {
        let qs = queries(&["a"]);
        let results = vec![vec![
            SearchHit::new("1", ""),
            SearchHit::new("2", ""),
            SearchHit::new("3", ""),
        ]];
        assert_eq!(merge_results(&qs, results, 2).len(), 2);
    }

    #[tokio::test]
    async fn test_failed_query_is_skipped() {
        let encyclopedia = MockEncyclopedia::new()
            .with_hits("tea industry", &["Tea"])
            .failing_search("tea market size", ServiceError::Network("reset".into()));

        let candidates = retrieve(
            &encyclopedia,
            &queries(&["tea industry", "tea market size"]),
            &ResearchConfig::default(),
        )
        .await
        .unwrap();

        assert_eq!(candidates.len(), 1);
        assert!(candidates[0].is_fetched());
    }

    #[tokio::test]
    async fn test_all_empty_is_no_data() {
        let encyclopedia = MockEncyclopedia::new();
        let err = retrieve(&encyclopedia, &queries(&["x", "y", "z"]), &ResearchConfig::default())
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::NoData { stage: Stage::Retrieval, .. }));
        assert_eq!(err.cause(), "no sources found");
        // Nothing to fetch
        assert!(encyclopedia
            .calls()
            .iter()
            .all(|c| matches!(c, EncyclopediaCall::Search { .. })));
    }

    #[tokio::test]
    async fn test_failed_fetch_drops_candidate() {
        let encyclopedia = MockEncyclopedia::new()
            .with_hits("q", &["Kept", "Broken", "Gone"])
            .failing_fetch("Broken", ServiceError::Timeout("slow".into()))
            .missing_article("Gone");

        let sources = retrieve(&encyclopedia, &queries(&["q"]), &ResearchConfig::default())
            .await
            .unwrap();
        let titles: Vec<_> = sources.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["Kept"]);
    }

    #[tokio::test]
    async fn test_fetch_preserves_order_with_concurrency() {
        let encyclopedia = MockEncyclopedia::new().with_hits("q", &["A", "B", "C", "D", "E"]);
        let config = ResearchConfig::default()
            .with_results_per_query(5)
            .with_fetch_concurrency(3);

        let sources = retrieve(&encyclopedia, &queries(&["q"]), &config).await.unwrap();
        let titles: Vec<_> = sources.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "B", "C", "D", "E"]);
    }

    #[tokio::test]
    async fn test_every_fetch_failing_is_no_data() {
        let encyclopedia = MockEncyclopedia::new()
            .with_hits("q", &["A"])
            .missing_article("A");

        let err = retrieve(&encyclopedia, &queries(&["q"]), &ResearchConfig::default())
            .await
            .unwrap_err();
        assert_eq!(err.cause(), "no sources could be fetched");
    }
}

//! Configuration for the research pipeline.

use serde::{Deserialize, Serialize};

/// Fewest and most search queries derived per topic.
pub const MIN_QUERIES: usize = 3;
pub const MAX_QUERIES: usize = 5;

/// Tunables for one pipeline. All limits are per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResearchConfig {
    /// Number of diversified search queries (clamped to 3..=5).
    ///
    /// Default: 5.
    pub max_queries: usize,

    /// Search results requested per query.
    ///
    /// Bounds total candidates to `max_queries * results_per_query`.
    /// Default: 4.
    pub results_per_query: usize,

    /// Concurrent article fetches.
    ///
    /// Default: 4.
    pub fetch_concurrency: usize,

    /// Candidates judged per relevance-filter call.
    ///
    /// Default: 25 (one call for any realistic candidate set).
    pub filter_batch_size: usize,

    /// Kept sources passed on to synthesis.
    ///
    /// Default: 5.
    pub max_selected_sources: usize,

    /// Characters of each source included in prompts.
    ///
    /// Default: 1500.
    pub per_source_chars: usize,

    /// Total characters of source context in the synthesis prompt.
    ///
    /// Default: 9000.
    pub max_context_chars: usize,

    /// Ask the model for explicit financial figures per source before
    /// synthesis.
    ///
    /// Default: true.
    pub extract_financials: bool,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            max_queries: MAX_QUERIES,
            results_per_query: 4,
            fetch_concurrency: 4,
            filter_batch_size: 25,
            max_selected_sources: 5,
            per_source_chars: 1500,
            max_context_chars: 9000,
            extract_financials: true,
        }
    }
}

impl ResearchConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of search queries.
    pub fn with_max_queries(mut self, count: usize) -> Self {
        self.max_queries = count;
        self
    }

    /// Set results requested per query.
    pub fn with_results_per_query(mut self, count: usize) -> Self {
        self.results_per_query = count;
        self
    }

    /// Set fetch concurrency.
    pub fn with_fetch_concurrency(mut self, count: usize) -> Self {
        self.fetch_concurrency = count;
        self
    }

    /// Set the relevance-filter batch size.
    pub fn with_filter_batch_size(mut self, size: usize) -> Self {
        self.filter_batch_size = size;
        self
    }

    /// Set how many kept sources reach synthesis.
    pub fn with_max_selected_sources(mut self, count: usize) -> Self {
        self.max_selected_sources = count;
        self
    }

    /// Set prompt truncation limits.
    pub fn with_context_limits(mut self, per_source: usize, total: usize) -> Self {
        self.per_source_chars = per_source;
        self.max_context_chars = total;
        self
    }

    /// Enable or disable per-source financial figure extraction.
    pub fn with_financials(mut self, enabled: bool) -> Self {
        self.extract_financials = enabled;
        self
    }

    /// Copy with every limit forced into a usable range.
    pub fn normalized(&self) -> Self {
        Self {
            max_queries: self.max_queries.clamp(MIN_QUERIES, MAX_QUERIES),
            results_per_query: self.results_per_query.max(1),
            fetch_concurrency: self.fetch_concurrency.max(1),
            filter_batch_size: self.filter_batch_size.max(1),
            max_selected_sources: self.max_selected_sources.max(1),
            per_source_chars: self.per_source_chars.max(1),
            max_context_chars: self.max_context_chars.max(self.per_source_chars.max(1)),
            extract_financials: self.extract_financials,
        }
    }
}

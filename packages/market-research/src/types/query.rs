//! Input and planning types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A user-submitted industry name, trimmed and guaranteed non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndustryQuery {
    text: String,
}

impl IndustryQuery {
    /// Returns `None` for empty or whitespace-only input.
    pub fn parse(raw: &str) -> Option<Self> {
        let text = raw.trim();
        if text.is_empty() {
            return None;
        }
        Some(Self {
            text: text.to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for IndustryQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Outcome of asking the model whether the input names an industry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub is_valid: bool,

    /// Normalized industry name (valid only)
    pub canonical_name: Option<String>,

    /// Why the input was rejected (invalid only)
    pub rejection_reason: Option<String>,

    /// Alternatives offered on rejection
    pub suggestions: Vec<String>,
}

impl ValidationResult {
    pub fn valid(canonical_name: impl Into<String>) -> Self {
        Self {
            is_valid: true,
            canonical_name: Some(canonical_name.into()),
            rejection_reason: None,
            suggestions: Vec::new(),
        }
    }

    pub fn invalid(reason: impl Into<String>, suggestions: Vec<String>) -> Self {
        Self {
            is_valid: false,
            canonical_name: None,
            rejection_reason: Some(reason.into()),
            suggestions,
        }
    }

    /// The model answered, but not in the requested shape.
    pub fn unparseable() -> Self {
        Self::invalid("unparseable response", Vec::new())
    }
}

/// One diversified search query. Position in the plan is its priority.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchQuery(String);

impl SearchQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What the Query Planner hands to the orchestrator.
#[derive(Debug, Clone)]
pub struct QueryPlan {
    pub validation: ValidationResult,

    /// Empty when the input was rejected.
    pub queries: Vec<SearchQuery>,
}

impl QueryPlan {
    /// Canonical topic, when validation succeeded.
    pub fn topic(&self) -> Option<&str> {
        self.validation.canonical_name.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_industry_query_trims() {
        let query = IndustryQuery::parse("  Healthcare \n").unwrap();
        assert_eq!(query.as_str(), "Healthcare");
    }

    #[test]
    fn test_industry_query_rejects_blank() {
        assert!(IndustryQuery::parse("").is_none());
        assert!(IndustryQuery::parse(" \t\n ").is_none());
    }

    #[test]
    fn test_unparseable_is_invalid() {
        let result = ValidationResult::unparseable();
        assert!(!result.is_valid);
        assert!(result.canonical_name.is_none());
        assert_eq!(result.rejection_reason.as_deref(), Some("unparseable response"));
    }
}

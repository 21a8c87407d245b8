//! Query Planner: validate the industry name and derive search queries.

use tracing::{debug, info, warn};

use crate::error::{PipelineError, Result, Stage};
use crate::pipeline::parse::parse_validation;
use crate::pipeline::prompts::{format_validate_prompt, VALIDATE_SYSTEM};
use crate::traits::llm::{CompletionRequest, LanguageModel, Task};
use crate::types::config::{ResearchConfig, MAX_QUERIES, MIN_QUERIES};
use crate::types::query::{IndustryQuery, QueryPlan, SearchQuery, ValidationResult};

/// Modifiers combined with the topic, in search priority order.
pub const QUERY_MODIFIERS: [&str; MAX_QUERIES] = [
    "industry",
    "market size",
    "companies",
    "value chain",
    "trends",
];

/// Trailing words stripped from the topic before modifiers are added.
const GENERIC_SUFFIXES: [&str; 4] = ["industry", "industries", "sector", "market"];

/// Validate `industry_text` with one model call and, if accepted, derive
/// the search queries.
///
/// Blank input fails without calling the model. A response that cannot be
/// parsed counts as a rejection, not as an error.
pub async fn validate_and_plan<L: LanguageModel + ?Sized>(
    llm: &L,
    industry_text: &str,
    config: &ResearchConfig,
) -> Result<QueryPlan> {
    let query = IndustryQuery::parse(industry_text)
        .ok_or_else(|| PipelineError::input(Stage::Validation, "industry name must not be empty"))?;

    let request = CompletionRequest::new(
        Task::Validate,
        VALIDATE_SYSTEM,
        format_validate_prompt(query.as_str()),
    );
    let response = llm
        .complete(request)
        .await
        .map_err(|e| PipelineError::upstream(Stage::Validation, e))?;

    let validation = match parse_validation(&response) {
        Ok(verdict) if verdict.valid => ValidationResult::valid(
            verdict
                .canonical_name
                .unwrap_or_else(|| query.as_str().to_string()),
        ),
        Ok(verdict) => ValidationResult::invalid(
            verdict
                .reason
                .unwrap_or_else(|| "not recognized as an industry".to_string()),
            verdict.suggestions,
        ),
        Err(failure) => {
            warn!(input = %query, error = %failure, "Validation response unparseable");
            ValidationResult::unparseable()
        }
    };

    let queries = match validation.canonical_name.as_deref() {
        Some(name) => diversify(name, config.max_queries),
        None => Vec::new(),
    };

    info!(
        input = %query,
        valid = validation.is_valid,
        canonical = ?validation.canonical_name,
        queries = queries.len(),
        "Industry validated"
    );

    Ok(QueryPlan {
        validation,
        queries,
    })
}

/// Derive 3 to 5 pairwise-distinct search queries from a canonical name.
///
/// Pure string composition: never fails and never calls a service.
pub fn diversify(canonical_name: &str, max_queries: usize) -> Vec<SearchQuery> {
    let count = max_queries.clamp(MIN_QUERIES, MAX_QUERIES);
    let stem = topic_stem(canonical_name);

    let queries: Vec<SearchQuery> = QUERY_MODIFIERS
        .iter()
        .take(count)
        .map(|modifier| SearchQuery::new(format!("{} {}", stem, modifier).trim()))
        .collect();

    debug!(stem = %stem, ?queries, "Derived search queries");
    queries
}

/// Topic with whitespace collapsed and a trailing generic word removed
/// ("Tea industry" becomes "Tea").
fn topic_stem(canonical_name: &str) -> String {
    let words: Vec<&str> = canonical_name.split_whitespace().collect();
    match words.split_last() {
        Some((last, rest))
            if !rest.is_empty()
                && GENERIC_SUFFIXES
                    .iter()
                    .any(|s| last.eq_ignore_ascii_case(s)) =>
        {
            rest.join(" ")
        }
        _ => words.join(" "),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use crate::testing::MockLanguageModel;

    #[tokio::test]
    async fn test_blank_input_makes_no_call() {
        let llm = MockLanguageModel::new();
        let err = validate_and_plan(&llm, "   ", &ResearchConfig::default())
            .await
            .unwrap_err();

        assert_eq!(err.stage(), Stage::Validation);
        assert!(matches!(err, PipelineError::Input { .. }));
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_valid_industry_gets_queries() {
        let llm = MockLanguageModel::new().reply(
            Task::Validate,
            r#"{"valid": true, "canonical_name": "Healthcare"}"#,
        );
        let plan = validate_and_plan(&llm, "healthcare", &ResearchConfig::default())
            .await
            .unwrap();

        assert!(plan.validation.is_valid);
        assert_eq!(plan.topic(), Some("Healthcare"));
        assert_eq!(plan.queries.len(), 5);
        assert_eq!(plan.queries[0].as_str(), "Healthcare industry");
        assert_eq!(llm.call_count(), 1);
    }

    #[tokio::test]
    async fn test_missing_canonical_name_falls_back_to_input() {
        let llm = MockLanguageModel::new().reply(Task::Validate, r#"{"valid": true}"#);
        let plan = validate_and_plan(&llm, "  Semiconductors ", &ResearchConfig::default())
            .await
            .unwrap();
        assert_eq!(plan.topic(), Some("Semiconductors"));
    }

    #[tokio::test]
    async fn test_unparseable_response_is_rejection() {
        let llm = MockLanguageModel::new().reply(Task::Validate, "I think so, yes.");
        let plan = validate_and_plan(&llm, "Tourism", &ResearchConfig::default())
            .await
            .unwrap();

        assert!(!plan.validation.is_valid);
        assert_eq!(
            plan.validation.rejection_reason.as_deref(),
            Some("unparseable response")
        );
        assert!(plan.queries.is_empty());
    }

    #[tokio::test]
    async fn test_service_failure_is_upstream() {
        let llm =
            MockLanguageModel::new().fail(Task::Validate, ServiceError::Auth("invalid key".into()));
        let err = validate_and_plan(&llm, "Tourism", &ResearchConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Upstream {
                stage: Stage::Validation,
                source: ServiceError::Auth(_)
            }
        ));
    }

    #[test]
    fn test_diversify_respects_bounds() {
        assert_eq!(diversify("Tea", 1).len(), 3);
        assert_eq!(diversify("Tea", 4).len(), 4);
        assert_eq!(diversify("Tea", 50).len(), 5);
    }

    #[test]
    fn test_stem_drops_generic_suffix() {
        let queries = diversify("Tea Industry", 3);
        assert_eq!(queries[0].as_str(), "Tea industry");
        assert_eq!(queries[1].as_str(), "Tea market size");

        // A lone generic word is kept as is
        assert_eq!(diversify("Industry", 3)[0].as_str(), "Industry industry");
    }
}

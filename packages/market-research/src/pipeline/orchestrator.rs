//! Pipeline Orchestrator: drives one request through every stage.

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::{PipelineError, Result, Stage};
use crate::pipeline::context::{PipelineState, RunContext};
use crate::pipeline::filter::filter;
use crate::pipeline::planner::validate_and_plan;
use crate::pipeline::retrieval::{collect_candidates, fetch_texts};
use crate::pipeline::synthesis::synthesize;
use crate::traits::encyclopedia::Encyclopedia;
use crate::traits::llm::LanguageModel;
use crate::types::config::ResearchConfig;
use crate::types::report::{PipelineWarning, Report};

/// Industry research pipeline over a language model and an encyclopedia.
///
/// Holds no per-request state; one instance serves any number of
/// concurrent runs.
///
/// # Example
///
/// ```rust,ignore
/// use market_research::{Pipeline, ResearchConfig};
///
/// let pipeline = Pipeline::new(llm, encyclopedia)
///     .with_config(ResearchConfig::default().with_financials(false));
/// let report = pipeline.run("Tea").await?;
/// println!("{}", report.to_text());
/// ```
pub struct Pipeline<L, E> {
    llm: L,
    encyclopedia: E,
    config: ResearchConfig,
}

impl<L: LanguageModel, E: Encyclopedia> Pipeline<L, E> {
    pub fn new(llm: L, encyclopedia: E) -> Self {
        Self {
            llm,
            encyclopedia,
            config: ResearchConfig::default(),
        }
    }

    /// Replace the configuration. Out-of-range limits are normalized.
    pub fn with_config(mut self, config: ResearchConfig) -> Self {
        self.config = config.normalized();
        self
    }

    pub fn config(&self) -> &ResearchConfig {
        &self.config
    }

    pub fn llm(&self) -> &L {
        &self.llm
    }

    pub fn encyclopedia(&self) -> &E {
        &self.encyclopedia
    }

    /// Produce a report for `industry_text`.
    pub async fn run(&self, industry_text: &str) -> Result<Report> {
        let mut ctx = RunContext::new();
        self.run_with_context(&mut ctx, industry_text).await
    }

    /// Like [`run`](Self::run), stopping early once `cancel` fires.
    pub async fn run_with_cancel(
        &self,
        industry_text: &str,
        cancel: CancellationToken,
    ) -> Result<Report> {
        let mut ctx = RunContext::with_cancel(cancel);
        self.run_with_context(&mut ctx, industry_text).await
    }

    /// Run inside a caller-owned context, which afterwards holds the full
    /// state history ending in `Done` or `Failed`.
    pub async fn run_with_context(
        &self,
        ctx: &mut RunContext,
        industry_text: &str,
    ) -> Result<Report> {
        let result = self.drive(ctx, industry_text).await;

        match &result {
            Ok(report) => {
                ctx.enter(PipelineState::Done);
                info!(
                    run_id = %ctx.id(),
                    topic = report.topic(),
                    confidence = ?report.confidence(),
                    elapsed_ms = (Utc::now() - ctx.started_at()).num_milliseconds(),
                    "Report generated"
                );
            }
            Err(e) => {
                ctx.enter(PipelineState::Failed {
                    stage: e.stage(),
                    cause: e.cause(),
                });
                warn!(
                    run_id = %ctx.id(),
                    stage = %e.stage(),
                    elapsed_ms = (Utc::now() - ctx.started_at()).num_milliseconds(),
                    error = %e,
                    "Pipeline failed"
                );
            }
        }

        result
    }

    async fn drive(&self, ctx: &mut RunContext, industry_text: &str) -> Result<Report> {
        let config = &self.config;

        ctx.enter(PipelineState::Validating);
        let plan = ctx
            .guard(
                Stage::Validation,
                validate_and_plan(&self.llm, industry_text, config),
            )
            .await?;

        let validation = &plan.validation;
        let topic = match (validation.is_valid, &validation.canonical_name) {
            (true, Some(topic)) => topic.clone(),
            _ => {
                return Err(PipelineError::Input {
                    stage: Stage::Validation,
                    reason: validation
                        .rejection_reason
                        .clone()
                        .unwrap_or_else(|| "not recognized as an industry".to_string()),
                    suggestions: validation.suggestions.clone(),
                });
            }
        };

        ctx.enter(PipelineState::Searching);
        let candidates = ctx
            .guard(
                Stage::Retrieval,
                collect_candidates(&self.encyclopedia, &plan.queries, config),
            )
            .await?;

        ctx.enter(PipelineState::Retrieving);
        let candidates = ctx
            .guard(
                Stage::Retrieval,
                fetch_texts(&self.encyclopedia, candidates, config),
            )
            .await?;
        let candidate_count = candidates.len();

        ctx.enter(PipelineState::Filtering);
        let sources = ctx
            .guard(
                Stage::Filtering,
                filter(&self.llm, &topic, candidates, config),
            )
            .await?;

        let mut warnings = Vec::new();
        if sources.is_empty() {
            warn!(
                topic = %topic,
                candidates = candidate_count,
                "No sources passed the relevance check, continuing with limited sourcing"
            );
            warnings.push(PipelineWarning::NoQualifyingSources {
                candidates: candidate_count,
            });
        }

        ctx.enter(PipelineState::Synthesizing);
        ctx.guard(
            Stage::Synthesis,
            synthesize(&self.llm, &topic, &sources, warnings, config),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, ServiceError};
    use crate::testing::{MockEncyclopedia, MockLanguageModel};
    use crate::traits::llm::Task;

    fn states(ctx: &RunContext) -> Vec<&'static str> {
        ctx.history()
            .iter()
            .map(|t| match t.state {
                PipelineState::Idle => "idle",
                PipelineState::Validating => "validating",
                PipelineState::Searching => "searching",
                PipelineState::Retrieving => "retrieving",
                PipelineState::Filtering => "filtering",
                PipelineState::Synthesizing => "synthesizing",
                PipelineState::Done => "done",
                PipelineState::Failed { .. } => "failed",
            })
            .collect()
    }

    fn tea_encyclopedia() -> MockEncyclopedia {
        MockEncyclopedia::new()
            .with_hits("Tea industry", &["Tea", "Tea production"])
            .with_hits("Tea market size", &["Tea", "Tea trade"])
    }

    #[tokio::test]
    async fn test_full_run_walks_every_state() {
        let llm = MockLanguageModel::new()
            .reply(Task::Validate, r#"{"valid": true, "canonical_name": "Tea"}"#);
        let pipeline = Pipeline::new(llm, tea_encyclopedia());

        let mut ctx = RunContext::new();
        let report = pipeline.run_with_context(&mut ctx, "tea").await.unwrap();

        assert_eq!(
            states(&ctx),
            vec!["idle", "validating", "searching", "retrieving", "filtering", "synthesizing", "done"]
        );
        assert_eq!(report.topic(), "Tea");
        assert_eq!(report.cited_titles(), vec!["Tea", "Tea production", "Tea trade"]);
        assert!(!report.is_low_confidence());
    }

    #[tokio::test]
    async fn test_rejection_reason_is_verbatim() {
        let llm = MockLanguageModel::new().reply(
            Task::Validate,
            r#"{"valid": false, "reason": "Purple is a colour.", "suggestions": ["Paint industry"]}"#,
        );
        let pipeline = Pipeline::new(llm, MockEncyclopedia::new());

        let mut ctx = RunContext::new();
        let err = pipeline.run_with_context(&mut ctx, "purple").await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Input);
        assert_eq!(err.cause(), "Purple is a colour.");
        assert_eq!(err.suggestions(), ["Paint industry".to_string()]);
        assert_eq!(states(&ctx), vec!["idle", "validating", "failed"]);
        assert!(pipeline.encyclopedia().calls().is_empty());
    }

    #[tokio::test]
    async fn test_zero_kept_sources_degrades() {
        let llm = MockLanguageModel::new().reply(
            Task::Filter,
            r#"[{"index": 1, "relevant": false}, {"index": 2, "relevant": false}, {"index": 3, "relevant": false}]"#,
        );
        let pipeline = Pipeline::new(llm, tea_encyclopedia());

        let report = pipeline.run("Tea").await.unwrap();

        assert!(report.is_low_confidence());
        assert!(report.citations().is_empty());
        assert_eq!(
            report.warnings(),
            &[PipelineWarning::NoQualifyingSources { candidates: 3 }]
        );
    }

    #[tokio::test]
    async fn test_synthesis_failure_names_stage() {
        let llm = MockLanguageModel::new()
            .fail(Task::Synthesize, ServiceError::Auth("invalid api key".into()));
        let pipeline = Pipeline::new(llm, tea_encyclopedia())
            .with_config(ResearchConfig::default().with_financials(false));

        let err = pipeline.run("Tea").await.unwrap_err();
        assert_eq!(err.stage(), Stage::Synthesis);
        assert_eq!(err.kind(), ErrorKind::Upstream);
    }

    #[tokio::test]
    async fn test_cancelled_before_start_makes_no_calls() {
        let token = CancellationToken::new();
        token.cancel();
        let pipeline = Pipeline::new(MockLanguageModel::new(), tea_encyclopedia());

        let err = pipeline.run_with_cancel("Tea", token).await.unwrap_err();

        assert!(matches!(err, PipelineError::Cancelled { stage: Stage::Validation }));
        assert_eq!(pipeline.llm().call_count(), 0);
    }

    #[test]
    fn test_config_is_normalized() {
        let pipeline = Pipeline::new(MockLanguageModel::new(), MockEncyclopedia::new())
            .with_config(ResearchConfig::default().with_max_queries(9));
        assert_eq!(pipeline.config().max_queries, 5);
    }
}

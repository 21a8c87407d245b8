//! Relevance Filter: judge candidates against the canonical topic.
//!
//! Candidates are judged in batches (one model call per batch, normally a
//! single call). Filtering fails open per item: a candidate without a usable
//! verdict is kept and marked `Decision::KeptByDefault`.

use tracing::{debug, info, warn};

use crate::error::{PipelineError, Result, Stage};
use crate::pipeline::parse::{parse_verdicts, ItemVerdict};
use crate::pipeline::prompts::{format_filter_prompt, FILTER_SYSTEM};
use crate::traits::llm::{CompletionRequest, LanguageModel, Task};
use crate::types::config::ResearchConfig;
use crate::types::source::{Decision, FilteredSource, SourceCandidate};

/// Keep the relevant candidates, in input order, up to
/// `config.max_selected_sources`.
///
/// An empty input returns immediately without a model call. An empty
/// output is not an error.
pub async fn filter<L: LanguageModel + ?Sized>(
    llm: &L,
    canonical_name: &str,
    candidates: Vec<SourceCandidate>,
    config: &ResearchConfig,
) -> Result<Vec<FilteredSource>> {
    let judged = judge(llm, canonical_name, candidates, config).await?;
    let total = judged.len();

    let kept: Vec<FilteredSource> = judged
        .into_iter()
        .filter(|s| s.decision.is_kept())
        .take(config.max_selected_sources.max(1))
        .collect();

    info!(
        topic = canonical_name,
        candidates = total,
        kept = kept.len(),
        "Sources filtered"
    );
    Ok(kept)
}

/// Attach a decision to every candidate, in input order.
pub async fn judge<L: LanguageModel + ?Sized>(
    llm: &L,
    canonical_name: &str,
    candidates: Vec<SourceCandidate>,
    config: &ResearchConfig,
) -> Result<Vec<FilteredSource>> {
    if candidates.is_empty() {
        return Ok(Vec::new());
    }

    let batch_size = config.filter_batch_size.max(1);
    let mut judged = Vec::with_capacity(candidates.len());
    let mut remaining = candidates.into_iter().peekable();

    while remaining.peek().is_some() {
        let batch: Vec<SourceCandidate> = remaining.by_ref().take(batch_size).collect();
        let verdicts = judge_batch(llm, canonical_name, &batch).await?;
        judged.extend(
            batch
                .into_iter()
                .zip(verdicts)
                .map(|(candidate, verdict)| decide(candidate, verdict)),
        );
    }

    Ok(judged)
}

/// One model call for one batch. Returns a verdict slot per candidate.
async fn judge_batch<L: LanguageModel + ?Sized>(
    llm: &L,
    canonical_name: &str,
    batch: &[SourceCandidate],
) -> Result<Vec<Option<ItemVerdict>>> {
    let prompt = format_filter_prompt(
        canonical_name,
        batch
            .iter()
            .map(|c| (c.title.as_str(), c.snippet.as_str())),
    );
    let response = llm
        .complete(CompletionRequest::new(Task::Filter, FILTER_SYSTEM, prompt))
        .await
        .map_err(|e| PipelineError::upstream(Stage::Filtering, e))?;

    match parse_verdicts(&response, batch.len()) {
        Ok(slots) => Ok(slots),
        Err(failure) => {
            warn!(
                batch = batch.len(),
                error = %failure,
                "Filter response unparseable, keeping whole batch"
            );
            Ok(vec![None; batch.len()])
        }
    }
}

fn decide(candidate: SourceCandidate, verdict: Option<ItemVerdict>) -> FilteredSource {
    match verdict {
        Some(verdict) => {
            let decision = if verdict.relevant {
                Decision::Kept
            } else {
                Decision::Dropped
            };
            debug!(title = %candidate.title, ?decision, reason = ?verdict.reason, "Relevance verdict");
            FilteredSource {
                candidate,
                decision,
                rationale: verdict.reason,
            }
        }
        None => {
            warn!(title = %candidate.title, "No relevance verdict, keeping by default");
            FilteredSource {
                candidate,
                decision: Decision::KeptByDefault,
                rationale: None,
            }
        }
    }
}

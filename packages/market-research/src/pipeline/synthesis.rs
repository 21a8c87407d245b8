//! Report Synthesizer: assemble bounded context and write the report.

use tracing::{debug, info, warn};

use crate::error::{PipelineError, Result, ServiceError, Stage};
use crate::pipeline::parse::{parse_figures, parse_sections};
use crate::pipeline::prompts::{
    format_figures_prompt, format_synthesize_prompt, FIGURES_SYSTEM, SYNTHESIZE_SYSTEM,
};
use crate::traits::llm::{CompletionRequest, LanguageModel, Task};
use crate::types::config::ResearchConfig;
use crate::types::report::{Citation, PipelineWarning, Report};
use crate::types::source::FilteredSource;

const NO_SOURCES_CONTEXT: &str =
    "No qualifying sources are available for this industry.";

/// Source context that fits the synthesis prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledContext {
    /// `[SOURCE n]` blocks, separated by blank lines.
    pub text: String,

    /// One citation per included source, numbered as in `text`.
    pub citations: Vec<Citation>,

    /// Titles left out to stay within `max_context_chars`.
    pub dropped: Vec<String>,
}

/// Write the report for `canonical_name` from the kept sources.
///
/// `warnings` carries conditions already recorded by earlier stages; the
/// report's confidence is derived from them. Zero sources still produce a
/// report, marked low confidence by the caller's warning.
pub async fn synthesize<L: LanguageModel + ?Sized>(
    llm: &L,
    canonical_name: &str,
    sources: &[FilteredSource],
    mut warnings: Vec<PipelineWarning>,
    config: &ResearchConfig,
) -> Result<Report> {
    let mut context = assemble_context(sources, config);
    if !context.dropped.is_empty() {
        warn!(
            dropped = context.dropped.len(),
            "Synthesis context truncated"
        );
        warnings.push(PipelineWarning::ContextTruncated {
            dropped: context.dropped.clone(),
        });
    }

    if config.extract_financials {
        extract_figures(llm, sources, &mut context.citations, config).await;
    }

    let financials = format_financials(&context.citations);
    let limited_sourcing = context.citations.is_empty();
    let body = if limited_sourcing {
        NO_SOURCES_CONTEXT
    } else {
        context.text.as_str()
    };

    let prompt = format_synthesize_prompt(canonical_name, body, &financials, limited_sourcing);
    let response = llm
        .complete(CompletionRequest::new(
            Task::Synthesize,
            SYNTHESIZE_SYSTEM,
            prompt,
        ))
        .await
        .map_err(|e| PipelineError::upstream(Stage::Synthesis, e))?;

    let sections = parse_sections(&response).map_err(|failure| {
        PipelineError::upstream(Stage::Synthesis, ServiceError::Malformed(failure.reason))
    })?;

    info!(
        topic = canonical_name,
        sections = sections.len(),
        citations = context.citations.len(),
        "Report synthesized"
    );

    Ok(Report::new(
        canonical_name,
        sections,
        context.citations,
        warnings,
    ))
}

/// Build the numbered source blocks for the synthesis prompt.
///
/// Each source contributes at most `per_source_chars` characters of text.
/// Sources are added in order until the next block would exceed
/// `max_context_chars`; the rest are dropped. The first source is always
/// included.
pub fn assemble_context(sources: &[FilteredSource], config: &ResearchConfig) -> AssembledContext {
    let mut blocks: Vec<String> = Vec::new();
    let mut citations = Vec::new();
    let mut dropped = Vec::new();
    let mut used = 0usize;

    for source in sources {
        if !dropped.is_empty() {
            dropped.push(source.title().to_string());
            continue;
        }

        let number = citations.len() + 1;
        let candidate = &source.candidate;
        let block = format!(
            "[SOURCE {}]\nTITLE: {}\nURL: {}\nCONTENT:\n{}",
            number,
            candidate.title,
            candidate.url.as_deref().unwrap_or("unavailable"),
            truncate_chars(candidate.text(), config.per_source_chars),
        );
        let size = block.chars().count();

        if !blocks.is_empty() && used + size > config.max_context_chars {
            debug!(title = %candidate.title, used, size, "Source does not fit in context");
            dropped.push(candidate.title.clone());
            continue;
        }

        used += size;
        blocks.push(block);
        citations.push(Citation {
            number,
            title: candidate.title.clone(),
            url: candidate.url.clone(),
            financial_figures: None,
        });
    }

    AssembledContext {
        text: blocks.join("\n\n"),
        citations,
        dropped,
    }
}

/// One sequential figures call per cited source. A failed call or a "None"
/// answer leaves the citation without figures.
async fn extract_figures<L: LanguageModel + ?Sized>(
    llm: &L,
    sources: &[FilteredSource],
    citations: &mut [Citation],
    config: &ResearchConfig,
) {
    for (citation, source) in citations.iter_mut().zip(sources) {
        let content = truncate_chars(source.candidate.text(), config.per_source_chars);
        let request = CompletionRequest::new(
            Task::ExtractFigures,
            FIGURES_SYSTEM,
            format_figures_prompt(content),
        );

        match llm.complete(request).await {
            Ok(text) => citation.financial_figures = parse_figures(&text),
            Err(e) => {
                warn!(title = %citation.title, error = %e, "Figure extraction failed, continuing without");
            }
        }
    }
}

fn format_financials(citations: &[Citation]) -> String {
    let lines: Vec<String> = citations
        .iter()
        .filter_map(|c| {
            c.financial_figures
                .as_ref()
                .map(|figures| format!("[SOURCE {}] {}\n{}", c.number, c.title, figures))
        })
        .collect();

    if lines.is_empty() {
        "None".to_string()
    } else {
        lines.join("\n\n")
    }
}

/// Prefix of `text` holding at most `max` characters.
fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockLanguageModel;
    use crate::traits::encyclopedia::Article;
    use crate::types::query::SearchQuery;
    use crate::types::report::{Confidence, REPORT_TEMPLATE};
    use crate::types::source::{Decision, SourceCandidate};

    fn source(title: &str, text: &str) -> FilteredSource {
        let candidate = SourceCandidate::new(title, "", SearchQuery::new("q")).with_article(Article {
            title: title.to_string(),
            url: format!("https://en.wikipedia.org/wiki/{}", title.replace(' ', "_")),
            text: text.to_string(),
        });
        FilteredSource {
            candidate,
            decision: Decision::Kept,
            rationale: None,
        }
    }

    fn no_figures() -> ResearchConfig {
        ResearchConfig::default().with_financials(false)
    }

    #[test]
    fn test_truncate_chars_respects_char_boundaries() {
        assert_eq!(truncate_chars("café au lait", 4), "café");
        assert_eq!(truncate_chars("tea", 10), "tea");
        assert_eq!(truncate_chars("", 3), "");
    }

    #[test]
    fn test_context_numbers_sources_in_order() {
        let sources = vec![source("Tea", "Tea is a drink."), source("Tea trade", "Traded widely.")];
        let ctx = assemble_context(&sources, &ResearchConfig::default());

        assert!(ctx.text.starts_with("[SOURCE 1]\nTITLE: Tea\n"));
        assert!(ctx.text.contains("[SOURCE 2]\nTITLE: Tea trade\nURL: https://en.wikipedia.org/wiki/Tea_trade"));
        assert_eq!(ctx.citations.len(), 2);
        assert_eq!(ctx.citations[1].number, 2);
        assert!(ctx.dropped.is_empty());
    }

    #[test]
    fn test_context_truncates_each_source() {
        let long = "x".repeat(5000);
        let ctx = assemble_context(&[source("Tea", &long)], &ResearchConfig::default().with_context_limits(100, 9000));
        assert!(!ctx.text.contains(&"x".repeat(101)));
        assert!(ctx.text.contains(&"x".repeat(100)));
    }

    #[test]
    fn test_context_drops_sources_past_total_limit() {
        let body = "y".repeat(200);
        let sources = vec![source("A", &body), source("B", &body), source("C", &body)];
        let config = ResearchConfig::default().with_context_limits(200, 600);

        let ctx = assemble_context(&sources, &config);

        assert_eq!(ctx.citations.len(), 2);
        assert_eq!(ctx.dropped, vec!["C".to_string()]);
    }

    #[tokio::test]
    async fn test_synthesize_orders_sections_by_template() {
        let llm = MockLanguageModel::new().reply(
            Task::Synthesize,
            "## Industry Outlook\n\nSteady [SOURCE 1].\n\n## Industry Overview & Market Value\n\nLarge [SOURCE 1].",
        );
        let report = synthesize(&llm, "Tea industry", &[source("Tea", "Tea.")], Vec::new(), &no_figures())
            .await
            .unwrap();

        assert_eq!(report.headings(), vec![REPORT_TEMPLATE[0], REPORT_TEMPLATE[7]]);
        assert_eq!(report.cited_titles(), vec!["Tea"]);
        assert_eq!(report.confidence(), Confidence::Standard);
    }

    #[tokio::test]
    async fn test_repeated_synthesis_keeps_section_order() {
        let llm = MockLanguageModel::new().reply(
            Task::Synthesize,
            "Briefing follows.\n\n## SWOT Analysis\n\n**Strengths** scale [SOURCE 1].\n\n\
             ## Appendix\n\nNotes.\n\n## Competitive Landscape\n\nFragmented [SOURCE 1].",
        );
        let sources = [source("Tea", "Tea.")];

        let first = synthesize(&llm, "Tea industry", &sources, Vec::new(), &no_figures())
            .await
            .unwrap();
        let second = synthesize(&llm, "Tea industry", &sources, Vec::new(), &no_figures())
            .await
            .unwrap();

        assert_eq!(first.headings(), second.headings());
        assert_eq!(
            first.headings(),
            vec!["", REPORT_TEMPLATE[3], REPORT_TEMPLATE[6], "Appendix"]
        );
        assert_eq!(llm.calls_for(Task::Synthesize).len(), 2);
    }

    #[tokio::test]
    async fn test_synthesize_passes_source_braces_through() {
        let llm = MockLanguageModel::new();
        let text = "Syntax like {financials} and {topic} is common.";

        synthesize(&llm, "Tea industry", &[source("Tea", text)], Vec::new(), &no_figures())
            .await
            .unwrap();

        let calls = llm.calls_for(Task::Synthesize);
        assert!(calls[0].user.contains(text));
    }

    #[tokio::test]
    async fn test_synthesize_with_no_sources_is_low_confidence() {
        let llm = MockLanguageModel::new();
        let warnings = vec![PipelineWarning::NoQualifyingSources { candidates: 3 }];

        let report = synthesize(&llm, "Tea industry", &[], warnings, &ResearchConfig::default())
            .await
            .unwrap();

        assert!(report.is_low_confidence());
        assert!(report.citations().is_empty());
        let calls = llm.calls_for(Task::Synthesize);
        assert_eq!(calls.len(), 1);
        assert!(calls[0].user.contains(NO_SOURCES_CONTEXT));
        assert!(llm.calls_for(Task::ExtractFigures).is_empty());
    }

    #[tokio::test]
    async fn test_figures_attach_to_citations() {
        let llm = MockLanguageModel::new()
            .reply(Task::ExtractFigures, "• US$1.3 billion — export revenue");
        let report = synthesize(&llm, "Tea industry", &[source("Tea", "Tea.")], Vec::new(), &ResearchConfig::default())
            .await
            .unwrap();

        assert_eq!(
            report.citations()[0].financial_figures.as_deref(),
            Some("• US$1.3 billion — export revenue")
        );
        let synth = &llm.calls_for(Task::Synthesize)[0];
        assert!(synth.user.contains("[SOURCE 1] Tea\n• US$1.3 billion"));
    }

    #[tokio::test]
    async fn test_figure_failure_is_not_fatal() {
        let llm = MockLanguageModel::new()
            .fail(Task::ExtractFigures, ServiceError::Network("reset".into()));
        let report = synthesize(&llm, "Tea industry", &[source("Tea", "Tea.")], Vec::new(), &ResearchConfig::default())
            .await
            .unwrap();
        assert_eq!(report.citations()[0].financial_figures, None);
    }

    #[tokio::test]
    async fn test_empty_completion_is_upstream_failure() {
        let llm = MockLanguageModel::new().reply(Task::Synthesize, "   ");
        let err = synthesize(&llm, "Tea industry", &[source("Tea", "Tea.")], Vec::new(), &no_figures())
            .await
            .unwrap_err();

        assert_eq!(err.stage(), Stage::Synthesis);
        assert!(matches!(
            err,
            PipelineError::Upstream { source: ServiceError::Malformed(_), .. }
        ));
    }

    #[tokio::test]
    async fn test_truncation_adds_warning() {
        let llm = MockLanguageModel::new();
        let body = "z".repeat(300);
        let sources = vec![source("A", &body), source("B", &body)];
        let config = no_figures().with_context_limits(300, 400);

        let report = synthesize(&llm, "Tea industry", &sources, Vec::new(), &config)
            .await
            .unwrap();

        assert_eq!(
            report.warnings(),
            &[PipelineWarning::ContextTruncated { dropped: vec!["B".to_string()] }]
        );
        assert!(!report.is_low_confidence());
    }
}

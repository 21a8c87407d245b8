//! Strict parsers for model responses.
//!
//! Each parser returns `Parsed<T>`: either the structured value or a
//! `ParseFailure`. The fallback policies (invalid-on-failure for validation,
//! fail-open for filtering, single-section for synthesis) are explicit
//! branches in the calling stage, never string sniffing here.

use serde::Deserialize;
use thiserror::Error;

use crate::types::report::{ReportSection, REPORT_TEMPLATE};

/// The response did not have the requested shape.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unparseable response: {reason}")]
pub struct ParseFailure {
    pub reason: String,
}

impl ParseFailure {
    fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Tagged parse result.
pub type Parsed<T> = std::result::Result<T, ParseFailure>;

// =============================================================================
// JSON extraction
// =============================================================================

/// Candidate JSON values in a completion, in order of their opening bracket.
///
/// Code fences are stripped. Each `{` or `[` yields the span up to the last
/// matching closer, so bracketed prose ahead of the real answer only costs
/// one failed attempt.
pub fn json_candidates(text: &str) -> impl Iterator<Item = &str> {
    let text = text
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    text.match_indices(['{', '['])
        .filter_map(move |(start, open)| {
            let close = if open == "{" { '}' } else { ']' };
            let end = text.rfind(close)?;
            (end > start).then(|| &text[start..=end])
        })
}

fn parse_json<T: for<'de> Deserialize<'de>>(text: &str) -> Parsed<T> {
    let mut first_error = None;
    for json in json_candidates(text) {
        match serde_json::from_str(json) {
            Ok(value) => return Ok(value),
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }
    }
    Err(match first_error {
        Some(e) => ParseFailure::new(e.to_string()),
        None => ParseFailure::new("no JSON found"),
    })
}

// =============================================================================
// Validation
// =============================================================================

/// Structured validation answer.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ValidationVerdict {
    #[serde(alias = "is_valid")]
    pub valid: bool,

    #[serde(default, alias = "name", alias = "canonical")]
    pub canonical_name: Option<String>,

    #[serde(default, alias = "rejection_reason")]
    pub reason: Option<String>,

    #[serde(default)]
    pub suggestions: Vec<String>,
}

pub fn parse_validation(text: &str) -> Parsed<ValidationVerdict> {
    let mut verdict: ValidationVerdict = parse_json(text)?;
    verdict.canonical_name = verdict
        .canonical_name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());
    verdict.reason = verdict
        .reason
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty());
    verdict.suggestions = verdict
        .suggestions
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    Ok(verdict)
}

// =============================================================================
// Relevance verdicts
// =============================================================================

/// Per-candidate relevance answer.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ItemVerdict {
    /// 1-based position in the prompt listing.
    pub index: usize,

    #[serde(alias = "keep", alias = "relevant_to_industry")]
    pub relevant: bool,

    #[serde(default, alias = "rationale")]
    pub reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum VerdictList {
    Bare(Vec<ItemVerdict>),
    Wrapped { verdicts: Vec<ItemVerdict> },
}

/// Parse verdicts for a batch of `count` candidates.
///
/// Returns one slot per candidate; `None` where the response gave no
/// verdict. Out-of-range indices are ignored and the first verdict for an
/// index wins.
pub fn parse_verdicts(text: &str, count: usize) -> Parsed<Vec<Option<ItemVerdict>>> {
    let list = match parse_json::<VerdictList>(text)? {
        VerdictList::Bare(items) => items,
        VerdictList::Wrapped { verdicts } => verdicts,
    };

    let mut slots: Vec<Option<ItemVerdict>> = vec![None; count];
    for verdict in list {
        if verdict.index == 0 || verdict.index > count {
            continue;
        }
        let slot = &mut slots[verdict.index - 1];
        if slot.is_none() {
            *slot = Some(verdict);
        }
    }
    Ok(slots)
}

// =============================================================================
// Financial figures
// =============================================================================

/// `None` when the model reported no figures.
pub fn parse_figures(text: &str) -> Option<String> {
    let trimmed = text.trim().trim_matches(|c| c == '"' || c == '\'').trim();
    if trimmed.is_empty() || trimmed.trim_end_matches('.').eq_ignore_ascii_case("none") {
        return None;
    }
    Some(trimmed.to_string())
}

// =============================================================================
// Report sections
// =============================================================================

/// Split a synthesis response into sections.
///
/// Sections matching `REPORT_TEMPLATE` come first in template order; other
/// headed sections follow in the order they appeared. Prose before the first
/// heading is kept as a leading unnamed section. Sections the response did
/// not supply are omitted. A response with no `#` headings becomes a
/// single unnamed section. Only an empty response is a failure.
pub fn parse_sections(text: &str) -> Parsed<Vec<ReportSection>> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ParseFailure::new("empty response"));
    }

    let mut preamble = String::new();
    let mut headed: Vec<(String, String)> = Vec::new();
    for line in text.lines() {
        if let Some(heading) = heading_text(line) {
            headed.push((heading, String::new()));
        } else {
            let body = match headed.last_mut() {
                Some((_, body)) => body,
                None => &mut preamble,
            };
            body.push_str(line);
            body.push('\n');
        }
    }

    if headed.is_empty() {
        return Ok(vec![ReportSection::unnamed(text)]);
    }

    let mut template_slots: Vec<Option<ReportSection>> = vec![None; REPORT_TEMPLATE.len()];
    let mut extras: Vec<ReportSection> = Vec::new();

    for (heading, body) in headed {
        let body = body.trim().to_string();
        match template_position(&heading) {
            Some(pos) => match &mut template_slots[pos] {
                Some(existing) => {
                    if !body.is_empty() {
                        existing.body.push_str("\n\n");
                        existing.body.push_str(&body);
                    }
                }
                slot => *slot = Some(ReportSection::new(REPORT_TEMPLATE[pos], body)),
            },
            None => extras.push(ReportSection::new(heading, body)),
        }
    }

    let preamble = preamble.trim();
    let lead = (!preamble.is_empty()).then(|| ReportSection::unnamed(preamble));

    let sections: Vec<ReportSection> = lead
        .into_iter()
        .chain(template_slots.into_iter().flatten())
        .chain(extras)
        .filter(|s| !s.body.is_empty())
        .collect();

    if sections.is_empty() {
        return Ok(vec![ReportSection::unnamed(text)]);
    }
    Ok(sections)
}

/// Heading text of a markdown `#` line, without numbering or emphasis.
fn heading_text(line: &str) -> Option<String> {
    let rest = line.trim_start().strip_prefix('#')?;
    let rest = rest.trim_start_matches('#');
    if !rest.starts_with(' ') {
        return None;
    }
    let cleaned = rest
        .trim()
        .trim_matches('*')
        .trim_start_matches(|c: char| c.is_ascii_digit() || c == '.' || c == ')')
        .trim()
        .trim_matches('*')
        .trim();
    (!cleaned.is_empty()).then(|| cleaned.to_string())
}

fn normalize(heading: &str) -> String {
    heading
        .to_lowercase()
        .replace('&', "and")
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn template_position(heading: &str) -> Option<usize> {
    let wanted = normalize(heading);
    if wanted.is_empty() {
        return None;
    }
    REPORT_TEMPLATE
        .iter()
        .position(|t| normalize(t) == wanted)
        .or_else(|| {
            REPORT_TEMPLATE.iter().position(|t| {
                let t = normalize(t);
                t.starts_with(&wanted) || wanted.starts_with(&t)
            })
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_candidates_from_fenced_prose() {
        let text = "Sure!\n```json\n{\"valid\": true}\n```";
        assert_eq!(json_candidates(text).next(), Some("{\"valid\": true}"));
        assert_eq!(json_candidates("no json here").next(), None);
    }

    #[test]
    fn test_parse_validation_skips_bracketed_prose() {
        let verdict = parse_validation(
            "Answer [per rules]: {\"valid\": true, \"canonical_name\": \"Tea\"}",
        )
        .unwrap();
        assert!(verdict.valid);
        assert_eq!(verdict.canonical_name.as_deref(), Some("Tea"));
    }

    #[test]
    fn test_parse_verdicts_skips_braced_prose() {
        let slots = parse_verdicts(
            "Using {index} numbering: [{\"index\": 1, \"relevant\": false}]",
            1,
        )
        .unwrap();
        assert!(!slots[0].as_ref().unwrap().relevant);
    }

    #[test]
    fn test_parse_validation_valid() {
        let verdict =
            parse_validation(r#"{"valid": true, "canonical_name": " Healthcare "}"#).unwrap();
        assert!(verdict.valid);
        assert_eq!(verdict.canonical_name.as_deref(), Some("Healthcare"));
    }

    #[test]
    fn test_parse_validation_invalid_with_suggestions() {
        let verdict = parse_validation(
            r#"{"valid": false, "reason": "Not an industry.", "suggestions": ["Pet care", " ", "Veterinary services"]}"#,
        )
        .unwrap();
        assert!(!verdict.valid);
        assert_eq!(verdict.reason.as_deref(), Some("Not an industry."));
        assert_eq!(verdict.suggestions, vec!["Pet care", "Veterinary services"]);
    }

    #[test]
    fn test_parse_validation_rejects_free_text() {
        assert!(parse_validation("VALID").is_err());
        assert!(parse_validation(r#"{"canonical_name": "Tea"}"#).is_err());
    }

    #[test]
    fn test_parse_verdicts_slots() {
        let text = r#"[
            {"index": 2, "relevant": false, "reason": "biography"},
            {"index": 1, "relevant": true},
            {"index": 2, "relevant": true},
            {"index": 9, "relevant": true}
        ]"#;
        let slots = parse_verdicts(text, 3).unwrap();

        assert_eq!(slots.len(), 3);
        assert!(slots[0].as_ref().unwrap().relevant);
        assert!(!slots[1].as_ref().unwrap().relevant);
        assert!(slots[2].is_none());
    }

    #[test]
    fn test_parse_verdicts_wrapped() {
        let slots = parse_verdicts(r#"{"verdicts": [{"index": 1, "keep": false}]}"#, 1).unwrap();
        assert!(!slots[0].as_ref().unwrap().relevant);
    }

    #[test]
    fn test_parse_verdicts_failure() {
        assert!(parse_verdicts("Health care, Hospital", 2).is_err());
    }

    #[test]
    fn test_parse_figures() {
        assert_eq!(parse_figures("None"), None);
        assert_eq!(parse_figures(" \"None.\" "), None);
        assert_eq!(parse_figures(""), None);
        assert_eq!(
            parse_figures("• US$4 trillion — US health spending"),
            Some("• US$4 trillion — US health spending".to_string())
        );
    }

    #[test]
    fn test_sections_follow_template_order() {
        let text = "Here is the report.\n\n\
            ## 8. Industry Outlook\n\nSteady growth [SOURCE 1].\n\n\
            ## 1. Industry Overview & Market Value\n\nLarge sector [SOURCE 2].\n\n\
            ## **SWOT Analysis**\n\n**Strengths** scale.";
        let sections = parse_sections(text).unwrap();
        let headings: Vec<_> = sections.iter().map(|s| s.heading.as_str()).collect();

        assert_eq!(
            headings,
            vec!["", "Industry Overview & Market Value", "SWOT Analysis", "Industry Outlook"]
        );
        assert_eq!(sections[0].body, "Here is the report.");
        assert_eq!(sections[3].body, "Steady growth [SOURCE 1].");
    }

    #[test]
    fn test_blank_preamble_adds_no_section() {
        let sections = parse_sections("\n\n## Competitive Landscape\nFew players.").unwrap();
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].heading, "Competitive Landscape");
    }

    #[test]
    fn test_sections_extras_after_template() {
        let text = "## Appendix\nExtra.\n## Competitive Landscape\nFew players.";
        let sections = parse_sections(text).unwrap();
        assert_eq!(sections[0].heading, "Competitive Landscape");
        assert_eq!(sections[1].heading, "Appendix");
    }

    #[test]
    fn test_sections_loose_heading_match() {
        let text = "### 6) Risks, Constraints and Regulatory Barriers\nCapital heavy.\n## Outlook\nok";
        let sections = parse_sections(text).unwrap();
        assert_eq!(sections[0].heading, "Risks, Constraints & Regulatory Barriers");
        assert_eq!(sections[1].heading, "Outlook");
    }

    #[test]
    fn test_unstructured_blob_is_single_section() {
        let sections = parse_sections("The tea industry is large.\nIt grows.").unwrap();
        assert_eq!(sections.len(), 1);
        assert!(sections[0].is_unnamed());
        assert_eq!(sections[0].body, "The tea industry is large.\nIt grows.");
    }

    #[test]
    fn test_empty_response_fails() {
        assert!(parse_sections("  \n ").is_err());
    }

    #[test]
    fn test_hashtag_is_not_heading() {
        let sections = parse_sections("#1 in exports.\nMore text.").unwrap();
        assert!(sections[0].is_unnamed());
    }
}

//! LLM prompts for the research pipeline.
//!
//! Every prompt that expects structure asks for JSON so the parsers in
//! `parse` can be strict.

use crate::types::report::REPORT_TEMPLATE;

/// System instruction for input validation.
pub const VALIDATE_SYSTEM: &str = "You are an input validator for a market research tool. \
Answer with a single JSON object and nothing else.";

/// Prompt for deciding whether the input names an industry.
pub const VALIDATE_PROMPT: &str = r#"Determine whether the input refers to a BUSINESS INDUSTRY, SECTOR, or MARKET.

Input: "{input}"

Rules:
- Accept industry names even if informal or simplified.
- Only reject if:
  1. It is a single generic product with no industry context, or
  2. It is not business-related at all (e.g. "my dog", "happiness", "purple").
- Be permissive: if it could reasonably refer to an industry, accept it.

Output JSON:
{
    "valid": true | false,
    "canonical_name": "Standard name of the industry, e.g. \"Healthcare\" (only when valid)",
    "reason": "One sentence explaining the rejection (only when invalid)",
    "suggestions": ["3-5 specific industry alternatives (only when invalid)"]
}"#;

/// System instruction for relevance filtering.
pub const FILTER_SYSTEM: &str = "You are a source quality filter for a business market research tool. \
Answer with a JSON array and nothing else.";

/// Prompt for judging a batch of candidate articles.
pub const FILTER_PROMPT: &str = r#"Industry: "{topic}"

Judge each candidate Wikipedia article below. An article is relevant when it
describes the "{topic}" industry as a whole, or is useful for business or
market analysis of it. Articles about unrelated subjects, single people,
fiction, or disambiguation pages are not relevant.

Candidates:
{candidates}

Output a JSON array with one entry per candidate, using the candidate numbers above:
[
    {"index": 1, "relevant": true, "reason": "brief reason"}
]"#;

/// System instruction for per-source financial figure extraction.
pub const FIGURES_SYSTEM: &str = "You are a financial data extractor.";

/// Prompt for pulling explicit figures out of one source.
pub const FIGURES_PROMPT: &str = r#"Scan the SOURCE CONTENT below and extract ALL explicit financial or market-scale figures.

Include: market size, revenue, valuations, growth rates (CAGR), investment amounts, market spending.

Rules:
- Extract ONLY figures explicitly stated in the content below.
- Do NOT calculate, estimate, or infer.
- Every bullet MUST follow this exact format:
  • [figure] — [what it refers to, in plain English]
  Example: • US$1.3 billion — Sri Lanka tea industry export revenue in 2021
- Do NOT return bare numbers without context.
- If none found, return exactly: None

SOURCE CONTENT:
{content}"#;

/// System instruction for report synthesis.
pub const SYNTHESIZE_SYSTEM: &str = "You are a Market Research Assistant supporting business analysts at a large corporation.";

/// Prompt for writing the report.
pub const SYNTHESIZE_PROMPT: &str = r#"Produce a concise, decision-oriented industry briefing that helps a corporate
analyst understand the structure, economics, risks, and strategic outlook of the {topic} industry.

Rules:
- Use ONLY information contained in the CONTEXT below.
- End every factual statement with at least one citation in the form [SOURCE X].
- Do NOT include assumptions, extrapolations, or forward-looking estimates unless the sources support them.
- Use the FINANCIAL FIGURES only where appropriate and accurate.
- If no numerical market size data is present, state: "No numerical market size data provided in sources."
{sourcing_note}
Formatting:
- Start every section with a level-two markdown heading (## Section Name) using exactly the section names below, in this order.
- Leave a blank line between the heading and the text.
- In the SWOT section use the labels **Strengths**, **Weaknesses**, **Opportunities**, **Threats**.

Sections:
{sections}

Length: at most 500 words.

CONTEXT:
{context}

FINANCIAL FIGURES:
{financials}"#;

/// Format the validation prompt.
pub fn format_validate_prompt(input: &str) -> String {
    fill(VALIDATE_PROMPT, &[("input", input.replace('"', "'").as_str())])
}

/// Format the filter prompt for a numbered list of `(title, snippet)` pairs.
pub fn format_filter_prompt<'a>(
    topic: &str,
    candidates: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> String {
    let listing = candidates
        .into_iter()
        .enumerate()
        .map(|(i, (title, snippet))| {
            if snippet.is_empty() {
                format!("{}. {}", i + 1, title)
            } else {
                format!("{}. {} :: {}", i + 1, title, snippet)
            }
        })
        .collect::<Vec<_>>()
        .join("\n");

    fill(FILTER_PROMPT, &[("topic", topic), ("candidates", listing.as_str())])
}

/// Format the figures prompt.
pub fn format_figures_prompt(content: &str) -> String {
    fill(FIGURES_PROMPT, &[("content", content)])
}

/// Format the synthesis prompt.
pub fn format_synthesize_prompt(
    topic: &str,
    context: &str,
    financials: &str,
    limited_sourcing: bool,
) -> String {
    let sections = REPORT_TEMPLATE
        .iter()
        .enumerate()
        .map(|(i, heading)| format!("{}. {}", i + 1, heading))
        .collect::<Vec<_>>()
        .join("\n");

    let sourcing_note = if limited_sourcing {
        "- No sources passed the relevance check. Say so plainly and keep the briefing short.\n"
    } else {
        ""
    };

    fill(
        SYNTHESIZE_PROMPT,
        &[
            ("topic", topic),
            ("sourcing_note", sourcing_note),
            ("sections", sections.as_str()),
            ("context", context),
            ("financials", financials),
        ],
    )
}

/// Substitute `{key}` placeholders in one pass over the template.
///
/// Substituted values are never rescanned, so article text containing
/// `{topic}` or similar reaches the model unchanged. Braces that do not name
/// a known key (the JSON examples) are copied through.
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open + 1..];
        let hit = values
            .iter()
            .find(|&&(key, _)| tail.starts_with(key) && tail[key.len()..].starts_with('}'));
        match hit {
            Some((key, value)) => {
                out.push_str(value);
                rest = &tail[key.len() + 1..];
            }
            None => {
                out.push('{');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}

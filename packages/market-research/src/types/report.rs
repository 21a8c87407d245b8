//! The final report artifact and its plain-text export.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Write;

/// Section headings requested from the model, in report order.
pub const REPORT_TEMPLATE: [&str; 8] = [
    "Industry Overview & Market Value",
    "Market Structure & Value Chain",
    "Industry Scale & Geographic Footprint",
    "Competitive Landscape",
    "Key Industry Drivers",
    "Risks, Constraints & Regulatory Barriers",
    "SWOT Analysis",
    "Industry Outlook",
];

/// One report section. An empty heading marks an unstructured response
/// kept as a single block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportSection {
    pub heading: String,
    pub body: String,
}

impl ReportSection {
    pub fn new(heading: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            heading: heading.into(),
            body: body.into(),
        }
    }

    pub fn unnamed(body: impl Into<String>) -> Self {
        Self::new("", body)
    }

    pub fn is_unnamed(&self) -> bool {
        self.heading.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Standard,
    /// Produced with zero or few qualifying sources.
    Low,
}

/// Non-fatal conditions recorded while producing a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PipelineWarning {
    /// The relevance filter removed every candidate.
    NoQualifyingSources { candidates: usize },

    /// Sources left out of the synthesis prompt to fit the input limit.
    ContextTruncated { dropped: Vec<String> },
}

impl PipelineWarning {
    /// Whether this warning degrades the report to low confidence.
    pub fn degrades(&self) -> bool {
        matches!(self, Self::NoQualifyingSources { .. })
    }
}

/// A source the report was written from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Citation {
    /// 1-based number used in `[SOURCE n]` markers.
    pub number: usize,
    pub title: String,
    pub url: Option<String>,
    pub financial_figures: Option<String>,
}

/// The terminal artifact of a pipeline run. Immutable once built.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    topic: String,
    sections: Vec<ReportSection>,
    generated_at: DateTime<Utc>,
    citations: Vec<Citation>,
    confidence: Confidence,
    warnings: Vec<PipelineWarning>,
}

impl Report {
    pub(crate) fn new(
        topic: impl Into<String>,
        sections: Vec<ReportSection>,
        citations: Vec<Citation>,
        warnings: Vec<PipelineWarning>,
    ) -> Self {
        let confidence = if warnings.iter().any(PipelineWarning::degrades) {
            Confidence::Low
        } else {
            Confidence::Standard
        };

        Self {
            topic: topic.into(),
            sections,
            generated_at: Utc::now(),
            citations,
            confidence,
            warnings,
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn sections(&self) -> &[ReportSection] {
        &self.sections
    }

    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    pub fn citations(&self) -> &[Citation] {
        &self.citations
    }

    pub fn cited_titles(&self) -> Vec<&str> {
        self.citations.iter().map(|c| c.title.as_str()).collect()
    }

    pub fn confidence(&self) -> Confidence {
        self.confidence
    }

    pub fn is_low_confidence(&self) -> bool {
        self.confidence == Confidence::Low
    }

    pub fn warnings(&self) -> &[PipelineWarning] {
        &self.warnings
    }

    /// Section headings in report order.
    pub fn headings(&self) -> Vec<&str> {
        self.sections.iter().map(|s| s.heading.as_str()).collect()
    }

    /// Download file name: `<topic lowercased, spaces as underscores>_report.txt`.
    pub fn file_name(&self) -> String {
        let stem: String = self
            .topic
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| match c {
                ' ' => '_',
                '/' | '\\' | ':' | '"' | '\'' | '*' | '?' | '<' | '>' | '|' => '-',
                c => c,
            })
            .collect();
        format!("{}_report.txt", stem)
    }

    /// Plain-text export offered for download.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "INDUSTRY REPORT: {}", self.topic.to_uppercase());
        let _ = writeln!(
            out,
            "Generated: {}",
            self.generated_at.format("%Y-%m-%d %H:%M UTC")
        );

        if self.is_low_confidence() {
            out.push('\n');
            out.push_str(
                "NOTE: Low confidence. No sources passed the relevance check, \
                 so this report rests on limited sourcing.\n",
            );
        }

        for section in &self.sections {
            out.push('\n');
            if !section.is_unnamed() {
                let _ = writeln!(out, "## {}\n", section.heading);
            }
            out.push_str(section.body.trim_end());
            out.push('\n');
        }

        if !self.citations.is_empty() {
            out.push_str("\nSOURCES\n");
            for citation in &self.citations {
                let _ = write!(out, "[{}] {}", citation.number, citation.title);
                if let Some(url) = &citation.url {
                    let _ = write!(out, " - {}", url);
                }
                out.push('\n');
                if let Some(figures) = &citation.financial_figures {
                    out.push_str("    Financial figures:\n");
                    for line in figures.lines().filter(|l| !l.trim().is_empty()) {
                        let _ = writeln!(out, "    {}", line.trim());
                    }
                }
            }
        }

        out
    }
}

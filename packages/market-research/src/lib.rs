//! Industry Market Research Pipeline
//!
//! Turns an industry name into a sourced market-research briefing:
//! validate the name with a language model, search an encyclopedia with a
//! handful of diversified queries, keep the relevant articles, and
//! synthesize a sectioned report that cites them.
//!
//! # Usage
//!
//! ```rust,ignore
//! use market_research::Pipeline;
//! use market_research::testing::{MockEncyclopedia, MockLanguageModel};
//!
//! let pipeline = Pipeline::new(MockLanguageModel::new(), MockEncyclopedia::new());
//! match pipeline.run("Healthcare").await {
//!     Ok(report) => println!("{}", report.to_text()),
//!     Err(e) => eprintln!("{}", e), // "<stage> failed: <cause>"
//! }
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Service seams (LanguageModel, Encyclopedia)
//! - [`types`] - Queries, sources, reports, configuration
//! - [`pipeline`] - Stages and the orchestrator
//! - [`ai`] - OpenAI/Groq language model (feature `openai`)
//! - [`encyclopedias`] - Wikipedia (feature `wikipedia`)
//! - [`security`] - Credential handling
//! - [`testing`] - Mock implementations for testing

pub mod ai;
pub mod encyclopedias;
pub mod error;
pub mod pipeline;
pub mod security;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use error::{ErrorKind, PipelineError, Result, ServiceError, ServiceResult, Stage};
pub use pipeline::{Pipeline, PipelineState, RunContext, Transition};
pub use traits::{
    encyclopedia::{Article, Encyclopedia, SearchHit},
    llm::{CompletionRequest, LanguageModel, Task},
};
pub use types::{
    config::ResearchConfig,
    query::{IndustryQuery, QueryPlan, SearchQuery, ValidationResult},
    report::{Citation, Confidence, PipelineWarning, Report, ReportSection, REPORT_TEMPLATE},
    source::{Decision, FilteredSource, SourceCandidate},
};

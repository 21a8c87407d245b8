//! The research pipeline.
//!
//! Stages run strictly in sequence, each consuming the previous stage's
//! output:
//!
//! 1. **Planner** - validate the industry name, derive search queries
//! 2. **Retrieval** - concurrent searches, dedup, bounded-concurrency fetches
//! 3. **Filter** - one model call judging every candidate, fail-open
//! 4. **Synthesis** - bounded context, optional figures, the report
//!
//! [`Pipeline`] drives a request through them and records progress in a
//! [`RunContext`].

pub mod context;
pub mod filter;
pub mod orchestrator;
pub mod parse;
pub mod planner;
pub mod prompts;
pub mod retrieval;
pub mod synthesis;

pub use context::{PipelineState, RunContext, Transition};
pub use filter::{filter, judge};
pub use orchestrator::Pipeline;
pub use parse::{ParseFailure, Parsed};
pub use planner::{diversify, validate_and_plan};
pub use retrieval::{collect_candidates, fetch_texts, merge_results, retrieve};
pub use synthesis::{assemble_context, synthesize, AssembledContext};

//! Data types passed between pipeline stages.

pub mod config;
pub mod query;
pub mod report;
pub mod source;

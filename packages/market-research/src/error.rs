//! Typed errors for the research pipeline.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Pipeline stage a failure is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Validation,
    Retrieval,
    Filtering,
    Synthesis,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Retrieval => "retrieval",
            Self::Filtering => "filtering",
            Self::Synthesis => "synthesis",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure reported by an external service (language model or encyclopedia).
///
/// This is the only error type that crosses the service traits.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ServiceError {
    /// Missing or rejected credential
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The call did not complete in time
    #[error("request timed out: {0}")]
    Timeout(String),

    /// Connection-level failure
    #[error("network error: {0}")]
    Network(String),

    /// Non-success status from the service
    #[error("service returned {status}: {message}")]
    Api { status: u16, message: String },

    /// Response body could not be decoded
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Error category, as shown to users and mapped to HTTP statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Input,
    Upstream,
    NoData,
    Cancelled,
}

/// Terminal failure of one report-generation request.
///
/// Every variant carries the stage it happened in. Nothing here is fatal
/// to the host process.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Empty input or a name the model did not accept as an industry
    #[error("{stage} failed: {reason}")]
    Input {
        stage: Stage,
        reason: String,
        suggestions: Vec<String>,
    },

    /// An external service call failed outright
    #[error("{stage} failed: {source}")]
    Upstream {
        stage: Stage,
        #[source]
        source: ServiceError,
    },

    /// Nothing usable came back from the encyclopedia
    #[error("{stage} failed: {cause}")]
    NoData { stage: Stage, cause: String },

    /// The caller stopped waiting
    #[error("{stage} failed: cancelled")]
    Cancelled { stage: Stage },
}

impl PipelineError {
    /// Input error without suggestions.
    pub fn input(stage: Stage, reason: impl Into<String>) -> Self {
        Self::Input {
            stage,
            reason: reason.into(),
            suggestions: Vec::new(),
        }
    }

    pub fn upstream(stage: Stage, source: ServiceError) -> Self {
        Self::Upstream { stage, source }
    }

    pub fn no_data(stage: Stage, cause: impl Into<String>) -> Self {
        Self::NoData {
            stage,
            cause: cause.into(),
        }
    }

    pub fn stage(&self) -> Stage {
        match self {
            Self::Input { stage, .. }
            | Self::Upstream { stage, .. }
            | Self::NoData { stage, .. }
            | Self::Cancelled { stage } => *stage,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Input { .. } => ErrorKind::Input,
            Self::Upstream { .. } => ErrorKind::Upstream,
            Self::NoData { .. } => ErrorKind::NoData,
            Self::Cancelled { .. } => ErrorKind::Cancelled,
        }
    }

    /// Human-readable cause, without the stage prefix.
    pub fn cause(&self) -> String {
        match self {
            Self::Input { reason, .. } => reason.clone(),
            Self::Upstream { source, .. } => source.to_string(),
            Self::NoData { cause, .. } => cause.clone(),
            Self::Cancelled { .. } => "cancelled".to_string(),
        }
    }

    /// Alternative industries offered by the validator, if any.
    pub fn suggestions(&self) -> &[String] {
        match self {
            Self::Input { suggestions, .. } => suggestions,
            _ => &[],
        }
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Result type alias for external service calls.
pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_stage() {
        let err = PipelineError::no_data(Stage::Retrieval, "no sources found");
        assert_eq!(err.to_string(), "retrieval failed: no sources found");
        assert_eq!(err.cause(), "no sources found");
        assert_eq!(err.kind(), ErrorKind::NoData);
    }

    #[test]
    fn test_upstream_keeps_source() {
        let err = PipelineError::upstream(
            Stage::Synthesis,
            ServiceError::Timeout("after 60s".into()),
        );
        assert_eq!(err.stage(), Stage::Synthesis);
        assert_eq!(err.to_string(), "synthesis failed: request timed out: after 60s");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_suggestions_only_on_input() {
        let err = PipelineError::Input {
            stage: Stage::Validation,
            reason: "too vague".into(),
            suggestions: vec!["Tea industry".into()],
        };
        assert_eq!(err.suggestions(), ["Tea industry".to_string()]);

        let err = PipelineError::Cancelled {
            stage: Stage::Filtering,
        };
        assert!(err.suggestions().is_empty());
        assert_eq!(err.to_string(), "filtering failed: cancelled");
    }
}

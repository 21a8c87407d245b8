//! Language model trait.
//!
//! The pipeline only ever needs stateless text completion: a system
//! instruction plus one user prompt in, completion text out. Prompting and
//! response parsing stay in `pipeline`.

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::ServiceResult;

/// Which pipeline step a completion serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Task {
    /// Is this an industry, and what is its canonical name?
    Validate,
    /// Which candidate sources are relevant?
    Filter,
    /// Pull explicit financial figures out of one source.
    ExtractFigures,
    /// Write the report.
    Synthesize,
}

/// One request/response completion.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub task: Task,
    pub system: String,
    pub user: String,
}

impl CompletionRequest {
    pub fn new(task: Task, system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            task,
            system: system.into(),
            user: user.into(),
        }
    }
}

/// Stateless text-completion endpoint.
///
/// Implementations attempt each call once; the pipeline decides what a
/// failure means for the request.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> ServiceResult<String>;
}

#[async_trait]
impl<T: LanguageModel + ?Sized> LanguageModel for Arc<T> {
    async fn complete(&self, request: CompletionRequest) -> ServiceResult<String> {
        (**self).complete(request).await
    }
}

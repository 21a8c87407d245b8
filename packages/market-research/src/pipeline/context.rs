//! Request-scoped run state: the state machine trace and cancellation.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::future::Future;
use tokio_util::sync::CancellationToken;
use tracing::info;
use uuid::Uuid;

use crate::error::{PipelineError, Result, Stage};

/// Where a run is in the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PipelineState {
    Idle,
    Validating,
    Searching,
    Retrieving,
    Filtering,
    Synthesizing,
    Done,
    Failed { stage: Stage, cause: String },
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed { .. })
    }

    /// Stage errors raised while in this state are attributed to.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Validating => Some(Stage::Validation),
            Self::Searching | Self::Retrieving => Some(Stage::Retrieval),
            Self::Filtering => Some(Stage::Filtering),
            Self::Synthesizing => Some(Stage::Synthesis),
            Self::Failed { stage, .. } => Some(*stage),
            Self::Idle | Self::Done => None,
        }
    }
}

/// One entry in the run history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transition {
    #[serde(flatten)]
    pub state: PipelineState,
    pub at: DateTime<Utc>,
}

/// Owned by exactly one pipeline run. Nothing in it is shared across
/// requests.
#[derive(Debug, Clone)]
pub struct RunContext {
    id: Uuid,
    started_at: DateTime<Utc>,
    history: Vec<Transition>,
    cancel: CancellationToken,
}

impl RunContext {
    pub fn new() -> Self {
        Self::with_cancel(CancellationToken::new())
    }

    /// Context whose run stops when `cancel` fires.
    pub fn with_cancel(cancel: CancellationToken) -> Self {
        let started_at = Utc::now();
        Self {
            id: Uuid::new_v4(),
            started_at,
            history: vec![Transition {
                state: PipelineState::Idle,
                at: started_at,
            }],
            cancel,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn history(&self) -> &[Transition] {
        &self.history
    }

    pub fn current(&self) -> &PipelineState {
        // history always starts with Idle
        &self.history[self.history.len() - 1].state
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Record a state transition. Ignored once the run is terminal.
    pub fn enter(&mut self, state: PipelineState) {
        if self.current().is_terminal() {
            return;
        }
        info!(run_id = %self.id, state = ?state, "Pipeline state");
        self.history.push(Transition {
            state,
            at: Utc::now(),
        });
    }

    /// Await `work` unless the run is cancelled first. A result that
    /// arrives after cancellation is discarded.
    pub async fn guard<T, F>(&self, stage: Stage, work: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(PipelineError::Cancelled { stage }),
            result = work => {
                if self.cancel.is_cancelled() {
                    return Err(PipelineError::Cancelled { stage });
                }
                result
            }
        }
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}

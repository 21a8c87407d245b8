//! Mapping pipeline failures to HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use market_research::{ErrorKind, PipelineError, Stage};
use serde::Serialize;

/// A failed report request, rendered as JSON.
#[derive(Debug)]
pub struct ApiError(pub PipelineError);

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub stage: Stage,
    pub kind: ErrorKind,
    /// `"<stage> failed: <cause>"`
    pub message: String,
    pub suggestions: Vec<String>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0.kind() {
            ErrorKind::Input => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::NoData => StatusCode::NOT_FOUND,
            ErrorKind::Upstream => StatusCode::BAD_GATEWAY,
            ErrorKind::Cancelled => StatusCode::REQUEST_TIMEOUT,
        }
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            stage: self.0.stage(),
            kind: self.0.kind(),
            message: self.0.to_string(),
            suggestions: self.0.suggestions().to_vec(),
        }
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}

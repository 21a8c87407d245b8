//! Report generation endpoints.
//!
//! A request runs the whole pipeline inside the handler. If the client goes
//! away, axum drops the handler future and the run is abandoned with it.

use axum::{
    extract::Extension,
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use market_research::{
    Citation, Confidence, PipelineWarning, Report, ReportSection, RunContext, Transition,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::server::app::AppState;
use crate::server::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct ReportRequest {
    pub industry: String,
}

#[derive(Debug, Serialize)]
pub struct ReportResponse {
    pub run_id: Uuid,
    pub topic: String,
    pub confidence: Confidence,
    pub sections: Vec<ReportSection>,
    pub sources: Vec<Citation>,
    pub warnings: Vec<PipelineWarning>,
    pub generated_at: DateTime<Utc>,
    pub trace: Vec<Transition>,
    pub file_name: String,
    /// Plain-text export, same as the download
    pub text: String,
}

impl ReportResponse {
    fn new(ctx: &RunContext, report: &Report) -> Self {
        Self {
            run_id: ctx.id(),
            topic: report.topic().to_string(),
            confidence: report.confidence(),
            sections: report.sections().to_vec(),
            sources: report.citations().to_vec(),
            warnings: report.warnings().to_vec(),
            generated_at: report.generated_at(),
            trace: ctx.history().to_vec(),
            file_name: report.file_name(),
            text: report.to_text(),
        }
    }
}

async fn generate(state: &AppState, industry: &str) -> Result<(RunContext, Report), ApiError> {
    let mut ctx = RunContext::new();
    tracing::info!(run_id = %ctx.id(), industry, "Report requested");

    let report = state.pipeline.run_with_context(&mut ctx, industry).await?;
    Ok((ctx, report))
}

/// Generate a report and return it as JSON, with the run's state trace.
pub async fn create_report_handler(
    Extension(state): Extension<AppState>,
    Json(request): Json<ReportRequest>,
) -> Result<Json<ReportResponse>, ApiError> {
    let (ctx, report) = generate(&state, &request.industry).await?;
    Ok(Json(ReportResponse::new(&ctx, &report)))
}

/// Generate a report and return the plain-text export as an attachment.
pub async fn download_report_handler(
    Extension(state): Extension<AppState>,
    Json(request): Json<ReportRequest>,
) -> Result<Response, ApiError> {
    let (_, report) = generate(&state, &request.industry).await?;

    let disposition = format!("attachment; filename=\"{}\"", report.file_name());
    Ok((
        [
            (CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (CONTENT_DISPOSITION, disposition),
        ],
        report.to_text(),
    )
        .into_response())
}

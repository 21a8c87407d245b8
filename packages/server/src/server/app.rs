//! Application setup and server configuration.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::{header::CONTENT_TYPE, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use market_research::ai::OpenAILanguageModel;
use market_research::encyclopedias::WikipediaEncyclopedia;
use market_research::{Encyclopedia, LanguageModel, Pipeline};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::server::routes::{
    create_report_handler, download_report_handler, health_handler, index_handler,
};

/// Pipeline over type-erased services, so handlers and tests share one type.
pub type SharedPipeline = Pipeline<Arc<dyn LanguageModel>, Arc<dyn Encyclopedia>>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<SharedPipeline>,
    /// Provider name shown by the health check
    pub provider: String,
    pub model: String,
}

impl AppState {
    pub fn new(pipeline: SharedPipeline, provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            provider: provider.into(),
            model: model.into(),
        }
    }

    /// Wire the configured language model and Wikipedia into a pipeline.
    pub fn from_config(config: &Config) -> Self {
        let llm: Arc<dyn LanguageModel> = Arc::new(
            OpenAILanguageModel::new(config.provider, &config.credentials())
                .with_timeout(config.llm_timeout),
        );
        let encyclopedia: Arc<dyn Encyclopedia> =
            Arc::new(WikipediaEncyclopedia::new(config.wikipedia_lang.clone()));

        let pipeline = Pipeline::new(llm, encyclopedia).with_config(config.research.clone());
        Self::new(pipeline, config.provider.as_str(), config.model.clone())
    }
}

/// Build the Axum application router
pub fn build_app(state: AppState, allowed_origins: &[String]) -> Router {
    // No configured origins means any origin (development)
    let origins = if allowed_origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(
            allowed_origins
                .iter()
                .filter_map(|o| HeaderValue::from_str(o).ok()),
        )
    };
    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE]);

    Router::new()
        .route("/", get(index_handler))
        .route("/api/reports", post(create_report_handler))
        .route("/api/reports/download", post(download_report_handler))
        .route("/health", get(health_handler))
        .layer(Extension(state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

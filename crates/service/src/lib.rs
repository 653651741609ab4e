use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::task;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use sentiflow_core::{
    AnalyzerConfig, Classifier, ErrorBody, SentimentLabel, TextRequest, TextResponse,
};

pub mod config;
mod ws;

pub use config::{load_config, ServiceConfig, DEFAULT_CONFIG_PATH};

pub const CLASSIFIER_UNAVAILABLE: &str = "sentiment classifier is not available";

/// Shared by every handler. `classifier` is `None` when the model failed to
/// load; the service still starts and reports the condition per request.
pub struct AppState {
    classifier: Option<Arc<dyn Classifier>>,
    analyzer: AnalyzerConfig,
}

impl AppState {
    pub fn new(classifier: Option<Arc<dyn Classifier>>, analyzer: AnalyzerConfig) -> Self {
        Self {
            classifier,
            analyzer,
        }
    }

    pub fn has_classifier(&self) -> bool {
        self.classifier.is_some()
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/ws/analyze/", get(ws::analyze_socket))
        .route("/analyze-text/", post(analyze_text))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> anyhow::Result<()> {
    let addr = listener.local_addr()?;
    info!("listening" = %addr, classifier = state.has_classifier());
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn root() -> Json<Value> {
    Json(json!({ "message": "Sentiment analysis service is running" }))
}

async fn analyze_text(
    State(state): State<Arc<AppState>>,
    Json(body): Json<TextRequest>,
) -> Result<Json<TextResponse>, AppError> {
    if body.text.trim().is_empty() {
        return Err(AppError::bad_request("'text' must not be empty"));
    }
    let classifier = state
        .classifier
        .clone()
        .ok_or_else(|| AppError::Unavailable(CLASSIFIER_UNAVAILABLE.to_string()))?;
    let text = body.text;
    let batch = vec![text.clone()];
    let labels = task::spawn_blocking(move || classifier.classify(&batch))
        .await
        .map_err(AppError::internal)?
        .map_err(AppError::internal)?;
    let sentiment = labels
        .into_iter()
        .next()
        .unwrap_or(SentimentLabel::Unknown);
    Ok(Json(TextResponse { text, sentiment }))
}

#[derive(Debug, Error)]
enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unavailable(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    fn bad_request<E: ToString>(msg: E) -> Self {
        Self::BadRequest(msg.to_string())
    }

    fn internal<E: Into<anyhow::Error>>(err: E) -> Self {
        Self::Internal(err.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            AppError::Internal(err) => {
                error!("internal_error" = %err);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
            }
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

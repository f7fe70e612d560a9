// Axum API Server Module
//
// Purpose: HTTP boundary around the decision engine
// - /invocations: model endpoint contract (content negotiation, bare result)
// - /api/predict: gateway contract (identity, GPS policy, history record)

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::config::ServerConfig;
use crate::engine::DecisionEngine;
use crate::error::PredictError;
use crate::history::{
    record_best_effort, MemoryPredictionLog, PredictionLog, PredictionRecord, SqlitePredictionLog,
    ANONYMOUS_USER,
};
use crate::model::ModelArtifacts;
use crate::reading::{PredictionResult, Reading};
use crate::request::{check_accept, check_content_type, GpsPolicy, PredictionRequest};
use crate::zones::ZONES;

/// Header carrying the caller's identity (set by the auth proxy)
pub const USER_EMAIL_HEADER: &str = "x-user-email";

// ============================================================================
// Application State
// ============================================================================

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<DecisionEngine>,
    pub history: Arc<dyn PredictionLog>,
    pub gps_policy: GpsPolicy,
}

impl AppState {
    /// Load model artifacts eagerly and open the history store
    pub fn new(config: &ServerConfig) -> anyhow::Result<Self> {
        tracing::info!("Loading decision engine...");
        let artifacts = ModelArtifacts::load(&config.model_dir)?;
        let engine = Arc::new(DecisionEngine::from_artifacts(artifacts));

        let history: Arc<dyn PredictionLog> = match &config.history_path {
            Some(path) => Arc::new(SqlitePredictionLog::open(path)?),
            None => {
                tracing::info!(
                    "HISTORY_PATH not set - keeping the last {} prediction records in memory",
                    config.history_capacity
                );
                Arc::new(MemoryPredictionLog::with_capacity(config.history_capacity))
            }
        };

        Ok(Self::with_engine(engine, history, config.gps_policy))
    }

    pub fn with_engine(
        engine: Arc<DecisionEngine>,
        history: Arc<dyn PredictionLog>,
        gps_policy: GpsPolicy,
    ) -> Self {
        Self { engine, history, gps_policy }
    }
}

// ============================================================================
// Router
// ============================================================================

pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))

        // Model endpoint
        .route("/invocations", post(invocations))

        // Gateway endpoints
        .route("/api/zones", get(list_zones))
        .route("/api/predict", post(predict))
        .route("/api/predict/batch", post(predict_batch))

        // Middleware (applied in reverse order)
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============================================================================
// Endpoint Handlers
// ============================================================================

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn list_zones() -> impl IntoResponse {
    Json(serde_json::json!({
        "zones": ZONES,
    }))
}

/// Model endpoint: JSON in, JSON out, no gateway policy
async fn invocations(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<PredictionResult>, AppError> {
    check_content_type(header_str(&headers, header::CONTENT_TYPE))?;
    check_accept(header_str(&headers, header::ACCEPT))?;

    let reading = PredictionRequest::from_json(&body)?.into_reading()?;
    let (result, _) = decide(&state, reading).await?;

    Ok(Json(result))
}

/// Gateway endpoint: applies the GPS policy and records the prediction
async fn predict(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<PredictionResult>, AppError> {
    check_content_type(header_str(&headers, header::CONTENT_TYPE))?;

    let user = header_str(&headers, USER_EMAIL_HEADER)
        .filter(|u| !u.trim().is_empty())
        .unwrap_or(ANONYMOUS_USER)
        .to_string();

    let reading = PredictionRequest::from_json(&body)?.into_reading()?;
    state.gps_policy.apply(&reading)?;

    let (result, reading) = decide(&state, reading).await?;

    tracing::info!(
        "Prediction for {}: {} -> {} ({})",
        user,
        result.predicted_zone,
        result.gps_zone,
        result.fish_recommendations.join(", ")
    );

    let record = PredictionRecord::new(&user, &reading, &result);
    record_all(&state, vec![record]).await;

    Ok(Json(result))
}

#[derive(Deserialize, Debug)]
struct BatchPredictionRequest {
    readings: Vec<PredictionRequest>,
}

/// Batch gateway endpoint: one result or `{error}` per reading, input order
async fn predict_batch(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, AppError> {
    use rayon::prelude::*;

    check_content_type(header_str(&headers, header::CONTENT_TYPE))?;

    let user = header_str(&headers, USER_EMAIL_HEADER)
        .filter(|u| !u.trim().is_empty())
        .unwrap_or(ANONYMOUS_USER)
        .to_string();

    let batch: BatchPredictionRequest = serde_json::from_slice(&body)
        .map_err(|e| PredictError::Validation(format!("error parsing input: {}", e)))?;

    if batch.readings.is_empty() {
        return Ok(Json(serde_json::json!({ "results": [] })));
    }

    let start = std::time::Instant::now();
    let count = batch.readings.len();
    tracing::info!("Batch prediction for {} readings", count);

    let engine = state.engine.clone();
    let gps_policy = state.gps_policy;

    // CPU-bound work: run Rayon on the blocking thread pool
    let outcomes: Vec<(Option<Reading>, Result<PredictionResult, PredictError>)> =
        tokio::task::spawn_blocking(move || {
            batch
                .readings
                .into_par_iter()
                .map(|req| {
                    let reading = match req.into_reading() {
                        Ok(r) => r,
                        Err(e) => return (None, Err(e)),
                    };
                    let outcome = gps_policy
                        .apply(&reading)
                        .and_then(|_| engine.decide(&reading));
                    (Some(reading), outcome)
                })
                .collect()
        })
        .await
        .map_err(|e| AppError::Internal(format!("Task join error: {}", e)))?;

    let mut records = Vec::with_capacity(count);
    let results: Vec<serde_json::Value> = outcomes
        .into_iter()
        .map(|(reading, outcome)| match (reading, outcome) {
            (Some(reading), Ok(result)) => {
                records.push(PredictionRecord::new(&user, &reading, &result));
                serde_json::to_value(&result)
                    .unwrap_or_else(|e| serde_json::json!({ "error": e.to_string() }))
            }
            (_, Err(e)) => serde_json::json!({ "error": e.to_string() }),
            (None, Ok(_)) => serde_json::json!({ "error": "missing reading" }),
        })
        .collect();

    tracing::info!("Batch of {} decided in {:?}", count, start.elapsed());
    record_all(&state, records).await;

    Ok(Json(serde_json::json!({ "results": results })))
}

// ============================================================================
// Helpers
// ============================================================================

fn header_str<K: header::AsHeaderName>(headers: &HeaderMap, key: K) -> Option<&str> {
    headers.get(key).and_then(|v| v.to_str().ok())
}

/// Run one decision on the blocking pool, handing the reading back
async fn decide(state: &AppState, reading: Reading) -> Result<(PredictionResult, Reading), AppError> {
    let engine = state.engine.clone();

    let result = tokio::task::spawn_blocking(move || engine.decide(&reading).map(|r| (r, reading)))
        .await
        .map_err(|e| AppError::Internal(format!("Task join error: {}", e)))??;

    Ok(result)
}

/// Persist records on the blocking pool; failures are logged, never returned
async fn record_all(state: &AppState, records: Vec<PredictionRecord>) {
    if records.is_empty() {
        return;
    }

    let history = state.history.clone();
    let written = tokio::task::spawn_blocking(move || {
        for record in &records {
            record_best_effort(history.as_ref(), record);
        }
    })
    .await;

    if let Err(e) = written {
        tracing::warn!("History write task failed: {}", e);
    }
}

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Debug)]
pub enum AppError {
    Predict(PredictError),
    Internal(String),
}

impl From<PredictError> for AppError {
    fn from(err: PredictError) -> Self {
        AppError::Predict(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::Predict(err) => {
                let status = match &err {
                    PredictError::Validation(_) => StatusCode::BAD_REQUEST,
                    PredictError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
                    PredictError::NotAcceptable(_) => StatusCode::NOT_ACCEPTABLE,
                    PredictError::Encoding { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                    PredictError::UnknownZone(_) | PredictError::Compute(_) => {
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                };
                tracing::warn!(kind = err.kind(), "Request failed: {}", err);
                (status, err.to_string())
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

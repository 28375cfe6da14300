// =============================================================================
// REST API Endpoints — Axum 0.7
// =============================================================================
//
// All endpoints live under `/api/v1/`. The prediction engine is synchronous
// and cheap; handlers await market data first and then call it inline.
//
// CORS is configured permissively; the service is meant to sit behind the
// web front-end.
// =============================================================================

use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::error::{AppError, Result};
use crate::history::{PredictionRecord, RefreshProgress};
use crate::indicators::IndicatorSnapshot;
use crate::market_data::rate_limit::RateLimitSnapshot;
use crate::predictor::resolve;
use crate::signals::ScoringResult;
use crate::ticker::{self, DEFAULT_SEARCH_LIMIT};
use crate::types::{Direction, PricePoint, Quote};

// =============================================================================
// Router construction
// =============================================================================

/// Build the full REST API router with CORS middleware and shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/health", get(health))
        // ── Tickers ─────────────────────────────────────────────────
        .route("/api/v1/tickers/popular", get(popular_tickers))
        .route("/api/v1/tickers/search", get(search_tickers))
        // ── Market data & prediction ────────────────────────────────
        .route("/api/v1/quote/:ticker", get(quote))
        .route("/api/v1/predict/:ticker", post(predict))
        // ── History ─────────────────────────────────────────────────
        .route("/api/v1/history", get(list_history).delete(clear_history))
        .route(
            "/api/v1/history/refresh",
            get(refresh_status).post(start_refresh),
        )
        .route(
            "/api/v1/history/:id",
            get(history_entry).delete(delete_history_entry),
        )
        // ── Middleware & State ──────────────────────────────────────
        .layer(cors)
        .with_state(state)
}

/// Normalise and validate a ticker from the path.
fn checked_ticker(raw: &str) -> Result<String> {
    if ticker::is_valid_ticker(raw) {
        Ok(ticker::normalize(raw))
    } else {
        Err(AppError::BadRequest(format!(
            "invalid ticker {raw:?}: expected 1-5 letters with an optional .XXX class suffix"
        )))
    }
}

// =============================================================================
// Health
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    predictions_served: u64,
    fallback_predictions: u64,
    history_len: usize,
    rate_limit: RateLimitSnapshot,
    server_time: i64,
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: state.uptime_secs(),
        predictions_served: state.predictions_served.load(Ordering::Relaxed),
        fallback_predictions: state.fallback_predictions.load(Ordering::Relaxed),
        history_len: state.history.len(),
        rate_limit: state.market.limiter().snapshot(),
        server_time: chrono::Utc::now().timestamp_millis(),
    })
}

// =============================================================================
// Tickers
// =============================================================================

async fn popular_tickers() -> impl IntoResponse {
    Json(ticker::popular_tickers())
}

#[derive(Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: String,
    limit: Option<usize>,
}

async fn search_tickers(Query(params): Query<SearchParams>) -> impl IntoResponse {
    let limit = params.limit.unwrap_or(DEFAULT_SEARCH_LIMIT).min(50);
    Json(ticker::search(&params.q, limit))
}

// =============================================================================
// Quote
// =============================================================================

#[derive(Serialize)]
struct QuoteResponse {
    ticker: String,
    #[serde(flatten)]
    quote: Quote,
}

async fn quote(
    State(state): State<Arc<AppState>>,
    Path(raw): Path<String>,
) -> Result<Json<QuoteResponse>> {
    let ticker = checked_ticker(&raw)?;
    let quote = state.market.quote(&ticker).await?;
    Ok(Json(QuoteResponse { ticker, quote }))
}

// =============================================================================
// Predict
// =============================================================================

#[derive(Serialize)]
struct PredictResponse {
    id: Uuid,
    ticker: String,
    direction: Direction,
    confidence: u8,
    current_price: f64,
    change: f64,
    change_percent: f64,
    /// `true` when history was too short and the call is a coin flip.
    fallback: bool,
    /// Daily closes used for the call, oldest first.
    history: Vec<PricePoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    indicators: Option<IndicatorSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    scoring: Option<ScoringResult>,
}

async fn predict(
    State(state): State<Arc<AppState>>,
    Path(raw): Path<String>,
) -> Result<Json<PredictResponse>> {
    let ticker = checked_ticker(&raw)?;
    let snapshot = state.market.snapshot(&ticker).await?;

    let report = resolve(&snapshot.history, &mut rand::thread_rng())?;
    state.count_prediction(report.fallback);

    let record = PredictionRecord::new(&ticker, report.prediction, &snapshot.quote);
    let id = record.id;
    state.history.record(record);

    info!(
        ticker = %ticker,
        direction = %report.prediction.direction,
        confidence = report.prediction.confidence,
        fallback = report.fallback,
        closes = snapshot.history.len(),
        "prediction served"
    );

    Ok(Json(PredictResponse {
        id,
        ticker,
        direction: report.prediction.direction,
        confidence: report.prediction.confidence,
        current_price: snapshot.quote.price,
        change: snapshot.quote.change,
        change_percent: snapshot.quote.change_percent,
        fallback: report.fallback,
        history: snapshot.history,
        indicators: report.indicators,
        scoring: report.scoring,
    }))
}

// =============================================================================
// History
// =============================================================================

/// A history record plus whether the price has since moved the called way.
#[derive(Serialize)]
struct HistoryEntry {
    #[serde(flatten)]
    record: PredictionRecord,
    correct: Option<bool>,
}

impl From<PredictionRecord> for HistoryEntry {
    fn from(record: PredictionRecord) -> Self {
        Self {
            correct: record.is_correct(),
            record,
        }
    }
}

async fn list_history(State(state): State<Arc<AppState>>) -> Json<Vec<HistoryEntry>> {
    Json(state.history.list().into_iter().map(HistoryEntry::from).collect())
}

async fn history_entry(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<HistoryEntry>> {
    state
        .history
        .get(id)
        .map(|r| Json(r.into()))
        .ok_or_else(|| AppError::NotFound(format!("history entry {id}")))
}

async fn clear_history(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let removed = state.history.clear();
    info!(removed, "history cleared");
    Json(serde_json::json!({ "removed": removed }))
}

async fn delete_history_entry(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    if state.history.remove(id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("history entry {id}")))
    }
}

/// Start a background price refresh unless one is already running, and
/// report its progress. Poll `GET /api/v1/history/refresh` for completion.
async fn start_refresh(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<RefreshProgress>) {
    if state.history.begin_refresh() {
        let worker = state.clone();
        tokio::spawn(async move {
            let market = worker.market.clone();
            worker
                .history
                .refresh_prices(
                    worker.config.refresh_batch_size,
                    worker.config.refresh_pause(),
                    worker.market.limiter(),
                    move |ticker| {
                        let market = market.clone();
                        async move { market.quote(&ticker).await }
                    },
                )
                .await;
        });
        info!("history refresh started");
    }
    (StatusCode::ACCEPTED, Json(state.history.refresh_progress()))
}

async fn refresh_status(State(state): State<Arc<AppState>>) -> Json<RefreshProgress> {
    Json(state.history.refresh_progress())
}

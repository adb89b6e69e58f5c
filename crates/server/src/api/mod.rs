pub mod price;
pub mod stats;
pub mod wallets;

use axum::{http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use common::pricefeed::PriceSource;
use common::schedule::ScheduleSource;
use common::types::ApiError;

use crate::price_cache::PriceCache;
use crate::store::WatchlistStore;

/// Shared application state available to all handlers. Generic over the two
/// upstream collaborators so tests run against fakes.
pub struct AppState<S, P> {
    pub store: WatchlistStore,
    pub schedule: S,
    pub price: PriceCache<P>,
    pub started_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Serialize)]
pub(crate) struct ErrorBody {
    pub error: String,
}

pub(crate) fn error_response(err: &ApiError) -> (StatusCode, Json<ErrorBody>) {
    let status = match err {
        ApiError::NotFound(_) => StatusCode::NOT_FOUND,
        ApiError::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
        ApiError::Validation(_) => StatusCode::BAD_REQUEST,
        ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorBody {
            error: err.to_string(),
        }),
    )
}

pub fn router<S, P>(state: Arc<AppState<S, P>>, static_dir: &str) -> Router
where
    S: ScheduleSource + Send + Sync + 'static,
    P: PriceSource + Send + Sync + 'static,
{
    Router::new()
        .route("/api/health", get(health::<S, P>))
        .route(
            "/api/wallets",
            get(wallets::list_wallets::<S, P>)
                .post(wallets::add_wallet::<S, P>)
                .put(wallets::rename_wallet::<S, P>)
                .delete(wallets::remove_wallet::<S, P>),
        )
        .route("/api/lookup", get(wallets::lookup::<S, P>))
        .route("/api/price", get(price::get_price::<S, P>))
        .route("/api/stats", get(stats::get_stats::<S, P>))
        .route("/api/chart", get(stats::get_chart::<S, P>))
        .fallback_service(ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    uptime_secs: i64,
}

async fn health<S, P>(
    axum::extract::State(state): axum::extract::State<Arc<AppState<S, P>>>,
) -> impl IntoResponse
where
    S: ScheduleSource + Send + Sync + 'static,
    P: PriceSource + Send + Sync + 'static,
{
    let uptime = chrono::Utc::now()
        .signed_duration_since(state.started_at)
        .num_seconds();

    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: uptime,
    })
}

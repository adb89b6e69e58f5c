use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use std::sync::Arc;
use tracing::error;

use common::pricefeed::PriceSource;
use common::schedule::ScheduleSource;
use common::types::{ApiError, PriceSnapshot};

use super::{error_response, AppState, ErrorBody};

/// Cached spot price. A cold cache plus a failed refresh is the only path to
/// an error; once a fetch has succeeded the cache serves stale instead.
pub async fn get_price<S, P>(
    State(state): State<Arc<AppState<S, P>>>,
) -> Result<Json<PriceSnapshot>, (StatusCode, Json<ErrorBody>)>
where
    S: ScheduleSource + Send + Sync + 'static,
    P: PriceSource + Send + Sync + 'static,
{
    match state.price.get().await {
        Ok(snapshot) => Ok(Json(snapshot)),
        Err(err) => {
            error!(error = %err, "price fetch failed with no cached snapshot");
            Err(error_response(&ApiError::UpstreamUnavailable(
                "failed to fetch price".to_string(),
            )))
        }
    }
}

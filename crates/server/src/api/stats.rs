//! Aggregate views over the watchlist: portfolio stats and the unlock chart.
//! Both walk the stored wallets and fetch each schedule; wallets whose fetch
//! fails are counted but contribute no amounts.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

use common::chart::{self, ChartSeries, ChartState};
use common::pricefeed::PriceSource;
use common::schedule::ScheduleSource;
use common::stats::{aggregate_global, compute_wallet_stats};
use common::types::{ApiError, GlobalStats, ThawEvent, WalletStats};

use super::{error_response, AppState, ErrorBody};

#[derive(Serialize)]
pub struct WalletStatsEntry {
    pub address: String,
    pub name: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<WalletStats>,
}

#[derive(Serialize)]
pub struct StatsResponse {
    pub global: GlobalStats,
    pub wallets: Vec<WalletStatsEntry>,
}

#[derive(Deserialize)]
pub struct ChartParams {
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub month: Option<String>,
}

pub async fn get_stats<S, P>(State(state): State<Arc<AppState<S, P>>>) -> Json<StatsResponse>
where
    S: ScheduleSource + Send + Sync + 'static,
    P: PriceSource + Send + Sync + 'static,
{
    let as_of = chrono::Utc::now();
    let mut per_wallet = Vec::new();
    let mut wallets = Vec::new();

    for entry in state.store.list() {
        match state.schedule.fetch_schedule(&entry.address).await {
            Ok(schedule) => {
                let stats = compute_wallet_stats(&schedule.thaws, as_of);
                per_wallet.push(Some(stats.clone()));
                wallets.push(WalletStatsEntry {
                    address: entry.address,
                    name: entry.name,
                    status: "success",
                    stats: Some(stats),
                });
            }
            Err(err) => {
                warn!(address = %entry.address, error = %err, "schedule fetch failed");
                per_wallet.push(None);
                wallets.push(WalletStatsEntry {
                    address: entry.address,
                    name: entry.name,
                    status: "error",
                    stats: None,
                });
            }
        }
    }

    Json(StatsResponse {
        global: aggregate_global(&per_wallet),
        wallets,
    })
}

/// Unlock chart over the union of every successfully fetched schedule.
/// `mode=monthly` (default) buckets by month; `mode=daily&month=YYYY-MM` is
/// the drill-down view for one month.
pub async fn get_chart<S, P>(
    State(state): State<Arc<AppState<S, P>>>,
    Query(params): Query<ChartParams>,
) -> Result<Json<ChartSeries>, (StatusCode, Json<ErrorBody>)>
where
    S: ScheduleSource + Send + Sync + 'static,
    P: PriceSource + Send + Sync + 'static,
{
    let nav = match params.mode.as_deref().unwrap_or("monthly") {
        "monthly" => ChartState::monthly(),
        "daily" => {
            let Some(month) = params.month.as_deref().filter(|m| chart::is_month_key(m)) else {
                return Err(error_response(&ApiError::Validation(
                    "daily mode requires month=YYYY-MM".to_string(),
                )));
            };
            ChartState::daily(month)
        }
        other => {
            return Err(error_response(&ApiError::Validation(format!(
                "unknown chart mode: {other}"
            ))));
        }
    };

    let mut events: Vec<ThawEvent> = Vec::new();
    for entry in state.store.list() {
        match state.schedule.fetch_schedule(&entry.address).await {
            Ok(schedule) => events.extend(schedule.thaws),
            Err(err) => {
                warn!(address = %entry.address, error = %err, "schedule fetch failed, excluded from chart");
            }
        }
    }

    Ok(Json(chart::render(&events, &nav)))
}

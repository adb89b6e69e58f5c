//! Watchlist CRUD plus the one-off lookup endpoint. List responses fetch
//! every wallet's schedule; a wallet whose upstream fetch fails is reported
//! in place with `status: "error"` instead of failing the whole response.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

use common::pricefeed::PriceSource;
use common::schedule::ScheduleSource;
use common::types::{ApiError, ThawSchedule, WatchlistEntry};

use super::{error_response, AppState, ErrorBody};

#[derive(Serialize)]
pub struct WalletScheduleResponse {
    pub address: String,
    pub name: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ThawSchedule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize)]
pub struct WatchlistResponse {
    pub success: bool,
    pub wallets: Vec<WatchlistEntry>,
}

#[derive(Deserialize)]
pub struct WalletRequest {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Deserialize)]
pub struct LookupParams {
    #[serde(default)]
    pub address: Option<String>,
}

pub async fn list_wallets<S, P>(
    State(state): State<Arc<AppState<S, P>>>,
) -> Json<Vec<WalletScheduleResponse>>
where
    S: ScheduleSource + Send + Sync + 'static,
    P: PriceSource + Send + Sync + 'static,
{
    let entries = state.store.list();
    metrics::gauge!("thawdash_watchlist_wallets").set(entries.len() as f64);

    let mut results = Vec::with_capacity(entries.len());
    for entry in entries {
        match state.schedule.fetch_schedule(&entry.address).await {
            Ok(data) => results.push(WalletScheduleResponse {
                address: entry.address,
                name: entry.name,
                status: "success",
                data: Some(data),
                error: None,
            }),
            Err(err) => {
                warn!(address = %entry.address, error = %err, "schedule fetch failed");
                results.push(WalletScheduleResponse {
                    address: entry.address,
                    name: entry.name,
                    status: "error",
                    data: None,
                    error: Some(err.to_string()),
                });
            }
        }
    }
    Json(results)
}

pub async fn add_wallet<S, P>(
    State(state): State<Arc<AppState<S, P>>>,
    Json(req): Json<WalletRequest>,
) -> Result<Json<WatchlistResponse>, (StatusCode, Json<ErrorBody>)>
where
    S: ScheduleSource + Send + Sync + 'static,
    P: PriceSource + Send + Sync + 'static,
{
    let address = req.address.trim();
    if address.is_empty() {
        return Err(error_response(&ApiError::Validation(
            "address is required".to_string(),
        )));
    }
    let wallets = state
        .store
        .add(address, req.name.as_deref())
        .map_err(|e| error_response(&e))?;
    Ok(Json(WatchlistResponse {
        success: true,
        wallets,
    }))
}

pub async fn rename_wallet<S, P>(
    State(state): State<Arc<AppState<S, P>>>,
    Json(req): Json<WalletRequest>,
) -> Result<Json<WatchlistResponse>, (StatusCode, Json<ErrorBody>)>
where
    S: ScheduleSource + Send + Sync + 'static,
    P: PriceSource + Send + Sync + 'static,
{
    let address = req.address.trim();
    if address.is_empty() {
        return Err(error_response(&ApiError::Validation(
            "address is required".to_string(),
        )));
    }
    let wallets = state
        .store
        .rename(address, req.name.as_deref().unwrap_or_default())
        .map_err(|e| error_response(&e))?;
    Ok(Json(WatchlistResponse {
        success: true,
        wallets,
    }))
}

pub async fn remove_wallet<S, P>(
    State(state): State<Arc<AppState<S, P>>>,
    Json(req): Json<WalletRequest>,
) -> Result<Json<WatchlistResponse>, (StatusCode, Json<ErrorBody>)>
where
    S: ScheduleSource + Send + Sync + 'static,
    P: PriceSource + Send + Sync + 'static,
{
    let address = req.address.trim();
    if address.is_empty() {
        return Err(error_response(&ApiError::Validation(
            "address is required".to_string(),
        )));
    }
    let wallets = state
        .store
        .remove(address)
        .map_err(|e| error_response(&e))?;
    Ok(Json(WatchlistResponse {
        success: true,
        wallets,
    }))
}

/// Fetch one schedule without touching the watchlist.
pub async fn lookup<S, P>(
    State(state): State<Arc<AppState<S, P>>>,
    Query(params): Query<LookupParams>,
) -> Result<Json<ThawSchedule>, (StatusCode, Json<ErrorBody>)>
where
    S: ScheduleSource + Send + Sync + 'static,
    P: PriceSource + Send + Sync + 'static,
{
    let address = params.address.as_deref().map(str::trim).unwrap_or_default();
    if address.is_empty() {
        return Err(error_response(&ApiError::Validation(
            "address is required".to_string(),
        )));
    }
    match state.schedule.fetch_schedule(address).await {
        Ok(schedule) => Ok(Json(schedule)),
        Err(err) => {
            warn!(address = %address, error = %err, "lookup failed");
            Err(error_response(&ApiError::UpstreamUnavailable(
                err.to_string(),
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{add_wallet, body_json, json_request, test_app};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_add_then_list_returns_schedules() {
        let (app, _dir) = test_app();
        add_wallet(&app, "0xaaa", "treasury").await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/wallets")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        let wallets = json.as_array().unwrap();
        assert_eq!(wallets.len(), 1);
        assert_eq!(wallets[0]["address"], "0xaaa");
        assert_eq!(wallets[0]["name"], "treasury");
        assert_eq!(wallets[0]["status"], "success");
        assert_eq!(wallets[0]["data"]["thaws"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_add_without_address_is_400() {
        let (app, _dir) = test_app();
        let response = app
            .oneshot(json_request("POST", "/api/wallets", json!({"name": "x"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"], "address is required");
    }

    #[tokio::test]
    async fn test_add_blank_address_is_400() {
        let (app, _dir) = test_app();
        let response = app
            .oneshot(json_request(
                "POST",
                "/api/wallets",
                json!({"address": "   "}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_add_duplicate_keeps_single_entry() {
        let (app, _dir) = test_app();
        add_wallet(&app, "0xaaa", "old").await;

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/wallets",
                json!({"address": "0xaaa", "name": "new"}),
            ))
            .await
            .unwrap();
        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        let wallets = json["wallets"].as_array().unwrap();
        assert_eq!(wallets.len(), 1);
        assert_eq!(wallets[0]["name"], "new");
    }

    #[tokio::test]
    async fn test_failed_wallet_reported_in_place() {
        let (app, _dir) = test_app();
        add_wallet(&app, "0xgood", "ok").await;
        add_wallet(&app, "0xbad1", "broken").await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/wallets")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let json = body_json(response).await;
        let wallets = json.as_array().unwrap();
        assert_eq!(wallets.len(), 2);
        assert_eq!(wallets[0]["status"], "success");
        assert_eq!(wallets[1]["status"], "error");
        assert!(wallets[1]["error"].as_str().unwrap().contains("refused"));
        assert!(wallets[1].get("data").is_none());
    }

    #[tokio::test]
    async fn test_rename_existing_wallet() {
        let (app, _dir) = test_app();
        add_wallet(&app, "0xaaa", "old").await;

        let response = app
            .oneshot(json_request(
                "PUT",
                "/api/wallets",
                json!({"address": "0xaaa", "name": "renamed"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["wallets"][0]["name"], "renamed");
    }

    #[tokio::test]
    async fn test_rename_unknown_wallet_is_404() {
        let (app, _dir) = test_app();
        let response = app
            .oneshot(json_request(
                "PUT",
                "/api/wallets",
                json!({"address": "0xmissing", "name": "x"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_remove_wallet() {
        let (app, _dir) = test_app();
        add_wallet(&app, "0xaaa", "gone").await;

        let response = app
            .oneshot(json_request(
                "DELETE",
                "/api/wallets",
                json!({"address": "0xaaa"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        assert!(json["wallets"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_remove_unknown_wallet_still_succeeds() {
        let (app, _dir) = test_app();
        let response = app
            .oneshot(json_request(
                "DELETE",
                "/api/wallets",
                json!({"address": "0xmissing"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["success"], true);
    }

    #[tokio::test]
    async fn test_lookup_returns_schedule() {
        let (app, _dir) = test_app();
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/lookup?address=0xsomeone")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["thaws"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_lookup_without_address_is_400() {
        let (app, _dir) = test_app();
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/lookup")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_lookup_upstream_failure_is_502() {
        let (app, _dir) = test_app();
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/lookup?address=0xbad1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let json = body_json(response).await;
        assert!(json["error"].as_str().unwrap().contains("unavailable"));
    }
}

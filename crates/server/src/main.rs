mod api;
mod metrics;
mod price_cache;
mod store;

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use common::config::Config;
use common::pricefeed::CoinGeckoClient;
use common::schedule::ThawScheduleClient;
use tracing::info;

use api::AppState;
use price_cache::PriceCache;
use store::WatchlistStore;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;

    let dispatch = common::observability::build_dispatch(&config.general.log_level);
    tracing::dispatcher::set_global_default(dispatch)
        .context("failed to set tracing dispatcher")?;

    metrics::install_prometheus(config.observability.prometheus_port)
        .context("failed to install Prometheus exporter")?;
    metrics::describe();
    info!(
        port = config.observability.prometheus_port,
        "prometheus exporter listening"
    );

    if let Some(parent) = Path::new(&config.store.path).parent() {
        if parent != Path::new("") {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }

    let schedule = ThawScheduleClient::new(
        &config.schedule.api_url,
        Duration::from_secs(config.schedule.timeout_secs),
        &config.schedule.user_agent,
    );
    let price_source = CoinGeckoClient::new(
        &config.price.api_url,
        &config.price.coin_id,
        Duration::from_secs(config.schedule.timeout_secs),
    );
    let state = Arc::new(AppState {
        store: WatchlistStore::new(&config.store.path),
        schedule,
        price: PriceCache::new(
            price_source,
            Duration::from_secs(config.price.cache_ttl_secs),
        ),
        started_at: chrono::Utc::now(),
    });

    let app = api::router(state, &config.server.static_dir);
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("invalid server host/port")?;
    info!(addr = %addr, "thawdash listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

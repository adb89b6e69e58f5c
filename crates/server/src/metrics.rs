use anyhow::Result;
use metrics::{describe_counter, describe_gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;

pub fn describe() {
    describe_counter!(
        "thawdash_schedule_fetches_total",
        "Number of thaw-schedule fetches attempted."
    );
    describe_counter!(
        "thawdash_schedule_fetch_errors_total",
        "Number of thaw-schedule fetches that failed."
    );
    describe_counter!(
        "thawdash_price_refreshes_total",
        "Number of successful spot-price refreshes."
    );
    describe_counter!(
        "thawdash_price_cache_hits_total",
        "Number of price requests served from a fresh cache entry."
    );
    describe_counter!(
        "thawdash_price_stale_serves_total",
        "Number of price requests served stale after a failed refresh."
    );
    describe_gauge!(
        "thawdash_watchlist_wallets",
        "Current number of monitored wallets."
    );
}

pub fn install_prometheus(port: u16) -> Result<PrometheusHandle> {
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    Ok(PrometheusBuilder::new()
        .with_http_listener(addr)
        .install_recorder()?)
}

//! TTL cache over the spot-price collaborator with stale fallback: an
//! expired refresh that fails serves the last good snapshot, so upstream
//! outages never surface once any fetch has succeeded. Only a cold cache
//! propagates the failure.

use std::time::Duration;

use anyhow::Result;
use common::pricefeed::PriceSource;
use common::types::PriceSnapshot;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::warn;

struct CachedPrice {
    snapshot: PriceSnapshot,
    fetched_at: Instant,
}

pub struct PriceCache<P> {
    source: P,
    ttl: Duration,
    cell: Mutex<Option<CachedPrice>>,
}

impl<P: PriceSource> PriceCache<P> {
    pub fn new(source: P, ttl: Duration) -> Self {
        Self {
            source,
            ttl,
            cell: Mutex::new(None),
        }
    }

    /// Current snapshot per the cache policy. The cell lock is held across
    /// the upstream call, so concurrent refreshes collapse to one in-flight
    /// fetch; latecomers see the fresh entry and hit the cache.
    pub async fn get(&self) -> Result<PriceSnapshot> {
        let mut cell = self.cell.lock().await;

        if let Some(cached) = cell.as_ref() {
            if cached.fetched_at.elapsed() < self.ttl {
                metrics::counter!("thawdash_price_cache_hits_total").increment(1);
                return Ok(cached.snapshot.clone());
            }
        }

        match self.source.fetch_price().await {
            Ok(snapshot) => {
                metrics::counter!("thawdash_price_refreshes_total").increment(1);
                *cell = Some(CachedPrice {
                    snapshot: snapshot.clone(),
                    fetched_at: Instant::now(),
                });
                Ok(snapshot)
            }
            Err(err) => match cell.as_ref() {
                Some(cached) => {
                    warn!(error = %err, "price refresh failed, serving stale snapshot");
                    metrics::counter!("thawdash_price_stale_serves_total").increment(1);
                    Ok(cached.snapshot.clone())
                }
                None => Err(err),
            },
        }
    }
}

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Url;
use tracing::{debug, warn};

use crate::types::PriceSnapshot;

/// Seam for the spot-price collaborator.
pub trait PriceSource {
    fn fetch_price(&self) -> impl std::future::Future<Output = Result<PriceSnapshot>> + Send;
}

/// Client for a CoinGecko-style simple-price endpoint.
pub struct CoinGeckoClient {
    api_url: String,
    coin_id: String,
    client: reqwest::Client,
}

impl CoinGeckoClient {
    pub fn new(api_url: &str, coin_id: &str, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("failed to build HTTP client");

        Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            coin_id: coin_id.to_string(),
            client,
        }
    }

    pub fn simple_price_url(&self) -> String {
        let mut url = Url::parse(&format!("{}/simple/price", self.api_url))
            .expect("price api_url must be a valid absolute URL");
        {
            let mut qp = url.query_pairs_mut();
            qp.append_pair("ids", &self.coin_id);
            qp.append_pair("vs_currencies", "eur,usd");
            qp.append_pair("include_24hr_change", "true");
        }
        url.to_string()
    }

    /// The payload is keyed by coin id. A response without our coin degrades
    /// to an all-zero snapshot instead of failing the refresh.
    fn parse_simple_price(body: &str, coin_id: &str) -> Result<PriceSnapshot> {
        let payload: serde_json::Value =
            serde_json::from_str(body).context("failed to parse price response")?;
        match payload.get(coin_id) {
            Some(entry) => serde_json::from_value(entry.clone())
                .context("failed to deserialize price snapshot"),
            None => {
                warn!(coin_id = coin_id, "price response missing coin id");
                Ok(PriceSnapshot::default())
            }
        }
    }
}

impl PriceSource for CoinGeckoClient {
    async fn fetch_price(&self) -> Result<PriceSnapshot> {
        let url = self.simple_price_url();
        debug!(url = %url, "fetching spot price");

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .context("failed to fetch spot price")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("price API returned {status}: {body}");
        }

        let body = resp.text().await.context("failed to read price response")?;
        Self::parse_simple_price(&body, &self.coin_id)
    }
}

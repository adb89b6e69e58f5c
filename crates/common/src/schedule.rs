use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::types::ThawSchedule;

/// Seam for the thaw-schedule collaborator so handlers and tests can swap in
/// fakes.
pub trait ScheduleSource {
    fn fetch_schedule(
        &self,
        address: &str,
    ) -> impl std::future::Future<Output = Result<ThawSchedule>> + Send;
}

/// Minimal client for the thaw-schedule API — one endpoint, one wallet at a
/// time.
pub struct ThawScheduleClient {
    api_url: String,
    client: reqwest::Client,
}

impl ThawScheduleClient {
    /// `user_agent` must look like a browser; the upstream rejects default
    /// HTTP-library agents.
    pub fn new(api_url: &str, timeout: Duration, user_agent: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .expect("failed to build HTTP client");

        Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    pub fn schedule_url(&self, address: &str) -> String {
        format!(
            "{}/thaws/{}/schedule",
            self.api_url,
            urlencoding::encode(address)
        )
    }

    async fn fetch_inner(&self, address: &str) -> Result<ThawSchedule> {
        let url = self.schedule_url(address);
        debug!(url = %url, "fetching thaw schedule");

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("failed to fetch thaw schedule for {address}"))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(address = address, status = %status, "schedule API returned an error");
            anyhow::bail!("schedule API returned {status}: {body}");
        }

        let schedule: ThawSchedule = resp
            .json()
            .await
            .context("failed to deserialize thaw schedule")?;

        debug!(
            address = address,
            count = schedule.thaws.len(),
            "fetched thaw schedule"
        );
        Ok(schedule)
    }
}

impl ScheduleSource for ThawScheduleClient {
    async fn fetch_schedule(&self, address: &str) -> Result<ThawSchedule> {
        metrics::counter!("thawdash_schedule_fetches_total").increment(1);
        let res = self.fetch_inner(address).await;
        if res.is_err() {
            metrics::counter!("thawdash_schedule_fetch_errors_total").increment(1);
        }
        res
    }
}

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raw amounts arrive scaled by 1e6; divide to obtain display units.
pub const AMOUNT_SCALE: f64 = 1_000_000.0;

/// One scheduled token unlock, as returned by the thaw-schedule API.
///
/// Events carry no unique identifier; they are positional within a wallet's
/// schedule. A present `transaction_id` means the unlock has been redeemed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThawEvent {
    #[serde(deserialize_with = "de_opt_string_any", default)]
    pub amount: Option<String>,
    pub thawing_period_start: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub transaction_id: Option<String>,
}

impl ThawEvent {
    /// Amount in display units. A missing or non-numeric amount is treated
    /// as zero rather than poisoning the aggregates with NaN.
    pub fn display_amount(&self) -> f64 {
        self.amount
            .as_deref()
            .and_then(|raw| raw.parse::<f64>().ok())
            .filter(|v| v.is_finite())
            .map_or(0.0, |v| v / AMOUNT_SCALE)
    }

    /// Unlock instant. Accepts RFC 3339, a bare datetime, or a bare date
    /// (midnight UTC). `None` when the wire string is unparseable; such an
    /// event is neither redeemable nor a next-thaw candidate.
    pub fn thaw_date(&self) -> Option<DateTime<Utc>> {
        let raw = self.thawing_period_start.as_str();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
            return Some(dt.and_utc());
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc())
    }
}

/// Wire envelope of the schedule endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThawSchedule {
    #[serde(default)]
    pub thaws: Vec<ThawEvent>,
}

/// Per-wallet aggregates in display units. Recomputed on every evaluation,
/// never persisted. `locked` is defined residually, so
/// `total == redeemable + redeemed + locked` holds by construction.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WalletStats {
    pub total: f64,
    pub redeemable: f64,
    pub redeemed: f64,
    pub locked: f64,
    pub next_thaw: Option<DateTime<Utc>>,
}

/// Portfolio-wide aggregates. `wallet_count` counts every monitored wallet,
/// including ones whose schedule fetch failed; only successful wallets
/// contribute to the sums and to `next_thaw`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GlobalStats {
    pub total: f64,
    pub redeemable: f64,
    pub redeemed: f64,
    pub locked: f64,
    pub wallet_count: usize,
    pub next_thaw: Option<DateTime<Utc>>,
}

/// Spot price in both supported currencies with 24h change percentages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSnapshot {
    pub eur: f64,
    pub usd: f64,
    #[serde(default)]
    pub eur_24h_change: f64,
    #[serde(default)]
    pub usd_24h_change: f64,
}

/// One persisted watchlist row. Address is the unique key; the display name
/// may be empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchlistEntry {
    pub address: String,
    #[serde(default)]
    pub name: String,
}

/// Domain failures surfaced over the API.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("wallet not found: {0}")]
    NotFound(String),
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Deserialize a field that can be either a string or a number into Option<String>.
fn de_opt_string_any<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de;

    struct StringOrNumber;

    impl<'de> de::Visitor<'de> for StringOrNumber {
        type Value = Option<String>;

        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            write!(f, "a string or number")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
            Ok(Some(v))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }
    }

    deserializer.deserialize_any(StringOrNumber)
}

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::str::FromStr;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub general: General,
    pub server: Server,
    pub store: Store,
    pub schedule: Schedule,
    pub price: Price,
    pub observability: Observability,
}

#[derive(Debug, Clone, Deserialize)]
pub struct General {
    pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Server {
    pub host: String,
    pub port: u16,
    pub static_dir: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Store {
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Schedule {
    pub api_url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Price {
    pub api_url: String,
    pub coin_id: String,
    pub cache_ttl_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Observability {
    pub prometheus_port: u16,
}

impl Config {
    pub fn load() -> Result<Self> {
        let content = std::fs::read_to_string("config/default.toml")
            .context("failed to read config/default.toml")?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).context("failed to parse config")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.schedule.api_url.is_empty() {
            bail!("schedule.api_url must not be empty");
        }
        if self.price.api_url.is_empty() {
            bail!("price.api_url must not be empty");
        }
        if self.schedule.timeout_secs == 0 {
            bail!("schedule.timeout_secs must be > 0");
        }
        if self.price.cache_ttl_secs == 0 {
            bail!("price.cache_ttl_secs must be > 0");
        }
        if self.store.path.is_empty() {
            bail!("store.path must not be empty");
        }
        Ok(())
    }
}

impl FromStr for Config {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::from_toml_str(s)
    }
}

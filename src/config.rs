use std::time::Duration;

use anyhow::Context;
use reqwest::Url;

#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub base_url: Option<Url>,
    pub timeout: Option<Duration>, // None keeps the library default
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: None,
            user_agent: concat!("accounts/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub http: HttpClientConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;

        let defaults = HttpClientConfig::default();
        let http = HttpClientConfig {
            base_url: std::env::var("HTTP_BASE_URL")
                .ok()
                .map(|v| Url::parse(&v))
                .transpose()
                .context("HTTP_BASE_URL is not a valid URL")?,
            timeout: parse_timeout(std::env::var("HTTP_TIMEOUT_SECS").ok().as_deref())?,
            user_agent: std::env::var("HTTP_USER_AGENT").unwrap_or(defaults.user_agent),
        };
        Ok(Self { database_url, http })
    }
}

fn parse_timeout(raw: Option<&str>) -> anyhow::Result<Option<Duration>> {
    raw.map(|v| v.trim().parse::<u64>().map(Duration::from_secs))
        .transpose()
        .context("HTTP_TIMEOUT_SECS is not a number")
}

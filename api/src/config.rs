use anyhow::{anyhow, Context, Result};
use hackrx_engine::document_fetcher::DEFAULT_MAX_DOCUMENT_BYTES;
use hackrx_engine::perplexity_service::{DEFAULT_PERPLEXITY_API_URL, DEFAULT_PERPLEXITY_MODEL};
use hackrx_engine::PerplexityConfig;
use std::net::SocketAddr;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

/// Process configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub bind_addr: SocketAddr,
    pub team_bearer_token: String,
    pub perplexity: PerplexityConfig,
    pub max_document_bytes: u64,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from an arbitrary variable lookup. Empty values count
    /// as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let team_bearer_token = get("TEAM_BEARER_TOKEN")
            .ok_or_else(|| anyhow!("TEAM_BEARER_TOKEN environment variable not set"))?;

        let api_key = get("PERPLEXITY_API_KEY");
        if api_key.is_none() {
            log::warn!("PERPLEXITY_API_KEY is not set; every question will fail until it is configured");
        }

        let bind_addr = get("HACKRX_BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .context("HACKRX_BIND_ADDR must be a socket address such as 0.0.0.0:3000")?;

        let max_document_bytes = match get("HACKRX_MAX_DOCUMENT_BYTES") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("HACKRX_MAX_DOCUMENT_BYTES is not a byte count: {}", raw))?,
            None => DEFAULT_MAX_DOCUMENT_BYTES,
        };

        Ok(Self {
            bind_addr,
            team_bearer_token,
            perplexity: PerplexityConfig {
                api_url: get("PERPLEXITY_API_URL")
                    .unwrap_or_else(|| DEFAULT_PERPLEXITY_API_URL.to_string()),
                model: get("PERPLEXITY_MODEL")
                    .unwrap_or_else(|| DEFAULT_PERPLEXITY_MODEL.to_string()),
                api_key,
            },
            max_document_bytes,
        })
    }
}

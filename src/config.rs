//! Process configuration from environment variables

use crate::chunker::{DEFAULT_MAX_SEGMENTS, DEFAULT_SEGMENT_CAPACITY};
use crate::pipeline::PipelineConfig;
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_PORT: u16 = 8081;
pub const DEFAULT_TWILIO_API_BASE: &str = "https://api.twilio.com";

#[derive(Debug, Clone)]
pub struct TwilioConfig {
    pub api_base: String,
    pub account_sid: String,
    pub auth_token: String,
    pub from_number: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Absent when any of the credentials is missing
    pub twilio: Option<TwilioConfig>,
    /// Shared Redis for links; in-process store when absent
    pub redis_url: Option<String>,
    pub pipeline: PipelineConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = parse_or(&get, "PORT", DEFAULT_PORT)?;

        let twilio = match (
            get("TWILIO_SID"),
            get("TWILIO_AUTH_TOKEN"),
            get("TWILIO_NUMBER"),
        ) {
            (Some(account_sid), Some(auth_token), Some(from_number)) => Some(TwilioConfig {
                api_base: get("TWILIO_API_BASE")
                    .unwrap_or_else(|| DEFAULT_TWILIO_API_BASE.to_string()),
                account_sid,
                auth_token,
                from_number,
            }),
            _ => None,
        };

        let mut pipeline = PipelineConfig::default();
        pipeline.segment_capacity = parse_or(&get, "SEGMENT_CAPACITY", DEFAULT_SEGMENT_CAPACITY)?;
        pipeline.max_segments = parse_or(&get, "MAX_SEGMENTS", DEFAULT_MAX_SEGMENTS)?;
        if pipeline.segment_capacity == 0 {
            anyhow::bail!("SEGMENT_CAPACITY must be at least 1");
        }
        pipeline.links.ttl = get("LINK_TTL_SECS")
            .map(|v| v.parse::<u64>().map(Duration::from_secs))
            .transpose()
            .context("LINK_TTL_SECS must be a number of seconds")?;

        Ok(Self {
            port,
            twilio,
            redis_url: get("REDIS_URL"),
            pipeline,
        })
    }
}

/// `APP_ENV` or `NODE_ENV` set to "production"
pub fn is_production<F>(lookup: F) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    ["APP_ENV", "NODE_ENV"].iter().any(|key| {
        lookup(key).is_some_and(|v| v.trim().eq_ignore_ascii_case("production"))
    })
}

/// Read `.env` into the process environment, except in production.
/// Variables already set are left alone.
pub fn load_dotenv() -> Option<PathBuf> {
    if is_production(|key| std::env::var(key).ok()) {
        return None;
    }
    match dotenvy::dotenv() {
        Ok(path) => Some(path),
        Err(e) if e.not_found() => None,
        Err(e) => {
            warn!("Ignoring unreadable .env file: {}", e);
            None
        }
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid {}: {:?}", key, raw)),
        None => Ok(default),
    }
}

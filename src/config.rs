// src/config.rs
use anyhow::{anyhow, Context, Result};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_PROVIDERS_PATH: &str = "PROVIDERS_PATH";
pub const ENV_CHECK_INTERVAL_SECS: &str = "CHECK_INTERVAL_SECS";
pub const ENV_HISTORY_LIMIT: &str = "HISTORY_LIMIT";
pub const ENV_FETCH_TIMEOUT_SECS: &str = "FETCH_TIMEOUT_SECS";
pub const ENV_BIND_ADDR: &str = "BIND_ADDR";
pub const ENV_LOG_FORMAT: &str = "LOG_FORMAT";

const DEFAULT_PROVIDERS_PATH: &str = "providers.json";
const DEFAULT_CHECK_INTERVAL_SECS: u64 = 60;
const DEFAULT_HISTORY_LIMIT: usize = 50;
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

/// Startup configuration. Fixed for the lifetime of the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub providers_path: PathBuf,
    pub poll_interval: Duration,
    pub history_limit: usize,
    pub fetch_timeout: Duration,
    pub bind_addr: SocketAddr,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Read from the process environment (call `dotenvy::dotenv()` first in dev).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset or blank keys fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let providers_path = get(ENV_PROVIDERS_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PROVIDERS_PATH));

        let poll_interval = Duration::from_secs(positive(
            ENV_CHECK_INTERVAL_SECS,
            get(ENV_CHECK_INTERVAL_SECS),
            DEFAULT_CHECK_INTERVAL_SECS,
        )?);
        let history_limit = positive(
            ENV_HISTORY_LIMIT,
            get(ENV_HISTORY_LIMIT),
            DEFAULT_HISTORY_LIMIT as u64,
        )? as usize;
        let fetch_timeout = Duration::from_secs(positive(
            ENV_FETCH_TIMEOUT_SECS,
            get(ENV_FETCH_TIMEOUT_SECS),
            DEFAULT_FETCH_TIMEOUT_SECS,
        )?);

        let raw_addr = get(ENV_BIND_ADDR).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr: SocketAddr = raw_addr
            .parse()
            .with_context(|| format!("{ENV_BIND_ADDR}={raw_addr:?} is not a socket address"))?;

        let log_format = match get(ENV_LOG_FORMAT).map(|v| v.to_ascii_lowercase()).as_deref() {
            None | Some("compact") | Some("text") => LogFormat::Compact,
            Some("json") => LogFormat::Json,
            Some(other) => return Err(anyhow!("{ENV_LOG_FORMAT}={other:?} is not compact|json")),
        };

        Ok(Self {
            providers_path,
            poll_interval,
            history_limit,
            fetch_timeout,
            bind_addr,
            log_format,
        })
    }
}

fn positive(key: &str, raw: Option<String>, default: u64) -> Result<u64> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    let v: u64 = raw
        .parse()
        .with_context(|| format!("{key}={raw:?} is not a whole number"))?;
    if v == 0 {
        return Err(anyhow!("{key} must be greater than zero"));
    }
    Ok(v)
}

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use vdub_core::error::CoreError;

use crate::poll::{PollConfig, DEFAULT_POLL_INTERVAL, FAILURE_NOTICE_EVERY, MAX_POLL_ATTEMPTS};

/// Default server root (the Flask development server).
pub const DEFAULT_SERVER_URL: &str = "http://localhost:5000";

/// Client configuration loaded from environment variables.
///
/// All fields have defaults suitable for a local server.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Server root URL.
    pub server_url: String,
    /// Poll cadence and budget.
    pub poll: PollConfig,
    /// Timeout for short JSON requests.
    pub request_timeout: Duration,
    /// Where finished videos are saved. `None` skips the download.
    pub download_dir: Option<PathBuf>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            poll: PollConfig::default(),
            request_timeout: crate::api::DEFAULT_REQUEST_TIMEOUT,
            download_dir: None,
        }
    }
}

impl TrackerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                     | Default                 |
    /// |-----------------------------|-------------------------|
    /// | `VDUB_SERVER_URL`           | `http://localhost:5000` |
    /// | `VDUB_POLL_INTERVAL_MS`     | `2000`                  |
    /// | `VDUB_MAX_POLL_ATTEMPTS`    | `150`                   |
    /// | `VDUB_REQUEST_TIMEOUT_SECS` | `30`                    |
    /// | `VDUB_DOWNLOAD_DIR`         | unset                   |
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) but reading values through
    /// `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let server_url = lookup("VDUB_SERVER_URL")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());
        if !server_url.starts_with("http://") && !server_url.starts_with("https://") {
            return Err(CoreError::Validation(format!(
                "VDUB_SERVER_URL must start with http:// or https://, got: '{server_url}'"
            )));
        }

        let interval_ms: u64 = parse_var(
            &lookup,
            "VDUB_POLL_INTERVAL_MS",
            DEFAULT_POLL_INTERVAL.as_millis() as u64,
        )?;
        if interval_ms == 0 {
            return Err(CoreError::Validation(
                "VDUB_POLL_INTERVAL_MS must be greater than zero".to_string(),
            ));
        }

        let max_attempts: u32 = parse_var(&lookup, "VDUB_MAX_POLL_ATTEMPTS", MAX_POLL_ATTEMPTS)?;

        let request_timeout_secs: u64 = parse_var(
            &lookup,
            "VDUB_REQUEST_TIMEOUT_SECS",
            crate::api::DEFAULT_REQUEST_TIMEOUT.as_secs(),
        )?;

        let download_dir = lookup("VDUB_DOWNLOAD_DIR")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            server_url,
            poll: PollConfig {
                interval: Duration::from_millis(interval_ms),
                max_attempts,
                failure_notice_every: FAILURE_NOTICE_EVERY,
            },
            request_timeout: Duration::from_secs(request_timeout_secs),
            download_dir,
        })
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T, CoreError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| CoreError::Validation(format!("{key} must be a valid number, got: '{raw}'"))),
    }
}

use billflow_common::error::{BillflowError, BillflowResult};
use serde::Deserialize;
use std::env;
use std::fmt::Display;
use std::str::FromStr;

/// Where the task batch is handed to the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchMode {
    /// `get_tasks` triggers one DAG run for the whole batch.
    Batch,
    /// `get_data` triggers one DAG run per task.
    PerTask,
}

impl FromStr for DispatchMode {
    type Err = BillflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "batch" => Ok(Self::Batch),
            "per_task" | "per-task" => Ok(Self::PerTask),
            other => Err(BillflowError::Config(format!(
                "invalid DISPATCH_MODE: {other} (expected batch or per_task)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub dispatch_mode: DispatchMode,
    pub http_timeout_secs: u64,
}

impl AppConfig {
    /// Load configuration from environment variables.
    /// Loads `.env` file if present; every value has a default.
    pub fn from_env() -> BillflowResult<Self> {
        // Best-effort .env load; ignore if missing
        let _ = dotenvy::dotenv();

        Ok(Self {
            host: get_var_or("HOST", "0.0.0.0"),
            port: parse_var_or("PORT", 8080)?,
            log_level: get_var_or("LOG_LEVEL", "info"),
            dispatch_mode: get_var_or("DISPATCH_MODE", "batch").parse()?,
            http_timeout_secs: parse_var_or("HTTP_TIMEOUT_SECS", 30)?,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

pub fn get_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

/// Read and parse `key`, falling back to `default` when unset.
/// A value that is set but unparsable is a configuration error.
pub fn parse_var_or<T>(key: &str, default: T) -> BillflowResult<T>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| BillflowError::Config(format!("invalid {key}: {e}"))),
        Err(_) => Ok(default),
    }
}

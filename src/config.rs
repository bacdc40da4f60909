use std::net::SocketAddr;
use std::path::PathBuf;

use axum::http::HeaderValue;
use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "PatientRecords";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name of the backing table inside the data directory.
pub const RECORDS_FILE_NAME: &str = "patient_records.csv";

/// Loopback only: the API is meant for the local user.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8750";

pub const ENV_RECORDS_FILE: &str = "PATIENT_RECORDS_FILE";
pub const ENV_BIND_ADDR: &str = "PATIENT_RECORDS_ADDR";
/// Comma-separated browser origins allowed to call the API cross-origin.
pub const ENV_ALLOWED_ORIGINS: &str = "PATIENT_RECORDS_ALLOWED_ORIGINS";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid bind address {value:?}: {reason}")]
    InvalidBindAddr { value: String, reason: String },
    #[error("Invalid allowed origin {value:?}: {reason}")]
    InvalidOrigin { value: String, reason: String },
}

/// Get the application data directory
/// ~/PatientRecords/ on all platforms, falling back to the working directory
/// when no home directory can be determined.
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Default location of the backing CSV file.
pub fn default_records_file() -> PathBuf {
    app_data_dir().join(RECORDS_FILE_NAME)
}

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    if cfg!(debug_assertions) {
        "info,patient_records_lib=debug"
    } else {
        "info"
    }
}

/// Runtime configuration resolved at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub records_file: PathBuf,
    pub bind_addr: SocketAddr,
    /// Empty means same-origin only.
    pub allowed_origins: Vec<HeaderValue>,
}

impl AppConfig {
    /// Resolve configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve configuration through an arbitrary key lookup.
    ///
    /// Blank values are treated as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let records_file = non_blank(ENV_RECORDS_FILE)
            .map(PathBuf::from)
            .unwrap_or_else(default_records_file);

        let raw_addr = non_blank(ENV_BIND_ADDR).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = raw_addr
            .trim()
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidBindAddr {
                value: raw_addr.clone(),
                reason: e.to_string(),
            })?;

        let allowed_origins = match non_blank(ENV_ALLOWED_ORIGINS) {
            Some(raw) => parse_origins(&raw)?,
            None => Vec::new(),
        };

        Ok(Self {
            records_file,
            bind_addr,
            allowed_origins,
        })
    }
}

/// Parse a comma-separated origin list. Wildcards are refused.
fn parse_origins(raw: &str) -> Result<Vec<HeaderValue>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(|origin| {
            let invalid = |reason: &str| ConfigError::InvalidOrigin {
                value: origin.to_string(),
                reason: reason.to_string(),
            };
            if origin == "*" {
                return Err(invalid("wildcard origins are not allowed"));
            }
            if !(origin.starts_with("http://") || origin.starts_with("https://")) {
                return Err(invalid("expected an http:// or https:// origin"));
            }
            HeaderValue::from_str(origin).map_err(|e| invalid(&e.to_string()))
        })
        .collect()
}

use std::{env, fmt::Display, net::IpAddr, path::PathBuf, str::FromStr};

use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
    pub host: IpAddr,
    pub port: u16,
    pub upload_dir: PathBuf,
    pub upload_url_prefix: String,
    pub session_ttl_hours: i64,
}

impl Config {
    /// Reads `.env` (if present) and then the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let upload_url_prefix = upload_prefix(try_load("UPLOAD_URL_PREFIX", "/uploads")?)?;

        Ok(Self {
            database_url: try_load("DATABASE_URL", "sqlite://studyboard.db?mode=rwc")?,
            max_connections: try_load("DB_MAX_CONNECTIONS", "5")?,
            host: try_load("HOST", "127.0.0.1")?,
            port: try_load("PORT", "3000")?,
            upload_dir: try_load("UPLOAD_DIR", "uploads")?,
            upload_url_prefix,
            session_ttl_hours: try_load("SESSION_TTL_HOURS", "168")?,
        })
    }
}

fn try_load<T: FromStr>(key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    let value = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    value.parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        reason: e.to_string(),
        value,
    })
}

/// Uploads are mounted beside `/api`, so the prefix cannot be the root.
fn upload_prefix(raw: String) -> Result<String, ConfigError> {
    let prefix = normalize_prefix(&raw);
    if prefix == "/" || prefix == "/api" || prefix.starts_with("/api/") {
        return Err(ConfigError::Invalid {
            key: "UPLOAD_URL_PREFIX",
            value: raw,
            reason: "must name a path other than / and /api".to_string(),
        });
    }
    Ok(prefix)
}

fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_end_matches('/');
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

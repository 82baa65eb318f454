use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use emora_core::gateway::gemini;
use thiserror::Error;

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("EMORA_JWT_SECRET is unset or still a placeholder")]
    MissingJwtSecret,

    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub db_path: PathBuf,
    pub addr: SocketAddr,
    pub jwt_secret: String,
    pub session_ttl: chrono::Duration,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub gateway_timeout: Duration,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from any variable source; `from_env` passes the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("EMORA_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            return Err(ConfigError::MissingJwtSecret);
        }

        let host = lookup("EMORA_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = parse_or(&lookup, "EMORA_PORT", 3000)?;
        let addr_raw = format!("{host}:{port}");
        let addr: SocketAddr = addr_raw.parse().map_err(|_| ConfigError::Invalid {
            name: "EMORA_HOST",
            value: host,
        })?;

        let ttl_hours: i64 = parse_or(&lookup, "EMORA_SESSION_TTL_HOURS", 24)?;
        let session_ttl = chrono::Duration::try_hours(ttl_hours)
            .filter(|ttl| *ttl > chrono::Duration::zero())
            .ok_or_else(|| ConfigError::Invalid {
                name: "EMORA_SESSION_TTL_HOURS",
                value: ttl_hours.to_string(),
            })?;
        let timeout_secs: u64 = parse_or(&lookup, "EMORA_GATEWAY_TIMEOUT_SECS", 60)?;

        Ok(Self {
            db_path: lookup("EMORA_DB_PATH").unwrap_or_else(|| "emora.db".into()).into(),
            addr,
            jwt_secret,
            session_ttl,
            gemini_api_key: lookup("GEMINI_API_KEY").filter(|k| !k.is_empty()),
            gemini_model: lookup("EMORA_GEMINI_MODEL").unwrap_or_else(|| gemini::DEFAULT_MODEL.into()),
            gemini_base_url: lookup("EMORA_GEMINI_BASE_URL")
                .unwrap_or_else(|| gemini::DEFAULT_BASE_URL.into()),
            gateway_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        Some(value) => value.parse().map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}

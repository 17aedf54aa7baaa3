//! Process settings from the environment (optionally seeded from a `.env` file).

use crate::error::ConfigError;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_DATABASE_URL: &str = "postgres://localhost/videogames_platform";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_QUERY_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_BODY_LIMIT_BYTES: usize = 64 * 1024;

#[derive(Clone, Debug)]
pub struct Settings {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    /// Upper bound for each store round trip.
    pub query_timeout: Duration,
    pub body_limit_bytes: usize,
    /// JSON catalog replacing the embedded one.
    pub catalog_path: Option<PathBuf>,
}

impl Settings {
    /// Reads the process environment after loading `.env`, if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env` with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.into());
        let bind_addr = lookup("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.into())
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Load(format!("BIND_ADDR: {}", e)))?;
        let query_timeout_ms = parse_positive(&lookup, "QUERY_TIMEOUT_MS", DEFAULT_QUERY_TIMEOUT_MS)?;
        let body_limit_bytes = parse_positive(&lookup, "BODY_LIMIT_BYTES", DEFAULT_BODY_LIMIT_BYTES as u64)? as usize;
        let catalog_path = lookup("CATALOG_PATH").filter(|s| !s.is_empty()).map(PathBuf::from);

        Ok(Settings {
            database_url,
            bind_addr,
            query_timeout: Duration::from_millis(query_timeout_ms),
            body_limit_bytes,
            catalog_path,
        })
    }
}

fn parse_positive<F>(lookup: &F, key: &str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => match raw.trim().parse::<u64>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(ConfigError::Load(format!(
                "{} must be a positive integer, got '{}'",
                key, raw
            ))),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Settings::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn defaults() {
        let s = settings(&[]).unwrap();
        assert_eq!(s.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(s.bind_addr.port(), 3000);
        assert_eq!(s.query_timeout, Duration::from_secs(5));
        assert_eq!(s.body_limit_bytes, 64 * 1024);
        assert!(s.catalog_path.is_none());
    }

    #[test]
    fn overrides() {
        let s = settings(&[
            ("DATABASE_URL", "postgres://api@db/games"),
            ("BIND_ADDR", "127.0.0.1:8080"),
            ("QUERY_TIMEOUT_MS", "250"),
            ("CATALOG_PATH", "/etc/api/catalog.json"),
        ])
        .unwrap();
        assert_eq!(s.database_url, "postgres://api@db/games");
        assert_eq!(s.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(s.query_timeout, Duration::from_millis(250));
        assert_eq!(s.catalog_path, Some(PathBuf::from("/etc/api/catalog.json")));
    }

    #[test]
    fn rejects_zero_timeout_and_bad_addr() {
        assert!(settings(&[("QUERY_TIMEOUT_MS", "0")]).is_err());
        assert!(settings(&[("QUERY_TIMEOUT_MS", "soon")]).is_err());
        assert!(settings(&[("BIND_ADDR", "localhost")]).is_err());
    }
}

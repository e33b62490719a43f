use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
];

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub db_path: PathBuf,
    pub media_root: PathBuf,
    pub jwt_secret: String,
    pub index_cache_ttl: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup, so tests need not touch the
    /// process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let jwt_secret = lookup("YATUBE_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("YATUBE_JWT_SECRET is unset or still a placeholder");
        }

        let host = var("YATUBE_HOST", "0.0.0.0");
        let port: u16 = var("YATUBE_PORT", "8000")
            .parse()
            .context("YATUBE_PORT must be a port number")?;
        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", host, port))?;

        let cache_secs: u64 = var("YATUBE_INDEX_CACHE_SECS", "20")
            .parse()
            .context("YATUBE_INDEX_CACHE_SECS must be a number of seconds")?;

        Ok(Self {
            addr,
            db_path: var("YATUBE_DB_PATH", "yatube.db").into(),
            media_root: var("YATUBE_MEDIA_ROOT", "./media").into(),
            jwt_secret,
            index_cache_ttl: Duration::from_secs(cache_secs),
        })
    }
}

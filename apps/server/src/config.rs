use anyhow::Context;
use std::{net::SocketAddr, time::Duration};

use ledgerfold_core::constants::DEFAULT_BASE_CURRENCY;

const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

pub struct Config {
    pub listen_addr: SocketAddr,
    pub db_path: String,
    pub base_currency: String,
    pub cors_allow: Vec<String>,
    pub request_timeout: Duration,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let listen_addr: SocketAddr = std::env::var("LF_LISTEN_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8088".to_string())
            .parse()
            .context("Invalid LF_LISTEN_ADDR")?;
        let db_path = std::env::var("LF_DB_PATH").unwrap_or_else(|_| "./db/ledgerfold.db".into());
        let base_currency = std::env::var("LF_BASE_CURRENCY")
            .map(|c| c.trim().to_uppercase())
            .ok()
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_CURRENCY.to_string());
        let cors_allow = std::env::var("LF_CORS_ALLOW_ORIGINS")
            .unwrap_or_else(|_| "*".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let timeout_ms: u64 = std::env::var("LF_REQUEST_TIMEOUT_MS")
            .unwrap_or_else(|_| "30000".into())
            .parse()
            .unwrap_or(30000);
        let max_upload_bytes = std::env::var("LF_MAX_UPLOAD_BYTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES);
        Ok(Self {
            listen_addr,
            db_path,
            base_currency,
            cors_allow,
            request_timeout: Duration::from_millis(timeout_ms),
            max_upload_bytes,
        })
    }

    /// Defaults with the database at `db_path`, without reading the environment.
    pub fn with_db_path(db_path: impl Into<String>) -> Self {
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 8088)),
            db_path: db_path.into(),
            base_currency: DEFAULT_BASE_CURRENCY.to_string(),
            cors_allow: vec!["*".to_string()],
            request_timeout: Duration::from_secs(30),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

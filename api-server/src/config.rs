use std::{env, path::PathBuf, sync::Arc};

use chrono::TimeDelta;

use crate::store::Store;

pub(crate) const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8787";
pub(crate) const DEFAULT_SESSION_TTL_SECS: u64 = 2 * 60 * 60;
pub(crate) const DEFAULT_SESSION_SWEEP_SECS: u64 = 60;
pub(crate) const DEFAULT_APP_ENV: &str = "development";

#[derive(Debug, Clone)]
pub(crate) struct ServerConfig {
    pub(crate) bind_addr: String,
    /// SQLite directory. `None` keeps everything in memory.
    pub(crate) data_dir: Option<PathBuf>,
    pub(crate) public_base_url: String,
    pub(crate) session_ttl_secs: u64,
    pub(crate) session_sweep_secs: u64,
    pub(crate) http_workers: Option<usize>,
    pub(crate) app_env: String,
}

impl ServerConfig {
    pub(crate) fn from_env() -> Self {
        let bind_addr =
            read_env_string("API_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let public_base_url = read_env_string("PUBLIC_BASE_URL")
            .unwrap_or_else(|| default_public_base_url(&bind_addr));

        Self {
            data_dir: read_env_string("DATA_DIR").map(PathBuf::from),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            session_ttl_secs: read_env_u64("SESSION_TTL_SECS", DEFAULT_SESSION_TTL_SECS),
            session_sweep_secs: read_env_u64("SESSION_SWEEP_SECS", DEFAULT_SESSION_SWEEP_SECS),
            http_workers: read_env_optional_usize("HTTP_WORKERS"),
            app_env: read_env_string("APP_ENV").unwrap_or_else(|| DEFAULT_APP_ENV.to_string()),
            bind_addr,
        }
    }
}

/// `http://localhost:<port>`, taking the port from the bind address.
pub(crate) fn default_public_base_url(bind_addr: &str) -> String {
    let port = bind_addr
        .rsplit_once(':')
        .map(|(_, port)| port)
        .filter(|port| !port.is_empty())
        .unwrap_or("8787");
    format!("http://localhost:{port}")
}

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) store: Arc<dyn Store>,
    pub(crate) public_base_url: String,
    pub(crate) session_ttl: TimeDelta,
    pub(crate) app_env: String,
}

impl AppState {
    pub(crate) fn new(store: Arc<dyn Store>, config: &ServerConfig) -> Self {
        Self {
            store,
            public_base_url: config.public_base_url.clone(),
            session_ttl: session_ttl(config.session_ttl_secs),
            app_env: config.app_env.clone(),
        }
    }
}

pub(crate) fn session_ttl(secs: u64) -> TimeDelta {
    TimeDelta::try_seconds(i64::try_from(secs).unwrap_or(i64::MAX))
        .unwrap_or_else(|| TimeDelta::seconds(DEFAULT_SESSION_TTL_SECS as i64))
}

pub(crate) fn read_env_string(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub(crate) fn read_env_optional_usize(name: &str) -> Option<usize> {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .filter(|value| *value > 0)
}

pub(crate) fn read_env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}

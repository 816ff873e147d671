use std::env;

use quiver_host::{
    config::{read_env_u64, read_env_usize},
    RecorderConfig,
};

pub(crate) const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub(crate) const DEFAULT_MAX_SESSIONS: usize = 256;
// An outdoor round rarely runs past a few hours.
pub(crate) const DEFAULT_SESSION_TTL_SECS: u64 = 4 * 60 * 60;
pub(crate) const DEFAULT_SESSION_SWEEP_SECS: u64 = 60;
pub(crate) const DEFAULT_JSON_LIMIT_BYTES: usize = 64 * 1024;

#[derive(Debug, Clone)]
pub(crate) struct ServerConfig {
    pub(crate) bind_addr: String,
    pub(crate) max_sessions: usize,
    pub(crate) session_ttl_secs: u64,
    pub(crate) session_sweep_secs: u64,
    pub(crate) json_limit: usize,
    pub(crate) recorder: RecorderConfig,
}

impl ServerConfig {
    pub(crate) fn from_env() -> Self {
        Self {
            bind_addr: env::var("API_BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
            max_sessions: read_env_usize("MAX_SESSIONS", DEFAULT_MAX_SESSIONS),
            session_ttl_secs: read_env_u64("SESSION_TTL_SECS", DEFAULT_SESSION_TTL_SECS),
            session_sweep_secs: read_env_u64("SESSION_SWEEP_SECS", DEFAULT_SESSION_SWEEP_SECS),
            json_limit: read_env_usize("JSON_LIMIT_BYTES", DEFAULT_JSON_LIMIT_BYTES),
            recorder: RecorderConfig::from_env(),
        }
    }
}

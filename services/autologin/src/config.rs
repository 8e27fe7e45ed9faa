use crate::domain::types::DEFAULT_CODE_TTL_SECS;

/// Autologin service configuration loaded from environment variables.
#[derive(Debug)]
pub struct AutologinConfig {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// Redis connection URL (failure counters).
    pub redis_url: String,
    /// Server-side salt mixed into `user_hash` digests. Env var: `CODE_SALT`.
    pub code_salt: String,
    /// TCP port to listen on (default 3114). Env var: `AUTOLOGIN_PORT`.
    pub autologin_port: u16,
    /// Default code validity in seconds (default 900). Env var:
    /// `DEFAULT_TTL_SECS`.
    pub default_ttl_secs: u64,
    /// Interval between expiry sweeps in seconds (default 300). Env var:
    /// `SWEEP_INTERVAL_SECS`.
    pub sweep_interval_secs: u64,
}

impl AutologinConfig {
    pub fn from_env() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL").expect("DATABASE_URL"),
            redis_url: std::env::var("REDIS_URL").expect("REDIS_URL"),
            code_salt: std::env::var("CODE_SALT").expect("CODE_SALT"),
            autologin_port: std::env::var("AUTOLOGIN_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3114),
            default_ttl_secs: std::env::var("DEFAULT_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_CODE_TTL_SECS),
            sweep_interval_secs: std::env::var("SWEEP_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(300),
        }
    }
}

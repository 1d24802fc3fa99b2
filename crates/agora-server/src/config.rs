use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;

/// Process configuration, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub session_ttl_hours: i64,
    /// Seconds between expired-session sweeps. `0` disables the sweep.
    pub session_sweep_secs: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let port = var("AGORA_PORT", "8080");
        let ttl = var("AGORA_SESSION_TTL_HOURS", "24");
        let sweep = var("AGORA_SESSION_SWEEP_SECS", "3600");

        let session_ttl_hours: i64 = ttl
            .parse()
            .with_context(|| format!("AGORA_SESSION_TTL_HOURS is not a number: {ttl}"))?;
        if session_ttl_hours <= 0 {
            anyhow::bail!("AGORA_SESSION_TTL_HOURS must be positive, got {session_ttl_hours}");
        }

        Ok(Self {
            db_path: var("AGORA_DB_PATH", "agora.db").into(),
            host: var("AGORA_HOST", "0.0.0.0"),
            port: port
                .parse()
                .with_context(|| format!("AGORA_PORT is not a valid port: {port}"))?,
            session_ttl_hours,
            session_sweep_secs: sweep
                .parse()
                .with_context(|| format!("AGORA_SESSION_SWEEP_SECS is not a number: {sweep}"))?,
        })
    }

    pub fn addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }
}

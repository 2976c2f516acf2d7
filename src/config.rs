use std::env;
use std::time::Duration;
use anyhow::{Context, Result};

/// The application's configuration.
#[derive(Clone)]
pub struct Config {
    /// The URL of the PostgreSQL store. When unset the in-memory store is used.
    pub database_url: Option<String>,
    /// The address the server binds to.
    pub bind_addr: String,
    /// How long a quiz session stays retrievable, in hours.
    pub session_ttl_hours: i64,
    /// Upper bound on any single durable-store call, in seconds.
    pub store_timeout_secs: u64,
    /// Interval of the background session reaper, in seconds.
    pub reaper_interval_secs: u64,
}

impl Config {
    /// Creates a new `Config` from environment variables.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_url: env::var("DATABASE_URL").ok(),
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:3000".to_string()),
            session_ttl_hours: env::var("SESSION_TTL_HOURS")
                .unwrap_or_else(|_| "24".to_string())
                .parse()
                .context("Invalid SESSION_TTL_HOURS")?,
            store_timeout_secs: env::var("STORE_TIMEOUT_SECS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .context("Invalid STORE_TIMEOUT_SECS")?,
            reaper_interval_secs: env::var("REAPER_INTERVAL_SECS")
                .unwrap_or_else(|_| "3600".to_string())
                .parse()
                .context("Invalid REAPER_INTERVAL_SECS")?,
        })
    }

    /// The session TTL as a `chrono` duration.
    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.session_ttl_hours)
    }

    /// The store-call deadline.
    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            bind_addr: "127.0.0.1:3000".to_string(),
            session_ttl_hours: 24,
            store_timeout_secs: 5,
            reaper_interval_secs: 3600,
        }
    }
}

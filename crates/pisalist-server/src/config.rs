//! Server configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the server can start with zero
//! configuration for local development.

use std::net::SocketAddr;
use std::path::PathBuf;

use chrono::Duration;

use pisalist_shared::constants::{DEFAULT_HTTP_PORT, DEFAULT_TOKEN_TTL_HOURS};

/// Token secret used when `JWT_SECRET` is unset. Development only.
pub const DEV_TOKEN_SECRET: &str = "pisalist-dev-secret-change-me";

/// Server configuration.
#[derive(Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP (axum) API server.
    /// Env: `HTTP_ADDR`
    /// Default: `0.0.0.0:8080`
    pub http_addr: SocketAddr,

    /// SQLite database file.
    /// Env: `DATABASE_PATH`
    /// Default: `./pisalist.db`
    pub database_path: PathBuf,

    /// Secret the token signing key is derived from.
    /// Env: `JWT_SECRET`
    pub token_secret: String,

    /// Lifetime of issued tokens.
    /// Env: `JWT_EXPIRE_HOURS` (positive integer)
    /// Default: 24 hours
    pub token_ttl: Duration,

    /// Fill an empty community pool with default wishes at startup.
    /// Env: `SEED_COMMUNITY` (true/false)
    /// Default: `true`
    pub seed_community: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], DEFAULT_HTTP_PORT).into(),
            database_path: PathBuf::from("./pisalist.db"),
            token_secret: DEV_TOKEN_SECRET.to_string(),
            token_ttl: Duration::hours(DEFAULT_TOKEN_TTL_HOURS),
            seed_community: true,
        }
    }
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("http_addr", &self.http_addr)
            .field("database_path", &self.database_path)
            .field("token_secret", &"<redacted>")
            .field("token_ttl_hours", &self.token_ttl.num_hours())
            .field("seed_community", &self.seed_community)
            .finish()
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(addr) = lookup("HTTP_ADDR") {
            if let Ok(parsed) = addr.parse::<SocketAddr>() {
                config.http_addr = parsed;
            } else {
                tracing::warn!(value = %addr, "Invalid HTTP_ADDR, using default");
            }
        }

        if let Some(path) = lookup("DATABASE_PATH") {
            if !path.trim().is_empty() {
                config.database_path = PathBuf::from(path);
            }
        }

        if let Some(secret) = lookup("JWT_SECRET") {
            if !secret.is_empty() {
                config.token_secret = secret;
            }
        }

        if let Some(val) = lookup("JWT_EXPIRE_HOURS") {
            match val.trim().parse::<i64>() {
                Ok(hours) if hours > 0 => config.token_ttl = Duration::hours(hours),
                _ => tracing::warn!(value = %val, "Invalid JWT_EXPIRE_HOURS, using default"),
            }
        }

        if let Some(val) = lookup("SEED_COMMUNITY") {
            config.seed_community = val != "false" && val != "0";
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter,
        // so we do not store it here.

        config
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.token_secret == DEV_TOKEN_SECRET
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn from_pairs(pairs: &[(&str, &str)]) -> ServerConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_default_config() {
        let config = from_pairs(&[]);
        assert_eq!(config.http_addr, ([0, 0, 0, 0], 8080).into());
        assert_eq!(config.token_ttl, Duration::hours(24));
        assert!(config.seed_community);
        assert!(config.uses_dev_secret());
    }

    #[test]
    fn test_overrides() {
        let config = from_pairs(&[
            ("HTTP_ADDR", "127.0.0.1:9000"),
            ("DATABASE_PATH", "/tmp/lists.db"),
            ("JWT_SECRET", "hunter2"),
            ("JWT_EXPIRE_HOURS", "2"),
            ("SEED_COMMUNITY", "false"),
        ]);
        assert_eq!(config.http_addr, ([127, 0, 0, 1], 9000).into());
        assert_eq!(config.database_path, PathBuf::from("/tmp/lists.db"));
        assert_eq!(config.token_ttl, Duration::hours(2));
        assert!(!config.seed_community);
        assert!(!config.uses_dev_secret());
    }

    #[test]
    fn test_invalid_values_fall_back() {
        for hours in ["0", "-3", "soon"] {
            let config = from_pairs(&[("JWT_EXPIRE_HOURS", hours), ("HTTP_ADDR", "nowhere")]);
            assert_eq!(config.token_ttl, Duration::hours(24));
            assert_eq!(config.http_addr, ServerConfig::default().http_addr);
        }
    }

    #[test]
    fn test_debug_hides_secret() {
        let config = from_pairs(&[("JWT_SECRET", "hunter2")]);
        assert!(!format!("{config:?}").contains("hunter2"));
    }
}

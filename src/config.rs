//! Configuration module for Pulse Monitor.
//!
//! Loads configuration from environment variables with sensible defaults.

use std::env;
use std::time::Duration;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP port for the API server (default: 8080)
    pub http_port: u16,
    /// Path to the SQLite database file (default: "pulse.db")
    pub db_path: String,
    /// Per-probe request timeout; `None` leaves the transport default.
    pub probe_timeout: Option<Duration>,
    /// Skip ticks while a target's previous probe is still running.
    pub overlap_guard: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_port: 8080,
            db_path: "pulse.db".to_string(),
            probe_timeout: None,
            overlap_guard: false,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `PULSE_HTTP_PORT`: HTTP port (default: 8080)
    /// - `PULSE_DB_PATH`: Database file path (default: "pulse.db")
    /// - `PULSE_PROBE_TIMEOUT_SECS`: probe timeout in seconds (default: unset)
    /// - `PULSE_OVERLAP_GUARD`: `true`/`1` to enable (default: false)
    pub fn load() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(port) = lookup("PULSE_HTTP_PORT").and_then(|s| s.parse().ok()) {
            cfg.http_port = port;
        }

        if let Some(db_path) = lookup("PULSE_DB_PATH") {
            cfg.db_path = db_path;
        }

        if let Some(secs) = lookup("PULSE_PROBE_TIMEOUT_SECS").and_then(|s| s.parse::<u64>().ok()) {
            if secs > 0 {
                cfg.probe_timeout = Some(Duration::from_secs(secs));
            }
        }

        if let Some(flag) = lookup("PULSE_OVERLAP_GUARD") {
            cfg.overlap_guard = matches!(flag.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }

        cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> ServerConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_default_config() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.http_port, 8080);
        assert_eq!(cfg.db_path, "pulse.db");
        assert_eq!(cfg.probe_timeout, None);
        assert!(!cfg.overlap_guard);
    }

    #[test]
    fn test_overrides() {
        let cfg = from_pairs(&[
            ("PULSE_HTTP_PORT", "9090"),
            ("PULSE_DB_PATH", "/tmp/p.db"),
            ("PULSE_PROBE_TIMEOUT_SECS", "10"),
            ("PULSE_OVERLAP_GUARD", "true"),
        ]);
        assert_eq!(cfg.http_port, 9090);
        assert_eq!(cfg.db_path, "/tmp/p.db");
        assert_eq!(cfg.probe_timeout, Some(Duration::from_secs(10)));
        assert!(cfg.overlap_guard);
    }

    #[test]
    fn test_bad_values_fall_back() {
        let cfg = from_pairs(&[
            ("PULSE_HTTP_PORT", "not-a-port"),
            ("PULSE_PROBE_TIMEOUT_SECS", "0"),
            ("PULSE_OVERLAP_GUARD", "maybe"),
        ]);
        assert_eq!(cfg.http_port, 8080);
        assert_eq!(cfg.probe_timeout, None);
        assert!(!cfg.overlap_guard);
    }
}

//! Console configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use reel_core::network::Backoff;

/// Top-level configuration for the console.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Network settings.
    pub network: NetworkConfig,
    /// Logging.
    pub logging: LoggingConfig,
}

/// Network settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Deck backend host.
    pub host: String,
    /// Deck backend port.
    pub port: u16,
    /// First reconnect delay after a drop, in milliseconds.
    pub base_backoff_ms: u64,
    /// Ceiling the reconnect delay never exceeds, in milliseconds.
    pub max_backoff_ms: u64,
}

/// Logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level.
    pub level: String,
}

// ── Defaults ─────────────────────────────────────────────────────

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            network: NetworkConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8765,
            base_backoff_ms: 1000,
            max_backoff_ms: 30_000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

impl NetworkConfig {
    pub fn backoff(&self) -> Backoff {
        Backoff::new(
            Duration::from_millis(self.base_backoff_ms),
            Duration::from_millis(self.max_backoff_ms),
        )
    }
}

// ── Loading ──────────────────────────────────────────────────────

impl ConsoleConfig {
    /// Load from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!("invalid config {}: {e}; using defaults", path.display());
                Self::default()
            }),
            Err(_) => {
                tracing::info!("no config at {}; using defaults", path.display());
                Self::default()
            }
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let cfg = ConsoleConfig::default();
        let text = toml::to_string_pretty(&cfg).unwrap();
        assert!(text.contains("host"));
        assert!(text.contains("base_backoff_ms"));
    }

    #[test]
    fn roundtrip_config() {
        let cfg = ConsoleConfig::default();
        let text = toml::to_string_pretty(&cfg).unwrap();
        let parsed: ConsoleConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.network.host, "127.0.0.1");
        assert_eq!(parsed.network.port, 8765);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let parsed: ConsoleConfig = toml::from_str("[network]\nhost = \"10.0.0.5\"\n").unwrap();
        assert_eq!(parsed.network.host, "10.0.0.5");
        assert_eq!(parsed.network.port, 8765);
        assert_eq!(parsed.logging.level, "info");
    }

    #[test]
    fn backoff_from_millis() {
        let net = NetworkConfig {
            base_backoff_ms: 50,
            max_backoff_ms: 200,
            ..NetworkConfig::default()
        };
        let mut backoff = net.backoff();
        assert_eq!(backoff.advance(), Duration::from_millis(50));
        assert_eq!(backoff.advance(), Duration::from_millis(100));
    }
}

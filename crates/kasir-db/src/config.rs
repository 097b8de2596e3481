//! # Application Configuration
//!
//! Settings are layered, later sources overriding earlier ones:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. Built-in defaults            (this file)                            │
//! │  2. kasir.toml                   (optional; path from KASIR_CONFIG)     │
//! │  3. KASIR__* environment vars    KASIR__DATABASE__PATH=/data/kasir.db   │
//! │                                  KASIR__SEQUENCE__CART_PREFIX=ORD       │
//! │                                  KASIR__LOG__FILTER=debug               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example `kasir.toml`
//! ```toml
//! [database]
//! path = "/var/lib/kasir/kasir.db"
//! max_connections = 8
//! busy_timeout_secs = 5
//!
//! [sequence]
//! transaction_prefix = "TRX"
//! cart_prefix = "ORD"
//!
//! [log]
//! filter = "info,kasir=debug,sqlx=warn"
//! ```

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use kasir_core::sequence::validate_prefix;
use kasir_core::{CART_CODE_PREFIX, TRANSACTION_CODE_PREFIX};

/// Default config file, relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "kasir.toml";

/// Environment variable naming an alternative config file.
pub const CONFIG_PATH_ENV: &str = "KASIR_CONFIG";

/// Top-level settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseSettings,
    pub sequence: SequenceSettings,
    pub log: LogSettings,
}

/// `[database]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// SQLite file path; `:memory:` for an in-memory database.
    pub path: PathBuf,
    pub max_connections: u32,
    pub min_connections: u32,
    /// How long a writer waits for the SQLite write lock.
    pub busy_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub run_migrations: bool,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: PathBuf::from("kasir.db"),
            max_connections: 5,
            min_connections: 1,
            busy_timeout_secs: 5,
            connect_timeout_secs: 30,
            run_migrations: true,
        }
    }
}

impl DatabaseSettings {
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_secs(self.busy_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// `[sequence]` section: code prefixes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceSettings {
    pub transaction_prefix: String,
    pub cart_prefix: String,
}

impl Default for SequenceSettings {
    fn default() -> Self {
        SequenceSettings {
            transaction_prefix: TRANSACTION_CODE_PREFIX.to_string(),
            cart_prefix: CART_CODE_PREFIX.to_string(),
        }
    }
}

/// `[log]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// `tracing_subscriber::EnvFilter` directive. `RUST_LOG` wins when set.
    pub filter: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        LogSettings {
            filter: "info,kasir=debug,sqlx=warn".to_string(),
        }
    }
}

impl AppConfig {
    /// Loads defaults, then the config file, then `KASIR__*` variables.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.into());
        Self::load_from(&path)
    }

    /// Same as [`AppConfig::load`] with an explicit file path. A missing
    /// file is not an error; a malformed one is.
    pub fn load_from(path: &str) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("KASIR")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: AppConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (key, prefix) in [
            ("sequence.transaction_prefix", &self.sequence.transaction_prefix),
            ("sequence.cart_prefix", &self.sequence.cart_prefix),
        ] {
            validate_prefix(prefix)
                .map_err(|e| ConfigError::Message(format!("{}: {}", key, e)))?;
        }

        if self.sequence.transaction_prefix == self.sequence.cart_prefix {
            return Err(ConfigError::Message(
                "sequence.transaction_prefix and sequence.cart_prefix must differ".into(),
            ));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::Message(
                "database.max_connections must be at least 1".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.sequence.transaction_prefix, "TRX");
        assert_eq!(config.sequence.cart_prefix, "ORD");
        assert_eq!(config.database.busy_timeout(), Duration::from_secs(5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = AppConfig::load_from("/definitely/not/here/kasir.toml").unwrap();
        assert_eq!(config.database.max_connections, 5);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kasir.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[database]\nmax_connections = 9\n\n[sequence]\ncart_prefix = \"CRT\""
        )
        .unwrap();

        let config = AppConfig::load_from(path.to_str().unwrap()).unwrap();
        assert_eq!(config.database.max_connections, 9);
        assert_eq!(config.database.min_connections, 1);
        assert_eq!(config.sequence.cart_prefix, "CRT");
        assert_eq!(config.sequence.transaction_prefix, "TRX");
    }

    #[test]
    fn test_rejects_bad_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kasir.toml");
        std::fs::write(&path, "[sequence]\ntransaction_prefix = \"trx-1\"\n").unwrap();

        assert!(AppConfig::load_from(path.to_str().unwrap()).is_err());
    }
}

//! Daemon configuration
//!
//! Layered with the `config` crate: built-in defaults, then an optional TOML file
//! (`~/.batchline/config.toml`, or the path in `BATCHLINE_CONFIG`), then environment
//! variables such as `BATCHLINE__SERVER__PORT=9700`.

use batchline_api_http::ApiServerConfig;
use batchline_core::application::{EngineConfig, QueryConfig};
use batchline_infra_memory::StoreConfig;
use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_CONFIG_PATH: &str = "~/.batchline/config.toml";
const CONFIG_PATH_ENV: &str = "BATCHLINE_CONFIG";
const ENV_PREFIX: &str = "BATCHLINE";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub store: StoreSettings,
    pub query: QuerySettings,
    pub engine: EngineSettings,
    pub processor: ProcessorSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub keep_alive_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreSettings {
    pub ttl_secs: u64,
    pub sweep_interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuerySettings {
    pub poll_interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EngineSettings {
    pub escalate_item_failures: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessorKind {
    /// Items are file paths, checked on disk
    File,
    /// Items are subprocess invocations
    Command,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProcessorSettings {
    pub kind: ProcessorKind,
    /// Base directory for relative file items
    pub root: Option<String>,
    pub max_bytes: Option<u64>,
    pub env_allowlist: Vec<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    /// EnvFilter directive, overridden by `RUST_LOG`
    pub level: String,
    pub format: LogFormat,
    /// Also write daily-rotated log files here
    pub directory: Option<String>,
}

impl Settings {
    /// Load from the default location
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(&shellexpand::tilde(&path))
    }

    /// Load with an explicit config file path (the file may be absent)
    pub fn load_from(path: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 9630)?
            .set_default("server.keep_alive_secs", 15)?
            .set_default("store.ttl_secs", 600)?
            .set_default("store.sweep_interval_secs", 60)?
            .set_default("query.poll_interval_secs", 10)?
            .set_default("engine.escalate_item_failures", false)?
            .set_default("processor.kind", "file")?
            .set_default("processor.env_allowlist", vec!["PATH", "HOME", "USER"])?
            .set_default("processor.timeout_secs", 300)?
            .set_default("logging.level", "batchline=info,tower_http=info")?
            .set_default("logging.format", "pretty")?
            .add_source(File::new(path, FileFormat::Toml).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("processor.env_allowlist")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<Self>()?
            .validate()
    }

    /// Reject values the runtime cannot honor. Every interval drives a timer.
    fn validate(self) -> Result<Self, ConfigError> {
        let intervals = [
            ("server.keep_alive_secs", self.server.keep_alive_secs),
            ("store.ttl_secs", self.store.ttl_secs),
            ("store.sweep_interval_secs", self.store.sweep_interval_secs),
            ("query.poll_interval_secs", self.query.poll_interval_secs),
            ("processor.timeout_secs", self.processor.timeout_secs),
        ];
        if let Some((key, _)) = intervals.iter().find(|(_, secs)| *secs == 0) {
            return Err(ConfigError::Message(format!("{} must be greater than zero", key)));
        }
        Ok(self)
    }

    pub fn server_config(&self) -> ApiServerConfig {
        ApiServerConfig {
            host: self.server.host.clone(),
            port: self.server.port,
        }
    }

    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.server.keep_alive_secs)
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            ttl: Duration::from_secs(self.store.ttl_secs),
            sweep_interval: Duration::from_secs(self.store.sweep_interval_secs),
        }
    }

    pub fn query_config(&self) -> QueryConfig {
        QueryConfig {
            poll_interval: Duration::from_secs(self.query.poll_interval_secs),
        }
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            escalate_item_failures: self.engine.escalate_item_failures,
            // Twice per TTL so a running job never looks abandoned
            record_refresh: Duration::from_millis(self.store.ttl_secs * 1_000 / 2),
        }
    }
}

impl ProcessorSettings {
    pub fn root_dir(&self) -> Option<PathBuf> {
        self.root
            .as_deref()
            .map(|root| PathBuf::from(shellexpand::tilde(root).into_owned()))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

use std::time::Duration;
use std::{env, fmt, fs, path};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::queue::MAX_BATCH_ENTRIES;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadFailed(#[source] std::io::Error),

    #[error("Failed to write config file: {0}")]
    WriteFailed(#[source] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseFailed(String),

    #[error("No config directory available (set XDG_CONFIG_HOME or HOME)")]
    ConfigPathUnavailable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store: Store,
    pub scheduler: Scheduler,
    pub worker: Worker,
    pub server: Server,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Store {
    pub database_path: String,
    pub timeout_secs: u64,
    pub pool_size: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scheduler {
    pub interval_secs: u64,
    pub batch_size: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Worker {
    pub workers: usize,
    pub probe_timeout_secs: u64,
    pub max_messages_per_delivery: usize,
    pub queue_capacity: usize,
    pub publish_timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Server {
    pub bind: String,
    pub port: u16,
}

impl Default for Store {
    fn default() -> Self {
        Self { database_path: "webpulse.db".into(), timeout_secs: 10, pool_size: 8 }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self { interval_secs: 60, batch_size: crate::DEFAULT_BATCH_SIZE }
    }
}

impl Default for Worker {
    fn default() -> Self {
        Self {
            workers: 4,
            probe_timeout_secs: crate::DEFAULT_PROBE_TIMEOUT_SECS,
            max_messages_per_delivery: MAX_BATCH_ENTRIES,
            queue_capacity: 1024,
            publish_timeout_secs: 30,
        }
    }
}

impl Default for Server {
    fn default() -> Self {
        Self { bind: "0.0.0.0".into(), port: 8080 }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store: Store::default(),
            scheduler: Scheduler::default(),
            worker: Worker::default(),
            server: Server::default(),
        }
    }
}

/// Used to ensure we are actually reading a toml file
fn normalize_toml_path(path: &path::Path) -> path::PathBuf {
    let mut path = path.to_path_buf();
    if path.extension().map(|ext| ext != "toml").unwrap_or(true) {
        path.set_extension("toml");
    }
    path
}

/// Get default config path ($XDG_CONFIG_HOME/webpulse/config.toml or
/// $HOME/.config/...)
fn default_config_path() -> Result<path::PathBuf, ConfigError> {
    let path = if let Ok(config_home) = env::var("XDG_CONFIG_HOME") {
        path::PathBuf::from(config_home)
    } else if let Some(home_dir) = env::home_dir() {
        home_dir.join(".config")
    } else {
        return Err(ConfigError::ConfigPathUnavailable);
    };

    Ok(path.join("webpulse/config.toml"))
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let write_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str, value: &dyn fmt::Display| {
                writeln!(f, "  {:indent$}{}: {}", "", label, value, indent = level * 2)
            }
        };
        let write_title_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str| {
                writeln!(f, "{:indent$}{}", "", label, indent = level * 2)
            }
        };

        let write_title_1 = write_title_indented(1);
        let write_1 = write_indented(1);

        writeln!(f, "Current Internal Configuration State:")?;
        write_title_1(f, "Store")?;
        write_1(f, "Database Path", &self.store.database_path)?;
        write_1(f, "Timeout (s)", &self.store.timeout_secs)?;
        write_1(f, "Pool Size", &self.store.pool_size)?;
        write_title_1(f, "Scheduler")?;
        write_1(f, "Interval (s)", &self.scheduler.interval_secs)?;
        write_1(f, "Batch Size", &self.scheduler.batch_size)?;
        write_title_1(f, "Worker")?;
        write_1(f, "Workers", &self.worker.workers)?;
        write_1(f, "Probe Timeout (s)", &self.worker.probe_timeout_secs)?;
        write_1(f, "Messages per Delivery", &self.worker.max_messages_per_delivery)?;
        write_1(f, "Queue Capacity", &self.worker.queue_capacity)?;
        write_1(f, "Publish Timeout (s)", &self.worker.publish_timeout_secs)?;
        write_title_1(f, "Server")?;
        write_1(f, "Bind Address", &self.server.bind)?;
        write_1(f, "Port", &self.server.port)?;

        Ok(())
    }
}

impl Config {
    /// Generate Config structure from file
    ///
    /// Creates a default config in ~/.config/webpulse/config.toml
    ///  or the specified path, with the name config.toml if one does not exist
    ///
    /// ```no_run
    /// let cfg = webpulse::Config::from_config(None::<&std::path::Path>).unwrap();
    /// println!("{}", cfg);
    /// ```
    pub fn from_config(optional_path: Option<impl AsRef<path::Path>>) -> Result<Self, ConfigError> {
        let config_path: path::PathBuf = if let Some(path) = optional_path {
            normalize_toml_path(path.as_ref())
        } else {
            default_config_path()?
        };

        if config_path.exists() {
            let raw_string = fs::read_to_string(&config_path).map_err(ConfigError::ReadFailed)?;
            toml::from_str(raw_string.as_str()).map_err(|e| ConfigError::ParseFailed(e.to_string()))
        } else {
            let config = Self::default();
            config.write_config(&config_path)?;
            Ok(config)
        }
    }

    /// Serialize and write a config to a file
    pub fn write_config(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        let config_str: String =
            toml::to_string_pretty(self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(ConfigError::WriteFailed)?;
        }

        std::fs::write(path, config_str).map_err(ConfigError::WriteFailed)
    }

    /// Apply `WEBPULSE_*` environment overrides on top of the file values
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(path) = env::var("WEBPULSE_DATABASE_PATH") {
            self.store.database_path = path;
        }
        if let Ok(bind) = env::var("WEBPULSE_BIND") {
            self.server.bind = bind;
        }
        if let Some(port) = env::var("WEBPULSE_PORT").ok().and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }
        self
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store.timeout_secs.max(1))
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.worker.probe_timeout_secs.max(1))
    }

    /// How long a publish waits for room in a full queue; zero fails at once
    pub fn publish_timeout(&self) -> Duration {
        Duration::from_secs(self.worker.publish_timeout_secs)
    }

    pub fn schedule_interval(&self) -> Duration {
        Duration::from_secs(self.scheduler.interval_secs.max(1))
    }
}

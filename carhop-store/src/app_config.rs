use carhop_catalog::Vehicle;
use carhop_core::DEFAULT_QUEUE_KEY;
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub queue: QueueConfig,
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub connectivity: ConnectivityConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub drafts: DraftConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

/// Where offline bookings are persisted
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum QueueBackend {
    File,
    Redis,
    /// Lost on restart, only for demos and tests
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct QueueConfig {
    #[serde(default = "default_backend")]
    pub backend: QueueBackend,
    #[serde(default = "default_queue_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_queue_key")]
    pub key: String,
    pub redis_url: Option<String>,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            dir: default_queue_dir(),
            key: default_queue_key(),
            redis_url: None,
        }
    }
}

fn default_backend() -> QueueBackend {
    QueueBackend::File
}

fn default_queue_dir() -> PathBuf {
    PathBuf::from("data/queue")
}

fn default_queue_key() -> String {
    DEFAULT_QUEUE_KEY.to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct RemoteConfig {
    /// Hosted booking database. Without it every remote write counts as unreachable.
    pub database_url: Option<String>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

impl RemoteConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            timeout_ms: default_timeout_ms(),
            run_migrations: true,
        }
    }
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone)]
pub struct ConnectivityConfig {
    /// `host:port` probed to detect reachability; no polling when unset
    pub probe_addr: Option<String>,
    #[serde(default = "default_probe_interval_ms")]
    pub probe_interval_ms: u64,
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
}

impl ConnectivityConfig {
    pub fn probe_interval(&self) -> Duration {
        Duration::from_millis(self.probe_interval_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        Self {
            probe_addr: None,
            probe_interval_ms: default_probe_interval_ms(),
            probe_timeout_ms: default_probe_timeout_ms(),
        }
    }
}

fn default_probe_interval_ms() -> u64 {
    5_000
}

fn default_probe_timeout_ms() -> u64 {
    2_000
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct CatalogConfig {
    /// Vehicles served when no database is configured
    #[serde(default)]
    pub seed: Vec<Vehicle>,
}

/// Lifetime of wizards held in memory by the API
#[derive(Debug, Deserialize, Clone)]
pub struct DraftConfig {
    /// Unsubmitted drafts older than this are dropped
    #[serde(default = "default_draft_ttl_secs")]
    pub ttl_secs: u64,
    /// How long a submitted draft stays readable
    #[serde(default = "default_submitted_retention_secs")]
    pub submitted_retention_secs: u64,
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl DraftConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn submitted_retention(&self) -> Duration {
        Duration::from_secs(self.submitted_retention_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

impl Default for DraftConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_draft_ttl_secs(),
            submitted_retention_secs: default_submitted_retention_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

fn default_draft_ttl_secs() -> u64 {
    3_600
}

fn default_submitted_retention_secs() -> u64 {
    300
}

fn default_sweep_interval_secs() -> u64 {
    60
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from(Path::new("config"))
    }

    /// Layered load: `default`, then the `RUN_MODE` file, then `local`, then `CARHOP__*` env vars
    pub fn load_from(dir: &Path) -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::from(dir.join("default")))
            .add_source(config::File::from(dir.join(&run_mode)).required(false))
            // Not checked in
            .add_source(config::File::from(dir.join("local")).required(false))
            // e.g. `CARHOP__QUEUE__BACKEND=redis`
            .add_source(config::Environment::with_prefix("CARHOP").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("default.toml"), "[server]\nport = 8080\n").unwrap();

        let config = Config::load_from(dir.path()).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.queue.backend, QueueBackend::File);
        assert_eq!(config.queue.key, "pendingBookings");
        assert_eq!(config.remote.timeout(), Duration::from_secs(10));
        assert!(config.remote.database_url.is_none());
        assert!(config.connectivity.probe_addr.is_none());
        assert!(config.catalog.seed.is_empty());
        assert_eq!(config.drafts.ttl(), Duration::from_secs(3_600));
        assert_eq!(config.drafts.sweep_interval(), Duration::from_secs(60));
    }

    #[test]
    fn test_local_file_overrides_default() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("default.toml"),
            r#"
[server]
port = 8080

[queue]
backend = "file"
dir = "data/queue"

[[catalog.seed]]
id = "6f0c6a52-2f5e-4d47-9a55-1f1f0d3f3a11"
name = "Renault Clio"
category = "ECONOMY"
seats = 5
hourly_rate = 20
"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("local.toml"),
            "[queue]\nbackend = \"memory\"\n\n[remote]\ntimeout_ms = 250\n",
        )
        .unwrap();

        let config = Config::load_from(dir.path()).unwrap();
        assert_eq!(config.queue.backend, QueueBackend::Memory);
        assert_eq!(config.queue.dir, PathBuf::from("data/queue"));
        assert_eq!(config.remote.timeout_ms, 250);
        assert_eq!(config.catalog.seed.len(), 1);
        assert_eq!(config.catalog.seed[0].hourly_rate, 20);
    }

    #[test]
    fn test_missing_default_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load_from(dir.path()).is_err());
    }
}

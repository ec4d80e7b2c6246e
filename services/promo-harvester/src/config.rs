//! Configuration types and loading
//!
//! Precedence: `--config` flag > `CONFIG_PATH` env var > `promo-harvester.toml`.
//! A missing file means built-in defaults. `CREDENTIALS_PATH` and
//! `CODES_PATH` override the file paths after the TOML is read.

use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use promo_client::ApiSettings;
use promo_engine::{DedupScope, RestartPolicy, RetryPolicy};

/// Added to the request timeout when draining units at shutdown
const DRAIN_GRACE: Duration = Duration::from_secs(5);

/// Root configuration
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub input: InputConfig,
    pub output: OutputConfig,
    pub api: ApiConfig,
    pub engine: EngineConfig,
    pub cooldowns: CooldownConfig,
    pub supervisor: SupervisorConfig,
    pub status: StatusConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub credentials_path: PathBuf,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            credentials_path: PathBuf::from("app_token.txt"),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub codes_path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            codes_path: PathBuf::from("code.txt"),
        }
    }
}

/// Remote API identity and transport settings
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub request_timeout_secs: u64,
    pub client_origin: String,
    pub client_version: String,
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        let settings = ApiSettings::default();
        Self {
            base_url: settings.base_url,
            request_timeout_secs: settings.request_timeout.as_secs(),
            client_origin: settings.client_origin,
            client_version: settings.client_version,
            user_agent: settings.user_agent,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupScopeSetting {
    #[default]
    Shared,
    PerUnit,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Number of execution units
    pub units: usize,
    pub dedup_scope: DedupScopeSetting,
    /// 0 polls until eligible
    pub max_poll_attempts: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            units: 10,
            dedup_scope: DedupScopeSetting::Shared,
            max_poll_attempts: 0,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CooldownConfig {
    pub rate_limited_secs: u64,
    pub pending_secs: u64,
    pub transient_secs: u64,
    pub reauth_secs: u64,
}

impl Default for CooldownConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            rate_limited_secs: policy.rate_limited.as_secs(),
            pending_secs: policy.pending.as_secs(),
            transient_secs: policy.transient.as_secs(),
            reauth_secs: policy.reauth.as_secs(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SupervisorConfig {
    pub restart_min_interval_ms: u64,
    pub restart_max_backoff_secs: u64,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        let policy = RestartPolicy::default();
        Self {
            restart_min_interval_ms: policy.min_interval.as_millis() as u64,
            restart_max_backoff_secs: policy.max_backoff.as_secs(),
        }
    }
}

/// Optional health/metrics listener
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StatusConfig {
    pub listen_addr: Option<SocketAddr>,
}

impl Config {
    /// Load configuration from a TOML file (or defaults when it does not
    /// exist), overlay environment variables, then validate.
    pub fn load(path: &Path) -> common::Result<Self> {
        let mut config: Config = match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Config::default(),
            Err(e) => return Err(e.into()),
        };

        if let Ok(p) = std::env::var("CREDENTIALS_PATH") {
            config.input.credentials_path = PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("CODES_PATH") {
            config.output.codes_path = PathBuf::from(p);
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> common::Result<()> {
        if !self.api.base_url.starts_with("http://") && !self.api.base_url.starts_with("https://")
        {
            return Err(common::Error::Config(format!(
                "base_url must start with http:// or https://, got: {}",
                self.api.base_url
            )));
        }

        let non_zero = [
            ("request_timeout_secs", self.api.request_timeout_secs),
            ("units", self.engine.units as u64),
            ("rate_limited_secs", self.cooldowns.rate_limited_secs),
            ("pending_secs", self.cooldowns.pending_secs),
            ("transient_secs", self.cooldowns.transient_secs),
            ("reauth_secs", self.cooldowns.reauth_secs),
            (
                "restart_min_interval_ms",
                self.supervisor.restart_min_interval_ms,
            ),
        ];
        for (name, value) in non_zero {
            if value == 0 {
                return Err(common::Error::Config(format!(
                    "{name} must be greater than 0"
                )));
            }
        }

        if self.restart_policy().max_backoff < self.restart_policy().min_interval {
            return Err(common::Error::Config(
                "restart_max_backoff_secs must be at least restart_min_interval_ms".into(),
            ));
        }

        Ok(())
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return PathBuf::from(p);
        }
        PathBuf::from("promo-harvester.toml")
    }

    pub fn api_settings(&self) -> ApiSettings {
        ApiSettings {
            base_url: self.api.base_url.trim_end_matches('/').to_string(),
            client_origin: self.api.client_origin.clone(),
            client_version: self.api.client_version.clone(),
            user_agent: self.api.user_agent.clone(),
            request_timeout: Duration::from_secs(self.api.request_timeout_secs),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            rate_limited: Duration::from_secs(self.cooldowns.rate_limited_secs),
            pending: Duration::from_secs(self.cooldowns.pending_secs),
            transient: Duration::from_secs(self.cooldowns.transient_secs),
            reauth: Duration::from_secs(self.cooldowns.reauth_secs),
            max_poll_attempts: (self.engine.max_poll_attempts > 0)
                .then_some(self.engine.max_poll_attempts),
        }
    }

    pub fn restart_policy(&self) -> RestartPolicy {
        RestartPolicy {
            min_interval: Duration::from_millis(self.supervisor.restart_min_interval_ms),
            max_backoff: Duration::from_secs(self.supervisor.restart_max_backoff_secs),
        }
    }

    /// Shutdown drain budget: long enough for a request that is already in
    /// flight (a redemption is never abandoned) plus time to persist its code.
    pub fn drain_timeout(&self) -> Duration {
        Duration::from_secs(self.api.request_timeout_secs) + DRAIN_GRACE
    }

    pub fn dedup_scope(&self) -> DedupScope {
        match self.engine.dedup_scope {
            DedupScopeSetting::Shared => DedupScope::Shared,
            DedupScopeSetting::PerUnit => DedupScope::PerUnit,
        }
    }
}

use super::capability::EngineId;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Invalid value for '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
    #[error("Failed to parse calculator configuration: {0}")]
    Parse(String),
    #[error("Failed to read calculator configuration '{path}': {message}")]
    Io { path: String, message: String },
}

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;
pub const DEFAULT_JOB_NAME: &str = "phase";

/// Settings shared by every adapter the dispatcher creates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct CalculatorConfig {
    /// Engines in order of preference; the first one supporting the experiment type wins.
    pub preference: Vec<EngineId>,
    /// How often the master thread checks worker completion and cancellation.
    pub poll_interval_ms: u64,
    /// Upper bound on worker threads; `None` sizes the pool to the phase count.
    pub max_workers: Option<usize>,
    /// Run per-phase calculations on a worker pool instead of sequentially.
    pub parallel: bool,
    /// Stem of the transient structure files written for the simulator.
    pub job_name: String,
}

impl Default for CalculatorConfig {
    fn default() -> Self {
        Self {
            preference: EngineId::ALL.to_vec(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            max_workers: None,
            parallel: true,
            job_name: DEFAULT_JOB_NAME.to_string(),
        }
    }
}

impl CalculatorConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Number of workers for `jobs` independent tasks.
    pub fn worker_count(&self, jobs: usize) -> usize {
        let cap = self.max_workers.unwrap_or(jobs);
        jobs.min(cap).max(1)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_string_lossy().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |name: &'static str, reason: &str| ConfigError::InvalidParameter {
            name,
            reason: reason.to_string(),
        };
        if self.preference.is_empty() {
            return Err(invalid("preference", "at least one engine is required"));
        }
        if self.poll_interval_ms == 0 {
            return Err(invalid("poll_interval", "must be positive"));
        }
        if self.max_workers == Some(0) {
            return Err(invalid("max_workers", "must be positive"));
        }
        let name_ok = !self.job_name.is_empty()
            && self
                .job_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !name_ok {
            return Err(invalid(
                "job_name",
                "only ASCII letters, digits, '-' and '_' are allowed",
            ));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct CalculatorConfigBuilder {
    preference: Option<Vec<EngineId>>,
    poll_interval: Option<Duration>,
    max_workers: Option<usize>,
    parallel: Option<bool>,
    job_name: Option<String>,
}

impl CalculatorConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn preference(mut self, engines: Vec<EngineId>) -> Self {
        self.preference = Some(engines);
        self
    }
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }
    pub fn max_workers(mut self, workers: usize) -> Self {
        self.max_workers = Some(workers);
        self
    }
    pub fn parallel(mut self, enabled: bool) -> Self {
        self.parallel = Some(enabled);
        self
    }
    pub fn job_name(mut self, name: impl Into<String>) -> Self {
        self.job_name = Some(name.into());
        self
    }

    pub fn build(self) -> Result<CalculatorConfig, ConfigError> {
        let defaults = CalculatorConfig::default();
        let config = CalculatorConfig {
            preference: self.preference.unwrap_or(defaults.preference),
            poll_interval_ms: self
                .poll_interval
                .map(|d| d.as_millis() as u64)
                .unwrap_or(defaults.poll_interval_ms),
            max_workers: self.max_workers.or(defaults.max_workers),
            parallel: self.parallel.unwrap_or(defaults.parallel),
            job_name: self.job_name.unwrap_or(defaults.job_name),
        };
        config.validate()?;
        Ok(config)
    }
}

//! Pool and polling configuration structures.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Environment variable overriding [`PoolConfig::idle_backoff_ms`].
pub const ENV_IDLE_BACKOFF_MS: &str = "JOBQ_IDLE_BACKOFF_MS";
/// Environment variable overriding [`PoolConfig::dispatch_capacity`].
pub const ENV_DISPATCH_CAPACITY: &str = "JOBQ_DISPATCH_CAPACITY";
/// Environment variable overriding [`PoolConfig::shutdown_grace_ms`].
pub const ENV_SHUTDOWN_GRACE_MS: &str = "JOBQ_SHUTDOWN_GRACE_MS";
/// Environment variable overriding [`WaitConfig::poll_interval_ms`].
pub const ENV_POLL_INTERVAL_MS: &str = "JOBQ_POLL_INTERVAL_MS";

/// Worker pool configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Longest the claim loop sleeps after an empty pull.
    ///
    /// Stores with a notifier wake it earlier when work is scheduled.
    pub idle_backoff_ms: u64,
    /// Claimed tickets buffered per topic ahead of its execution loops.
    pub dispatch_capacity: usize,
    /// How long `run` waits for execution loops after cancellation.
    pub shutdown_grace_ms: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            idle_backoff_ms: 50,
            dispatch_capacity: 1,
            shutdown_grace_ms: 5_000,
        }
    }
}

impl PoolConfig {
    /// Default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the idle backoff.
    #[must_use]
    pub const fn with_idle_backoff_ms(mut self, ms: u64) -> Self {
        self.idle_backoff_ms = ms;
        self
    }

    /// Set the per-topic dispatch queue capacity.
    #[must_use]
    pub const fn with_dispatch_capacity(mut self, capacity: usize) -> Self {
        self.dispatch_capacity = capacity;
        self
    }

    /// Set the shutdown grace period.
    #[must_use]
    pub const fn with_shutdown_grace_ms(mut self, ms: u64) -> Self {
        self.shutdown_grace_ms = ms;
        self
    }

    /// Idle backoff as a duration.
    #[must_use]
    pub const fn idle_backoff(&self) -> Duration {
        Duration::from_millis(self.idle_backoff_ms)
    }

    /// Shutdown grace period as a duration.
    #[must_use]
    pub const fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }

    /// Validate pool configuration values.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.idle_backoff_ms == 0 {
            return Err("idle_backoff_ms must be greater than 0".into());
        }
        if self.dispatch_capacity == 0 {
            return Err("dispatch_capacity must be greater than 0".into());
        }
        if self.shutdown_grace_ms == 0 {
            return Err("shutdown_grace_ms must be greater than 0".into());
        }
        Ok(())
    }
}

/// Producer-side polling configuration for `wait`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitConfig {
    /// Interval between ticket reads.
    pub poll_interval_ms: u64,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
        }
    }
}

impl WaitConfig {
    /// Poll interval as a duration.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Validate polling configuration values.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.poll_interval_ms == 0 {
            return Err("poll_interval_ms must be greater than 0".into());
        }
        Ok(())
    }
}

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobQueueConfig {
    /// Worker pool settings.
    pub pool: PoolConfig,
    /// Job polling settings.
    pub wait: WaitConfig,
}

impl JobQueueConfig {
    /// Validate every section.
    ///
    /// # Errors
    ///
    /// Returns a description prefixed with the failing section.
    pub fn validate(&self) -> Result<(), String> {
        self.pool.validate().map_err(|e| format!("pool invalid: {e}"))?;
        self.wait.validate().map_err(|e| format!("wait invalid: {e}"))?;
        Ok(())
    }

    /// Parse configuration from a JSON string and validate.
    ///
    /// Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns a parse or validation message.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load overrides from the process environment, after reading `.env` if present.
    ///
    /// # Errors
    ///
    /// Returns a message naming any variable that does not parse, or a
    /// validation message.
    pub fn from_env() -> Result<Self, String> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary variable lookup over the defaults.
    ///
    /// # Errors
    ///
    /// Returns a message naming any variable that does not parse, or a
    /// validation message.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(v) = parse_var(&lookup, ENV_IDLE_BACKOFF_MS)? {
            cfg.pool.idle_backoff_ms = v;
        }
        if let Some(v) = parse_var(&lookup, ENV_DISPATCH_CAPACITY)? {
            cfg.pool.dispatch_capacity = v;
        }
        if let Some(v) = parse_var(&lookup, ENV_SHUTDOWN_GRACE_MS)? {
            cfg.pool.shutdown_grace_ms = v;
        }
        if let Some(v) = parse_var(&lookup, ENV_POLL_INTERVAL_MS)? {
            cfg.wait.poll_interval_ms = v;
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

fn parse_var<F, T>(lookup: &F, name: &str) -> Result<Option<T>, String>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    lookup(name)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| format!("{name}={raw:?}: {e}"))
        })
        .transpose()
}

/*!
 * Kernel Configuration
 *
 * Runtime configuration with defaults from `limits` and environment overrides.
 *
 * Environment variables:
 * - MEMSIM_TOTAL_MEMORY_MB: Pool capacity (default: 1024)
 * - MEMSIM_PID_BASE: First PID handed out (default: 1000)
 * - MEMSIM_DRAIN_INTERVAL_MS: Waiting-queue poll interval (default: 1000)
 * - MEMSIM_STATUS_INTERVAL_MS: Status view refresh (default: 2000)
 * - MEMSIM_OVERSIZE_POLICY: `reject` or `enqueue` (default: reject)
 * - MEMSIM_RECENT_EVENTS: Events kept for display (default: 5)
 */

use super::limits;
use super::types::{Megabytes, Pid};
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum ConfigError {
    #[error("Invalid value for {key}: '{value}' ({reason})")]
    #[diagnostic(
        code(config::invalid_value),
        help("Check the MEMSIM_* environment variables.")
    )]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
}

/// What to do with a request that can never fit in the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OversizePolicy {
    /// Fail the submission with `CapacityExceeded`
    #[default]
    Reject,
    /// Queue it anyway; it blocks the head of the queue forever
    Enqueue,
}

impl FromStr for OversizePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(Self::Reject),
            "enqueue" => Ok(Self::Enqueue),
            _ => Err(ConfigError::InvalidValue {
                key: "MEMSIM_OVERSIZE_POLICY",
                value: s.to_string(),
                reason: "expected 'reject' or 'enqueue'",
            }),
        }
    }
}

/// Kernel configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct KernelConfig {
    pub total_memory_mb: Megabytes,
    pub pid_base: Pid,
    pub drain_interval: Duration,
    pub status_interval: Duration,
    pub oversize_policy: OversizePolicy,
    pub recent_events: usize,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            total_memory_mb: limits::DEFAULT_TOTAL_MEMORY_MB,
            pid_base: limits::DEFAULT_PID_BASE,
            drain_interval: limits::DEFAULT_DRAIN_INTERVAL,
            status_interval: limits::DEFAULT_STATUS_INTERVAL,
            oversize_policy: OversizePolicy::default(),
            recent_events: limits::DEFAULT_RECENT_EVENTS,
        }
    }
}

impl KernelConfig {
    /// Defaults overlaid with MEMSIM_* environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (environment, test fixtures)
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(mb) = parse_var(&lookup, "MEMSIM_TOTAL_MEMORY_MB")? {
            config.total_memory_mb = mb;
        }
        if let Some(base) = parse_var(&lookup, "MEMSIM_PID_BASE")? {
            config.pid_base = base;
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, "MEMSIM_DRAIN_INTERVAL_MS")? {
            config.drain_interval = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, "MEMSIM_STATUS_INTERVAL_MS")? {
            config.status_interval = Duration::from_millis(ms);
        }
        if let Some(raw) = lookup("MEMSIM_OVERSIZE_POLICY") {
            config.oversize_policy = raw.parse()?;
        }
        if let Some(n) = parse_var(&lookup, "MEMSIM_RECENT_EVENTS")? {
            config.recent_events = n;
        }

        config.validate()?;
        Ok(config)
    }

    #[must_use]
    pub fn with_total_memory(mut self, total_memory_mb: Megabytes) -> Self {
        self.total_memory_mb = total_memory_mb;
        self
    }

    #[must_use]
    pub fn with_pid_base(mut self, pid_base: Pid) -> Self {
        self.pid_base = pid_base;
        self
    }

    #[must_use]
    pub fn with_drain_interval(mut self, interval: Duration) -> Self {
        self.drain_interval = interval;
        self
    }

    #[must_use]
    pub fn with_oversize_policy(mut self, policy: OversizePolicy) -> Self {
        self.oversize_policy = policy;
        self
    }

    /// Reject values the dispatcher cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.total_memory_mb == 0 {
            return Err(invalid("MEMSIM_TOTAL_MEMORY_MB", "0", "must be positive"));
        }
        if self.pid_base == 0 {
            return Err(invalid("MEMSIM_PID_BASE", "0", "must be positive"));
        }
        if self.drain_interval.is_zero() {
            return Err(invalid("MEMSIM_DRAIN_INTERVAL_MS", "0", "must be positive"));
        }
        if self.status_interval.is_zero() {
            return Err(invalid("MEMSIM_STATUS_INTERVAL_MS", "0", "must be positive"));
        }
        Ok(())
    }
}

fn invalid(key: &'static str, value: &str, reason: &'static str) -> ConfigError {
    ConfigError::InvalidValue {
        key,
        value: value.to_string(),
        reason,
    }
}

fn parse_var<T, F>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&'static str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| invalid(key, &raw, "not a valid number")),
    }
}

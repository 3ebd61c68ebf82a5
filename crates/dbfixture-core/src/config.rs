//! Fixture session configuration.

use serde::{Deserialize, Serialize};

use crate::error::{FixtureError, FixtureResult};
use crate::matcher::TimedPeriod;

/// Settings for one fixture session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixtureConfig {
    /// Owner applied to table names given without one.
    pub default_schema: Option<String>,
    /// Record a consistency marker at session start and flash touched tables
    /// back to it when the session finishes.
    pub restore: bool,
    /// Time budget for a polling match (milliseconds).
    pub match_timeout_ms: u64,
    /// Pause between match attempts (milliseconds).
    pub poll_interval_ms: u64,
}

impl Default for FixtureConfig {
    fn default() -> Self {
        Self {
            default_schema: None,
            restore: false,
            match_timeout_ms: 2_000,
            poll_interval_ms: 500,
        }
    }
}

impl FixtureConfig {
    /// Read overrides from the process environment.
    ///
    /// - `DBFIXTURE_DEFAULT_SCHEMA`
    /// - `DBFIXTURE_RESTORE` (`true`/`false`, `1`/`0`, `yes`/`no`)
    /// - `DBFIXTURE_MATCH_TIMEOUT_MS`
    /// - `DBFIXTURE_POLL_INTERVAL_MS`
    pub fn from_env() -> FixtureResult<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Same as [`FixtureConfig::from_env`] with an arbitrary variable lookup.
    pub fn from_vars<F>(lookup: F) -> FixtureResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(schema) = lookup("DBFIXTURE_DEFAULT_SCHEMA") {
            let schema = schema.trim();
            if !schema.is_empty() {
                config.default_schema = Some(schema.to_uppercase());
            }
        }
        if let Some(value) = lookup("DBFIXTURE_RESTORE") {
            config.restore = parse_flag("DBFIXTURE_RESTORE", &value)?;
        }
        if let Some(value) = lookup("DBFIXTURE_MATCH_TIMEOUT_MS") {
            config.match_timeout_ms = parse_millis("DBFIXTURE_MATCH_TIMEOUT_MS", &value)?;
        }
        if let Some(value) = lookup("DBFIXTURE_POLL_INTERVAL_MS") {
            config.poll_interval_ms = parse_millis("DBFIXTURE_POLL_INTERVAL_MS", &value)?;
        }

        Ok(config)
    }

    pub fn with_default_schema(mut self, schema: impl AsRef<str>) -> Self {
        self.default_schema = Some(schema.as_ref().trim().to_uppercase());
        self
    }

    pub fn with_restore(mut self, restore: bool) -> Self {
        self.restore = restore;
        self
    }

    pub fn with_period(mut self, match_timeout_ms: u64, poll_interval_ms: u64) -> Self {
        self.match_timeout_ms = match_timeout_ms;
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    pub fn timed_period(&self) -> TimedPeriod {
        TimedPeriod::from_millis(self.match_timeout_ms, self.poll_interval_ms)
    }
}

fn parse_flag(key: &str, value: &str) -> FixtureResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(FixtureError::Config(format!(
            "{key}: expected a boolean, got '{other}'"
        ))),
    }
}

fn parse_millis(key: &str, value: &str) -> FixtureResult<u64> {
    value
        .trim()
        .parse()
        .map_err(|e| FixtureError::Config(format!("{key}: '{value}' is not a number of milliseconds: {e}")))
}

//! Compiler configuration that downstream crates can serialize/deserialize.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Whether the session binlog stores the schema version of each statement.
    /// The recorder is invoked either way; this only controls whether it keeps the value.
    pub binlog_enabled: bool,

    /// Count compiled statements per classification label.
    pub metrics_enabled: bool,

    /// Number of published schema versions the domain keeps for snapshot reads.
    pub schema_history_capacity: usize,

    /// Current database of freshly opened sessions.
    pub default_database: Option<String>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            binlog_enabled: false,
            metrics_enabled: true,
            schema_history_capacity: 16,
            default_database: None,
        }
    }
}

impl CompilerConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `SQLFRONT_BINLOG_ENABLED`: `true`/`false`/`1`/`0`
    /// - `SQLFRONT_METRICS_ENABLED`: `true`/`false`/`1`/`0`
    /// - `SQLFRONT_SCHEMA_HISTORY`: retained schema versions
    /// - `SQLFRONT_DEFAULT_DB`: default database name
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(s) = std::env::var("SQLFRONT_BINLOG_ENABLED") {
            if let Some(v) = parse_bool(&s) {
                cfg.binlog_enabled = v;
            }
        }

        if let Ok(s) = std::env::var("SQLFRONT_METRICS_ENABLED") {
            if let Some(v) = parse_bool(&s) {
                cfg.metrics_enabled = v;
            }
        }

        if let Ok(s) = std::env::var("SQLFRONT_SCHEMA_HISTORY") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.schema_history_capacity = v;
            }
        }

        if let Ok(s) = std::env::var("SQLFRONT_DEFAULT_DB") {
            if !s.trim().is_empty() {
                cfg.default_database = Some(s.trim().to_string());
            }
        }

        cfg
    }

    pub fn validate(&self) -> Result<()> {
        if self.schema_history_capacity == 0 {
            return Err(Error::Config(
                "schema_history_capacity must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}

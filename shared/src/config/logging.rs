//! Log level and output format settings

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::environment::Environment;

/// Output format of log lines
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
    Compact,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `info,pv_core=debug`
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self::for_environment(Environment::default())
    }
}

impl LoggingConfig {
    /// Defaults per environment: verbose and readable locally, JSON once deployed
    pub fn for_environment(env: Environment) -> Self {
        let (level, format) = match env {
            Environment::Development => ("debug", LogFormat::Pretty),
            Environment::Staging => ("info", LogFormat::Json),
            Environment::Production => ("warn", LogFormat::Json),
        };
        Self {
            level: level.to_string(),
            format,
        }
    }

    pub fn from_env(env: Environment) -> Self {
        Self::from_vars(env, |key| std::env::var(key).ok())
    }

    /// Environment defaults overridden by `LOG_LEVEL` and `LOG_FORMAT`
    pub fn from_vars(env: Environment, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::for_environment(env);
        Self {
            level: lookup("LOG_LEVEL")
                .map(|level| level.trim().to_string())
                .filter(|level| !level.is_empty())
                .unwrap_or(defaults.level),
            format: lookup("LOG_FORMAT")
                .and_then(|format| format.parse().ok())
                .unwrap_or(defaults.format),
        }
    }
}

// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Serializer options and their environment source.

use std::str::FromStr;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::Level;

use crate::diagnostics::DEFAULT_DIAGNOSTIC_LIMIT;

/// Environment variable naming the diagnostic severity (`warn` by default).
pub const LEVEL_ENV: &str = "ECHO_HYDRATE_LOG_LEVEL";
/// Environment variable holding the per-call diagnostic cap (99 by default).
pub const LIMIT_ENV: &str = "ECHO_HYDRATE_LOG_LIMIT";

/// Error type for strict option parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Not one of `trace`, `debug`, `info`, `warn`, `error`.
    #[error("invalid diagnostic level: {0:?}")]
    InvalidLevel(String),
    /// Not a non-negative integer.
    #[error("invalid diagnostic limit: {0:?}")]
    InvalidLimit(String),
}

/// Knobs for one serialization call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerializeOptions {
    /// Severity at which unsupported-value diagnostics are reported.
    #[serde(with = "level_name")]
    pub level: Level,
    /// Maximum diagnostics delivered per call.
    pub diagnostic_limit: usize,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self {
            level: Level::WARN,
            diagnostic_limit: DEFAULT_DIAGNOSTIC_LIMIT,
        }
    }
}

impl SerializeOptions {
    /// Options read from [`LEVEL_ENV`] and [`LIMIT_ENV`]. Unset or malformed
    /// values fall back to the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`SerializeOptions::from_env`] with an injectable variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let level = lookup(LEVEL_ENV)
            .and_then(|raw| parse_level(&raw).ok())
            .unwrap_or(defaults.level);
        let diagnostic_limit = lookup(LIMIT_ENV)
            .and_then(|raw| parse_limit(&raw).ok())
            .unwrap_or(defaults.diagnostic_limit);
        Self {
            level,
            diagnostic_limit,
        }
    }

    /// Process-wide options, read from the environment on first use.
    pub fn global() -> &'static Self {
        static GLOBAL: OnceLock<SerializeOptions> = OnceLock::new();
        GLOBAL.get_or_init(Self::from_env)
    }
}

/// Parse a severity name (case-insensitive).
pub fn parse_level(raw: &str) -> Result<Level, ConfigError> {
    Level::from_str(raw.trim()).map_err(|_| ConfigError::InvalidLevel(raw.to_owned()))
}

/// Parse a diagnostic cap.
pub fn parse_limit(raw: &str) -> Result<usize, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::InvalidLimit(raw.to_owned()))
}

mod level_name {
    use serde::{de, Deserialize, Deserializer, Serializer};
    use tracing::Level;

    pub fn serialize<S: Serializer>(level: &Level, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&level.as_str().to_ascii_lowercase())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Level, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_level(&raw).map_err(de::Error::custom)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    fn lookup<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| (*v).to_owned())
        }
    }

    #[test]
    fn defaults_when_unset() {
        let options = SerializeOptions::from_lookup(lookup(&[]));
        assert_eq!(options, SerializeOptions::default());
        assert_eq!(options.level, Level::WARN);
        assert_eq!(options.diagnostic_limit, 99);
    }

    #[test]
    fn reads_both_variables() {
        let options =
            SerializeOptions::from_lookup(lookup(&[(LEVEL_ENV, "error"), (LIMIT_ENV, "5")]));
        assert_eq!(options.level, Level::ERROR);
        assert_eq!(options.diagnostic_limit, 5);
    }

    #[test]
    fn malformed_values_fall_back() {
        let options =
            SerializeOptions::from_lookup(lookup(&[(LEVEL_ENV, "loud"), (LIMIT_ENV, "lots")]));
        assert_eq!(options, SerializeOptions::default());
    }

    #[test]
    fn strict_parsers_report_errors() {
        assert_eq!(parse_level("INFO"), Ok(Level::INFO));
        assert_eq!(
            parse_level("loud"),
            Err(ConfigError::InvalidLevel("loud".into()))
        );
        assert_eq!(parse_limit(" 7 "), Ok(7));
        assert_eq!(
            parse_limit("-1"),
            Err(ConfigError::InvalidLimit("-1".into()))
        );
    }

    #[test]
    fn options_deserialize_from_json() {
        let options: SerializeOptions =
            serde_json::from_str(r#"{"level":"debug","diagnostic_limit":3}"#).expect("parse");
        assert_eq!(options.level, Level::DEBUG);
        assert_eq!(options.diagnostic_limit, 3);

        let partial: SerializeOptions = serde_json::from_str("{}").expect("parse");
        assert_eq!(partial, SerializeOptions::default());

        let json = serde_json::to_string(&options).expect("serialize");
        assert_eq!(json, r#"{"level":"debug","diagnostic_limit":3}"#);
    }
}

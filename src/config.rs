//! Matcher configuration: a single flag, loaded the way the teacher
//! loads its much larger config surface — YAML file first, then
//! environment-variable overrides.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

fn default_allow_suite_wide_matching() -> bool {
    false
}

/// Runtime-tunable behaviour of the match engine (spec §9, Open
/// Question: suite-wide cascade gating).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatcherConfig {
    /// When `false`, a trace-scoped miss on a non-empty trace id never
    /// falls through to suite scope. Pre-app-start spans and requests
    /// with no trace id still reach suite scope regardless — see
    /// `find_best_match_with_trace_priority` in `src/engine.rs`.
    #[serde(
        alias = "allowSuiteWideMatching",
        default = "default_allow_suite_wide_matching"
    )]
    pub allow_suite_wide_matching: bool,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        MatcherConfig {
            allow_suite_wide_matching: default_allow_suite_wide_matching(),
        }
    }
}

/// Errors raised while loading a [`MatcherConfig`].
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] config::ConfigError),
}

impl MatcherConfig {
    /// Parse a `MatcherConfig` directly from a YAML string. Used by
    /// tests and by [`Self::from_file`].
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let value: MatcherConfig = serde_yaml::from_str(yaml)
            .map_err(|err| ConfigLoadError::Parse(config::ConfigError::Message(err.to_string())))?;
        Ok(value)
    }

    /// Load from an optional YAML file at `path`, then layer
    /// `MOCKMATCHER_*` environment variables on top (e.g.
    /// `MOCKMATCHER_ALLOW_SUITE_WIDE_MATCHING=false`). The file is
    /// optional so a bare environment-only deployment still works.
    pub fn from_file(path: &Path) -> Result<Self, ConfigLoadError> {
        let builder = config::Config::builder()
            .set_default("allow_suite_wide_matching", false)?
            .add_source(
                config::File::from(path)
                    .format(config::FileFormat::Yaml)
                    .required(false),
            )
            .add_source(config::Environment::with_prefix("MOCKMATCHER").separator("__"));
        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }
}

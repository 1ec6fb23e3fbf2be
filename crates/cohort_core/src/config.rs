//! Editor and logging configuration.
//!
//! # Responsibility
//! - Group per-session view settings (`EditorConfig`).
//! - Resolve logging settings from the environment with build-mode defaults.

use crate::adapter::graph::GraphOptions;
use crate::adapter::spatial::SpatialLayout;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable overriding the log level.
pub const LOG_LEVEL_ENV: &str = "COHORT_DIAGRAM_LOG_LEVEL";
/// Environment variable overriding the log directory.
pub const LOG_DIR_ENV: &str = "COHORT_DIAGRAM_LOG_DIR";

const DEFAULT_LOG_DIR_NAME: &str = "cohort-diagram-logs";

/// Per-session view settings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub layout: SpatialLayout,
    pub graph: GraphOptions,
}

/// Logging bootstrap settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// One of `trace|debug|info|warn|error`, case-insensitive.
    pub level: String,
    /// Absolute directory for rolling log files.
    pub log_dir: PathBuf,
}

impl LogConfig {
    pub fn new(level: impl Into<String>, log_dir: impl Into<PathBuf>) -> Self {
        Self {
            level: level.into(),
            log_dir: log_dir.into(),
        }
    }

    /// Reads `COHORT_DIAGRAM_LOG_LEVEL` / `COHORT_DIAGRAM_LOG_DIR`.
    ///
    /// Blank or missing values fall back to `default_log_level()` and a
    /// directory under the system temp dir.
    pub fn from_env() -> Self {
        Self::resolve(
            std::env::var(LOG_LEVEL_ENV).ok(),
            std::env::var(LOG_DIR_ENV).ok(),
        )
    }

    fn resolve(level: Option<String>, log_dir: Option<String>) -> Self {
        let level = non_blank(level).unwrap_or_else(|| default_log_level().to_string());
        let log_dir = non_blank(log_dir)
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_LOG_DIR_NAME));
        Self { level, log_dir }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
}

/// Returns the default log level for current build mode.
///
/// - `debug` builds -> `debug`
/// - `release` builds -> `info`
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

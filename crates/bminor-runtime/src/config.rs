//! Runtime configuration read from the environment
//!
//! | Variable | Meaning | Default |
//! |---|---|---|
//! | `BMINOR_LOG` | `tracing` filter directive | `warn` |
//! | `BMINOR_CHECK_HANDLES` | validate C handles against the live table | on |
//! | `BMINOR_REPORT_LEAKS` | warn about live handles at shutdown | on |

use std::sync::OnceLock;

use derive_more::{Display, Error};

pub const LOG_VAR: &str = "BMINOR_LOG";
pub const CHECK_HANDLES_VAR: &str = "BMINOR_CHECK_HANDLES";
pub const REPORT_LEAKS_VAR: &str = "BMINOR_REPORT_LEAKS";

const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Display, Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[display("{var}: expected a boolean, got {value:?}")]
    InvalidBool { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub log_filter: String,
    pub check_handles: bool,
    pub report_leaks: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            check_handles: true,
            report_leaks: true,
        }
    }
}

static GLOBAL: OnceLock<RuntimeConfig> = OnceLock::new();

impl RuntimeConfig {
    /// Build a configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let log_filter = lookup(LOG_VAR)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or(defaults.log_filter);

        Ok(Self {
            log_filter,
            check_handles: parse_flag(CHECK_HANDLES_VAR, lookup(CHECK_HANDLES_VAR))?
                .unwrap_or(defaults.check_handles),
            report_leaks: parse_flag(REPORT_LEAKS_VAR, lookup(REPORT_LEAKS_VAR))?
                .unwrap_or(defaults.report_leaks),
        })
    }

    /// Read the process environment, falling back to defaults on bad values.
    pub fn from_env() -> Self {
        Self::from_lookup(|var| std::env::var(var).ok()).unwrap_or_else(|error| {
            tracing::warn!("ignoring runtime configuration: {error}");
            Self::default()
        })
    }

    /// The process-wide configuration, loaded from the environment on first use.
    pub fn global() -> &'static RuntimeConfig {
        GLOBAL.get_or_init(Self::from_env)
    }
}

fn parse_flag(var: &'static str, value: Option<String>) -> Result<Option<bool>, ConfigError> {
    let Some(value) = value else {
        return Ok(None);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "" => Ok(None),
        "1" | "true" | "yes" | "on" => Ok(Some(true)),
        "0" | "false" | "no" | "off" => Ok(Some(false)),
        _ => Err(ConfigError::InvalidBool { var, value }),
    }
}

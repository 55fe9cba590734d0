//! Tracing subscriber setup.
//!
//! The member crates log through the `log` facade; `init_logging` installs
//! a `tracing-subscriber` fmt subscriber that also captures those records.
//! Build with `--features logs-json` for one JSON object per line.

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use pwbackup_core::{BackupError, BackupResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingConfig {
    /// Filter directives used when `RUST_LOG` is not set.
    pub default_filter: String,
    /// Print the module path of each event.
    pub with_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default_filter: "pwbackup=info,pwbackup_core=info,pwbackup_interchange=info,pwbackup_chrome=info".into(),
            with_target: false,
        }
    }
}

/// `RUST_LOG` when set and valid, otherwise the configured default.
pub fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.default_filter))
}

/// Install the global subscriber. Fails with a `Config` error when one is
/// already installed.
pub fn init_logging(config: &LoggingConfig) -> BackupResult<()> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(config))
        .with_target(config.with_target);

    #[cfg(feature = "logs-json")]
    let result = builder.json().try_init();
    #[cfg(not(feature = "logs-json"))]
    let result = builder.try_init();

    result.map_err(|e| BackupError::config(format!("Failed to initialise logging: {e}")))
}

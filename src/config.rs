//! Application configuration, stored as JSON. Missing keys take their
//! defaults so older files keep loading.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use pwbackup_chrome::chrome::ChromeImportConfig;
use pwbackup_core::{BackupError, BackupResult};
use pwbackup_interchange::interchange::InterchangeConfig;

use crate::logging::LoggingConfig;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BackupConfig {
    pub interchange: InterchangeConfig,
    pub chrome: ChromeImportConfig,
    pub logging: LoggingConfig,
}

impl BackupConfig {
    pub fn from_json(json: &str) -> BackupResult<Self> {
        serde_json::from_str(json).map_err(|e| BackupError::config(format!("Invalid configuration: {e}")))
    }

    pub fn to_json(&self) -> BackupResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| BackupError::config(format!("Failed to serialize configuration: {e}")))
    }

    /// Read `path`; a file that does not exist yields the defaults.
    pub fn load(path: &Path) -> BackupResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn save(&self, path: &Path) -> BackupResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pwbackup_core::BackupErrorKind;
    use pwbackup_interchange::interchange::{ExportFormat, LineBreak};

    #[test]
    fn partial_file_fills_defaults() {
        let cfg = BackupConfig::from_json(r#"{"interchange":{"lineBreak":"crlf","defaultFormat":"csv"},"chrome":{"maxAttempts":5}}"#).unwrap();
        assert_eq!(cfg.interchange.line_break, LineBreak::CrLf);
        assert_eq!(cfg.interchange.default_format, ExportFormat::Csv);
        assert!(cfg.interchange.encrypt);
        assert_eq!(cfg.chrome.max_attempts, 5);
        assert_eq!(cfg.chrome.retry_interval_ms, 100);
        assert_eq!(cfg.logging, LoggingConfig::default());
    }

    #[test]
    fn bad_json_is_config_error() {
        let err = BackupConfig::from_json("{ nope").unwrap_err();
        assert_eq!(err.kind, BackupErrorKind::Config);
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("pwbackup.json");
        assert_eq!(BackupConfig::load(&path).unwrap(), BackupConfig::default());

        let mut cfg = BackupConfig::default();
        cfg.chrome.store_description = "Chromium".into();
        cfg.interchange.encrypt = false;
        cfg.save(&path).unwrap();
        assert_eq!(BackupConfig::load(&path).unwrap(), cfg);
    }
}

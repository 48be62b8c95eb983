use dirs::home_dir;
use serde::{Deserialize, Serialize};
use std::{
    env,
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use crate::currency::{CurrencyCode, LocaleConfig, MoneyFormat};
use crate::errors::ConfigError;

const DEFAULT_DIR_NAME: &str = ".bank_ledger";
const CONFIG_FILE: &str = "config.json";
const TMP_SUFFIX: &str = "tmp";
const HOME_ENV: &str = "BANK_LEDGER_HOME";

/// Tunables for a ledger instance and the terminal host.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LedgerConfig {
    pub currency: CurrencyCode,
    pub locale: LocaleConfig,
    /// Default number of entries returned by the recent-transactions view.
    pub recent_limit: usize,
    pub account_prefix: String,
    pub first_account_number: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            currency: CurrencyCode::default(),
            locale: LocaleConfig::default(),
            recent_limit: 5,
            account_prefix: "ACC".into(),
            first_account_number: 1001,
        }
    }
}

impl LedgerConfig {
    pub fn money_format(&self) -> MoneyFormat {
        MoneyFormat::new(self.currency.clone(), self.locale.clone())
    }
}

/// Returns the application data directory, defaulting to `~/.bank_ledger`.
pub fn app_data_dir() -> PathBuf {
    if let Some(custom) = env::var_os(HOME_ENV) {
        return PathBuf::from(custom);
    }
    home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_DIR_NAME)
}

/// Loads and stores [`LedgerConfig`] as pretty-printed JSON.
pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Self {
        Self::with_base_dir(app_data_dir())
    }

    pub fn with_base_dir(base: impl Into<PathBuf>) -> Self {
        Self {
            path: base.into().join(CONFIG_FILE),
        }
    }

    /// Reads the config file, falling back to defaults when it does not exist.
    pub fn load(&self) -> Result<LedgerConfig, ConfigError> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "no config file, using defaults");
            return Ok(LedgerConfig::default());
        }
        let data = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&data)?)
    }

    pub fn save(&self, config: &LedgerConfig) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(config)?;
        let tmp = tmp_path(&self.path);
        let mut file = File::create(&tmp)?;
        file.write_all(json.as_bytes())?;
        file.flush()?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() {
        let temp = tempdir().unwrap();
        let manager = ConfigManager::with_base_dir(temp.path());
        assert_eq!(manager.load().unwrap(), LedgerConfig::default());
    }

    #[test]
    fn partial_file_fills_remaining_fields() {
        let temp = tempdir().unwrap();
        let manager = ConfigManager::with_base_dir(temp.path());
        fs::write(manager.path(), r#"{ "recent_limit": 10 }"#).unwrap();

        let config = manager.load().unwrap();
        assert_eq!(config.recent_limit, 10);
        assert_eq!(config.account_prefix, "ACC");
    }

    #[test]
    fn save_then_load_preserves_values() {
        let temp = tempdir().unwrap();
        let manager = ConfigManager::with_base_dir(temp.path().join("nested"));
        let config = LedgerConfig {
            currency: CurrencyCode::new("eur"),
            account_prefix: "BNK".into(),
            ..LedgerConfig::default()
        };
        manager.save(&config).unwrap();

        assert_eq!(manager.load().unwrap(), config);
        assert!(!tmp_path(manager.path()).exists());
    }

    #[test]
    fn malformed_file_reports_serde_error() {
        let temp = tempdir().unwrap();
        let manager = ConfigManager::with_base_dir(temp.path());
        fs::write(manager.path(), "{ not json").unwrap();

        let err = manager.load().expect_err("malformed config must fail");
        assert!(matches!(err, ConfigError::Serde(_)), "unexpected error: {err:?}");
    }
}

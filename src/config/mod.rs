#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::adapters::storage::FileBillStore;
use crate::core::validator::NumberLocale;
use crate::domain::model::BillFormat;
use crate::utils::error::ConfigError;
use crate::utils::validation::{validate_distinct, validate_path, validate_separator, Validate};
use std::path::PathBuf;
use toml_config::TomlConfig;

/// Values given on the command line; `None` defers to the file or defaults.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub root_dir: Option<PathBuf>,
    pub format: Option<BillFormat>,
    pub verbose: bool,
    pub log_json: bool,
}

/// Fully resolved settings: defaults, then the TOML file, then overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub root_dir: PathBuf,
    pub default_format: BillFormat,
    pub locale: NumberLocale,
    pub verbose: bool,
    pub log_json: bool,
}

impl Settings {
    pub fn resolve(file: Option<&TomlConfig>, overrides: Overrides) -> Result<Self, ConfigError> {
        if let Some(file) = file {
            file.validate()?;
        }

        let root_dir = overrides
            .root_dir
            .or_else(|| file.and_then(TomlConfig::root_dir).map(PathBuf::from))
            .or_else(FileBillStore::default_root)
            .ok_or_else(|| ConfigError::InvalidValue {
                field: "storage.root_dir".to_string(),
                value: String::new(),
                reason: "No local data directory on this platform; set a root directory"
                    .to_string(),
            })?;

        let default_format = overrides
            .format
            .or_else(|| file.and_then(TomlConfig::default_format).map(BillFormat::from_name))
            .unwrap_or_default();

        let detected = NumberLocale::from_env();
        let locale = match (
            file.and_then(TomlConfig::decimal_separator),
            file.and_then(TomlConfig::group_separator),
        ) {
            (Some(decimal_separator), Some(group_separator)) => NumberLocale {
                decimal_separator,
                group_separator,
            },
            (Some(decimal_separator), None) => detected.with_decimal_separator(decimal_separator),
            (None, Some(group_separator)) => detected.with_group_separator(group_separator),
            (None, None) => detected,
        };

        let settings = Self {
            root_dir,
            default_format,
            locale,
            verbose: overrides.verbose || file.is_some_and(TomlConfig::verbose),
            log_json: overrides.log_json || file.is_some_and(TomlConfig::log_json),
        };
        settings.validate()?;
        Ok(settings)
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<(), ConfigError> {
        validate_path("storage.root_dir", &self.root_dir.to_string_lossy())?;
        validate_separator("locale.decimal_separator", self.locale.decimal_separator)?;
        validate_separator("locale.group_separator", self.locale.group_separator)?;
        validate_distinct(
            "locale",
            self.locale.decimal_separator,
            self.locale.group_separator,
        )
    }
}

use crate::utils::error::ConfigError;
use crate::utils::validation::{validate_distinct, validate_path, validate_separator, Validate};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;

static ENV_VAR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is a valid regex"));

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    pub storage: Option<StorageConfig>,
    pub locale: Option<LocaleConfig>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    pub root_dir: Option<String>,
    pub default_format: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LocaleConfig {
    pub decimal_separator: Option<char>,
    pub group_separator: Option<char>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    pub verbose: Option<bool>,
    pub json: Option<bool>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// Parses TOML text after expanding `${VAR}` references.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let processed_content = Self::substitute_env_vars(content);
        Ok(toml::from_str(&processed_content)?)
    }

    /// Unknown variables stay as written so the validation error shows them.
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR_PATTERN
            .replace_all(content, |caps: &Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    pub fn root_dir(&self) -> Option<&str> {
        self.storage.as_ref()?.root_dir.as_deref()
    }

    pub fn default_format(&self) -> Option<&str> {
        self.storage.as_ref()?.default_format.as_deref()
    }

    pub fn decimal_separator(&self) -> Option<char> {
        self.locale.as_ref()?.decimal_separator
    }

    pub fn group_separator(&self) -> Option<char> {
        self.locale.as_ref()?.group_separator
    }

    pub fn verbose(&self) -> bool {
        self.logging.as_ref().and_then(|l| l.verbose).unwrap_or(false)
    }

    pub fn log_json(&self) -> bool {
        self.logging.as_ref().and_then(|l| l.json).unwrap_or(false)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(root_dir) = self.root_dir() {
            validate_path("storage.root_dir", root_dir)?;
            if ENV_VAR_PATTERN.is_match(root_dir) {
                return Err(ConfigError::InvalidValue {
                    field: "storage.root_dir".to_string(),
                    value: root_dir.to_string(),
                    reason: "References an environment variable that is not set".to_string(),
                });
            }
        }

        if let Some(separator) = self.decimal_separator() {
            validate_separator("locale.decimal_separator", separator)?;
        }
        if let Some(separator) = self.group_separator() {
            validate_separator("locale.group_separator", separator)?;
        }
        if let (Some(decimal), Some(group)) = (self.decimal_separator(), self.group_separator()) {
            validate_distinct("locale", decimal, group)?;
        }

        Ok(())
    }
}

pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliConfig;

pub use adapters::storage::FileBillStore;
pub use config::{toml_config::TomlConfig, Overrides, Settings};
pub use core::service::{BillService, SubmitOutcome, ViewOutcome};
pub use core::validator::{BillValidationService, NumberLocale};
pub use domain::model::{Bill, BillForm, BillFormat, StoredBill, ValidatedBill, ValidationOutcome};
pub use domain::ports::{BillStore, BillValidator};
pub use utils::error::{ConfigError, Result, StorageError, StorageFailure};

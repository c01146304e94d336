use thiserror::Error;

pub const SAVE_FAILED_MESSAGE: &str =
    "Unable to save bill to disk. Please check file permissions and try again.";
pub const LOAD_FAILED_MESSAGE: &str = "Unable to load the last saved bill.";

/// The only error kinds that leave the storage layer.
///
/// `Display` is the user-facing message; the underlying cause is kept as
/// the error `source()` for diagnostics.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("{}", SAVE_FAILED_MESSAGE)]
    Save {
        #[source]
        source: StorageFailure,
    },

    #[error("{}", LOAD_FAILED_MESSAGE)]
    Load {
        #[source]
        source: StorageFailure,
    },
}

impl StorageError {
    pub fn save(source: impl Into<StorageFailure>) -> Self {
        Self::Save {
            source: source.into(),
        }
    }

    pub fn load(source: impl Into<StorageFailure>) -> Self {
        Self::Load {
            source: source.into(),
        }
    }

    pub fn failure(&self) -> &StorageFailure {
        match self {
            Self::Save { source } | Self::Load { source } => source,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        self.to_string()
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match (self, self.failure()) {
            (_, StorageFailure::InvalidFileName { .. }) => {
                "Use a file name of 1-10 letters, numbers, or underscores"
            }
            (Self::Save { .. }, StorageFailure::Io(_)) => {
                "Check that the data directory exists, is writable, and the disk is not full"
            }
            (Self::Load { .. }, StorageFailure::Io(_)) => {
                "Check that the data directory is readable"
            }
            (_, StorageFailure::Serialization(_)) => {
                "The last bill pointer is corrupted; saving a new bill will replace it"
            }
        }
    }
}

/// Underlying cause of a [`StorageError`].
#[derive(Error, Debug)]
pub enum StorageFailure {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid file name '{name}': {reason}")]
    InvalidFileName { name: String, reason: String },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, StorageError>;

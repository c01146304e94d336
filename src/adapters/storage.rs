//! Filesystem-backed bill store.
//!
//! ```text
//! <root>/
//! ├── lastBill.json        ← pointer to the most recent save
//! └── Bills/
//!     ├── lunch1.json
//!     └── taxi.txt
//! ```
//!
//! Every file is written to a sibling `*.tmp` file first and renamed into
//! place, so readers see either the old content or the new content.

use crate::domain::model::{Bill, BillFormat, StoredBill};
use crate::domain::ports::BillStore;
use crate::utils::error::{Result, StorageError, StorageFailure};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

pub const APP_DIR_NAME: &str = "BillManager";
pub const BILLS_DIR_NAME: &str = "Bills";
pub const LAST_BILL_FILE_NAME: &str = "lastBill.json";

const CREATED_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// On-disk shape of `lastBill.json`. Fields are optional so a partial
/// pointer parses and is then reported as "nothing saved yet".
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct LastBillPointer {
    #[serde(default, alias = "filePath")]
    file_path: Option<String>,
    #[serde(default, alias = "format")]
    format: BillFormat,
    #[serde(default, alias = "bill")]
    bill: Option<Bill>,
}

impl LastBillPointer {
    fn into_stored(self) -> Option<StoredBill> {
        let file_path = self.file_path.filter(|path| !path.trim().is_empty())?;
        let bill = self.bill?;
        Some(StoredBill {
            bill,
            file_path: PathBuf::from(file_path),
            format: self.format,
        })
    }
}

#[derive(Debug, Clone)]
pub struct FileBillStore {
    bills_dir: PathBuf,
    pointer_path: PathBuf,
}

impl FileBillStore {
    /// Opens a store rooted at `root`, creating `<root>/Bills` if needed.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = std::path::absolute(root.as_ref()).map_err(StorageError::save)?;
        let store = Self {
            bills_dir: root.join(BILLS_DIR_NAME),
            pointer_path: root.join(LAST_BILL_FILE_NAME),
        };

        std::fs::create_dir_all(&store.bills_dir).map_err(|e| {
            tracing::error!("Cannot create bills directory {:?}: {}", store.bills_dir, e);
            StorageError::save(e)
        })?;
        tracing::debug!("Bill store ready at {:?}", root);

        Ok(store)
    }

    /// `<local data dir>/BillManager`, when the platform has one.
    pub fn default_root() -> Option<PathBuf> {
        dirs::data_local_dir().map(|dir| dir.join(APP_DIR_NAME))
    }

    pub fn bills_dir(&self) -> &Path {
        &self.bills_dir
    }

    pub fn pointer_path(&self) -> &Path {
        &self.pointer_path
    }

    pub fn bill_path(&self, file_name: &str, format: BillFormat) -> PathBuf {
        self.bills_dir
            .join(format!("{}{}", file_name, format.extension()))
    }

    async fn write_bill(
        &self,
        bill: &Bill,
        file_name: &str,
        format: BillFormat,
    ) -> std::result::Result<StoredBill, StorageFailure> {
        tokio::fs::create_dir_all(&self.bills_dir).await?;
        let final_path = self.bill_path(file_name, format);

        let content = match format {
            BillFormat::Json => serde_json::to_string_pretty(bill)?,
            BillFormat::Text => bill.render(CREATED_FORMAT),
        };
        tracing::debug!("Writing {} bytes to {:?}", content.len(), final_path);
        write_atomic(&final_path, content.as_bytes()).await?;

        let pointer = LastBillPointer {
            file_path: Some(final_path.to_string_lossy().into_owned()),
            format,
            bill: Some(bill.clone()),
        };
        let pointer_json = serde_json::to_string_pretty(&pointer)?;
        write_atomic(&self.pointer_path, pointer_json.as_bytes()).await?;

        Ok(StoredBill {
            bill: bill.clone(),
            file_path: final_path,
            format,
        })
    }

    async fn read_pointer(&self) -> std::result::Result<Option<StoredBill>, StorageFailure> {
        let bytes = match tokio::fs::read(&self.pointer_path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("No last bill pointer at {:?}", self.pointer_path);
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let pointer: Option<LastBillPointer> = serde_json::from_slice(&bytes)?;
        let stored = pointer.and_then(LastBillPointer::into_stored);
        if stored.is_none() {
            tracing::warn!(
                "Last bill pointer {:?} is incomplete, treating as empty",
                self.pointer_path
            );
        }
        Ok(stored)
    }
}

#[async_trait]
impl BillStore for FileBillStore {
    async fn save(&self, bill: &Bill, file_name: &str, format: BillFormat) -> Result<StoredBill> {
        check_file_name(file_name).map_err(StorageError::save)?;

        match self.write_bill(bill, file_name, format).await {
            Ok(stored) => {
                tracing::info!("Saved bill to {:?} ({})", stored.file_path, format);
                Ok(stored)
            }
            Err(e) => {
                tracing::error!("Saving bill '{}' failed: {}", file_name, e);
                Err(StorageError::save(e))
            }
        }
    }

    async fn load_last(&self) -> Result<Option<StoredBill>> {
        match self.read_pointer().await {
            Ok(stored) => {
                if let Some(stored) = &stored {
                    tracing::info!("Loaded last bill from {:?}", stored.file_path);
                }
                Ok(stored)
            }
            Err(e) => {
                tracing::error!("Reading {:?} failed: {}", self.pointer_path, e);
                Err(StorageError::load(e))
            }
        }
    }
}

/// Names reaching the store should already be sanitized; this only keeps
/// them from escaping the bills directory.
fn check_file_name(file_name: &str) -> std::result::Result<(), StorageFailure> {
    let reason = if file_name.trim().is_empty() {
        Some("File name cannot be empty")
    } else if file_name.contains(['/', '\\', '\0']) || file_name == "." || file_name == ".." {
        Some("File name cannot contain path components")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(StorageFailure::InvalidFileName {
            name: file_name.to_string(),
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}

async fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut temp_name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_else(|| OsString::from("bill"));
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);

    let result: std::io::Result<()> = async {
        let mut file = tokio::fs::File::create(&temp_path).await?;
        file.write_all(contents).await?;
        file.sync_all().await?;
        drop(file);
        tokio::fs::rename(&temp_path, path).await
    }
    .await;

    if result.is_err() {
        let _ = tokio::fs::remove_file(&temp_path).await;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeZone};
    use rust_decimal::Decimal;
    use std::str::FromStr;
    use tempfile::TempDir;

    fn bill(description: &str, price: &str, items: u8) -> Bill {
        Bill::new(
            description.to_string(),
            Decimal::from_str(price).unwrap(),
            items,
            Local.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap(),
        )
    }

    #[test]
    fn test_check_file_name() {
        assert!(check_file_name("lunch1").is_ok());
        assert!(check_file_name("").is_err());
        assert!(check_file_name("   ").is_err());
        assert!(check_file_name("../escape").is_err());
        assert!(check_file_name("..").is_err());
    }

    #[test]
    fn test_open_creates_bills_dir_idempotently() {
        let temp_dir = TempDir::new().unwrap();
        let first = FileBillStore::open(temp_dir.path()).unwrap();
        let second = FileBillStore::open(temp_dir.path()).unwrap();

        assert!(first.bills_dir().is_dir());
        assert_eq!(first.bills_dir(), second.bills_dir());
        assert_eq!(first.pointer_path(), temp_dir.path().join(LAST_BILL_FILE_NAME));
    }

    #[tokio::test]
    async fn test_pointer_is_structured_json_for_text_bills() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileBillStore::open(temp_dir.path()).unwrap();

        store
            .save(&bill("Taxi", "7.25", 1), "taxi", BillFormat::Text)
            .await
            .unwrap();

        let raw = std::fs::read_to_string(store.pointer_path()).unwrap();
        let pointer: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(pointer["Format"], "Text");
        assert!(pointer["FilePath"].as_str().unwrap().ends_with("taxi.txt"));
        assert_eq!(pointer["Bill"]["Description"], "Taxi");
        assert_eq!(pointer["Bill"]["Items"], 1);
    }

    #[tokio::test]
    async fn test_save_leaves_no_temp_files() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileBillStore::open(temp_dir.path()).unwrap();

        store
            .save(&bill("Lunch", "12.50", 2), "lunch1", BillFormat::Json)
            .await
            .unwrap();

        let leftovers: Vec<_> = std::fs::read_dir(store.bills_dir())
            .unwrap()
            .chain(std::fs::read_dir(temp_dir.path()).unwrap())
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn test_empty_file_name_is_a_save_error() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileBillStore::open(temp_dir.path()).unwrap();

        let err = store
            .save(&bill("Lunch", "12.50", 2), "  ", BillFormat::Json)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StorageError::Save {
                source: StorageFailure::InvalidFileName { .. }
            }
        ));
    }

    #[tokio::test]
    async fn test_null_pointer_is_absent() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileBillStore::open(temp_dir.path()).unwrap();
        std::fs::write(store.pointer_path(), "null").unwrap();

        assert!(store.load_last().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_blank_file_path_is_absent() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileBillStore::open(temp_dir.path()).unwrap();
        let json = r#"{
  "FilePath": "  ",
  "Format": "Json",
  "Bill": {"Description":"Lunch","Price":12.5,"Items":2,"CreatedAt":"2024-05-01T12:30:00+00:00"}
}"#;
        std::fs::write(store.pointer_path(), json).unwrap();

        assert!(store.load_last().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_offsetless_created_at_loads_as_local_time() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileBillStore::open(temp_dir.path()).unwrap();
        let json = r#"{
  "FilePath": "/data/Bills/lunch1.json",
  "Format": "Json",
  "Bill": {"Description":"Lunch","Price":12.5,"Items":2,"CreatedAt":"2024-05-01T12:30:00"}
}"#;
        std::fs::write(store.pointer_path(), json).unwrap();

        let stored = store.load_last().await.unwrap().unwrap();
        assert_eq!(
            stored.bill.created_at(),
            Local.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap()
        );
    }

    #[tokio::test]
    async fn test_numeric_format_codes_load() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileBillStore::open(temp_dir.path()).unwrap();

        for (code, format) in [(0, BillFormat::Json), (1, BillFormat::Text)] {
            let json = format!(
                r#"{{"FilePath":"/data/Bills/x.txt","Format":{},"Bill":{{"Description":"Lunch","Price":12.5,"Items":2,"CreatedAt":"2024-05-01T12:30:00.1234567"}}}}"#,
                code
            );
            std::fs::write(store.pointer_path(), json).unwrap();

            let stored = store.load_last().await.unwrap().unwrap();
            assert_eq!(stored.format, format);
        }
    }

    #[tokio::test]
    async fn test_unreadable_timestamp_is_a_load_error() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileBillStore::open(temp_dir.path()).unwrap();
        let json = r#"{"FilePath":"/x.json","Format":"Json","Bill":{"Description":"Lunch","Price":1,"Items":2,"CreatedAt":"someday"}}"#;
        std::fs::write(store.pointer_path(), json).unwrap();

        assert!(matches!(
            store.load_last().await.unwrap_err(),
            StorageError::Load { .. }
        ));
    }
}

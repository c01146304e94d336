use crate::domain::model::{Bill, BillFormat, BillForm, StoredBill, ValidationOutcome};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait BillValidator: Send + Sync {
    fn validate(&self, form: &BillForm) -> ValidationOutcome;
}

#[async_trait]
pub trait BillStore: Send + Sync {
    /// Writes the bill under `file_name` and repoints the last-bill pointer at it.
    async fn save(&self, bill: &Bill, file_name: &str, format: BillFormat) -> Result<StoredBill>;

    /// `Ok(None)` means nothing usable has been saved yet.
    async fn load_last(&self) -> Result<Option<StoredBill>>;
}

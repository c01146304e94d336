use crate::domain::model::{BillForm, BillFormat, StoredBill, ValidationOutcome};
use crate::domain::ports::{BillStore, BillValidator};
use std::sync::atomic::{AtomicBool, Ordering};

pub const INVALID_FORM_MESSAGE: &str = "Please correct the highlighted validation errors.";
pub const NO_BILL_MESSAGE: &str = "No bill information is available yet.";
pub const LOADED_MESSAGE: &str = "Last bill loaded successfully.";
pub const BUSY_MESSAGE: &str = "A bill is already being saved.";

const DETAILS_CREATED_FORMAT: &str = "%A, %B %-d, %Y %H:%M";

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Saved {
        stored: StoredBill,
        summary: String,
        message: String,
    },
    Invalid {
        errors: Vec<String>,
    },
    Failed {
        message: String,
    },
    Busy,
}

impl SubmitOutcome {
    pub fn status_message(&self) -> &str {
        match self {
            Self::Saved { message, .. } | Self::Failed { message } => message,
            Self::Invalid { .. } => INVALID_FORM_MESSAGE,
            Self::Busy => BUSY_MESSAGE,
        }
    }

    pub fn is_error(&self) -> bool {
        !matches!(self, Self::Saved { .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewOutcome {
    Loaded {
        stored: StoredBill,
        summary: String,
        details: String,
    },
    Empty,
    Failed {
        message: String,
    },
}

impl ViewOutcome {
    pub fn status_message(&self) -> &str {
        match self {
            Self::Loaded { .. } => LOADED_MESSAGE,
            Self::Empty => NO_BILL_MESSAGE,
            Self::Failed { message } => message,
        }
    }

    pub fn is_error(&self) -> bool {
        !matches!(self, Self::Loaded { .. })
    }
}

/// Drives validation and storage for a front end, reporting each step as
/// a value instead of mutating shared status.
pub struct BillService<V: BillValidator, S: BillStore> {
    validator: V,
    store: S,
    saving: AtomicBool,
}

impl<V: BillValidator, S: BillStore> BillService<V, S> {
    pub fn new(validator: V, store: S) -> Self {
        Self {
            validator,
            store,
            saving: AtomicBool::new(false),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn is_saving(&self) -> bool {
        self.saving.load(Ordering::Acquire)
    }

    pub async fn submit(&self, form: &BillForm, format: BillFormat) -> SubmitOutcome {
        let Some(_guard) = SavingGuard::acquire(&self.saving) else {
            tracing::warn!("Ignoring submit while a save is in flight");
            return SubmitOutcome::Busy;
        };

        let validated = match self.validator.validate(form) {
            ValidationOutcome::Valid(validated) => validated,
            ValidationOutcome::Invalid(errors) => {
                tracing::info!("Bill form has {} validation error(s)", errors.len());
                return SubmitOutcome::Invalid { errors };
            }
        };

        match self
            .store
            .save(&validated.bill, &validated.file_name, format)
            .await
        {
            Ok(stored) => {
                let file_name = stored.file_name();
                SubmitOutcome::Saved {
                    summary: format!("Saved as {} ({})", file_name, stored.format),
                    message: format!("Bill successfully saved as {}", file_name),
                    stored,
                }
            }
            Err(e) => {
                tracing::error!("{} ({})", e, e.failure());
                tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
                SubmitOutcome::Failed {
                    message: e.user_friendly_message(),
                }
            }
        }
    }

    pub async fn view_last(&self) -> ViewOutcome {
        match self.store.load_last().await {
            Ok(Some(stored)) => ViewOutcome::Loaded {
                summary: format!("Last saved file: {} ({})", stored.file_name(), stored.format),
                details: stored.bill.render(DETAILS_CREATED_FORMAT),
                stored,
            },
            Ok(None) => ViewOutcome::Empty,
            Err(e) => {
                tracing::error!("{} ({})", e, e.failure());
                ViewOutcome::Failed {
                    message: e.user_friendly_message(),
                }
            }
        }
    }
}

/// Clears the in-flight flag when the submit finishes or its future is dropped.
struct SavingGuard<'a>(&'a AtomicBool);

impl<'a> SavingGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for SavingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::validator::{BillValidationService, NumberLocale, FILENAME_ERROR};
    use crate::domain::model::Bill;
    use crate::utils::error::{Result, StorageError};
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryStore {
        last: Mutex<Option<StoredBill>>,
        fail: bool,
    }

    #[async_trait]
    impl BillStore for MemoryStore {
        async fn save(&self, bill: &Bill, file_name: &str, format: BillFormat) -> Result<StoredBill> {
            if self.fail {
                return Err(StorageError::save(std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "read-only",
                )));
            }
            let stored = StoredBill {
                bill: bill.clone(),
                file_path: format!("/data/Bills/{}{}", file_name, format.extension()).into(),
                format,
            };
            *self.last.lock().unwrap() = Some(stored.clone());
            Ok(stored)
        }

        async fn load_last(&self) -> Result<Option<StoredBill>> {
            if self.fail {
                return Err(StorageError::load(std::io::Error::other("unreadable")));
            }
            Ok(self.last.lock().unwrap().clone())
        }
    }

    fn service(store: MemoryStore) -> BillService<BillValidationService, MemoryStore> {
        BillService::new(BillValidationService::new(NumberLocale::INVARIANT), store)
    }

    #[test]
    fn test_submit_then_view() {
        let service = service(MemoryStore::default());

        let outcome = tokio_test::block_on(
            service.submit(&BillForm::new("Lunch", "12.50", "2", "lunch1"), BillFormat::Text),
        );
        match &outcome {
            SubmitOutcome::Saved { summary, message, .. } => {
                assert_eq!(summary, "Saved as lunch1.txt (TEXT)");
                assert_eq!(message, "Bill successfully saved as lunch1.txt");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(!outcome.is_error());
        assert!(!service.is_saving());

        let view = tokio_test::block_on(service.view_last());
        match view {
            ViewOutcome::Loaded { summary, details, .. } => {
                assert_eq!(summary, "Last saved file: lunch1.txt (TEXT)");
                assert!(details.starts_with("Description: Lunch\nPrice: 12.50\nItems: 2\n"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_invalid_form_is_not_saved() {
        let service = service(MemoryStore::default());

        let outcome = tokio_test::block_on(
            service.submit(&BillForm::new("Lunch", "12.50", "2", "no good"), BillFormat::Json),
        );
        assert_eq!(
            outcome,
            SubmitOutcome::Invalid {
                errors: vec![FILENAME_ERROR.to_string()]
            }
        );
        assert_eq!(outcome.status_message(), INVALID_FORM_MESSAGE);
        assert_eq!(tokio_test::block_on(service.view_last()), ViewOutcome::Empty);
    }

    #[test]
    fn test_storage_failures_become_messages() {
        let service = service(MemoryStore {
            fail: true,
            ..MemoryStore::default()
        });

        let outcome = tokio_test::block_on(
            service.submit(&BillForm::new("Lunch", "12.50", "2", "lunch1"), BillFormat::Json),
        );
        assert_eq!(
            outcome.status_message(),
            "Unable to save bill to disk. Please check file permissions and try again."
        );

        let view = tokio_test::block_on(service.view_last());
        assert_eq!(view.status_message(), "Unable to load the last saved bill.");
        assert!(view.is_error());
    }

    #[test]
    fn test_busy_while_saving() {
        let service = service(MemoryStore::default());
        let _guard = SavingGuard::acquire(&service.saving).unwrap();

        let outcome = tokio_test::block_on(
            service.submit(&BillForm::new("Lunch", "12.50", "2", "lunch1"), BillFormat::Json),
        );
        assert_eq!(outcome, SubmitOutcome::Busy);
    }

    #[test]
    fn test_guard_releases_flag() {
        let flag = AtomicBool::new(false);
        {
            let _guard = SavingGuard::acquire(&flag).unwrap();
            assert!(SavingGuard::acquire(&flag).is_none());
        }
        assert!(SavingGuard::acquire(&flag).is_some());
    }
}

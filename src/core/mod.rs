pub mod service;
pub mod validator;

pub use crate::domain::model::{
    Bill, BillForm, BillFormat, StoredBill, ValidatedBill, ValidationOutcome,
};
pub use crate::domain::ports::{BillStore, BillValidator};
pub use crate::utils::error::Result;

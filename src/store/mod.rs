pub mod csv_store;

pub use csv_store::PatientStore;

use thiserror::Error;

use crate::models::ValidationError;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Patient ID {patient_id} already exists")]
    DuplicateKey { patient_id: String },

    #[error("Patient not found: {patient_id}")]
    NotFound { patient_id: String },

    #[error("Unknown field: {0}")]
    InvalidField(String),

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),
}

impl From<csv::Error> for StoreError {
    fn from(err: csv::Error) -> Self {
        StoreError::Storage(err.into())
    }
}

impl StoreError {
    /// True when the backing file could not be read or written.
    pub fn is_storage(&self) -> bool {
        matches!(self, StoreError::Storage(_))
    }
}

//! Application state shared by every API request.
//!
//! `CoreState` owns the record store. Reads go straight to the store; every
//! mutation takes the write lock first so two requests in this process never
//! interleave a read-modify-write of the backing file.

use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use crate::models::{Column, PatientRecord};
use crate::store::{PatientStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Lock poisoned")]
    LockPoisoned,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Records returned by a read path, plus whether the read failed and was
/// degraded to an empty result.
#[derive(Debug, Clone, Default)]
pub struct RecordSnapshot {
    pub records: Vec<PatientRecord>,
    pub degraded: bool,
}

pub struct CoreState {
    store: PatientStore,
    write_lock: Mutex<()>,
}

impl CoreState {
    /// Open (and initialize if needed) the store at `records_file`.
    pub fn open(records_file: impl Into<PathBuf>) -> Result<Self, CoreError> {
        Ok(Self::with_store(PatientStore::open(records_file)?))
    }

    pub fn with_store(store: PatientStore) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &PatientStore {
        &self.store
    }

    fn lock_writes(&self) -> Result<MutexGuard<'_, ()>, CoreError> {
        self.write_lock.lock().map_err(|_| CoreError::LockPoisoned)
    }

    // ── Read paths (degrade storage failures to "no records") ──

    pub fn records_or_empty(&self) -> RecordSnapshot {
        degrade(self.store.list_all())
    }

    /// Search, or list everything when `term` is blank.
    ///
    /// Only storage failures degrade; an unknown field is still an error,
    /// even when the term is blank.
    pub fn search_or_empty(&self, field: &str, term: &str) -> Result<RecordSnapshot, CoreError> {
        Column::lookup(field)?;
        let term = term.trim();
        if term.is_empty() {
            return Ok(self.records_or_empty());
        }
        match self.store.search(field, term) {
            Err(err) if !err.is_storage() => Err(err.into()),
            result => Ok(degrade(result)),
        }
    }

    // ── Write paths ──

    pub fn insert(&self, record: PatientRecord) -> Result<PatientRecord, CoreError> {
        let _guard = self.lock_writes()?;
        Ok(self.store.insert(record)?)
    }

    pub fn update(
        &self,
        patient_id: &str,
        record: PatientRecord,
    ) -> Result<PatientRecord, CoreError> {
        let _guard = self.lock_writes()?;
        Ok(self.store.update(patient_id, record)?)
    }

    pub fn delete(&self, patient_id: &str) -> Result<usize, CoreError> {
        let _guard = self.lock_writes()?;
        Ok(self.store.delete(patient_id)?)
    }
}

fn degrade(result: Result<Vec<PatientRecord>, StoreError>) -> RecordSnapshot {
    match result {
        Ok(records) => RecordSnapshot {
            records,
            degraded: false,
        },
        Err(err) => {
            tracing::warn!(error = %err, "Patient records unreadable, showing none");
            RecordSnapshot {
                records: Vec::new(),
                degraded: true,
            }
        }
    }
}

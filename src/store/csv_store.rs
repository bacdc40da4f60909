//! CSV-backed patient record store.
//!
//! The backing file is the single source of truth. Every read re-parses the
//! whole table; inserts append one row; updates and deletes rewrite the whole
//! table through a temporary file that is renamed over the original, so a
//! reader never sees a half-written table.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tempfile::NamedTempFile;

use crate::models::{validate_record, Column, PatientRecord};

use super::StoreError;

pub struct PatientStore {
    path: PathBuf,
}

impl PatientStore {
    /// Handle on `path` without touching the filesystem.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Handle on `path`, creating the file with its header row if missing.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let store = Self::new(path);
        store.initialize()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ensure the backing file exists and starts with the header row.
    ///
    /// A missing or zero-length file gets a fresh header; anything else is
    /// left untouched.
    pub fn initialize(&self) -> Result<(), StoreError> {
        match fs::metadata(&self.path) {
            Ok(meta) if meta.len() > 0 => return Ok(()),
            Ok(_) => {
                tracing::warn!(
                    path = %self.path.display(),
                    "Patient records file is empty, writing header"
                );
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                fs::create_dir_all(self.dir())?;
                tracing::info!(path = %self.path.display(), "Created patient records file");
            }
            Err(e) => return Err(e.into()),
        }
        self.rewrite(&[])?;
        Ok(())
    }

    /// Every non-blank data row, in file order.
    pub fn list_all(&self) -> Result<Vec<PatientRecord>, StoreError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(&self.path)?;

        let mut records = Vec::new();
        for row in reader.records() {
            let record = PatientRecord::from_row(row?.iter());
            if !record.is_blank() {
                records.push(record);
            }
        }

        tracing::debug!(count = records.len(), "Loaded patient records");
        Ok(records)
    }

    pub fn exists(&self, patient_id: &str) -> Result<bool, StoreError> {
        Ok(self
            .list_all()?
            .iter()
            .any(|record| record.patient_id == patient_id))
    }

    /// First record with `patient_id`, if any.
    pub fn get(&self, patient_id: &str) -> Result<Option<PatientRecord>, StoreError> {
        Ok(self
            .list_all()?
            .into_iter()
            .find(|record| record.patient_id == patient_id))
    }

    /// Validate and append a new record. Returns the record as stored.
    pub fn insert(&self, record: PatientRecord) -> Result<PatientRecord, StoreError> {
        let record = validate_record(record, today())?;

        if self.exists(&record.patient_id)? {
            return Err(StoreError::DuplicateKey {
                patient_id: record.patient_id,
            });
        }

        self.append(&record)?;
        tracing::info!(patient_id = %record.patient_id, "Patient record added");
        Ok(record)
    }

    /// Replace the first record whose id is `patient_id` with `new_record`.
    ///
    /// `new_record` may carry a different id; it must not collide with
    /// another existing record.
    pub fn update(
        &self,
        patient_id: &str,
        new_record: PatientRecord,
    ) -> Result<PatientRecord, StoreError> {
        let new_record = validate_record(new_record, today())?;
        let mut records = self.list_all()?;

        let position = records
            .iter()
            .position(|record| record.patient_id == patient_id)
            .ok_or_else(|| StoreError::NotFound {
                patient_id: patient_id.to_string(),
            })?;

        if new_record.patient_id != patient_id
            && records
                .iter()
                .any(|record| record.patient_id == new_record.patient_id)
        {
            return Err(StoreError::DuplicateKey {
                patient_id: new_record.patient_id,
            });
        }

        records[position] = new_record.clone();
        self.rewrite(&records)?;

        tracing::info!(
            patient_id = %patient_id,
            new_patient_id = %new_record.patient_id,
            "Patient record updated"
        );
        Ok(new_record)
    }

    /// Remove every record whose id is `patient_id`. Returns how many were
    /// removed; zero matches is `NotFound`.
    pub fn delete(&self, patient_id: &str) -> Result<usize, StoreError> {
        let records = self.list_all()?;
        let before = records.len();

        let remaining: Vec<PatientRecord> = records
            .into_iter()
            .filter(|record| record.patient_id != patient_id)
            .collect();
        let removed = before - remaining.len();

        if removed == 0 {
            return Err(StoreError::NotFound {
                patient_id: patient_id.to_string(),
            });
        }

        self.rewrite(&remaining)?;
        tracing::info!(patient_id = %patient_id, removed, "Patient record deleted");
        Ok(removed)
    }

    /// Case-insensitive substring search on one column (label or field key).
    pub fn search(&self, field: &str, term: &str) -> Result<Vec<PatientRecord>, StoreError> {
        let column = Column::lookup(field)?;
        let needle = term.to_lowercase();

        let matches: Vec<PatientRecord> = self
            .list_all()?
            .into_iter()
            .filter(|record| record.matches(column, &needle))
            .collect();

        tracing::debug!(field = %column, found = matches.len(), "Searched patient records");
        Ok(matches)
    }

    // ── File plumbing ──────────────────────────────────────

    fn dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    fn append(&self, record: &PatientRecord) -> Result<(), StoreError> {
        let needs_newline = !ends_with_newline(&self.path)?;

        let mut file = OpenOptions::new().append(true).open(&self.path)?;
        if needs_newline {
            file.write_all(b"\n")?;
        }

        let mut writer = csv_writer(&mut file);
        writer.write_record(record.to_row())?;
        writer.flush()?;
        Ok(())
    }

    /// Replace the table with header + `records`.
    fn rewrite(&self, records: &[PatientRecord]) -> Result<(), StoreError> {
        let mut tmp = NamedTempFile::new_in(self.dir())?;
        {
            let mut writer = csv_writer(&mut tmp);
            writer.write_record(Column::headers())?;
            for record in records {
                writer.write_record(record.to_row())?;
            }
            writer.flush()?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

fn csv_writer<W: Write>(inner: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(inner)
}

/// Empty files count as terminated.
fn ends_with_newline(path: &Path) -> Result<bool, StoreError> {
    let mut file = File::open(path)?;
    let len = file.metadata()?.len();
    if len == 0 {
        return Ok(true);
    }
    file.seek(SeekFrom::Start(len - 1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

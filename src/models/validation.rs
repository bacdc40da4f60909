//! Input validation for patient records.
//!
//! Runs before every insert and update. Produces the normalized record that
//! is actually persisted: trimmed fields and a `YYYY-MM-DD` admission date
//! (today's date when left blank).

use chrono::NaiveDate;
use thiserror::Error;

use super::enums::Column;
use super::patient::PatientRecord;

pub const ADMISSION_DATE_FORMAT: &str = "%Y-%m-%d";
pub const MIN_AGE: i64 = 0;
pub const MAX_AGE: i64 = 150;

/// Columns that must be non-blank.
pub const REQUIRED_COLUMNS: [Column; 3] = [Column::PatientId, Column::Name, Column::Age];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(Column),

    #[error("Age must be a valid number")]
    AgeNotNumeric(String),

    #[error("Age must be between {} and {}", MIN_AGE, MAX_AGE)]
    AgeOutOfRange(i64),

    #[error("Admission date must be YYYY-MM-DD, got {0:?}")]
    InvalidAdmissionDate(String),
}

/// Validate and normalize a record against `today`.
pub fn validate_record(
    mut record: PatientRecord,
    today: NaiveDate,
) -> Result<PatientRecord, ValidationError> {
    for column in Column::ALL {
        let value = record.field_mut(*column);
        let trimmed = value.trim();
        if trimmed.len() != value.len() {
            *value = trimmed.to_string();
        }
    }

    for column in REQUIRED_COLUMNS {
        if record.field(column).is_empty() {
            return Err(ValidationError::MissingField(column));
        }
    }

    let age: i64 = record
        .age
        .parse()
        .map_err(|_| ValidationError::AgeNotNumeric(record.age.clone()))?;
    if !(MIN_AGE..=MAX_AGE).contains(&age) {
        return Err(ValidationError::AgeOutOfRange(age));
    }

    let admission = if record.admission_date.is_empty() {
        today
    } else {
        NaiveDate::parse_from_str(&record.admission_date, ADMISSION_DATE_FORMAT)
            .map_err(|_| ValidationError::InvalidAdmissionDate(record.admission_date.clone()))?
    };
    record.admission_date = admission.format(ADMISSION_DATE_FORMAT).to_string();

    Ok(record)
}

//! Record export.
//!
//! `Csv` is the backing file itself, copied byte-for-byte. `Tsv` and `Json`
//! are re-serializations of `list_all()` for spreadsheets and scripts; they
//! carry no information the table does not.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::Column;
use crate::store::{PatientStore, StoreError};

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Unsupported export format: {0}")]
    UnsupportedFormat(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Export I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Export serialization error: {0}")]
    Serialize(String),
}

impl From<csv::Error> for ExportError {
    fn from(err: csv::Error) -> Self {
        ExportError::Io(err.into())
    }
}

impl From<serde_json::Error> for ExportError {
    fn from(err: serde_json::Error) -> Self {
        ExportError::Serialize(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Tsv,
    Json,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Tsv => "tsv",
            Self::Json => "json",
        }
    }

    pub fn extension(&self) -> &'static str {
        self.as_str()
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Csv => "text/csv; charset=utf-8",
            Self::Tsv => "text/tab-separated-values; charset=utf-8",
            Self::Json => "application/json",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "tsv" => Ok(Self::Tsv),
            "json" => Ok(Self::Json),
            _ => Err(ExportError::UnsupportedFormat(s.into())),
        }
    }
}

/// Outcome of writing an export to disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportResult {
    pub path: String,
    pub format: ExportFormat,
    pub bytes: u64,
}

/// Render the store in `format`.
pub fn render(store: &PatientStore, format: ExportFormat) -> Result<Vec<u8>, ExportError> {
    match format {
        ExportFormat::Csv => Ok(fs::read(store.path())?),
        ExportFormat::Tsv => {
            let mut writer = csv::WriterBuilder::new()
                .delimiter(b'\t')
                .terminator(csv::Terminator::Any(b'\n'))
                .from_writer(Vec::new());
            writer.write_record(Column::headers())?;
            for record in store.list_all()? {
                writer.write_record(record.to_row())?;
            }
            writer
                .into_inner()
                .map_err(|e| ExportError::Io(e.into_error()))
        }
        ExportFormat::Json => Ok(serde_json::to_vec_pretty(&store.list_all()?)?),
    }
}

/// Byte-for-byte copy of the backing file to `destination`.
pub fn copy_to(store: &PatientStore, destination: &Path) -> Result<u64, ExportError> {
    ensure_parent(destination)?;
    let bytes = fs::copy(store.path(), destination)?;
    tracing::info!(destination = %destination.display(), bytes, "Records exported");
    Ok(bytes)
}

/// Write the store to `destination` in `format`.
pub fn write_to(
    store: &PatientStore,
    format: ExportFormat,
    destination: &Path,
) -> Result<ExportResult, ExportError> {
    let bytes = match format {
        ExportFormat::Csv => copy_to(store, destination)?,
        ExportFormat::Tsv | ExportFormat::Json => {
            let rendered = render(store, format)?;
            ensure_parent(destination)?;
            fs::write(destination, &rendered)?;
            tracing::info!(
                destination = %destination.display(),
                format = format.as_str(),
                bytes = rendered.len(),
                "Records exported"
            );
            rendered.len() as u64
        }
    };

    Ok(ExportResult {
        path: destination.to_string_lossy().into_owned(),
        format,
        bytes,
    })
}

fn ensure_parent(path: &Path) -> Result<(), ExportError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

//! Shared types for the API layer.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core_state::{CoreState, RecordSnapshot};
use crate::models::PatientRecord;

/// Column searched when a list request names no field.
pub const DEFAULT_SEARCH_FIELD: &str = "Name";

/// Shared context for all API routes.
#[derive(Clone)]
pub struct ApiContext {
    pub core: Arc<CoreState>,
}

impl ApiContext {
    pub fn new(core: Arc<CoreState>) -> Self {
        Self { core }
    }
}

/// `GET /api/patients` query. A blank or absent `q` lists every record.
#[derive(Debug, Default, Deserialize)]
pub struct PatientQuery {
    pub field: Option<String>,
    pub q: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PatientListResponse {
    pub records: Vec<PatientRecord>,
    pub count: usize,
    /// True when the backing file could not be read and `records` is empty
    /// for that reason rather than because the store is empty.
    pub degraded: bool,
}

impl From<RecordSnapshot> for PatientListResponse {
    fn from(snapshot: RecordSnapshot) -> Self {
        Self {
            count: snapshot.records.len(),
            records: snapshot.records,
            degraded: snapshot.degraded,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub patient_id: String,
    pub deleted: usize,
}

#[derive(Debug, Default, Deserialize)]
pub struct ExportQuery {
    pub format: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ExportRequest {
    pub destination: String,
    pub format: Option<String>,
}

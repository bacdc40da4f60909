use serde::{Deserialize, Deserializer, Serialize};

use super::enums::Column;

/// One patient row. Every field is kept as text, exactly as persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatientRecord {
    pub patient_id: String,
    pub name: String,
    #[serde(deserialize_with = "loose_text")]
    pub age: String,
    pub gender: String,
    pub contact_number: String,
    pub address: String,
    pub admission_date: String,
    pub disease: String,
    pub doctor_assigned: String,
    pub room_number: String,
}

impl PatientRecord {
    pub fn field(&self, column: Column) -> &str {
        match column {
            Column::PatientId => &self.patient_id,
            Column::Name => &self.name,
            Column::Age => &self.age,
            Column::Gender => &self.gender,
            Column::ContactNumber => &self.contact_number,
            Column::Address => &self.address,
            Column::AdmissionDate => &self.admission_date,
            Column::Disease => &self.disease,
            Column::DoctorAssigned => &self.doctor_assigned,
            Column::RoomNumber => &self.room_number,
        }
    }

    pub fn field_mut(&mut self, column: Column) -> &mut String {
        match column {
            Column::PatientId => &mut self.patient_id,
            Column::Name => &mut self.name,
            Column::Age => &mut self.age,
            Column::Gender => &mut self.gender,
            Column::ContactNumber => &mut self.contact_number,
            Column::Address => &mut self.address,
            Column::AdmissionDate => &mut self.admission_date,
            Column::Disease => &mut self.disease,
            Column::DoctorAssigned => &mut self.doctor_assigned,
            Column::RoomNumber => &mut self.room_number,
        }
    }

    /// Build a record from a persisted row. Missing trailing fields become
    /// empty strings; fields past the last column are ignored.
    pub fn from_row<'a>(fields: impl IntoIterator<Item = &'a str>) -> Self {
        let mut record = Self::default();
        for (column, value) in Column::ALL.iter().zip(fields) {
            *record.field_mut(*column) = value.to_string();
        }
        record
    }

    /// All ten fields in persisted order.
    pub fn to_row(&self) -> impl Iterator<Item = &str> {
        Column::ALL.iter().map(move |column| self.field(*column))
    }

    /// True when every field is empty (a blank line in the table).
    pub fn is_blank(&self) -> bool {
        self.to_row().all(str::is_empty)
    }

    /// Case-insensitive substring match on one column.
    pub fn matches(&self, column: Column, needle_lower: &str) -> bool {
        self.field(column).to_lowercase().contains(needle_lower)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LooseScalar {
    Text(String),
    Integer(i64),
    Float(f64),
}

/// Accept a JSON string, number, or null for a text column.
fn loose_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<LooseScalar>::deserialize(deserializer)? {
        Some(LooseScalar::Text(s)) => s,
        Some(LooseScalar::Integer(n)) => n.to_string(),
        Some(LooseScalar::Float(f)) => f.to_string(),
        None => String::new(),
    })
}

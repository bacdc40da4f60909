use std::fmt;

use crate::store::StoreError;

/// Macro to generate the column enum with label + field-key lookups.
///
/// The label is the header text persisted in the backing file; the key is
/// the field identifier used by `PatientRecord` and the JSON API. Both are
/// declared here and nowhere else.
macro_rules! column_enum {
    ($name:ident { $($variant:ident => ($label:literal, $key:literal)),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Every column, in persisted order.
            pub const ALL: &'static [$name] = &[$(Self::$variant),+];

            /// Header label as written in the first row of the table.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }

            /// Field identifier.
            pub fn key(&self) -> &'static str {
                match self {
                    $(Self::$variant => $key),+
                }
            }

            fn from_key(s: &str) -> Option<Self> {
                match s {
                    $($key => Some(Self::$variant)),+,
                    _ => None,
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = StoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($label => Ok(Self::$variant)),+,
                    _ => Err(StoreError::InvalidField(s.into())),
                }
            }
        }
    };
}

column_enum!(Column {
    PatientId => ("Patient ID", "patient_id"),
    Name => ("Name", "name"),
    Age => ("Age", "age"),
    Gender => ("Gender", "gender"),
    ContactNumber => ("Contact Number", "contact_number"),
    Address => ("Address", "address"),
    AdmissionDate => ("Admission Date", "admission_date"),
    Disease => ("Disease", "disease"),
    DoctorAssigned => ("Doctor Assigned", "doctor_assigned"),
    RoomNumber => ("Room Number", "room_number"),
});

impl Column {
    /// Position of this column in a persisted row.
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Resolve a column by header label or field key.
    pub fn lookup(name: &str) -> Result<Self, StoreError> {
        let name = name.trim();
        name.parse::<Self>()
            .or_else(|err| Self::from_key(name).ok_or(err))
    }

    /// Header row, in persisted order.
    pub fn headers() -> impl Iterator<Item = &'static str> {
        Self::ALL.iter().map(Column::as_str)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

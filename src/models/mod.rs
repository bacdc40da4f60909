pub mod enums;
pub mod patient;
pub mod validation;

pub use enums::Column;
pub use patient::PatientRecord;
pub use validation::{validate_record, ValidationError};

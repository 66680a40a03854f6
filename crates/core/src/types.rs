/// Record primary keys are backend-assigned BIGSERIAL values.
pub type RecordId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

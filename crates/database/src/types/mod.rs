//! Shared types and result types for the database layer

pub mod errors;

pub use errors::{Constraint, DatabaseError};

pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Current time as an RFC 3339 UTC string with fixed microsecond precision.
///
/// The fixed width keeps lexical order of stored timestamps equal to
/// chronological order, which the `ORDER BY created_at` queries rely on.
pub fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}

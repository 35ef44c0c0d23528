use derive_more::Display;
use super::helpers::{constraint_violation, Constraint};

// Errors for everything that goes through the content
// repository. The HTTP layer maps these to responses
// (see app::error), the actual database messages are
// only meant for the logs.
#[derive(Debug, Display, PartialEq)]
pub enum DataError {
  // Missing, empty or oversized field:
  #[display(fmt = "{}: {}", field, message)]
  Validation {
    field: &'static str,
    message: String
  },
  #[display(fmt = "Not found: {}", _0)]
  NotFound(String),
  // The write was rejected because of existing rows
  // (e.g. deleting a category that still has posts).
  #[display(fmt = "Conflict: {}", _0)]
  Conflict(String),
  // Broken reference or unique constraint that made it
  // to the database.
  #[display(fmt = "Integrity error: {}", _0)]
  Integrity(String),
  #[display(fmt = "Database error: {}", _0)]
  Database(String)
}

impl std::error::Error for DataError {}

impl DataError {
  pub fn validation(field: &'static str, message: &str) -> Self {
    DataError::Validation {
      field,
      message: String::from(message)
    }
  }
}

impl From<rusqlite::Error> for DataError {
  fn from(error: rusqlite::Error) -> Self {
    match constraint_violation(&error) {
      Some(Constraint::Unique) =>
        DataError::Integrity(format!("Unique constraint failed - {}", error)),
      Some(Constraint::ForeignKey) =>
        DataError::Integrity(format!("Foreign key constraint failed - {}", error)),
      None => DataError::Database(error.to_string())
    }
  }
}

impl From<r2d2::Error> for DataError {
  fn from(error: r2d2::Error) -> Self {
    DataError::Database(format!("Could not get a connection from the pool - {}", error))
  }
}

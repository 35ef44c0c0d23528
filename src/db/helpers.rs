use rusqlite::ffi;
use crate::utils::text_utils::{char_len, is_blank};
use super::error::DataError;

pub enum Constraint {
  Unique,
  ForeignKey
}

const FOREIGN_KEY_FAILED: &str = "FOREIGN KEY constraint failed";

// SQLite gives out extended result codes telling us
// which kind of constraint blew up. ON DELETE RESTRICT
// is enforced like a trigger and reports the trigger
// code, only the message tells it apart.
pub fn constraint_violation(error: &rusqlite::Error) -> Option<Constraint> {
  match error {
    rusqlite::Error::SqliteFailure(e, message) => match e.extended_code {
      ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
        Some(Constraint::Unique),
      ffi::SQLITE_CONSTRAINT_FOREIGNKEY => Some(Constraint::ForeignKey),
      ffi::SQLITE_CONSTRAINT_TRIGGER
        if message.as_deref() == Some(FOREIGN_KEY_FAILED) =>
          Some(Constraint::ForeignKey),
      _ => None
    },
    _ => None
  }
}

pub fn is_unique_violation(error: &rusqlite::Error) -> bool {
  matches!(constraint_violation(error), Some(Constraint::Unique))
}

pub fn is_foreign_key_violation(error: &rusqlite::Error) -> bool {
  matches!(constraint_violation(error), Some(Constraint::ForeignKey))
}

// Required text: present, not blank, not too long.
pub fn check_required(
  field: &'static str,
  value: &str,
  max_length: Option<usize>
) -> Result<(), DataError> {
  if is_blank(value) {
    return Err(DataError::validation(field, "is required"));
  }
  check_length(field, value, max_length)
}

pub fn check_optional(
  field: &'static str,
  value: Option<&str>,
  max_length: usize
) -> Result<(), DataError> {
  match value {
    Some(v) => check_length(field, v, Some(max_length)),
    None => Ok(())
  }
}

fn check_length(
  field: &'static str,
  value: &str,
  max_length: Option<usize>
) -> Result<(), DataError> {
  match max_length {
    Some(max) if char_len(value) > max => Err(DataError::Validation {
      field,
      message: format!("cannot be longer than {} characters", max)
    }),
    _ => Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn blank_required_field_is_rejected() {
    assert_eq!(
      Err(DataError::validation("title", "is required")),
      check_required("title", "   ", Some(255))
    );
  }

  #[test]
  fn length_is_counted_in_characters() {
    let ok = "é".repeat(100);
    let too_long = "é".repeat(101);
    assert!(check_required("name", &ok, Some(100)).is_ok());
    assert!(check_required("name", &too_long, Some(100)).is_err());
  }

  fn sqlite_failure(extended_code: std::os::raw::c_int, message: &str) -> rusqlite::Error {
    rusqlite::Error::SqliteFailure(
      ffi::Error::new(extended_code),
      Some(message.to_string())
    )
  }

  #[test]
  fn restrict_violation_counts_as_foreign_key() {
    assert!(is_foreign_key_violation(
      &sqlite_failure(ffi::SQLITE_CONSTRAINT_TRIGGER, FOREIGN_KEY_FAILED)
    ));
    assert!(is_foreign_key_violation(
      &sqlite_failure(ffi::SQLITE_CONSTRAINT_FOREIGNKEY, FOREIGN_KEY_FAILED)
    ));
    // A RAISE(ABORT) from a real trigger is something else.
    assert!(!is_foreign_key_violation(
      &sqlite_failure(ffi::SQLITE_CONSTRAINT_TRIGGER, "no deleting on fridays")
    ));
    assert!(is_unique_violation(
      &sqlite_failure(ffi::SQLITE_CONSTRAINT_UNIQUE, "UNIQUE constraint failed: blog_posts.slug")
    ));
  }

  #[test]
  fn absent_optional_field_is_fine() {
    assert!(check_optional("seo_title", None, 255).is_ok());
    assert!(check_optional("seo_title", Some(&"a".repeat(256)), 255).is_err());
  }
}

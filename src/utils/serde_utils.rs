// Optional text fields coming from the admin forms
// are often sent as empty strings. These should be
// NULL in the database.
pub fn empty_string_to_none(value: Option<String>) -> Option<String> {
  match value {
    Some(s) => if s.trim().is_empty()
      { None } else { Some(s) },
    None => None
  }
}

use regex::Regex;
use lazy_static::lazy_static;

lazy_static! {
  // Anything that isn't a letter, a digit, a space,
  // an underscore or a hyphen goes away.
  static ref SLUG_STRIP_REGEX: Regex = Regex::new(
    r"[^\p{Alphabetic}\p{N}\s_-]"
  ).unwrap();
  // Runs of separators become a single hyphen.
  static ref SLUG_SEPARATOR_REGEX: Regex = Regex::new(
    r"[\s_-]+"
  ).unwrap();
}

/**
 * Normalizes a title into the base part of a slug.
 * Can return an empty string, e.g. for "???".
 */
pub fn slugify(text: &str) -> String {
  let lowered = text.to_lowercase();
  let stripped = SLUG_STRIP_REGEX.replace_all(lowered.trim(), "");
  let hyphenated = SLUG_SEPARATOR_REGEX.replace_all(&stripped, "-");
  hyphenated.trim_matches('-').to_string()
}

// Field limits are expressed in characters, not
// in bytes like len() would give us.
pub fn char_len(value: &str) -> usize {
  value.chars().count()
}

pub fn is_blank(value: &str) -> bool {
  value.trim().is_empty()
}

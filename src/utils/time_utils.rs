use chrono::{TimeZone, Utc};

const DATE_FORMAT_ISO8601: &str = "%Y-%m-%dT%H:%M:%SZ";
// What the contact emails used to show:
const DATE_FORMAT_STANDARD: &str = "%Y-%m-%d %H:%M:%S";

pub enum DateFormat {
  Iso8601,
  Standard,
}

// Everything is stored as UTC Unix timestamps.
pub fn timestamp_to_date_string(timestamp: i64, format: DateFormat) -> String {
  let format_str = match format {
    DateFormat::Iso8601 => DATE_FORMAT_ISO8601,
    DateFormat::Standard => DATE_FORMAT_STANDARD,
  };
  match Utc.timestamp_opt(timestamp, 0).single() {
    Some(d) => d.format(format_str).to_string(),
    None => String::new()
  }
}

pub fn current_timestamp() -> i64 {
  Utc::now().timestamp()
}

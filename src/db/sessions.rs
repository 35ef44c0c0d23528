use rusqlite::params;
use log::debug;
use super::error::DataError;
use super::{select_one, Pool};

// Only a digest of the token is ever stored, the
// app module does the hashing.

pub fn create_session(
  pool: &Pool,
  token_hash: &str,
  now: i64,
  ttl_secs: i64
) -> Result<(), DataError> {
  let conn = pool.get()?;
  // Good time to get rid of the old ones.
  let purged = conn.execute(
    "DELETE FROM admin_sessions WHERE expires_at <= ?",
    params![now]
  )?;
  if purged > 0 {
    debug!("Purged {} expired admin session(s)", purged);
  }
  conn.execute(
    "INSERT INTO admin_sessions (token_hash, created_at, expires_at) VALUES (?, ?, ?)",
    params![token_hash, now, now.saturating_add(ttl_secs)]
  )?;
  Ok(())
}

pub fn session_is_valid(
  pool: &Pool,
  token_hash: &str,
  now: i64
) -> Result<bool, DataError> {
  let conn = pool.get()?;
  let found = select_one(
    &conn,
    "SELECT 1 FROM admin_sessions WHERE token_hash = ? AND expires_at > ?",
    params![token_hash, now],
    |row| row.get::<_, i64>(0)
  )?;
  Ok(found.is_some())
}

pub fn delete_session(pool: &Pool, token_hash: &str) -> Result<(), DataError> {
  let conn = pool.get()?;
  conn.execute(
    "DELETE FROM admin_sessions WHERE token_hash = ?",
    params![token_hash]
  )?;
  Ok(())
}

use rusqlite::{Connection, OptionalExtension, Params, Row};
use r2d2_sqlite::SqliteConnectionManager;
use std::time::Duration;
use log::info;
pub mod entities;
pub mod error;
mod helpers;
mod mappers;
mod queries;
mod slugs;
mod posts;
mod categories;
mod views;
mod published;
mod sessions;
mod seed;
pub use entities::*;
pub use error::DataError;
pub use posts::*;
pub use categories::*;
pub use views::increment_view;
pub use published::*;
pub use sessions::*;
pub use seed::{seed_data, SeedOutcome};

// Type alias to make function signatures much clearer:
pub type Pool = r2d2::Pool<SqliteConnectionManager>;

/**
 * All the DB stuff is done in a non-async way.
 * Writes use "immediate" transactions and every
 * connection has a busy timeout, so concurrent
 * writers wait for each other instead of failing.
 */
pub fn open_pool(
  db_path: &str,
  max_size: u32,
  busy_timeout: Duration
) -> Result<Pool, DataError> {
  // WAL mode sticks to the database file, it only
  // has to be set once. Readers then don't block the
  // writer and the other way around.
  let conn = Connection::open(db_path)?;
  conn.busy_timeout(busy_timeout)?;
  let journal_mode: String = conn.pragma_update_and_check(
    None,
    "journal_mode",
    "WAL",
    |row| row.get(0)
  )?;
  info!("Opened database {} with journal mode {}", db_path, journal_mode);
  drop(conn);

  // Foreign keys are off by default in SQLite and it's
  // a per connection setting.
  let manager = SqliteConnectionManager::file(db_path)
    .with_init(move |c| {
      c.busy_timeout(busy_timeout)?;
      c.pragma_update(None, "foreign_keys", true)
    });
  let pool = Pool::builder()
    .max_size(max_size)
    .build(manager)?;
  Ok(pool)
}

const SCHEMA: &str = "
  CREATE TABLE IF NOT EXISTS categories (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name VARCHAR(100) NOT NULL UNIQUE
  );
  CREATE TABLE IF NOT EXISTS blog_posts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title VARCHAR(255) NOT NULL,
    slug VARCHAR(300) NOT NULL UNIQUE,
    summary TEXT NOT NULL,
    content TEXT NOT NULL,
    featured_image VARCHAR(300),
    author_name VARCHAR(120) NOT NULL,
    seo_title VARCHAR(255),
    seo_description VARCHAR(300),
    category_id INTEGER NOT NULL
      REFERENCES categories(id) ON DELETE RESTRICT,
    is_published BOOLEAN NOT NULL DEFAULT 0,
    published_at INTEGER,
    view_count INTEGER NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
  );
  CREATE INDEX IF NOT EXISTS idx_blog_published
    ON blog_posts (is_published, published_at);
  CREATE INDEX IF NOT EXISTS idx_blog_category
    ON blog_posts (category_id);
  CREATE TABLE IF NOT EXISTS admin_sessions (
    token_hash TEXT PRIMARY KEY,
    created_at INTEGER NOT NULL,
    expires_at INTEGER NOT NULL
  );
";

// Safe to run on every startup.
pub fn init_schema(pool: &Pool) -> Result<(), DataError> {
  let conn = pool.get()?;
  conn.execute_batch(SCHEMA)?;
  Ok(())
}

// Stole most of the signature from the rusqlite doc.
fn select_many<T, P, F>(
  conn: &Connection,
  query: &str,
  params: P,
  mapper: F
) -> Result<Vec<T>, DataError>
  where
    P: Params,
    F: FnMut(&Row<'_>) -> Result<T, rusqlite::Error>,
{
  let mut stmt = conn.prepare(query)?;
  let rows = stmt.query_map(params, mapper)?
    .collect::<Result<Vec<T>, rusqlite::Error>>()?;
  Ok(rows)
}

fn select_one<T, P, F>(
  conn: &Connection,
  query: &str,
  params: P,
  mapper: F
) -> Result<Option<T>, DataError>
  where
    P: Params,
    F: FnOnce(&Row<'_>) -> Result<T, rusqlite::Error>,
{
  let mut stmt = conn.prepare(query)?;
  let row = stmt.query_row(params, mapper).optional()?;
  Ok(row)
}

fn count(
  conn: &Connection,
  query: &str,
  params: impl Params
) -> Result<i64, DataError> {
  let count: i64 = conn.query_row(query, params, |row| row.get(0))?;
  Ok(count)
}

#[cfg(test)]
pub mod test_utils {
  use super::*;
  use tempfile::TempDir;

  // Pooled connections have to share the same database,
  // which rules out ":memory:". The TempDir has to be
  // kept alive for the duration of the test.
  pub fn test_pool() -> (TempDir, Pool) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("blog-test.db");
    let pool = open_pool(
      path.to_str().unwrap(),
      8,
      Duration::from_secs(30)
    ).unwrap();
    init_schema(&pool).unwrap();
    (dir, pool)
  }

  pub fn sample_post(title: &str, category_id: i64, is_published: bool) -> NewPost {
    NewPost {
      title: String::from(title),
      summary: String::from("Some summary"),
      content: String::from("<p>Some content</p>"),
      featured_image: None,
      author_name: String::from("Sadiq Ali"),
      seo_title: None,
      seo_description: None,
      category_id,
      is_published
    }
  }
}

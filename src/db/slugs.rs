use rusqlite::{Connection, params};
use crate::utils::text_utils::slugify;
use super::error::DataError;
use super::select_one;

fn slug_taken(
  conn: &Connection,
  slug: &str,
  exclude_id: Option<i64>
) -> Result<bool, DataError> {
  // A post being edited doesn't collide with itself.
  // NULL never matches so "id != NULL" would filter
  // out everything, hence the IS NULL.
  let found = select_one(
    conn,
    "SELECT 1 FROM blog_posts WHERE slug = ?1 AND (?2 IS NULL OR id != ?2)",
    params![slug, exclude_id],
    |row| row.get::<_, i64>(0)
  )?;
  Ok(found.is_some())
}

/**
 * Generates a slug from the given text that no other
 * post is using right now. Has to be called inside
 * the transaction that writes the post, the unique
 * index on the slug column still has the last word.
 */
pub fn unique_slug(
  conn: &Connection,
  text: &str,
  exclude_id: Option<i64>
) -> Result<String, DataError> {
  let base_slug = slugify(text);
  // Titles like "???" normalize to nothing. We never
  // use the empty string as is, the suffixes kick in
  // right away.
  if !base_slug.is_empty() && !slug_taken(conn, &base_slug, exclude_id)? {
    return Ok(base_slug);
  }
  let mut counter: u64 = 1;
  loop {
    let slug = format!("{}-{}", base_slug, counter);
    if !slug_taken(conn, &slug, exclude_id)? {
      return Ok(slug);
    }
    counter += 1;
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::db::test_utils::*;
  use crate::db::{create_category, create_post};

  #[test]
  fn free_slug_is_used_as_is() {
    let (_dir, pool) = test_pool();
    let conn = pool.get().unwrap();
    assert_eq!("hello-world", unique_slug(&conn, "Hello, World!", None).unwrap());
  }

  #[test]
  fn colliding_slugs_get_a_counter() {
    let (_dir, pool) = test_pool();
    let category = create_category(&pool, "Web Development").unwrap();
    create_post(&pool, &sample_post("Hello World", category.id, false), 100).unwrap();
    create_post(&pool, &sample_post("Hello World", category.id, false), 100).unwrap();
    let conn = pool.get().unwrap();
    assert_eq!("hello-world-2", unique_slug(&conn, "hello world", None).unwrap());
  }

  #[test]
  fn excluded_post_does_not_collide_with_itself() {
    let (_dir, pool) = test_pool();
    let category = create_category(&pool, "Web Development").unwrap();
    let post = create_post(&pool, &sample_post("Hello World", category.id, false), 100).unwrap();
    let conn = pool.get().unwrap();
    assert_eq!("hello-world", unique_slug(&conn, "Hello World", Some(post.id)).unwrap());
    assert_eq!("hello-world-1", unique_slug(&conn, "Hello World", None).unwrap());
  }

  #[test]
  fn empty_base_gets_suffixes() {
    let (_dir, pool) = test_pool();
    let category = create_category(&pool, "Web Development").unwrap();
    let conn = pool.get().unwrap();
    assert_eq!("-1", unique_slug(&conn, "???", None).unwrap());
    drop(conn);
    create_post(&pool, &sample_post("???", category.id, false), 100).unwrap();
    let conn = pool.get().unwrap();
    assert_eq!("-2", unique_slug(&conn, "!!!", None).unwrap());
  }
}

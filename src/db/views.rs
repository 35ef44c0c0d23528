use rusqlite::params;
use super::error::DataError;
use super::Pool;

/**
 * Adds one view to a post. This is a single UPDATE
 * computed by SQLite itself, so concurrent detail views
 * can't overwrite each other's increments like a read
 * then write from here would.
 */
pub fn increment_view(pool: &Pool, post_id: i64) -> Result<(), DataError> {
  let conn = pool.get()?;
  let updated = conn.execute(
    "UPDATE blog_posts SET view_count = view_count + 1 WHERE id = ?",
    params![post_id]
  )?;
  match updated {
    0 => Err(DataError::NotFound(format!("Post {}", post_id))),
    _ => Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::db::test_utils::*;
  use crate::db::{create_category, create_post, post_by_id};
  use std::thread;

  #[test]
  fn missing_post_is_reported() {
    let (_dir, pool) = test_pool();
    assert_eq!(
      Err(DataError::NotFound("Post 3".to_string())),
      increment_view(&pool, 3)
    );
  }

  #[test]
  fn concurrent_increments_are_not_lost() {
    let (_dir, pool) = test_pool();
    let category = create_category(&pool, "Web Development").unwrap();
    let post = create_post(&pool, &sample_post("Popular", category.id, true), 1000).unwrap();
    // r2d2 pools are cheap to clone, they're an Arc inside.
    let handles: Vec<_> = (0..100).map(|_| {
      let pool = pool.clone();
      thread::spawn(move || increment_view(&pool, post.id))
    }).collect();
    for handle in handles {
      handle.join().unwrap().unwrap();
    }
    assert_eq!(100, post_by_id(&pool, post.id).unwrap().unwrap().view_count);
  }
}

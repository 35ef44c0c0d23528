use rusqlite::{Connection, TransactionBehavior, params};
use log::info;
use super::entities::*;
use super::error::DataError;
use super::helpers::{check_required, is_foreign_key_violation, is_unique_violation};
use super::mappers::{map_category, CATEGORY_COLUMNS};
use super::queries::{Query, OrderBy};
use super::{count, select_many, select_one, Pool};

pub const MAX_CATEGORY_NAME_LENGTH: usize = 100;

pub(super) fn category_exists(conn: &Connection, id: i64) -> Result<bool, DataError> {
  let found = select_one(
    conn,
    "SELECT 1 FROM categories WHERE id = ?",
    params![id],
    |row| row.get::<_, i64>(0)
  )?;
  Ok(found.is_some())
}

fn posts_in_category(conn: &Connection, id: i64) -> Result<i64, DataError> {
  count(conn, "SELECT COUNT(*) FROM blog_posts WHERE category_id = ?", params![id])
}

fn category_query() -> Query {
  Query::select(&CATEGORY_COLUMNS, &["categories"])
}

pub(super) fn insert_category(conn: &Connection, name: &str) -> Result<Category, DataError> {
  let inserted = conn.execute(
    "INSERT INTO categories (name) VALUES (?)",
    params![name]
  );
  match inserted {
    Err(e) if is_unique_violation(&e) =>
      return Err(DataError::validation("name", "a category with that name already exists")),
    other => other?
  };
  Ok(Category {
    id: conn.last_insert_rowid(),
    name: String::from(name)
  })
}

pub fn create_category(pool: &Pool, name: &str) -> Result<Category, DataError> {
  let name = name.trim();
  check_required("name", name, Some(MAX_CATEGORY_NAME_LENGTH))?;
  let mut conn = pool.get()?;
  let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
  let category = insert_category(&tx, name)?;
  tx.commit()?;
  info!("Created category {} ({})", category.name, category.id);
  Ok(category)
}

/**
 * Categories that still have posts can't be deleted.
 * The post count and the delete happen in the same
 * transaction so a post can't sneak in between. The
 * foreign key (ON DELETE RESTRICT) is the backstop.
 */
pub fn delete_category(pool: &Pool, id: i64) -> Result<(), DataError> {
  let mut conn = pool.get()?;
  let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
  if !category_exists(&tx, id)? {
    return Err(DataError::NotFound(format!("Category {}", id)));
  }
  let post_count = posts_in_category(&tx, id)?;
  if post_count > 0 {
    return Err(DataError::Conflict(
      format!("Category {} still has {} post(s)", id, post_count)
    ));
  }
  let deleted = tx.execute("DELETE FROM categories WHERE id = ?", params![id]);
  match deleted {
    Err(e) if is_foreign_key_violation(&e) => {
      return Err(DataError::Conflict(format!("Category {} still has posts", id)));
    },
    other => other?
  };
  tx.commit()?;
  info!("Deleted category {}", id);
  Ok(())
}

pub fn all_categories(pool: &Pool) -> Result<Vec<Category>, DataError> {
  let conn = pool.get()?;
  select_many(
    &conn,
    &category_query()
      .order(OrderBy::asc("categories.name"))
      .order(OrderBy::asc("categories.id"))
      .to_string(),
    [],
    map_category
  )
}

pub fn category_by_id(pool: &Pool, id: i64) -> Result<Option<Category>, DataError> {
  let conn = pool.get()?;
  select_one(
    &conn,
    &category_query().where_and(&["categories.id = ?"]).to_string(),
    params![id],
    map_category
  )
}

pub fn category_count(pool: &Pool) -> Result<i64, DataError> {
  let conn = pool.get()?;
  count(&conn, "SELECT COUNT(*) FROM categories", [])
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::db::test_utils::*;
  use crate::db::{create_post, delete_post};

  #[test]
  fn create_and_list_categories() {
    let (_dir, pool) = test_pool();
    create_category(&pool, "Web Development").unwrap();
    create_category(&pool, "  AI & ML ").unwrap();
    let names: Vec<String> = all_categories(&pool).unwrap()
      .into_iter()
      .map(|c| c.name)
      .collect();
    assert_eq!(vec!["AI & ML".to_string(), "Web Development".to_string()], names);
    assert_eq!(2, category_count(&pool).unwrap());
  }

  #[test]
  fn category_name_is_validated() {
    let (_dir, pool) = test_pool();
    assert_eq!(
      Err(DataError::validation("name", "is required")),
      create_category(&pool, "   ")
    );
    match create_category(&pool, &"x".repeat(101)) {
      Err(DataError::Validation { field, .. }) => assert_eq!("name", field),
      other => panic!("Expected a validation error, got {:?}", other)
    }
    create_category(&pool, "Cloud Computing").unwrap();
    assert_eq!(
      Err(DataError::validation("name", "a category with that name already exists")),
      create_category(&pool, "Cloud Computing")
    );
    assert_eq!(1, category_count(&pool).unwrap());
  }

  #[test]
  fn category_with_posts_cannot_be_deleted() {
    let (_dir, pool) = test_pool();
    let category = create_category(&pool, "Web Development").unwrap();
    let post = create_post(&pool, &sample_post("Still here", category.id, false), 1000).unwrap();
    match delete_category(&pool, category.id) {
      Err(DataError::Conflict(_)) => (),
      other => panic!("Expected a conflict, got {:?}", other)
    }
    assert!(category_by_id(&pool, category.id).unwrap().is_some());

    delete_post(&pool, post.id).unwrap();
    delete_category(&pool, category.id).unwrap();
    assert_eq!(None, category_by_id(&pool, category.id).unwrap());
  }

  #[test]
  fn empty_category_can_be_deleted() {
    let (_dir, pool) = test_pool();
    let category = create_category(&pool, "Empty").unwrap();
    delete_category(&pool, category.id).unwrap();
    assert_eq!(0, category_count(&pool).unwrap());
  }

  #[test]
  fn deleting_missing_category_is_not_found() {
    let (_dir, pool) = test_pool();
    assert_eq!(
      Err(DataError::NotFound("Category 7".to_string())),
      delete_category(&pool, 7)
    );
  }

  #[test]
  fn foreign_key_restricts_raw_deletes() {
    // Bypasses delete_category on purpose to make sure
    // the schema itself refuses.
    let (_dir, pool) = test_pool();
    let category = create_category(&pool, "Web Development").unwrap();
    create_post(&pool, &sample_post("Pinned", category.id, false), 1000).unwrap();
    let conn = pool.get().unwrap();
    let result = conn.execute("DELETE FROM categories WHERE id = ?", params![category.id]);
    let error = result.unwrap_err();
    assert!(is_foreign_key_violation(&error));
    match DataError::from(error) {
      DataError::Integrity(_) => (),
      other => panic!("Expected an integrity error, got {:?}", other)
    }
    assert!(category_by_id(&pool, category.id).unwrap().is_some());
  }
}

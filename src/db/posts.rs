use rusqlite::{Connection, TransactionBehavior, params};
use log::{info, warn};
use super::entities::*;
use super::error::DataError;
use super::helpers::{check_optional, check_required, is_unique_violation};
use super::mappers::{map_post, POST_COLUMNS};
use super::queries::{Query, OrderBy};
use super::slugs::unique_slug;
use super::categories::category_exists;
use super::{count, select_many, select_one, Pool};

pub const MAX_TITLE_LENGTH: usize = 255;
pub const MAX_SLUG_LENGTH: usize = 300;
pub const MAX_IMAGE_URL_LENGTH: usize = 300;
pub const MAX_AUTHOR_LENGTH: usize = 120;
pub const MAX_SEO_TITLE_LENGTH: usize = 255;
pub const MAX_SEO_DESCRIPTION_LENGTH: usize = 300;
// How many times create_post generates a new slug when
// the insert hits the unique index anyway.
const MAX_SLUG_ATTEMPTS: usize = 3;

// Result of a single insert attempt. A taken slug is
// not an error yet, the caller may try again.
pub(super) enum InsertOutcome {
  Inserted(BlogPost),
  SlugTaken(String)
}

fn validate_new_post(post: &NewPost) -> Result<(), DataError> {
  check_required("title", &post.title, Some(MAX_TITLE_LENGTH))?;
  check_required("summary", &post.summary, None)?;
  check_required("content", &post.content, None)?;
  check_required("author_name", &post.author_name, Some(MAX_AUTHOR_LENGTH))?;
  check_optional("featured_image", post.featured_image.as_deref(), MAX_IMAGE_URL_LENGTH)?;
  check_optional("seo_title", post.seo_title.as_deref(), MAX_SEO_TITLE_LENGTH)?;
  check_optional("seo_description", post.seo_description.as_deref(), MAX_SEO_DESCRIPTION_LENGTH)
}

// Only what's present gets checked, but what's present
// has to be valid.
fn validate_update(update: &PostUpdate) -> Result<(), DataError> {
  if let Some(title) = &update.title {
    check_required("title", title, Some(MAX_TITLE_LENGTH))?;
  }
  if let Some(slug) = &update.slug {
    check_required("slug", slug, Some(MAX_SLUG_LENGTH))?;
  }
  if let Some(summary) = &update.summary {
    check_required("summary", summary, None)?;
  }
  if let Some(content) = &update.content {
    check_required("content", content, None)?;
  }
  if let Some(author_name) = &update.author_name {
    check_required("author_name", author_name, Some(MAX_AUTHOR_LENGTH))?;
  }
  check_optional("featured_image", update.featured_image.as_deref(), MAX_IMAGE_URL_LENGTH)?;
  check_optional(
    "seo_title",
    update.seo_title.as_ref().and_then(|s| s.as_deref()),
    MAX_SEO_TITLE_LENGTH
  )?;
  check_optional(
    "seo_description",
    update.seo_description.as_ref().and_then(|s| s.as_deref()),
    MAX_SEO_DESCRIPTION_LENGTH
  )
}

// Generated slugs get a suffix and could go over the
// limit even though the title didn't.
fn check_slug_length(slug: &str) -> Result<(), DataError> {
  check_required("slug", slug, Some(MAX_SLUG_LENGTH))
}

fn post_query() -> Query {
  Query::select(&POST_COLUMNS, &["blog_posts"])
}

pub(super) fn fetch_post(conn: &Connection, id: i64) -> Result<Option<BlogPost>, DataError> {
  select_one(
    conn,
    &post_query().where_and(&["blog_posts.id = ?"]).to_string(),
    params![id],
    map_post
  )
}

/**
 * Inserts a post using the given connection, which is
 * expected to be inside a write transaction. Checks the
 * category and resolves the slug first.
 */
pub(super) fn insert_post(
  conn: &Connection,
  new_post: &NewPost,
  now: i64
) -> Result<InsertOutcome, DataError> {
  if !category_exists(conn, new_post.category_id)? {
    return Err(DataError::Integrity(
      format!("Category {} does not exist", new_post.category_id)
    ));
  }
  let slug = unique_slug(conn, &new_post.title, None)?;
  check_slug_length(&slug)?;
  let published_at = if new_post.is_published { Some(now) } else { None };
  let inserted = conn.execute(
    "INSERT INTO blog_posts (title, slug, summary, content, featured_image, \
    author_name, seo_title, seo_description, category_id, is_published, \
    published_at, view_count, created_at, updated_at) \
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, 0, ?12, ?12)",
    params![
      new_post.title.trim(),
      slug,
      new_post.summary,
      new_post.content,
      new_post.featured_image,
      new_post.author_name.trim(),
      new_post.seo_title,
      new_post.seo_description,
      new_post.category_id,
      new_post.is_published,
      published_at,
      now
    ]
  );
  match inserted {
    Err(e) if is_unique_violation(&e) => return Ok(InsertOutcome::SlugTaken(slug)),
    other => other?
  };
  let id = conn.last_insert_rowid();
  fetch_post(conn, id)?
    .map(InsertOutcome::Inserted)
    .ok_or_else(|| DataError::Database(format!("Post {} vanished after insert", id)))
}

/**
 * Creates a post. The post is only published right away
 * if the flag is set, in which case the publish timestamp
 * is "now".
 */
pub fn create_post(
  pool: &Pool,
  new_post: &NewPost,
  now: i64
) -> Result<BlogPost, DataError> {
  validate_new_post(new_post)?;
  let mut conn = pool.get()?;
  for attempt in 1..=MAX_SLUG_ATTEMPTS {
    // Dropping the transaction without commit rolls
    // everything back.
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    match insert_post(&tx, new_post, now)? {
      InsertOutcome::Inserted(post) => {
        tx.commit()?;
        info!("Created post {} with slug {}", post.id, post.slug);
        return Ok(post);
      },
      InsertOutcome::SlugTaken(slug) => {
        warn!("Slug {} got taken while creating a post (attempt {})", slug, attempt);
      }
    }
  }
  Err(DataError::Integrity(
    format!("Could not find a free slug for \"{}\"", new_post.title)
  ))
}

/**
 * Updates whatever is present in the PostUpdate. The
 * slug is only generated again when the slug or the
 * title actually changed. The publish timestamp is set
 * the first time the post gets published and never
 * touched again.
 */
pub fn update_post(
  pool: &Pool,
  id: i64,
  update: &PostUpdate,
  now: i64
) -> Result<BlogPost, DataError> {
  validate_update(update)?;
  let mut conn = pool.get()?;
  let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
  let mut post = fetch_post(&tx, id)?
    .ok_or_else(|| DataError::NotFound(format!("Post {}", id)))?;

  // An explicit slug wins over the title.
  let slug_source: Option<&str> = match (&update.slug, &update.title) {
    (Some(slug), _) if *slug != post.slug => Some(slug.as_str()),
    (None, Some(title)) if *title != post.title => Some(title.as_str()),
    _ => None
  };
  if let Some(source) = slug_source {
    let slug = unique_slug(&tx, source, Some(id))?;
    check_slug_length(&slug)?;
    post.slug = slug;
  }

  if let Some(category_id) = update.category_id {
    if category_id != post.category_id && !category_exists(&tx, category_id)? {
      return Err(DataError::Integrity(
        format!("Category {} does not exist", category_id)
      ));
    }
    post.category_id = category_id;
  }

  if let Some(is_published) = update.is_published {
    if is_published && post.published_at.is_none() {
      post.published_at = Some(now);
    }
    post.is_published = is_published;
  }

  if let Some(title) = &update.title {
    post.title = title.trim().to_string();
  }
  if let Some(summary) = &update.summary {
    post.summary = summary.clone();
  }
  if let Some(content) = &update.content {
    post.content = content.clone();
  }
  if let Some(author_name) = &update.author_name {
    post.author_name = author_name.trim().to_string();
  }
  if let Some(featured_image) = &update.featured_image {
    post.featured_image = Some(featured_image.clone());
  }
  if let Some(seo_title) = &update.seo_title {
    post.seo_title = seo_title.clone();
  }
  if let Some(seo_description) = &update.seo_description {
    post.seo_description = seo_description.clone();
  }
  post.updated_at = now;

  // view_count is never written from here, it belongs
  // to increment_view.
  let updated = tx.execute(
    "UPDATE blog_posts SET title = ?1, slug = ?2, summary = ?3, content = ?4, \
    featured_image = ?5, author_name = ?6, seo_title = ?7, seo_description = ?8, \
    category_id = ?9, is_published = ?10, published_at = ?11, updated_at = ?12 \
    WHERE id = ?13",
    params![
      post.title,
      post.slug,
      post.summary,
      post.content,
      post.featured_image,
      post.author_name,
      post.seo_title,
      post.seo_description,
      post.category_id,
      post.is_published,
      post.published_at,
      post.updated_at,
      id
    ]
  );
  match updated {
    Err(e) if is_unique_violation(&e) => {
      return Err(DataError::Conflict(format!("Slug {} is already taken", post.slug)));
    },
    other => other?
  };
  tx.commit()?;
  info!("Updated post {}", id);
  Ok(post)
}

pub fn delete_post(pool: &Pool, id: i64) -> Result<(), DataError> {
  let conn = pool.get()?;
  let deleted = conn.execute("DELETE FROM blog_posts WHERE id = ?", params![id])?;
  if deleted == 0 {
    return Err(DataError::NotFound(format!("Post {}", id)));
  }
  info!("Deleted post {}", id);
  Ok(())
}

pub fn post_by_id(pool: &Pool, id: i64) -> Result<Option<BlogPost>, DataError> {
  let conn = pool.get()?;
  fetch_post(&conn, id)
}

// Admin listing, published or not, newest first.
pub fn all_posts(pool: &Pool) -> Result<Vec<BlogPost>, DataError> {
  let conn = pool.get()?;
  select_many(
    &conn,
    &post_query()
      .order(OrderBy::desc("blog_posts.created_at"))
      .order(OrderBy::desc("blog_posts.id"))
      .to_string(),
    [],
    map_post
  )
}

pub fn post_count(pool: &Pool) -> Result<i64, DataError> {
  let conn = pool.get()?;
  count(&conn, "SELECT COUNT(*) FROM blog_posts", [])
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::db::test_utils::*;
  use crate::db::create_category;
  use std::collections::HashSet;
  use std::sync::Arc;
  use std::thread;

  #[test]
  fn create_post_unpublished_by_default() {
    let (_dir, pool) = test_pool();
    let category = create_category(&pool, "Web Development").unwrap();
    let post = create_post(&pool, &sample_post("Why Flask Is Perfect", category.id, false), 1000).unwrap();
    assert_eq!("why-flask-is-perfect", post.slug);
    assert!(!post.is_published);
    assert_eq!(None, post.published_at);
    assert_eq!(0, post.view_count);
    assert_eq!(1000, post.created_at);
    assert_eq!(1000, post.updated_at);
  }

  #[test]
  fn create_published_post_sets_publish_timestamp() {
    let (_dir, pool) = test_pool();
    let category = create_category(&pool, "Web Development").unwrap();
    let post = create_post(&pool, &sample_post("Published", category.id, true), 1000).unwrap();
    assert!(post.is_published);
    assert_eq!(Some(1000), post.published_at);
  }

  #[test]
  fn create_post_requires_fields() {
    let (_dir, pool) = test_pool();
    let category = create_category(&pool, "Web Development").unwrap();
    let mut post = sample_post("  ", category.id, false);
    assert_eq!(
      Err(DataError::validation("title", "is required")),
      create_post(&pool, &post, 1000)
    );
    post.title = "a".repeat(256);
    match create_post(&pool, &post, 1000) {
      Err(DataError::Validation { field, .. }) => assert_eq!("title", field),
      other => panic!("Expected a validation error, got {:?}", other)
    }
    let mut post = sample_post("Fine title", category.id, false);
    post.author_name = String::new();
    match create_post(&pool, &post, 1000) {
      Err(DataError::Validation { field, .. }) => assert_eq!("author_name", field),
      other => panic!("Expected a validation error, got {:?}", other)
    }
    assert_eq!(0, post_count(&pool).unwrap());
  }

  #[test]
  fn create_post_with_unknown_category_fails() {
    let (_dir, pool) = test_pool();
    match create_post(&pool, &sample_post("Orphan", 42, false), 1000) {
      Err(DataError::Integrity(_)) => (),
      other => panic!("Expected an integrity error, got {:?}", other)
    }
    assert_eq!(0, post_count(&pool).unwrap());
  }

  #[test]
  fn all_punctuation_title_still_gets_a_slug() {
    let (_dir, pool) = test_pool();
    let category = create_category(&pool, "Web Development").unwrap();
    let post = create_post(&pool, &sample_post("???", category.id, false), 1000).unwrap();
    assert!(!post.slug.is_empty());
    assert_eq!("-1", post.slug);
  }

  #[test]
  fn concurrent_creations_never_share_a_slug() {
    let (_dir, pool) = test_pool();
    let category = create_category(&pool, "Web Development").unwrap();
    let pool = Arc::new(pool);
    let handles: Vec<_> = (0..50).map(|_| {
      let pool = Arc::clone(&pool);
      thread::spawn(move || {
        create_post(&pool, &sample_post("Same Old Title", category.id, true), 1000)
          .unwrap()
          .slug
      })
    }).collect();
    let slugs: HashSet<String> = handles.into_iter()
      .map(|h| h.join().unwrap())
      .collect();
    assert_eq!(50, slugs.len());
    assert_eq!(50, post_count(&pool).unwrap());
    assert!(slugs.contains("same-old-title"));
    assert!(slugs.contains("same-old-title-49"));
  }

  #[test]
  fn publishing_sets_timestamp_exactly_once() {
    let (_dir, pool) = test_pool();
    let category = create_category(&pool, "Web Development").unwrap();
    let post = create_post(&pool, &sample_post("Draft", category.id, false), 1000).unwrap();

    let publish = PostUpdate { is_published: Some(true), ..Default::default() };
    let post = update_post(&pool, post.id, &publish, 2000).unwrap();
    assert_eq!(Some(2000), post.published_at);

    // Saving again with the flag still set:
    let post = update_post(&pool, post.id, &publish, 3000).unwrap();
    assert_eq!(Some(2000), post.published_at);
    assert_eq!(3000, post.updated_at);

    // Unpublishing then publishing again keeps the original date:
    let unpublish = PostUpdate { is_published: Some(false), ..Default::default() };
    let post = update_post(&pool, post.id, &unpublish, 4000).unwrap();
    assert!(!post.is_published);
    assert_eq!(Some(2000), post.published_at);
    let post = update_post(&pool, post.id, &publish, 5000).unwrap();
    assert!(post.is_published);
    assert_eq!(Some(2000), post_by_id(&pool, post.id).unwrap().unwrap().published_at);
  }

  #[test]
  fn update_keeps_slug_unless_title_or_slug_changed() {
    let (_dir, pool) = test_pool();
    let category = create_category(&pool, "Web Development").unwrap();
    let post = create_post(&pool, &sample_post("First Title", category.id, false), 1000).unwrap();

    let same = PostUpdate {
      title: Some("First Title".to_string()),
      summary: Some("New summary".to_string()),
      ..Default::default()
    };
    let post = update_post(&pool, post.id, &same, 2000).unwrap();
    assert_eq!("first-title", post.slug);
    assert_eq!("New summary", post.summary);

    let retitled = PostUpdate { title: Some("Second Title".to_string()), ..Default::default() };
    let post = update_post(&pool, post.id, &retitled, 3000).unwrap();
    assert_eq!("second-title", post.slug);

    let reslugged = PostUpdate {
      title: Some("Third Title".to_string()),
      slug: Some("Custom Slug".to_string()),
      ..Default::default()
    };
    let post = update_post(&pool, post.id, &reslugged, 4000).unwrap();
    assert_eq!("custom-slug", post.slug);
    assert_eq!("Third Title", post.title);
  }

  #[test]
  fn update_resolves_slug_collisions_against_other_posts() {
    let (_dir, pool) = test_pool();
    let category = create_category(&pool, "Web Development").unwrap();
    create_post(&pool, &sample_post("Taken", category.id, false), 1000).unwrap();
    let post = create_post(&pool, &sample_post("Other", category.id, false), 1000).unwrap();
    let update = PostUpdate { slug: Some("taken".to_string()), ..Default::default() };
    let post = update_post(&pool, post.id, &update, 2000).unwrap();
    assert_eq!("taken-1", post.slug);
  }

  #[test]
  fn update_never_touches_view_count() {
    let (_dir, pool) = test_pool();
    let category = create_category(&pool, "Web Development").unwrap();
    let post = create_post(&pool, &sample_post("Viewed", category.id, true), 1000).unwrap();
    crate::db::increment_view(&pool, post.id).unwrap();
    crate::db::increment_view(&pool, post.id).unwrap();
    let update = PostUpdate { content: Some("<p>Edited</p>".to_string()), ..Default::default() };
    let post = update_post(&pool, post.id, &update, 2000).unwrap();
    assert_eq!(2, post.view_count);
    assert_eq!(2, post_by_id(&pool, post.id).unwrap().unwrap().view_count);
  }

  #[test]
  fn update_with_unknown_category_rolls_back() {
    let (_dir, pool) = test_pool();
    let category = create_category(&pool, "Web Development").unwrap();
    let post = create_post(&pool, &sample_post("Stays", category.id, false), 1000).unwrap();
    let update = PostUpdate {
      title: Some("Changed".to_string()),
      category_id: Some(999),
      ..Default::default()
    };
    match update_post(&pool, post.id, &update, 2000) {
      Err(DataError::Integrity(_)) => (),
      other => panic!("Expected an integrity error, got {:?}", other)
    }
    let unchanged = post_by_id(&pool, post.id).unwrap().unwrap();
    assert_eq!(post, unchanged);
  }

  #[test]
  fn update_can_clear_seo_fields_but_keeps_image() {
    let (_dir, pool) = test_pool();
    let category = create_category(&pool, "Web Development").unwrap();
    let mut new_post = sample_post("With SEO", category.id, false);
    new_post.seo_title = Some("SEO title".to_string());
    new_post.featured_image = Some("https://cdn.example.com/a.webp".to_string());
    let post = create_post(&pool, &new_post, 1000).unwrap();
    let update = PostUpdate { seo_title: Some(None), ..Default::default() };
    let post = update_post(&pool, post.id, &update, 2000).unwrap();
    assert_eq!(None, post.seo_title);
    assert_eq!(Some("https://cdn.example.com/a.webp".to_string()), post.featured_image);
  }

  #[test]
  fn update_missing_post_is_not_found() {
    let (_dir, pool) = test_pool();
    assert_eq!(
      Err(DataError::NotFound("Post 12".to_string())),
      update_post(&pool, 12, &PostUpdate::default(), 1000)
    );
  }

  #[test]
  fn delete_post_removes_it() {
    let (_dir, pool) = test_pool();
    let category = create_category(&pool, "Web Development").unwrap();
    let post = create_post(&pool, &sample_post("Doomed", category.id, true), 1000).unwrap();
    delete_post(&pool, post.id).unwrap();
    assert_eq!(None, post_by_id(&pool, post.id).unwrap());
    assert_eq!(
      Err(DataError::NotFound(format!("Post {}", post.id))),
      delete_post(&pool, post.id)
    );
  }

  #[test]
  fn all_posts_lists_newest_first() {
    let (_dir, pool) = test_pool();
    let category = create_category(&pool, "Web Development").unwrap();
    create_post(&pool, &sample_post("Old", category.id, true), 1000).unwrap();
    create_post(&pool, &sample_post("New", category.id, false), 2000).unwrap();
    let titles: Vec<String> = all_posts(&pool).unwrap().into_iter().map(|p| p.title).collect();
    assert_eq!(vec!["New".to_string(), "Old".to_string()], titles);
  }
}

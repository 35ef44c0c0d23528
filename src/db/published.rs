// Read side of the blog: everything in here only ever
// sees published posts.
use rusqlite::{params, Connection, TransactionBehavior};
use super::entities::*;
use super::error::DataError;
use super::mappers::{map_category_count, map_post, POST_COLUMNS};
use super::queries::{Query, OrderBy};
use super::{count, select_many, select_one, Pool};

pub const MAX_PAGE_SIZE: i64 = 50;
pub const RELATED_POSTS_LIMIT: i64 = 3;
pub const POPULAR_POSTS_LIMIT: i64 = 5;
pub const RECENT_POSTS_LIMIT: i64 = 10;

const PUBLISHED_CLAUSE: &str = "blog_posts.is_published = 1";

#[derive(Debug)]
pub struct Page<T> {
  pub items: Vec<T>,
  pub page: i64,
  pub page_size: i64,
  pub total: i64
}

impl<T> Page<T> {
  pub fn total_pages(&self) -> i64 {
    (self.total + self.page_size - 1) / self.page_size
  }

  pub fn has_prev(&self) -> bool {
    self.page > 1
  }

  pub fn has_next(&self) -> bool {
    self.page < self.total_pages()
  }
}

// Ties on the main ordering are broken with the id so
// the same query always gives the same order.
fn published_query() -> Query {
  Query::select(&POST_COLUMNS, &["blog_posts"])
    .where_and(&[PUBLISHED_CLAUSE])
}

fn newest_first(query: Query) -> Query {
  query
    .order(OrderBy::desc("blog_posts.published_at"))
    .order(OrderBy::asc("blog_posts.id"))
}

fn count_published(conn: &Connection) -> Result<i64, DataError> {
  count(
    conn,
    &format!("SELECT COUNT(*) FROM blog_posts WHERE {}", PUBLISHED_CLAUSE),
    []
  )
}

pub fn published_count(pool: &Pool) -> Result<i64, DataError> {
  let conn = pool.get()?;
  count_published(&conn)
}

/**
 * Page numbers start at 1. Anything lower is page 1 and
 * the page size is kept between 1 and MAX_PAGE_SIZE.
 * Pages past the end come back empty.
 */
pub fn list_published(
  pool: &Pool,
  page: i64,
  page_size: i64
) -> Result<Page<BlogPost>, DataError> {
  let page = page.max(1);
  let page_size = page_size.clamp(1, MAX_PAGE_SIZE);
  // The count and the rows have to come from the same
  // snapshot or total and has_next can disagree with items.
  let mut conn = pool.get()?;
  let tx = conn.transaction_with_behavior(TransactionBehavior::Deferred)?;
  let total = count_published(&tx)?;
  // Huge page numbers shouldn't overflow anything:
  let offset = (page - 1).saturating_mul(page_size);
  let items = if offset >= total {
    Vec::new()
  } else {
    select_many(
      &tx,
      &newest_first(published_query())
        .limit(page_size)
        .offset(offset)
        .to_string(),
      [],
      map_post
    )?
  };
  tx.commit()?;
  Ok(Page {
    items,
    page,
    page_size,
    total
  })
}

// The most recently published post.
pub fn featured_post(pool: &Pool) -> Result<Option<BlogPost>, DataError> {
  let conn = pool.get()?;
  select_one(
    &conn,
    &newest_first(published_query()).limit(1).to_string(),
    [],
    map_post
  )
}

// Categories without any published post are left out.
pub fn category_counts(pool: &Pool) -> Result<Vec<CategoryCount>, DataError> {
  let conn = pool.get()?;
  let query = Query::select(
    &["categories.id", "categories.name", "COUNT(blog_posts.id)"],
    &["categories"]
  )
    .join("blog_posts ON blog_posts.category_id = categories.id")
    .where_and(&[PUBLISHED_CLAUSE])
    .group_by(&["categories.id", "categories.name"])
    .order(OrderBy::asc("categories.id"));
  select_many(&conn, &query.to_string(), [], map_category_count)
}

// Other published posts from the same category.
pub fn related_posts(pool: &Pool, post: &BlogPost) -> Result<Vec<BlogPost>, DataError> {
  let conn = pool.get()?;
  select_many(
    &conn,
    &newest_first(
      published_query()
        .where_and(&["blog_posts.category_id = ?", "blog_posts.id != ?"])
    )
      .limit(RELATED_POSTS_LIMIT)
      .to_string(),
    params![post.category_id, post.id],
    map_post
  )
}

pub fn popular_posts(pool: &Pool, limit: i64) -> Result<Vec<BlogPost>, DataError> {
  let conn = pool.get()?;
  select_many(
    &conn,
    &published_query()
      .order(OrderBy::desc("blog_posts.view_count"))
      .order(OrderBy::asc("blog_posts.id"))
      .limit(limit.clamp(1, MAX_PAGE_SIZE))
      .to_string(),
    [],
    map_post
  )
}

pub fn recent_posts(pool: &Pool, limit: i64) -> Result<Vec<BlogPost>, DataError> {
  let conn = pool.get()?;
  select_many(
    &conn,
    &newest_first(published_query())
      .limit(limit.clamp(1, MAX_PAGE_SIZE))
      .to_string(),
    [],
    map_post
  )
}

// Unpublished posts are invisible here, even when the
// slug is right.
pub fn published_post_by_slug(pool: &Pool, slug: &str) -> Result<Option<BlogPost>, DataError> {
  let conn = pool.get()?;
  select_one(
    &conn,
    &published_query().where_and(&["blog_posts.slug = ?"]).to_string(),
    params![slug],
    map_post
  )
}

use super::entities::*;
use rusqlite::{Row, Error};

// Column lists have to match the mappers below,
// in the same order.
pub const CATEGORY_COLUMNS: [&str; 2] = [
  "categories.id",
  "categories.name"
];

pub const POST_COLUMNS: [&str; 15] = [
  "blog_posts.id",
  "blog_posts.title",
  "blog_posts.slug",
  "blog_posts.summary",
  "blog_posts.content",
  "blog_posts.featured_image",
  "blog_posts.author_name",
  "blog_posts.seo_title",
  "blog_posts.seo_description",
  "blog_posts.category_id",
  "blog_posts.is_published",
  "blog_posts.published_at",
  "blog_posts.view_count",
  "blog_posts.created_at",
  "blog_posts.updated_at"
];

pub fn map_category(row: &Row) -> Result<Category, Error> {
  Ok(Category {
    id: row.get(0)?,
    name: row.get(1)?
  })
}

pub fn map_post(row: &Row) -> Result<BlogPost, Error> {
  Ok(BlogPost {
    id: row.get(0)?,
    title: row.get(1)?,
    slug: row.get(2)?,
    summary: row.get(3)?,
    content: row.get(4)?,
    featured_image: row.get(5)?,
    author_name: row.get(6)?,
    seo_title: row.get(7)?,
    seo_description: row.get(8)?,
    category_id: row.get(9)?,
    is_published: row.get(10)?,
    published_at: row.get(11)?,
    view_count: row.get(12)?,
    created_at: row.get(13)?,
    updated_at: row.get(14)?
  })
}

pub fn map_category_count(row: &Row) -> Result<CategoryCount, Error> {
  Ok(CategoryCount {
    category_id: row.get(0)?,
    name: row.get(1)?,
    post_count: row.get(2)?
  })
}

use serde::Serialize;

// Plain rows, timestamps are UTC Unix timestamps
// like everything else in the database.

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Category {
  pub id: i64,
  pub name: String
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlogPost {
  pub id: i64,
  pub title: String,
  pub slug: String,
  pub summary: String,
  pub content: String,
  pub featured_image: Option<String>,
  pub author_name: String,
  pub seo_title: Option<String>,
  pub seo_description: Option<String>,
  pub category_id: i64,
  pub is_published: bool,
  // Only ever set once, the first time the post
  // gets published.
  pub published_at: Option<i64>,
  pub view_count: i64,
  pub created_at: i64,
  pub updated_at: i64
}

// Everything the admin provides when creating a post.
// The slug is always generated from the title.
#[derive(Debug, Clone)]
pub struct NewPost {
  pub title: String,
  pub summary: String,
  pub content: String,
  pub featured_image: Option<String>,
  pub author_name: String,
  pub seo_title: Option<String>,
  pub seo_description: Option<String>,
  pub category_id: i64,
  pub is_published: bool
}

// "Update only what's in the request" object.
// The SEO fields use a double Option so they can be
// cleared: Some(None) sets them to NULL.
// The featured image can only be replaced, never
// cleared.
#[derive(Debug, Clone, Default)]
pub struct PostUpdate {
  pub title: Option<String>,
  pub slug: Option<String>,
  pub summary: Option<String>,
  pub content: Option<String>,
  pub featured_image: Option<String>,
  pub author_name: Option<String>,
  pub seo_title: Option<Option<String>>,
  pub seo_description: Option<Option<String>>,
  pub category_id: Option<i64>,
  pub is_published: Option<bool>
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryCount {
  pub category_id: i64,
  pub name: String,
  pub post_count: i64
}

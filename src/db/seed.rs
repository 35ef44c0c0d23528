use rusqlite::{Connection, TransactionBehavior};
use log::info;
use super::entities::NewPost;
use super::error::DataError;
use super::categories::insert_category;
use super::posts::{insert_post, InsertOutcome};
use super::{count, Pool};

#[derive(Debug, PartialEq)]
pub enum SeedOutcome {
  AlreadySeeded,
  Seeded {
    categories: usize,
    posts: usize
  }
}

const STARTER_CATEGORIES: [&str; 3] = [
  "Web Development",
  "AI & ML",
  "Cloud Computing"
];

// (category index, title, summary, content, image, author, SEO title, SEO description)
const STARTER_POSTS: [(usize, &str, &str, &str, &str, &str, &str, &str); 3] = [
  (
    0,
    "Why Flask Is Perfect for Startups",
    "Flask offers flexibility, simplicity, and scalability for startups.",
    "<p>Flask is lightweight, flexible, and ideal for rapid development.</p>",
    "images/blogs/web.webp",
    "Sadiq Ali",
    "Why Flask Is Best for Startups | Nexa Solutions",
    "Discover why Flask is a top choice for startup web development."
  ),
  (
    1,
    "How AI Is Transforming Businesses",
    "AI is revolutionizing industries through automation and intelligence.",
    "<p>AI enables smarter decision-making and automation.</p>",
    "images/blogs/ai.webp",
    "John Doe",
    "AI Transforming Businesses in 2026",
    "Explore real-world AI applications for modern businesses."
  ),
  (
    2,
    "Cloud Migration: Things You Must Know",
    "A complete guide to successful cloud migration.",
    "<p>Cloud migration improves scalability and reduces costs.</p>",
    "images/blogs/cloud.webp",
    "Jane Smith",
    "Cloud Migration Guide | Nexa Solutions",
    "Essential tips for cloud migration success."
  )
];

fn insert_starter_set(conn: &Connection, now: i64) -> Result<SeedOutcome, DataError> {
  let mut category_ids: Vec<i64> = Vec::with_capacity(STARTER_CATEGORIES.len());
  for name in STARTER_CATEGORIES.iter() {
    category_ids.push(insert_category(conn, name)?.id);
  }
  for (category, title, summary, content, image, author, seo_title, seo_description)
    in STARTER_POSTS.iter() {
    let new_post = NewPost {
      title: title.to_string(),
      summary: summary.to_string(),
      content: content.to_string(),
      featured_image: Some(image.to_string()),
      author_name: author.to_string(),
      seo_title: Some(seo_title.to_string()),
      seo_description: Some(seo_description.to_string()),
      category_id: category_ids[*category],
      is_published: true
    };
    if let InsertOutcome::SlugTaken(slug) = insert_post(conn, &new_post, now)? {
      return Err(DataError::Integrity(format!("Slug {} is already taken", slug)));
    }
  }
  Ok(SeedOutcome::Seeded {
    categories: STARTER_CATEGORIES.len(),
    posts: STARTER_POSTS.len()
  })
}

/**
 * Puts the starter categories and posts in an empty
 * database. Does nothing at all as soon as there's at
 * least one category. Either everything gets inserted
 * or nothing does.
 */
pub fn seed_data(pool: &Pool, now: i64) -> Result<SeedOutcome, DataError> {
  let mut conn = pool.get()?;
  let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
  if count(&tx, "SELECT COUNT(*) FROM categories", [])? > 0 {
    info!("Data already exists, skipping seeding");
    return Ok(SeedOutcome::AlreadySeeded);
  }
  let outcome = insert_starter_set(&tx, now)?;
  tx.commit()?;
  info!("Starter data inserted: {:?}", outcome);
  Ok(outcome)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::db::test_utils::*;
  use crate::db::{all_categories, category_count, create_category, featured_post, post_count};

  #[test]
  fn seeding_an_empty_database() {
    let (_dir, pool) = test_pool();
    assert_eq!(
      SeedOutcome::Seeded { categories: 3, posts: 3 },
      seed_data(&pool, 1000).unwrap()
    );
    assert_eq!(3, category_count(&pool).unwrap());
    assert_eq!(3, post_count(&pool).unwrap());
    let featured = featured_post(&pool).unwrap().unwrap();
    assert_eq!("why-flask-is-perfect-for-startups", featured.slug);
    assert_eq!(Some(1000), featured.published_at);
  }

  #[test]
  fn seeding_twice_does_nothing() {
    let (_dir, pool) = test_pool();
    seed_data(&pool, 1000).unwrap();
    assert_eq!(SeedOutcome::AlreadySeeded, seed_data(&pool, 2000).unwrap());
    assert_eq!(3, category_count(&pool).unwrap());
    assert_eq!(3, post_count(&pool).unwrap());
  }

  #[test]
  fn any_category_blocks_seeding() {
    let (_dir, pool) = test_pool();
    create_category(&pool, "Web Development").unwrap();
    assert_eq!(SeedOutcome::AlreadySeeded, seed_data(&pool, 1000).unwrap());
    assert_eq!(1, all_categories(&pool).unwrap().len());
    assert_eq!(0, post_count(&pool).unwrap());
  }
}

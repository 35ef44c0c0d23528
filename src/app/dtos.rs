use serde::{Deserialize, Serialize};
use derive_more::Display;
use crate::db::entities::*;
use crate::db::Page;
use crate::services::mail::{self, MailMessage};
use crate::utils::{serde_utils, text_utils, time_utils::{self, DateFormat}};

// Entities are converted to DTOs with the From trait,
// it only ever goes entity -> DTO except for the
// admin forms.

// The CategoryDto is exactly Category.
pub use crate::db::entities::Category as CategoryDto;

const DEFAULT_CONTACT_SUBJECT: &str = "New Contact Form";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDto {
  pub id: i64,
  pub title: String,
  pub slug: String,
  pub summary: String,
  // Left out of the lists to save some bytes.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub content: Option<String>,
  pub featured_image: Option<String>,
  pub author_name: String,
  pub seo_title: Option<String>,
  pub seo_description: Option<String>,
  pub category_id: i64,
  pub is_published: bool,
  pub published_at: Option<String>,
  pub view_count: i64,
  pub created_at: String,
  pub updated_at: String
}

impl From<BlogPost> for PostDto {
  fn from(post: BlogPost) -> Self {
    Self {
      id: post.id,
      title: post.title,
      slug: post.slug,
      summary: post.summary,
      content: Some(post.content),
      featured_image: post.featured_image,
      author_name: post.author_name,
      seo_title: post.seo_title,
      seo_description: post.seo_description,
      category_id: post.category_id,
      is_published: post.is_published,
      published_at: post.published_at
        .map(|t| time_utils::timestamp_to_date_string(t, DateFormat::Iso8601)),
      view_count: post.view_count,
      created_at: time_utils::timestamp_to_date_string(post.created_at, DateFormat::Iso8601),
      updated_at: time_utils::timestamp_to_date_string(post.updated_at, DateFormat::Iso8601)
    }
  }
}

impl PostDto {
  pub fn without_content(mut self) -> Self {
    self.content = None;
    self
  }
}

pub fn post_summaries(posts: Vec<BlogPost>) -> Vec<PostDto> {
  posts.into_iter()
    .map(|p| PostDto::from(p).without_content())
    .collect()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCountDto {
  pub id: i64,
  pub name: String,
  pub post_count: i64
}

impl From<CategoryCount> for CategoryCountDto {
  fn from(count: CategoryCount) -> Self {
    Self {
      id: count.category_id,
      name: count.name,
      post_count: count.post_count
    }
  }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageDto {
  pub items: Vec<PostDto>,
  pub page: i64,
  pub page_size: i64,
  pub total: i64,
  pub total_pages: i64,
  pub has_prev: bool,
  pub has_next: bool
}

impl From<Page<BlogPost>> for PageDto {
  fn from(page: Page<BlogPost>) -> Self {
    let total_pages = page.total_pages();
    let has_prev = page.has_prev();
    let has_next = page.has_next();
    Self {
      items: post_summaries(page.items),
      page: page.page,
      page_size: page.page_size,
      total: page.total,
      total_pages,
      has_prev,
      has_next
    }
  }
}

// Everything the blog landing page needs.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogIndexDto {
  pub featured: Option<PostDto>,
  pub posts: PageDto,
  pub categories: Vec<CategoryCountDto>,
  pub recent: Vec<PostDto>
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogDetailDto {
  pub post: PostDto,
  pub related: Vec<PostDto>,
  pub popular: Vec<PostDto>,
  pub categories: Vec<CategoryCountDto>
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardDto {
  pub blog_count: i64,
  pub category_count: i64
}

#[derive(Deserialize)]
pub struct BlogQuery {
  pub page: Option<i64>
}

#[derive(Deserialize)]
pub struct LoginForm {
  pub username: String,
  pub password: String
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
  pub token: String,
  pub expires_in: i64
}

#[derive(Deserialize)]
pub struct CategoryForm {
  pub name: String
}

// The image comes in as base64 and is uploaded before
// anything gets written.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostForm {
  pub title: String,
  pub summary: String,
  pub content: String,
  pub author_name: String,
  pub category_id: i64,
  #[serde(default)]
  pub is_published: bool,
  pub seo_title: Option<String>,
  pub seo_description: Option<String>,
  pub featured_image_data: Option<String>
}

impl PostForm {
  pub fn into_new_post(self, featured_image: Option<String>) -> NewPost {
    NewPost {
      title: self.title,
      summary: self.summary,
      content: self.content,
      featured_image,
      author_name: self.author_name,
      seo_title: serde_utils::empty_string_to_none(self.seo_title),
      seo_description: serde_utils::empty_string_to_none(self.seo_description),
      category_id: self.category_id,
      is_published: self.is_published
    }
  }
}

// Only what's present gets updated. An empty string
// clears the SEO fields.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostUpdateForm {
  pub title: Option<String>,
  pub slug: Option<String>,
  pub summary: Option<String>,
  pub content: Option<String>,
  pub author_name: Option<String>,
  pub category_id: Option<i64>,
  pub is_published: Option<bool>,
  pub seo_title: Option<String>,
  pub seo_description: Option<String>,
  pub featured_image_data: Option<String>
}

impl PostUpdateForm {
  pub fn into_update(self, featured_image: Option<String>) -> PostUpdate {
    PostUpdate {
      title: self.title,
      slug: serde_utils::empty_string_to_none(self.slug),
      summary: self.summary,
      content: self.content,
      featured_image,
      author_name: self.author_name,
      seo_title: self.seo_title.map(|s| serde_utils::empty_string_to_none(Some(s))),
      seo_description: self.seo_description
        .map(|s| serde_utils::empty_string_to_none(Some(s))),
      category_id: self.category_id,
      is_published: self.is_published
    }
  }
}

#[derive(Debug, Deserialize)]
pub struct ContactForm {
  pub name: String,
  pub email: String,
  pub phone: String,
  pub subject: Option<String>,
  pub message: String
}

impl ContactForm {
  // Returns the first missing field, if any.
  pub fn missing_field(&self) -> Option<&'static str> {
    [
      ("name", &self.name),
      ("email", &self.email),
      ("phone", &self.phone),
      ("message", &self.message)
    ].iter()
      .find(|(_, value)| text_utils::is_blank(value))
      .map(|(field, _)| *field)
  }

  // Nobody can answer a message without a usable address.
  pub fn has_valid_email(&self) -> bool {
    mail::is_valid_address(&self.email)
  }

  pub fn into_mail(
    self,
    recipient: &str,
    page_url: &str,
    sent_at: i64
  ) -> MailMessage {
    let subject = self.subject
      .map(|s| s.trim().to_string())
      .filter(|s| !s.is_empty())
      .unwrap_or_else(|| String::from(DEFAULT_CONTACT_SUBJECT));
    let email = self.email.trim().to_string();
    let body = format!(
      "Name: {}\nEmail: {}\nPhone: {}\nSubject: {}\n\nMessage:\n{}\n\n\
      Sent from: {}\nTime: {}",
      self.name.trim(),
      email,
      self.phone.trim(),
      subject,
      self.message.trim(),
      page_url,
      time_utils::timestamp_to_date_string(sent_at, DateFormat::Standard)
    );
    MailMessage {
      subject: format!("Contact Form: {}", subject),
      body,
      reply_to: Some(email),
      recipients: vec![String::from(recipient)]
    }
  }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct JsonStatus {
  pub status: String,
  pub message: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub id: Option<i64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub field: Option<String>
}

#[derive(Debug, Display)]
pub enum JsonStatusType {
  #[display(fmt = "success")]
  Success,
  #[display(fmt = "error")]
  Error
}

impl JsonStatus {
  pub fn new(status: JsonStatusType, message: &str) -> Self {
    Self {
      status: status.to_string(),
      message: String::from(message),
      id: None,
      field: None
    }
  }

  pub fn new_with_id(
    status: JsonStatusType,
    message: &str,
    id: i64
  ) -> Self {
    Self {
      id: Some(id),
      ..Self::new(status, message)
    }
  }
}

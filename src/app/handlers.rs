use actix_web::{
  web,
  HttpResponse,
  HttpRequest,
  Result
};
use log::{error, info, warn};
use crate::db;
use crate::services::image_upload::upload_image;
use crate::utils::time_utils::current_timestamp;
use super::auth::{self, AdminIdentity};
use super::dtos::*;
use super::error::{Error, map_db_error};
use super::helpers;
use super::AppState;

// Module with all the API handler functions. Public
// blog pages first, then the contact form, then
// everything behind the admin session.

// Default response when no route matched the request:
pub async fn not_found() -> Result<HttpResponse, Error> {
  Err(Error::NotFound(String::from("Endpoint doesn't exist")))
}

fn category_count_dtos(pool: &db::Pool) -> Result<Vec<CategoryCountDto>, Error> {
  Ok(
    db::category_counts(pool)
      .map_err(map_db_error)?
      .into_iter()
      .map(CategoryCountDto::from)
      .collect()
  )
}

pub async fn blog_index(
  app_state: web::Data<AppState>,
  query: web::Query<BlogQuery>
) -> Result<HttpResponse, Error> {
  let pool = &app_state.pool;
  let page = db::list_published(
    pool,
    query.page.unwrap_or(1),
    app_state.posts_per_page
  ).map_err(map_db_error)?;
  let featured = db::featured_post(pool).map_err(map_db_error)?;
  let recent = db::recent_posts(pool, db::RECENT_POSTS_LIMIT)
    .map_err(map_db_error)?;

  Ok(HttpResponse::Ok().json(BlogIndexDto {
    featured: featured.map(|p| PostDto::from(p).without_content()),
    posts: page.into(),
    categories: category_count_dtos(pool)?,
    recent: post_summaries(recent)
  }))
}

// Path variables have to be in a tuple.
pub async fn blog_detail(
  app_state: web::Data<AppState>,
  path: web::Path<(String,)>
) -> Result<HttpResponse, Error> {
  let slug = path.into_inner().0;
  let pool = &app_state.pool;
  let mut post = db::published_post_by_slug(pool, &slug)
    .map_err(map_db_error)?
    .ok_or_else(|| Error::NotFound(String::from("Blog post does not exist")))?;

  // Losing a view is not worth failing the page for.
  match db::increment_view(pool, post.id) {
    Ok(()) => post.view_count += 1,
    Err(e) => error!("Could not count a view for post {} - {}", post.id, e)
  }

  let related = db::related_posts(pool, &post).map_err(map_db_error)?;
  let popular = db::popular_posts(pool, db::POPULAR_POSTS_LIMIT)
    .map_err(map_db_error)?;

  Ok(HttpResponse::Ok().json(BlogDetailDto {
    post: post.into(),
    related: post_summaries(related),
    popular: post_summaries(popular),
    categories: category_count_dtos(pool)?
  }))
}

/**
 * Mail problems are logged and swallowed, the visitor
 * always gets the same answer once the form is valid.
 */
pub async fn contact(
  app_state: web::Data<AppState>,
  form: web::Json<ContactForm>,
  req: HttpRequest
) -> Result<HttpResponse, Error> {
  let form = form.into_inner();
  if let Some(field) = form.missing_field() {
    return Err(Error::InvalidField {
      field,
      message: String::from("is required")
    });
  }
  if !form.has_valid_email() {
    return Err(Error::InvalidField {
      field: "email",
      message: String::from("is not a valid email address")
    });
  }
  if app_state.check_rate_limit() {
    warn!("Rate limit reached on {} from {:?}", req.path(), helpers::real_ip_addr(&req));
    return Err(Error::TooManyRequests);
  }

  let mail = form.into_mail(
    &app_state.contact_recipient,
    &helpers::contact_page_url(&req),
    current_timestamp()
  );
  match app_state.mailer.send(&mail).await {
    Ok(()) => info!("Contact form mail sent ({})", mail.subject),
    Err(e) => error!("Could not send contact form mail - {}", e)
  }

  Ok(HttpResponse::Ok().json(JsonStatus::new(
    JsonStatusType::Success,
    "Thank you! Your message has been received."
  )))
}

pub async fn login(
  app_state: web::Data<AppState>,
  form: web::Json<LoginForm>,
  req: HttpRequest
) -> Result<HttpResponse, Error> {
  if app_state.check_rate_limit() {
    warn!("Rate limit reached on {} from {:?}", req.path(), helpers::real_ip_addr(&req));
    return Err(Error::TooManyRequests);
  }
  if !auth::credentials_match(&app_state.credentials, form.username.trim(), &form.password) {
    warn!("Failed admin login attempt from {:?}", helpers::real_ip_addr(&req));
    return Err(Error::Unauthorized(String::from("Invalid username or password")));
  }

  let token = auth::new_token();
  let ttl = app_state.credentials.session_ttl_secs;
  db::create_session(
    &app_state.pool,
    &auth::hash_token(&token),
    current_timestamp(),
    ttl
  ).map_err(map_db_error)?;
  info!("Admin logged in from {:?}", helpers::real_ip_addr(&req));

  Ok(HttpResponse::Ok().json(LoginResponse {
    token,
    expires_in: ttl
  }))
}

pub async fn logout(
  app_state: web::Data<AppState>,
  admin: AdminIdentity
) -> Result<HttpResponse, Error> {
  db::delete_session(&app_state.pool, &admin.token_hash)
    .map_err(map_db_error)?;
  Ok(HttpResponse::Ok().json(JsonStatus::new(JsonStatusType::Success, "Logged out")))
}

pub async fn dashboard(
  app_state: web::Data<AppState>,
  _admin: AdminIdentity
) -> Result<HttpResponse, Error> {
  Ok(HttpResponse::Ok().json(DashboardDto {
    blog_count: db::post_count(&app_state.pool).map_err(map_db_error)?,
    category_count: db::category_count(&app_state.pool).map_err(map_db_error)?
  }))
}

pub async fn admin_posts(
  app_state: web::Data<AppState>,
  _admin: AdminIdentity
) -> Result<HttpResponse, Error> {
  let posts = db::all_posts(&app_state.pool).map_err(map_db_error)?;
  Ok(HttpResponse::Ok().json(post_summaries(posts)))
}

pub async fn admin_post(
  app_state: web::Data<AppState>,
  _admin: AdminIdentity,
  path: web::Path<(i64,)>
) -> Result<HttpResponse, Error> {
  let id = path.into_inner().0;
  match db::post_by_id(&app_state.pool, id).map_err(map_db_error)? {
    Some(post) => Ok(HttpResponse::Ok().json(PostDto::from(post))),
    None => Err(Error::NotFound(format!("Post {} does not exist", id)))
  }
}

// Nothing gets written when the upload fails, the
// caller has to bail out on the error.
async fn upload_featured_image(
  app_state: &AppState,
  data: &str
) -> Result<String, Error> {
  let bytes = helpers::decode_image_data(data)
    .ok_or_else(|| Error::InvalidField {
      field: "featuredImageData",
      message: String::from("is not valid base64 data")
    })?;
  upload_image(app_state.uploader.as_ref(), bytes)
    .await
    .map_err(|e| Error::Upstream(e.to_string()))
}

async fn featured_image_from(
  app_state: &AppState,
  data: Option<String>
) -> Result<Option<String>, Error> {
  match data {
    Some(data) if !data.trim().is_empty() =>
      Ok(Some(upload_featured_image(app_state, &data).await?)),
    _ => Ok(None)
  }
}

pub async fn create_post(
  app_state: web::Data<AppState>,
  _admin: AdminIdentity,
  form: web::Json<PostForm>
) -> Result<HttpResponse, Error> {
  let mut form = form.into_inner();
  let featured_image = featured_image_from(
    &app_state,
    form.featured_image_data.take()
  ).await?;
  let post = db::create_post(
    &app_state.pool,
    &form.into_new_post(featured_image),
    current_timestamp()
  ).map_err(map_db_error)?;
  info!("Created post {} ({})", post.id, post.slug);
  Ok(HttpResponse::Created().json(PostDto::from(post)))
}

pub async fn update_post(
  app_state: web::Data<AppState>,
  _admin: AdminIdentity,
  path: web::Path<(i64,)>,
  form: web::Json<PostUpdateForm>
) -> Result<HttpResponse, Error> {
  let id = path.into_inner().0;
  // Don't upload anything for a post that isn't there.
  if db::post_by_id(&app_state.pool, id).map_err(map_db_error)?.is_none() {
    return Err(Error::NotFound(format!("Post {} does not exist", id)));
  }
  let mut form = form.into_inner();
  let featured_image = featured_image_from(
    &app_state,
    form.featured_image_data.take()
  ).await?;
  let post = db::update_post(
    &app_state.pool,
    id,
    &form.into_update(featured_image),
    current_timestamp()
  ).map_err(map_db_error)?;
  info!("Updated post {} ({})", post.id, post.slug);
  Ok(HttpResponse::Ok().json(PostDto::from(post)))
}

pub async fn delete_post(
  app_state: web::Data<AppState>,
  _admin: AdminIdentity,
  path: web::Path<(i64,)>
) -> Result<HttpResponse, Error> {
  let id = path.into_inner().0;
  db::delete_post(&app_state.pool, id).map_err(map_db_error)?;
  info!("Deleted post {}", id);
  Ok(HttpResponse::Ok().json(
    JsonStatus::new_with_id(JsonStatusType::Success, "Post deleted", id)
  ))
}

pub async fn categories(
  app_state: web::Data<AppState>,
  _admin: AdminIdentity
) -> Result<HttpResponse, Error> {
  let categories: Vec<CategoryDto> = db::all_categories(&app_state.pool)
    .map_err(map_db_error)?;
  Ok(HttpResponse::Ok().json(categories))
}

pub async fn admin_category(
  app_state: web::Data<AppState>,
  _admin: AdminIdentity,
  path: web::Path<(i64,)>
) -> Result<HttpResponse, Error> {
  let id = path.into_inner().0;
  match db::category_by_id(&app_state.pool, id).map_err(map_db_error)? {
    Some(category) => Ok(HttpResponse::Ok().json(CategoryDto::from(category))),
    None => Err(Error::NotFound(format!("Category {} does not exist", id)))
  }
}

pub async fn create_category(
  app_state: web::Data<AppState>,
  _admin: AdminIdentity,
  form: web::Json<CategoryForm>
) -> Result<HttpResponse, Error> {
  let category = db::create_category(&app_state.pool, &form.name)
    .map_err(map_db_error)?;
  info!("Created category {} ({})", category.id, category.name);
  Ok(HttpResponse::Created().json(CategoryDto::from(category)))
}

pub async fn delete_category(
  app_state: web::Data<AppState>,
  _admin: AdminIdentity,
  path: web::Path<(i64,)>
) -> Result<HttpResponse, Error> {
  let id = path.into_inner().0;
  db::delete_category(&app_state.pool, id).map_err(map_db_error)?;
  info!("Deleted category {}", id);
  Ok(HttpResponse::Ok().json(
    JsonStatus::new_with_id(JsonStatusType::Success, "Category deleted", id)
  ))
}

pub async fn seed(
  app_state: web::Data<AppState>,
  _admin: AdminIdentity
) -> Result<HttpResponse, Error> {
  let message = match db::seed_data(&app_state.pool, current_timestamp())
    .map_err(map_db_error)? {
      db::SeedOutcome::AlreadySeeded =>
        String::from("Database already has data, nothing was seeded"),
      db::SeedOutcome::Seeded { categories, posts } =>
        format!("Seeded {} categories and {} posts", categories, posts)
    };
  info!("{}", message);
  Ok(HttpResponse::Ok().json(JsonStatus::new(JsonStatusType::Success, &message)))
}

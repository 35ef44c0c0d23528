use actix_web::{middleware, web, App, HttpServer};
use color_eyre::Result;
use eyre::WrapErr;
use log::{error, info};
use rate_limiter::BasicRateLimiter;
use std::sync::{Arc, RwLock};
use std::time::Duration;
// I think we have to add crate here because
// of the other crate named "config" that we
// use as a dependency.
use crate::config::{AdminCredentials, Config, MailSettings};
use crate::db::{self, Pool};
use crate::services::image_upload::{HttpImageUploader, ImageUploader};
use crate::services::mail::{Mailer, SmtpMailer};
use crate::utils::time_utils::current_timestamp;
use error::Error;
mod auth;
mod dtos;
mod error;
mod handlers;
mod helpers;
mod rate_limiter;

// Base64 images travel inside the JSON bodies.
const MAX_JSON_BODY_BYTES: usize = 10 * 1024 * 1024;

pub struct AppState {
  pub pool: Pool,
  pub credentials: AdminCredentials,
  pub uploader: Arc<dyn ImageUploader>,
  pub mailer: Arc<dyn Mailer>,
  pub contact_recipient: String,
  pub posts_per_page: i64,
  // Shared by the login and contact endpoints.
  pub rate_limiter: RwLock<BasicRateLimiter>
}

impl AppState {

  pub fn check_rate_limit(&self) -> bool {
    let now = current_timestamp();
    let (needs_update, is_locked) = self.rate_limiter_needs_update(now);
    if needs_update {
      // Get a lock on the rate limiter:
      match self.rate_limiter.write() {
        Ok(mut rl) => return rl.update(now),
        Err(e) => {
          error!("Could not get a write handle on the \
          rate limiter, SHOULD NEVER HAPPEN - {}", e);
        }
      }
    }
    is_locked
  }

  // Returns tuple: "needs update" first, then the current
  // is_locked value.
  fn rate_limiter_needs_update(&self, now: i64) -> (bool, bool) {
    match self.rate_limiter.read() {
      Ok(rl) => (
        !rl.is_locked() || rl.is_expired(now),
        rl.is_locked()
      ),
      Err(e) => {
        error!("Could not get a read handle on the rate limiter - \
          SHOULD NEVER HAPPEN - {}", e);
        (false, false)
      }
    }
  }

}

// Function to start the server, main.rs awaits it
// from the actix runtime.
pub async fn run() -> Result<()> {
  let config = Config::from_env()?;
  info!("Current config: {}", config.redacted());

  let pool = db::open_pool(
    &config.db_path,
    config.db_pool_size,
    Duration::from_millis(config.db_busy_timeout_ms)
  ).context("Opening the database")?;
  db::init_schema(&pool)
    .context("Creating the database schema")?;

  let uploader = HttpImageUploader::open(&config.upload_url)
    .context("Creating the image upload client")?;
  let mail_settings = MailSettings::from(&config);
  let mailer = SmtpMailer::open(&mail_settings)
    .context("Creating the SMTP transport")?;

  let bind_address = config.bind_address.clone();

  let app_state = web::Data::new(
    AppState {
      pool,
      credentials: AdminCredentials::from(&config),
      uploader: Arc::new(uploader),
      mailer: Arc::new(mailer),
      contact_recipient: mail_settings.contact_recipient,
      posts_per_page: config.posts_per_page.into(),
      rate_limiter: RwLock::new(
        BasicRateLimiter::new(
          config.rl_max_requests,
          config.rl_max_requests_time,
          config.rl_block_duration,
          current_timestamp()
        )
      )
    }
  );

  info!("Listening on {}", bind_address);
  HttpServer::new(move|| {
    App::new()
      .app_data(app_state.clone())
      .wrap(middleware::Logger::default())
      .configure(configure_routes)
      .default_service(web::route().to(handlers::not_found))
  })
  .bind(bind_address)?
  .run()
  .await
  .context("Start Actix web server")
}

// Route configuration, also used by the handler tests.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
  cfg.app_data(web::PathConfig::default().error_handler(|_, _| {
      Error::BadRequest(String::from("Invalid path arguments")).into()
    }))
    .app_data(web::QueryConfig::default().error_handler(|_, _| {
      Error::BadRequest(String::from("Invalid query string arguments")).into()
    }))
    .app_data(web::JsonConfig::default()
      .limit(MAX_JSON_BODY_BYTES)
      .error_handler(|err, _| Error::BadRequest(err.to_string()).into())
    )
    .route("/blog", web::get().to(handlers::blog_index))
    .route("/blog/{slug}", web::get().to(handlers::blog_detail))
    .route("/contact", web::post().to(handlers::contact))
    .route("/admin/login", web::post().to(handlers::login))
    .route("/admin/logout", web::post().to(handlers::logout))
    .route("/admin", web::get().to(handlers::dashboard))
    .route("/admin/blogs", web::get().to(handlers::admin_posts))
    .route("/admin/blogs", web::post().to(handlers::create_post))
    .route("/admin/blogs/{id}", web::get().to(handlers::admin_post))
    .route("/admin/blogs/{id}", web::put().to(handlers::update_post))
    .route("/admin/blogs/{id}", web::delete().to(handlers::delete_post))
    .route("/admin/categories", web::get().to(handlers::categories))
    .route("/admin/categories", web::post().to(handlers::create_category))
    .route("/admin/categories/{id}", web::get().to(handlers::admin_category))
    .route("/admin/categories/{id}", web::delete().to(handlers::delete_category))
    .route("/admin/seed", web::post().to(handlers::seed));
}

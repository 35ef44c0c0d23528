// Adding the context method to errors:
use eyre::WrapErr;
use color_eyre::Result;
use serde::Deserialize;
use std::convert::From;

// No Debug derive, there are passwords in there.
#[derive(Deserialize)]
pub struct Config {
  pub db_path: String,
  pub db_pool_size: u32,
  pub db_busy_timeout_ms: u64,
  pub bind_address: String,
  // The one and only administrator:
  pub admin_username: String,
  pub admin_password: String,
  pub session_ttl_secs: i64,
  pub posts_per_page: u32,
  // External collaborators:
  pub upload_url: String,
  pub smtp_host: String,
  pub smtp_port: u16,
  pub smtp_username: String,
  pub smtp_password: String,
  pub mail_sender: String,
  pub contact_recipient: String,
  // Rate limiter settings (login and contact form):
  pub rl_max_requests: u32,
  pub rl_max_requests_time: u32,
  pub rl_block_duration: u32
}

// Credentials are moved out of the config on their
// own so the rest of it can be logged.
pub struct AdminCredentials {
  pub username: String,
  pub password: String,
  pub session_ttl_secs: i64
}

impl From<&Config> for AdminCredentials {
  fn from(config: &Config) -> Self {
    Self {
      username: config.admin_username.clone(),
      password: config.admin_password.clone(),
      session_ttl_secs: config.session_ttl_secs
    }
  }
}

impl std::fmt::Debug for AdminCredentials {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("AdminCredentials")
      .field("username", &self.username)
      .field("password", &"********")
      .field("session_ttl_secs", &self.session_ttl_secs)
      .finish()
  }
}

#[derive(Debug, Clone)]
pub struct MailSettings {
  pub smtp_host: String,
  pub smtp_port: u16,
  pub smtp_username: String,
  pub smtp_password: String,
  pub sender: String,
  pub contact_recipient: String
}

impl From<&Config> for MailSettings {
  fn from(config: &Config) -> Self {
    Self {
      smtp_host: config.smtp_host.clone(),
      smtp_port: config.smtp_port,
      smtp_username: config.smtp_username.clone(),
      smtp_password: config.smtp_password.clone(),
      sender: config.mail_sender.clone(),
      contact_recipient: config.contact_recipient.clone()
    }
  }
}

impl Config {

  pub fn from_env() -> Result<Config> {
    // Values from the .env file end up in the
    // environment, the config crate reads them
    // from there. Keys are lowercase compared to
    // what's in the .env file.
    config::Config::builder()
      .set_default("bind_address", "127.0.0.1:8080")?
      .set_default("db_pool_size", 8)?
      // SQLite writers wait on each other instead
      // of failing right away:
      .set_default("db_busy_timeout_ms", 5000)?
      .set_default("session_ttl_secs", 86400)?
      .set_default("posts_per_page", 4)?
      .set_default("smtp_host", "smtp.gmail.com")?
      .set_default("smtp_port", 587)?
      .set_default("smtp_username", "")?
      .set_default("smtp_password", "")?
      .set_default("mail_sender", "Nexa Solutions <noreply@nexa-solutions.in>")?
      .set_default("contact_recipient", "contact@nexa-solutions.in")?
      .set_default("rl_max_requests", 20)?
      .set_default("rl_max_requests_time", 60)?
      .set_default("rl_block_duration", 120)?
      .add_source(config::Environment::default())
      .build()
      .and_then(|c| c.try_deserialize())
      // The error has to be given a context for
      // color_eyre to work here:
      .context("Loading configuration from env")
  }

  // What gets printed in the startup logs.
  pub fn redacted(&self) -> String {
    format!(
      "Config {{ db_path: {:?}, db_pool_size: {}, bind_address: {:?}, \
      admin_username: {:?}, posts_per_page: {}, upload_url: {:?}, \
      smtp_host: {:?}, smtp_port: {}, mail_sender: {:?} }}",
      self.db_path,
      self.db_pool_size,
      self.bind_address,
      self.admin_username,
      self.posts_per_page,
      self.upload_url,
      self.smtp_host,
      self.smtp_port,
      self.mail_sender
    )
  }
}

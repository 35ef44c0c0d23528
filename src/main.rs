mod app;
mod config;
mod db;
mod services;
mod utils;
use color_eyre::Result;
use dotenv::dotenv;

#[actix_web::main]
async fn main() -> Result<()> {
  // Values from the .env file end up in the environment
  // before anything reads the config.
  dotenv().ok();
  env_logger::Builder::from_env(
    env_logger::Env::default().default_filter_or("info")
  ).init();
  color_eyre::install()?;

  app::run().await
}

#![allow(dead_code)]
mod config;
mod db;
mod utils;

use std::env;
use std::time::Duration;
use color_eyre::Result;
use eyre::WrapErr;
use dotenv::dotenv;
use log::info;
use getopts::Options;
use crate::config::Config;
use crate::db::SeedOutcome;
use crate::utils::time_utils::current_timestamp;

fn print_usage(program: &str, opts: Options) {
  let brief = format!("Usage: {} [options]", program);
  print!("{}", opts.usage(&brief));
}

/**
 * Binary meant to create the database schema and load
 * the starter content without going through the API.
 */
fn main() -> Result<()> {
  dotenv().ok();
  env_logger::Builder::from_env(
    env_logger::Env::default().default_filter_or("info")
  ).init();
  color_eyre::install()?;

  let args: Vec<String> = env::args().collect();
  let program = args[0].clone();
  let mut opts = Options::new();
  opts.optflag("i", "init", "Create the database schema if missing");
  opts.optflag("s", "seed", "Load the starter categories and posts (implies --init)");
  opts.optflag("h", "help", "Program usage");
  let opt_matches = opts.parse(&args[1..])?;
  if opt_matches.opt_present("h")
    || !(opt_matches.opt_present("i") || opt_matches.opt_present("s")) {
    print_usage(&program, opts);
    return Ok(());
  }

  let config = Config::from_env()?;
  let pool = db::open_pool(
    &config.db_path,
    config.db_pool_size,
    Duration::from_millis(config.db_busy_timeout_ms)
  ).context("Opening the database")?;

  db::init_schema(&pool).context("Creating the database schema")?;
  info!("Schema is ready in {}", config.db_path);

  if opt_matches.opt_present("s") {
    match db::seed_data(&pool, current_timestamp()).context("Seeding the database")? {
      SeedOutcome::AlreadySeeded =>
        info!("Database already has categories, nothing was seeded"),
      SeedOutcome::Seeded { categories, posts } =>
        info!("Seeded {} categories and {} posts", categories, posts)
    }
  }

  Ok(())
}

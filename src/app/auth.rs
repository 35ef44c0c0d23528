use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use log::{error, warn};
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::future::{ready, Ready};
use crate::config::AdminCredentials;
use crate::db;
use crate::utils::time_utils::current_timestamp;
use super::error::{Error, map_db_error};
use super::helpers;
use super::AppState;

const TOKEN_BYTES: usize = 32;

/**
 * Proof that the request carries a live admin session.
 * Add it as a handler argument to protect an endpoint,
 * requests without a valid bearer token get a 401.
 */
#[derive(Debug)]
pub struct AdminIdentity {
  pub token_hash: String
}

impl FromRequest for AdminIdentity {
  type Error = Error;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
    ready(authenticate(req))
  }
}

fn authenticate(req: &HttpRequest) -> Result<AdminIdentity, Error> {
  let app_state = req.app_data::<web::Data<AppState>>()
    .ok_or_else(|| {
      error!("App state is missing from the request");
      Error::InternalServerError(String::from("App state missing"))
    })?;
  let token = helpers::bearer_token(req)
    .ok_or_else(|| Error::Unauthorized(String::from("Missing bearer token")))?;
  let token_hash = hash_token(token);
  let valid = db::session_is_valid(&app_state.pool, &token_hash, current_timestamp())
    .map_err(map_db_error)?;
  if valid {
    Ok(AdminIdentity { token_hash })
  } else {
    warn!("Invalid or expired admin token used from {:?} on {}",
      helpers::real_ip_addr(req), req.path());
    Err(Error::Unauthorized(String::from("Invalid or expired session")))
  }
}

// Only the digest of a token ever gets stored.
pub fn hash_token(token: &str) -> String {
  hex::encode(Sha256::digest(token.as_bytes()))
}

pub fn new_token() -> String {
  let mut bytes = [0u8; TOKEN_BYTES];
  rand::thread_rng().fill_bytes(&mut bytes);
  hex::encode(bytes)
}

// Compares every byte so the time taken doesn't
// depend on where the first difference is.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
  if a.len() != b.len() {
    return false;
  }
  a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

pub fn credentials_match(
  credentials: &AdminCredentials,
  username: &str,
  password: &str
) -> bool {
  // An empty configured password never lets anyone in.
  if credentials.password.is_empty() {
    return false;
  }
  let user_ok = constant_time_eq(credentials.username.as_bytes(), username.as_bytes());
  let pass_ok = constant_time_eq(credentials.password.as_bytes(), password.as_bytes());
  user_ok && pass_ok
}

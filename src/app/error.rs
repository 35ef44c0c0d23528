use actix_web::{
  error::ResponseError,
  http::StatusCode,
  HttpResponse
};
use derive_more::Display;
use log::error;
use crate::db::DataError;
use super::dtos::{JsonStatus, JsonStatusType};

// Internal details never show up in the response for
// the 500s, the full message only goes to the logs.
#[derive(Debug, Display)]
pub enum Error {
  #[display(fmt = "Internal Server Error")]
  InternalServerError(String),
  #[display(fmt = "Database Error")]
  DatabaseError(String),
  #[display(fmt = "Unauthorized: {}", _0)]
  Unauthorized(String),
  #[display(fmt = "Not Found: {}", _0)]
  NotFound(String),
  #[display(fmt = "Bad Request: {}", _0)]
  BadRequest(String),
  #[display(fmt = "{}: {}", field, message)]
  InvalidField {
    field: &'static str,
    message: String
  },
  #[display(fmt = "Conflict: {}", _0)]
  Conflict(String),
  #[display(fmt = "Image upload failed, nothing was saved")]
  Upstream(String),
  #[display(fmt = "Too many requests, try again later")]
  TooManyRequests
}

impl ResponseError for Error {
  fn status_code(&self) -> StatusCode {
    match self {
      Error::InternalServerError(_) | Error::DatabaseError(_) =>
        StatusCode::INTERNAL_SERVER_ERROR,
      Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
      Error::NotFound(_) => StatusCode::NOT_FOUND,
      Error::BadRequest(_) | Error::InvalidField { .. } => StatusCode::BAD_REQUEST,
      Error::Conflict(_) => StatusCode::CONFLICT,
      Error::Upstream(_) => StatusCode::BAD_GATEWAY,
      Error::TooManyRequests => StatusCode::TOO_MANY_REQUESTS
    }
  }

  fn error_response(&self) -> HttpResponse {
    let mut status = JsonStatus::new(JsonStatusType::Error, &self.to_string());
    if let Error::InvalidField { field, .. } = self {
      status.field = Some(field.to_string());
    }
    HttpResponse::build(self.status_code()).json(status)
  }
}

pub fn map_db_error(e: DataError) -> Error {
  match e {
    DataError::Validation { field, message } => Error::InvalidField { field, message },
    DataError::NotFound(what) => Error::NotFound(format!("{} does not exist", what)),
    DataError::Conflict(message) | DataError::Integrity(message) => Error::Conflict(message),
    DataError::Database(message) => {
      error!("Database error - {}", message);
      Error::DatabaseError(message)
    }
  }
}

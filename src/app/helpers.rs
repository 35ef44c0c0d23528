use actix_web::{http::header, HttpRequest};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use lazy_static::lazy_static;
use regex::Regex;
use std::net::{IpAddr, SocketAddr};

// Extracting Actix header values is kinda convoluted,
// the value might not be convertible to a string.
pub fn header_value<'a>(req: &'a HttpRequest, name: &str) -> Option<&'a str> {
  req.headers().get(name)
    .and_then(|h| h.to_str().ok())
}

// "Authorization: Bearer <token>"
pub fn bearer_token(req: &HttpRequest) -> Option<&str> {
  header_value(req, header::AUTHORIZATION.as_str())
    .and_then(|value| value.strip_prefix("Bearer "))
    .map(|token| token.trim())
    .filter(|token| !token.is_empty())
}

// The "IP address" Actix gives us may or may not have
// a port part.
pub fn real_ip_addr(req: &HttpRequest) -> Option<IpAddr> {
  req.connection_info().realip_remote_addr()
    .and_then(|ip| ip.parse::<IpAddr>().ok()
      .or_else(|| ip.parse::<SocketAddr>().ok().map(|s| s.ip()))
    )
}

// Where the contact form lives, used in the mail body.
pub fn contact_page_url(req: &HttpRequest) -> String {
  let info = req.connection_info();
  format!("{}://{}/contact", info.scheme(), info.host())
}

/**
 * Images come in as base64 in the JSON bodies, possibly
 * as a data URL ("data:image/png;base64,...").
 * Returns None when the data can't be decoded.
 */
pub fn decode_image_data(data: &str) -> Option<Vec<u8>> {
  lazy_static! {
    static ref DATA_URL_REGEX: Regex = Regex::new(
      r"^data:[^,]*;base64,"
    ).unwrap();
  }
  let payload = DATA_URL_REGEX.replace(data.trim(), "");
  let payload: String = payload.chars()
    .filter(|c| !c.is_whitespace())
    .collect();
  if payload.is_empty() {
    return None;
  }
  STANDARD.decode(payload).ok()
}

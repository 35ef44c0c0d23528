use async_trait::async_trait;
use derive_more::Display;
use log::{debug, error};
use serde::Deserialize;
use std::time::Duration;

const UPLOAD_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Display)]
pub enum UploadError {
  #[display(fmt = "Upload request failed - {}", _0)]
  Request(String),
  #[display(fmt = "Upload service answered with status {}", _0)]
  Status(u16),
  #[display(fmt = "Upload service did not return a URL")]
  NoUrl
}

impl std::error::Error for UploadError {}

#[async_trait]
pub trait ImageUploader: Send + Sync {
  // Ok(None) means the service took the file but gave
  // us no URL back.
  async fn upload(&self, bytes: Vec<u8>) -> Result<Option<String>, UploadError>;
}

/**
 * Uploads the image and insists on getting a URL back.
 * Callers must not touch the post's image when this
 * fails.
 */
pub async fn upload_image(
  uploader: &dyn ImageUploader,
  bytes: Vec<u8>
) -> Result<String, UploadError> {
  let size = bytes.len();
  match uploader.upload(bytes).await {
    Ok(Some(url)) => {
      debug!("Uploaded image of {} bytes to {}", size, url);
      Ok(url)
    },
    Ok(None) => {
      error!("Image upload of {} bytes returned no URL", size);
      Err(UploadError::NoUrl)
    },
    Err(e) => {
      error!("Image upload of {} bytes failed - {}", size, e);
      Err(e)
    }
  }
}

#[derive(Deserialize)]
struct UploadResponse {
  url: Option<String>
}

// Posts the raw bytes to the upload endpoint, which
// answers with {"url": "..."}.
pub struct HttpImageUploader {
  client: reqwest::Client,
  endpoint: String
}

impl HttpImageUploader {
  pub fn open(endpoint: &str) -> Result<Self, UploadError> {
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(UPLOAD_TIMEOUT_SECS))
      .build()
      .map_err(|e| UploadError::Request(e.to_string()))?;
    Ok(Self {
      client,
      endpoint: String::from(endpoint)
    })
  }
}

#[async_trait]
impl ImageUploader for HttpImageUploader {
  async fn upload(&self, bytes: Vec<u8>) -> Result<Option<String>, UploadError> {
    let response = self.client.post(&self.endpoint)
      .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
      .body(bytes)
      .send()
      .await
      .map_err(|e| UploadError::Request(e.to_string()))?;
    let status = response.status();
    if !status.is_success() {
      return Err(UploadError::Status(status.as_u16()));
    }
    let body: UploadResponse = response.json()
      .await
      .map_err(|e| UploadError::Request(e.to_string()))?;
    Ok(body.url.filter(|url| !url.trim().is_empty()))
  }
}

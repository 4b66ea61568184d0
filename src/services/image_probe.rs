//! Checks whether an image cell's URL actually resolves to an image

use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("server answered {0}")]
    Status(u16),
    #[error("not an image (content type {0:?})")]
    NotAnImage(Option<String>),
}

/// Outcome of probing one image, as shown in the image view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeStatus {
    Loading,
    Loaded { content_type: String },
    Failed(String),
}

pub struct ImageProbe {
    client: reqwest::Client,
}

impl ImageProbe {
    pub fn new(timeout: Duration) -> Result<Self, ProbeError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    /// Fetch `url` and return its image content type
    pub async fn probe(&self, url: &str) -> Result<String, ProbeError> {
        debug!("Probing image {url}");
        let response = self.client.get(url).send().await?;
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        check_response(response.status(), content_type.as_deref())
    }
}

pub fn check_response(status: StatusCode, content_type: Option<&str>) -> Result<String, ProbeError> {
    if !status.is_success() {
        return Err(ProbeError::Status(status.as_u16()));
    }
    match content_type {
        Some(ct) if ct.trim_start().to_ascii_lowercase().starts_with("image/") => Ok(ct.to_string()),
        other => Err(ProbeError::NotAnImage(other.map(str::to_owned))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_response_is_accepted() {
        assert_eq!(check_response(StatusCode::OK, Some("image/png")).unwrap(), "image/png");
        assert!(check_response(StatusCode::OK, Some("Image/JPEG")).is_ok());
    }

    #[test]
    fn test_bad_status_fails() {
        assert!(matches!(
            check_response(StatusCode::NOT_FOUND, Some("image/png")),
            Err(ProbeError::Status(404))
        ));
    }

    #[test]
    fn test_non_image_content_fails() {
        assert!(matches!(
            check_response(StatusCode::OK, Some("text/html")),
            Err(ProbeError::NotAnImage(Some(_)))
        ));
        assert!(matches!(check_response(StatusCode::OK, None), Err(ProbeError::NotAnImage(None))));
    }
}

//! Blocking HTTP transport used for capability, describe and feed requests.
//!
//! Everything that talks to a remote service goes through [`HttpClient`], so
//! tests can substitute a recording transport and count the requests issued.

use std::time::Duration;

use bytes::Bytes;
use tracing::{debug, instrument};

use crate::{OgcError, OgcResult};

/// A completed HTTP response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self {
            status: 200,
            content_type: None,
            body: body.into(),
        }
    }

    pub fn with_status(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            content_type: None,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Synchronous GET transport.
pub trait HttpClient: Send + Sync {
    /// Issue a GET request. Non-2xx statuses are returned, not raised.
    fn get(&self, url: &str, timeout: Duration) -> OgcResult<HttpResponse>;
}

/// `reqwest` blocking client implementation.
pub struct ReqwestHttp {
    client: reqwest::blocking::Client,
}

impl ReqwestHttp {
    pub fn new(user_agent: &str) -> OgcResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(user_agent)
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| OgcError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

impl HttpClient for ReqwestHttp {
    #[instrument(skip(self), fields(url = %url))]
    fn get(&self, url: &str, timeout: Duration) -> OgcResult<HttpResponse> {
        let response = self.client.get(url).timeout(timeout).send()?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes()?;

        debug!(status, size = body.len(), "HTTP response received");

        Ok(HttpResponse {
            status,
            content_type,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_range() {
        assert!(HttpResponse::ok("x").is_success());
        assert!(HttpResponse::with_status(204, "").is_success());
        assert!(!HttpResponse::with_status(404, "").is_success());
        assert!(!HttpResponse::with_status(500, "").is_success());
    }

    #[test]
    fn test_lossy_text() {
        let response = HttpResponse::ok(vec![b'a', 0xff, b'b']);
        assert_eq!(response.text(), "a\u{fffd}b");
    }
}

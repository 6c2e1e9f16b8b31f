//! Recording HTTP transport.

use std::sync::Mutex;
use std::time::Duration;

use ogc_common::{HttpClient, HttpResponse, OgcError, OgcResult};

#[derive(Debug, Clone)]
enum Matcher {
    Exact(String),
    Prefix(String),
}

#[derive(Debug, Clone)]
enum Reply {
    Response(HttpResponse),
    Unreachable,
}

/// An [`HttpClient`] answering from canned routes and recording every URL.
///
/// Exact routes win over prefix routes; among prefixes the longest wins.
/// Unknown URLs get a 404.
#[derive(Debug, Default)]
pub struct MockHttp {
    routes: Vec<(Matcher, Reply)>,
    requests: Mutex<Vec<String>>,
}

impl MockHttp {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `url` with a 200 and `body`.
    pub fn route(self, url: &str, body: impl Into<Vec<u8>>) -> Self {
        self.route_status(url, 200, body)
    }

    pub fn route_status(mut self, url: &str, status: u16, body: impl Into<Vec<u8>>) -> Self {
        self.routes.push((
            Matcher::Exact(url.to_string()),
            Reply::Response(HttpResponse::with_status(status, body.into())),
        ));
        self
    }

    /// Answer every URL starting with `prefix` with a 200 and `body`.
    pub fn route_prefix(mut self, prefix: &str, body: impl Into<Vec<u8>>) -> Self {
        self.routes.push((
            Matcher::Prefix(prefix.to_string()),
            Reply::Response(HttpResponse::ok(body.into())),
        ));
        self
    }

    /// Fail every URL starting with `prefix` at the transport level.
    pub fn unreachable(mut self, prefix: &str) -> Self {
        self.routes
            .push((Matcher::Prefix(prefix.to_string()), Reply::Unreachable));
        self
    }

    /// Every requested URL, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Number of requested URLs containing `needle`.
    pub fn count_containing(&self, needle: &str) -> usize {
        self.requests()
            .iter()
            .filter(|url| url.contains(needle))
            .count()
    }

    fn lookup(&self, url: &str) -> Option<&Reply> {
        let exact = self.routes.iter().find_map(|(matcher, reply)| match matcher {
            Matcher::Exact(route) if route == url => Some(reply),
            _ => None,
        });
        exact.or_else(|| {
            self.routes
                .iter()
                .filter_map(|(matcher, reply)| match matcher {
                    Matcher::Prefix(prefix) if url.starts_with(prefix.as_str()) => {
                        Some((prefix.len(), reply))
                    }
                    _ => None,
                })
                .max_by_key(|(len, _)| *len)
                .map(|(_, reply)| reply)
        })
    }
}

impl HttpClient for MockHttp {
    fn get(&self, url: &str, _timeout: Duration) -> OgcResult<HttpResponse> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(url.to_string());

        match self.lookup(url) {
            Some(Reply::Response(response)) => Ok(response.clone()),
            Some(Reply::Unreachable) => Err(OgcError::Http(format!("connection refused: {}", url))),
            None => Ok(HttpResponse::with_status(404, Vec::new())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_then_longest_prefix() {
        let http = MockHttp::new()
            .route_prefix("https://example.org/", "short")
            .route_prefix("https://example.org/wfs", "long")
            .route("https://example.org/wfs?x=1", "exact");

        let timeout = Duration::from_secs(1);
        assert_eq!(http.get("https://example.org/wfs?x=1", timeout).unwrap().text(), "exact");
        assert_eq!(http.get("https://example.org/wfs?x=2", timeout).unwrap().text(), "long");
        assert_eq!(http.get("https://example.org/wcs", timeout).unwrap().text(), "short");
        assert_eq!(http.get("https://other.org/", timeout).unwrap().status, 404);
        assert_eq!(http.requests().len(), 4);
        assert_eq!(http.count_containing("/wfs"), 2);
    }

    #[test]
    fn test_unreachable() {
        let http = MockHttp::new().unreachable("https://down.example.org");
        assert!(http
            .get("https://down.example.org/wfs", Duration::from_secs(1))
            .is_err());
    }
}

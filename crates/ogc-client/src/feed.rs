//! Atom feed link discovery.
//!
//! Feeds are parsed leniently with an HTML parser so that HTML-wrapped feeds
//! served by some providers are accepted too. Nested feeds are walked with an
//! explicit stack; a nested feed is skipped when its href was already visited
//! or its body is byte-identical to a feed on the current path.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use scraper::{Html, Selector};
use serde::Serialize;
use tracing::{debug, instrument, warn};

use ogc_common::{HttpClient, OgcError, OgcResult};

pub const ATOM_MEDIA_TYPE: &str = "application/atom+xml";

/// Link types pointing at metadata records rather than data.
pub const METADATA_MEDIA_TYPES: [&str; 2] = ["application/vnd.iso.19139+xml", "application/xml"];

/// A `link` element of a feed entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedLink {
    pub href: String,
    pub rel: Option<String>,
    pub media_type: Option<String>,
}

impl FeedLink {
    pub fn is_metadata(&self) -> bool {
        self.media_type
            .as_deref()
            .map_or(false, |t| METADATA_MEDIA_TYPES.contains(&t))
    }

    /// An Atom-typed link to an `.xml` document.
    pub fn is_nested_feed(&self) -> bool {
        self.media_type.as_deref() == Some(ATOM_MEDIA_TYPE)
            && self.href.to_ascii_lowercase().ends_with(".xml")
    }

    pub fn is_http(&self) -> bool {
        let href = self.href.to_ascii_lowercase();
        href.starts_with("http://") || href.starts_with("https://")
    }
}

/// Every `link[href]` inside `feed > entry`, in document order.
pub fn entry_links(document: &str) -> Vec<FeedLink> {
    let html = Html::parse_document(document);
    let Ok(selector) = Selector::parse("feed entry link[href]") else {
        return Vec::new();
    };
    html.select(&selector)
        .filter_map(|link| {
            let attr = |name: &str| link.value().attr(name).map(str::to_string);
            Some(FeedLink {
                href: attr("href")?,
                rel: attr("rel"),
                media_type: attr("type"),
            })
        })
        .collect()
}

/// True when `body` looks like an Atom feed or an HTML page wrapping one.
pub fn looks_like_feed(body: &str) -> bool {
    let body = body.trim();
    body.to_ascii_lowercase().ends_with("</html>") || body.ends_with("</feed>")
}

struct Frame {
    body: Bytes,
    links: VecDeque<FeedLink>,
}

impl Frame {
    fn new(body: Bytes) -> Self {
        let links = entry_links(&String::from_utf8_lossy(&body)).into();
        Self { body, links }
    }
}

/// Lazy iterator over the data links reachable from a feed.
pub struct AtomFeedResolver {
    http: Arc<dyn HttpClient>,
    timeout: Duration,
    stack: Vec<Frame>,
    visited: HashSet<String>,
}

impl AtomFeedResolver {
    /// Start from an already fetched feed document.
    pub fn new(http: Arc<dyn HttpClient>, timeout: Duration, root_url: &str, body: Bytes) -> Self {
        Self {
            http,
            timeout,
            stack: vec![Frame::new(body)],
            visited: HashSet::from([root_url.to_string()]),
        }
    }

    /// Fetch the feed at `url` and start from it.
    #[instrument(skip(http, timeout))]
    pub fn fetch(http: Arc<dyn HttpClient>, url: &str, timeout: Duration) -> OgcResult<Self> {
        let body = fetch_body(http.as_ref(), url, timeout)?;
        Ok(Self::new(http, timeout, url, body))
    }

    fn descend(&mut self, link: &FeedLink) {
        if !self.visited.insert(link.href.clone()) {
            debug!(href = %link.href, "Feed already visited");
            return;
        }
        match fetch_body(self.http.as_ref(), &link.href, self.timeout) {
            Ok(body) => {
                if self.stack.iter().any(|frame| frame.body == body) {
                    debug!(href = %link.href, "Feed identical to an enclosing feed");
                } else {
                    self.stack.push(Frame::new(body));
                }
            }
            Err(e) => warn!(href = %link.href, error = %e, "Failed to fetch nested feed"),
        }
    }
}

impl Iterator for AtomFeedResolver {
    type Item = FeedLink;

    fn next(&mut self) -> Option<FeedLink> {
        loop {
            let frame = self.stack.last_mut()?;
            let Some(link) = frame.links.pop_front() else {
                self.stack.pop();
                continue;
            };
            if link.is_metadata() {
                continue;
            }
            if link.is_nested_feed() {
                self.descend(&link);
                continue;
            }
            if link.is_http() {
                return Some(link);
            }
        }
    }
}

/// GET `url`, failing on transport errors and non-2xx statuses.
pub(crate) fn fetch_body(http: &dyn HttpClient, url: &str, timeout: Duration) -> OgcResult<Bytes> {
    let response = http
        .get(url, timeout)
        .map_err(|e| OgcError::unavailable(url, e))?;
    if !response.is_success() {
        return Err(OgcError::unavailable(url, format!("HTTP status {}", response.status)));
    }
    Ok(response.body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::fixtures::atom;
    use test_utils::MockHttp;

    fn resolve(http: Arc<MockHttp>) -> Vec<String> {
        AtomFeedResolver::fetch(http, atom::FEED_A_URL, Duration::from_secs(5))
            .unwrap()
            .map(|link| link.href)
            .collect()
    }

    #[test]
    fn test_entry_links_skip_feed_level_links() {
        let links = entry_links(atom::FEED_A);
        assert_eq!(links.len(), 2);
        assert!(links[0].is_metadata());
        assert!(links[1].is_nested_feed());
        assert_eq!(links[1].rel.as_deref(), Some("alternate"));
    }

    #[test]
    fn test_mutually_linked_feeds_terminate() {
        let http = Arc::new(atom::mock());
        let leaves = resolve(http.clone());
        assert_eq!(leaves, vec![atom::GML_URL, atom::ZIP_URL]);
        assert_eq!(http.count_containing("feed-a.xml"), 1);
        assert_eq!(http.count_containing("feed-b.xml"), 1);
        assert_eq!(http.count_containing("metadata"), 0);
    }

    #[test]
    fn test_identical_nested_feed_is_not_entered() {
        let feed = r#"<feed><entry><link href="https://example.org/copy.xml" type="application/atom+xml"/><link href="https://example.org/a.gml"/></entry></feed>"#;
        let http = Arc::new(
            MockHttp::new()
                .route("https://example.org/root.xml", feed)
                .route("https://example.org/copy.xml", feed),
        );
        let leaves: Vec<String> =
            AtomFeedResolver::fetch(http.clone(), "https://example.org/root.xml", Duration::from_secs(5))
                .unwrap()
                .map(|l| l.href)
                .collect();
        assert_eq!(leaves, vec!["https://example.org/a.gml"]);
        assert_eq!(http.requests().len(), 2);
    }

    #[test]
    fn test_failed_nested_feed_is_skipped() {
        let feed = r#"<feed><entry><link href="https://down.example.org/b.xml" type="application/atom+xml"/><link href="https://example.org/a.zip"/><link href="ftp://example.org/a.zip"/></entry></feed>"#;
        let http = Arc::new(
            MockHttp::new()
                .route("https://example.org/root.xml", feed)
                .unreachable("https://down.example.org"),
        );
        let leaves: Vec<String> =
            AtomFeedResolver::fetch(http, "https://example.org/root.xml", Duration::from_secs(5))
                .unwrap()
                .map(|l| l.href)
                .collect();
        assert_eq!(leaves, vec!["https://example.org/a.zip"]);
    }

    #[test]
    fn test_looks_like_feed() {
        assert!(looks_like_feed(atom::FEED_A));
        assert!(looks_like_feed("<html><body></body></HTML>\n"));
        assert!(!looks_like_feed("{\"type\": \"FeatureCollection\"}"));
    }
}

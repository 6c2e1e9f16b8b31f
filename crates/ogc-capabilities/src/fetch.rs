//! Document retrieval shared by every capability parser.

use std::time::Duration;

use serde_json::Value;
use tracing::{debug, instrument};

use ogc_common::{HttpClient, OgcError, OgcResult};

use crate::exception::exception_report;
use crate::xml::XmlDocument;

/// GET `url` and parse the body as XML.
///
/// Transport failures, non-2xx statuses and malformed bodies are reported as
/// `ServiceUnavailable`; an exception report body becomes `ServiceException`.
#[instrument(skip(http, timeout))]
pub fn fetch_xml(http: &dyn HttpClient, url: &str, timeout: Duration) -> OgcResult<XmlDocument> {
    let response = http
        .get(url, timeout)
        .map_err(|e| OgcError::unavailable(url, e))?;

    if !response.is_success() {
        return Err(OgcError::unavailable(
            url,
            format!("HTTP status {}", response.status),
        ));
    }

    let doc = XmlDocument::parse(&response.body).map_err(|e| OgcError::unavailable(url, e))?;
    if let Some(exception) = exception_report(&doc) {
        return Err(exception.into());
    }

    debug!(namespaces = doc.namespaces().len(), "Parsed XML document");
    Ok(doc)
}

/// GET `url` and parse the body as JSON, with the same failure mapping as [`fetch_xml`].
#[instrument(skip(http, timeout))]
pub fn fetch_json(http: &dyn HttpClient, url: &str, timeout: Duration) -> OgcResult<Value> {
    let response = http
        .get(url, timeout)
        .map_err(|e| OgcError::unavailable(url, e))?;

    if !response.is_success() {
        return Err(OgcError::unavailable(
            url,
            format!("HTTP status {}", response.status),
        ));
    }

    serde_json::from_slice(&response.body).map_err(|e| OgcError::unavailable(url, e))
}

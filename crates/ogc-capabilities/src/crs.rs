//! Best-effort resolution of CRS definition documents.

use std::time::Duration;

use tracing::{instrument, warn};

use ogc_common::HttpClient;

use crate::fetch::fetch_xml;

const UNKNOWN_CODE_SPACE: &str = "UnknownCodeSpace";

/// Fetch the CRS definition at `crs_uri` and return `codeSpace:identifier`
/// from its root `gml:identifier`.
///
/// Every failure is logged and yields `None`.
#[instrument(skip(http, timeout))]
pub fn resolve_crs_identifier(http: &dyn HttpClient, crs_uri: &str, timeout: Duration) -> Option<String> {
    let doc = match fetch_xml(http, crs_uri, timeout) {
        Ok(doc) => doc,
        Err(e) => {
            warn!(error = %e, "Failed to fetch CRS definition");
            return None;
        }
    };

    let identifier = doc.root().find("gml:identifier");
    match identifier.and_then(|node| Some((node.attr("codeSpace"), node.text_opt()?))) {
        Some((code_space, id)) => Some(format!(
            "{}:{}",
            code_space.unwrap_or(UNKNOWN_CODE_SPACE),
            id
        )),
        None => {
            warn!("No CRS identifier found");
            None
        }
    }
}

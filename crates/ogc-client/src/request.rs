//! Request building shared by the service clients.

use std::path::Path;

use tracing::{error, info, warn};

use ogc_capabilities::parameters::TRANSPORT_PARAMETERS;
use ogc_common::{with_query, OgcResult, QueryArgs};

/// Access-layer driver prefixes.
pub const WFS_DRIVER: &str = "WFS:";
pub const WCS_DRIVER: &str = "WCS:";
pub const OAPIF_DRIVER: &str = "OAPIF:";
pub const OGCAPI_DRIVER: &str = "OGCAPI:";

/// `base?service=..&version=..&request=..` followed by `args`, names upper-cased
/// and list values sent as repeated keys. Transport keys in `args` are ignored.
pub fn kvp_url(base: &str, service: &str, version: &str, request: &str, args: &QueryArgs) -> OgcResult<String> {
    let mut pairs = vec![
        ("service".to_string(), service.to_string()),
        ("version".to_string(), version.to_string()),
        ("request".to_string(), request.to_string()),
    ];
    pairs.extend(
        wire_pairs(args, |name| name.to_ascii_uppercase())
            .into_iter()
            .filter(|(name, _)| !TRANSPORT_PARAMETERS.iter().any(|t| t.eq_ignore_ascii_case(name))),
    );
    with_query(base, pairs)
}

/// One (name, value) pair per wire occurrence, names passed through `rename`.
pub fn wire_pairs(args: &QueryArgs, rename: impl Fn(&str) -> String) -> Vec<(String, String)> {
    args.iter()
        .flat_map(|(name, value)| {
            let name = rename(name);
            value
                .values()
                .into_iter()
                .map(move |v| (name.clone(), v.to_string()))
                .collect::<Vec<_>>()
        })
        .collect()
}

/// `bbox_crs` → `bbox-crs`.
pub fn kebab_case(name: &str) -> String {
    name.replace('_', "-")
}

/// Warn about arguments dropped from a request.
pub fn warn_excluded(excluded: &QueryArgs, valid: &[&str], service: &str, version: &str) {
    if excluded.is_empty() {
        return;
    }
    let excluded: Vec<&str> = excluded.names().collect();
    warn!(
        ?excluded,
        ?valid,
        service,
        version,
        "The following parameters have been excluded"
    );
}

/// Write a downloaded payload to `path`, creating parent directories.
///
/// Failures are logged, never raised.
pub fn save_payload(path: &Path, body: &[u8]) {
    let result = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or(Ok(()), std::fs::create_dir_all)
        .and_then(|_| std::fs::write(path, body));
    match result {
        Ok(()) => info!(path = %path.display(), bytes = body.len(), "Payload saved"),
        Err(e) => error!(path = %path.display(), error = %e, "The coverage file could not be downloaded"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ogc_common::ArgValue;

    #[test]
    fn test_kvp_url_upper_cases_and_repeats_lists() {
        let args = QueryArgs::new()
            .with("coverageID", "Elevacion4258_5")
            .with("subset", ArgValue::from(vec!["Lat(40,41)", "Long(-4,-3)"]));
        let url = kvp_url("https://example.org/wcs", "WCS", "2.0.1", "GetCoverage", &args).unwrap();
        assert_eq!(
            url,
            "https://example.org/wcs?service=WCS&version=2.0.1&request=GetCoverage\
             &COVERAGEID=Elevacion4258_5&SUBSET=Lat%2840%2C41%29&SUBSET=Long%28-4%2C-3%29"
        );
    }

    #[test]
    fn test_kvp_url_ignores_transport_keys() {
        let args = QueryArgs::new().with("service", "WMS").with("typeNames", "gn:NamedPlace");
        let url = kvp_url("https://example.org/wfs", "WFS", "2.0.0", "GetFeature", &args).unwrap();
        assert!(url.contains("service=WFS"));
        assert!(!url.contains("WMS"));
    }

    #[test]
    fn test_kebab_case() {
        assert_eq!(kebab_case("bbox_crs"), "bbox-crs");
        assert_eq!(kebab_case("limit"), "limit");
    }

    #[test]
    fn test_save_payload_creates_parents() {
        let dir = test_utils::temp_test_dir();
        let path = test_utils::nested_output(dir.path(), "out/nested/mdt.tif");
        save_payload(&path, b"II*\0");
        assert_eq!(std::fs::read(&path).unwrap(), b"II*\0");
    }
}

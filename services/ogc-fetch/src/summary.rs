//! JSON summaries printed by the CLI.

use serde::Serialize;
use serde_json::{json, Value};

use ogc_capabilities::{CapabilitiesDocument, ParameterCatalog};

/// Summary of a capabilities document.
pub fn capabilities(doc: &CapabilitiesDocument) -> Value {
    let descriptor = doc.descriptor();
    let mut summary = json!({
        "service": descriptor.service_type.as_str(),
        "version": descriptor.version,
        "base_url": descriptor.base_url,
        "info": doc.service_info(),
        "operations": doc.operations(),
        "constraints": doc.constraints(),
    });

    match doc {
        CapabilitiesDocument::Wfs(caps) => {
            summary["feature_types"] = to_value(caps.feature_types());
            let queries: Vec<_> = caps.stored_queries().iter().collect();
            summary["stored_queries"] = to_value(queries);
        }
        CapabilitiesDocument::Wcs100(caps) | CapabilitiesDocument::Wcs20(caps) => {
            summary["coverages"] = to_value(caps.coverages());
        }
        CapabilitiesDocument::OgcApi(api) => {
            summary["kind"] = json!(api.kind().to_string());
            summary["collections"] = to_value(api.collections());
        }
    }
    summary
}

/// Recognized parameters of one protocol version.
pub fn parameters(catalog: &ParameterCatalog) -> Value {
    to_value(catalog)
}

fn to_value<T: Serialize>(value: T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ogc_capabilities::{FetchOptions, Protocol, ServiceType};
    use test_utils::fixtures::{ogcapi, wcs, wfs};

    fn fetch(http: &test_utils::MockHttp, service: ServiceType, version: &str, url: &str) -> Value {
        let doc = CapabilitiesDocument::fetch(http, service, version, url, &FetchOptions::default()).unwrap();
        capabilities(&doc)
    }

    #[test]
    fn test_wfs_summary_lists_feature_types_and_stored_queries() {
        let summary = fetch(&wfs::mock(), ServiceType::Feature, "2.0.0", wfs::BASE_URL);
        assert_eq!(summary["service"], "WFS");
        assert_eq!(summary["version"], "2.0.0");
        assert!(summary["feature_types"].as_array().is_some_and(|t| !t.is_empty()));
        let queries = summary["stored_queries"].as_array().unwrap();
        assert!(queries.iter().any(|q| q["identifier"] == "GetPlaceByName"));
    }

    #[test]
    fn test_wcs_summary_lists_coverages() {
        let summary = fetch(&wcs::mock(), ServiceType::Coverage, "2.0.1", wcs::BASE_URL);
        assert_eq!(summary["service"], "WCS");
        assert!(summary["coverages"].as_array().is_some_and(|c| !c.is_empty()));
    }

    #[test]
    fn test_ogcapi_summary_lists_collections() {
        let summary = fetch(&ogcapi::mock(), ServiceType::OgcApi, "", ogcapi::BASE_URL);
        assert_eq!(summary["kind"], "Features");
        let ids: Vec<&str> = summary["collections"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|c| c["id"].as_str())
            .collect();
        assert!(ids.contains(&"address"));
    }

    #[test]
    fn test_parameters_summary() {
        let catalog = ParameterCatalog::for_version(Protocol::Wcs, "2.0.1").unwrap();
        let summary = parameters(catalog);
        assert_eq!(summary["version"], "2.0.1");
        assert!(summary["parameters"]
            .as_array()
            .unwrap()
            .iter()
            .any(|p| p["name"] == "coverageID" && p["required"] == true));
    }
}

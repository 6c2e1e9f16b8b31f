//! Integration tests for capability negotiation against the fixture services.

use std::time::Duration;

use ogc_capabilities::{
    resolve_crs_identifier, ApiKind, CapabilitiesDocument, FetchOptions, ParameterCatalog,
    Protocol, ServiceType,
};
use ogc_common::{OgcError, QueryArgs};
use serde_json::json;
use test_utils::fixtures::{self, ogcapi, wcs, wcs_legacy, wfs};
use test_utils::MockHttp;

fn fetch(http: &MockHttp, service: ServiceType, version: &str, url: &str) -> CapabilitiesDocument {
    CapabilitiesDocument::fetch(http, service, version, url, &FetchOptions::default()).unwrap()
}

// ============================================================================
// Document variants
// ============================================================================

#[test]
fn test_variant_follows_service_and_version() {
    let doc = fetch(&wfs::mock(), ServiceType::Feature, "2.0.0", wfs::BASE_URL);
    assert!(matches!(doc, CapabilitiesDocument::Wfs(_)));

    let doc = fetch(&wcs::mock(), ServiceType::Coverage, "2.0.1", wcs::BASE_URL);
    assert!(matches!(doc, CapabilitiesDocument::Wcs20(_)));

    let doc = fetch(&wcs_legacy::mock(), ServiceType::Coverage, "1.0.0", wcs_legacy::BASE_URL);
    assert!(matches!(doc, CapabilitiesDocument::Wcs100(_)));

    let doc = fetch(&ogcapi::mock(), ServiceType::OgcApi, "", ogcapi::BASE_URL);
    assert_eq!(doc.as_ogc_api().map(|api| api.kind()), Some(ApiKind::Features));
}

#[test]
fn test_atom_has_no_capabilities() {
    let result = CapabilitiesDocument::fetch(
        &MockHttp::new(),
        ServiceType::Atom,
        "",
        "https://example.org/atom/feed.xml",
        &FetchOptions::default(),
    );
    assert!(matches!(result, Err(OgcError::UnsupportedVersion { .. })));
}

#[test]
fn test_exception_report_is_raised() {
    let http = MockHttp::new().route(wfs::CAPABILITIES_URL, fixtures::EXCEPTION_REPORT);
    let result = CapabilitiesDocument::fetch(
        &http,
        ServiceType::Feature,
        "2.0.0",
        wfs::BASE_URL,
        &FetchOptions::default(),
    );
    match result {
        Err(OgcError::ServiceException { code, .. }) => assert_eq!(code, "InvalidParameterValue"),
        other => panic!("unexpected result: {:?}", other.map(|doc| doc.service_type())),
    }
}

#[test]
fn test_unreachable_service() {
    let http = MockHttp::new().unreachable(wcs::BASE_URL);
    let result = CapabilitiesDocument::fetch(
        &http,
        ServiceType::Coverage,
        "2.0.1",
        wcs::BASE_URL,
        &FetchOptions::default(),
    );
    assert!(matches!(result, Err(OgcError::ServiceUnavailable(_))));
}

// ============================================================================
// Coverage descriptions
// ============================================================================

#[test]
fn test_coverage_descriptions_limited_by_options() {
    let http = wcs::mock();
    let options = FetchOptions {
        max_coverages: 0,
        ..FetchOptions::default()
    };
    let doc =
        CapabilitiesDocument::fetch(&http, ServiceType::Coverage, "2.0.1", wcs::BASE_URL, &options)
            .unwrap();
    assert_eq!(http.count_containing("DescribeCoverage"), 0);
    assert!(doc.as_wcs().is_some());
}

#[test]
fn test_unknown_coverage_needs_no_request() {
    let http = wcs::mock();
    let doc = fetch(&http, ServiceType::Coverage, "2.0.1", wcs::BASE_URL);
    let before = http.requests().len();
    let caps = doc.as_wcs().unwrap();
    assert_eq!(caps.list_coverages(), vec!["Elevacion4258_5"]);
    assert!(matches!(
        caps.require_coverage("Unknown"),
        Err(OgcError::CoverageNotFound(_))
    ));
    assert_eq!(http.requests().len(), before);
}

// ============================================================================
// Parameter catalogs
// ============================================================================

#[test]
fn test_missing_parameters_do_not_depend_on_argument_order() {
    let catalog = ParameterCatalog::for_version(Protocol::Wcs, "2.0.1").unwrap();
    let forward = QueryArgs::new().with("format", "image/tiff").with("service", "WCS");
    let backward = QueryArgs::new().with("service", "WCS").with("format", "image/tiff");
    assert_eq!(catalog.missing(&forward), catalog.missing(&backward));
    assert_eq!(catalog.missing(&forward), vec!["coverageID", "subset"]);
}

#[test]
fn test_transport_parameters_never_missing() {
    for catalog in ParameterCatalog::all() {
        let missing = catalog.missing(&QueryArgs::new());
        for transport in ["service", "request", "version"] {
            assert!(
                !missing.iter().any(|m| m.eq_ignore_ascii_case(transport)),
                "{} {} reports {}",
                catalog.protocol,
                catalog.version,
                transport
            );
        }
    }
}

// ============================================================================
// OpenAPI
// ============================================================================

#[test]
fn test_parameter_resolution_is_idempotent() {
    let doc = fetch(&ogcapi::mock(), ServiceType::OgcApi, "", ogcapi::BASE_URL);
    let api = doc.as_ogc_api().unwrap();

    let reference = json!({"$ref": "#/components/parameters/limit"});
    let resolved = api.resolve_parameter(&reference);
    assert_eq!(resolved["name"], "limit");
    assert_eq!(api.resolve_parameter(&resolved), resolved);
}

#[test]
fn test_items_parameters_are_resolved() {
    let doc = fetch(&ogcapi::mock(), ServiceType::OgcApi, "", ogcapi::BASE_URL);
    let api = doc.as_ogc_api().unwrap();
    let names: Vec<String> = api
        .operation_parameters("/collections/address/items")
        .unwrap()
        .into_iter()
        .map(|p| p.name)
        .collect();
    for expected in ["collectionId", "f", "bbox", "bbox-crs", "crs", "limit", "postal_code"] {
        assert!(names.iter().any(|n| n == expected), "{} not resolved", expected);
    }
}

// ============================================================================
// CRS definitions
// ============================================================================

const EPSG_25830_URI: &str = "http://www.opengis.net/def/crs/EPSG/0/25830";

#[test]
fn test_crs_identifier_from_definition() {
    let http = MockHttp::new().route(
        EPSG_25830_URI,
        r#"<gml:ProjectedCRS xmlns:gml="http://www.opengis.net/gml/3.2" gml:id="epsg-crs-25830">
  <gml:identifier codeSpace="EPSG">25830</gml:identifier>
  <gml:name>ETRS89 / UTM zone 30N</gml:name>
</gml:ProjectedCRS>"#,
    );
    assert_eq!(
        resolve_crs_identifier(&http, EPSG_25830_URI, Duration::from_secs(5)),
        Some("EPSG:25830".to_string())
    );
}

#[test]
fn test_crs_identifier_failures_are_unknown() {
    let missing_code_space = MockHttp::new().route(
        EPSG_25830_URI,
        r#"<gml:ProjectedCRS xmlns:gml="http://www.opengis.net/gml/3.2"><gml:identifier>25830</gml:identifier></gml:ProjectedCRS>"#,
    );
    assert_eq!(
        resolve_crs_identifier(&missing_code_space, EPSG_25830_URI, Duration::from_secs(5)),
        Some("UnknownCodeSpace:25830".to_string())
    );

    let unreachable = MockHttp::new().unreachable(EPSG_25830_URI);
    assert_eq!(resolve_crs_identifier(&unreachable, EPSG_25830_URI, Duration::from_secs(5)), None);

    let not_found = MockHttp::new();
    assert_eq!(resolve_crs_identifier(&not_found, EPSG_25830_URI, Duration::from_secs(5)), None);
}

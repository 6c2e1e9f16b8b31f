//! Coverage service (WCS) client.

use std::path::Path;
use std::sync::Arc;

use tracing::{info, instrument, warn};

use ogc_capabilities::{ParameterCatalog, Protocol, WcsCapabilities, WcsFamily};
use ogc_common::{normalize_base, HttpClient, OgcError, OgcResult, QueryArgs};

use crate::access::DataAccess;
use crate::config::ClientConfig;
use crate::request::{kvp_url, save_payload, warn_excluded, WCS_DRIVER};
use crate::stream::{FeatureStream, Segment, Selection};

/// Parameter catalog version used for a WCS protocol version.
fn catalog_version(version: &str) -> &str {
    match version {
        "2.0.0" => "2.0.1",
        other => other,
    }
}

/// Client of one WCS endpoint at one protocol version.
pub struct CoverageClient {
    capabilities: WcsCapabilities,
    catalog: &'static ParameterCatalog,
    http: Arc<dyn HttpClient>,
    access: Arc<dyn DataAccess>,
    config: ClientConfig,
}

impl CoverageClient {
    /// Fetch the capabilities and describe the listed coverages.
    #[instrument(skip(http, access, config))]
    pub fn connect(
        base_url: &str,
        version: &str,
        http: Arc<dyn HttpClient>,
        access: Arc<dyn DataAccess>,
        config: ClientConfig,
    ) -> OgcResult<Self> {
        let catalog = ParameterCatalog::for_version(Protocol::Wcs, catalog_version(version))?;
        let capabilities = WcsCapabilities::fetch(
            http.as_ref(),
            &normalize_base(base_url),
            version,
            &config.fetch_options(),
        )?;
        info!(
            base_url,
            version,
            coverages = capabilities.coverages().len(),
            "WCS service ready"
        );
        Ok(Self {
            capabilities,
            catalog,
            http,
            access,
            config,
        })
    }

    pub fn capabilities(&self) -> &WcsCapabilities {
        &self.capabilities
    }

    pub fn version(&self) -> &str {
        self.capabilities.version()
    }

    /// Recognized GetCoverage parameters of this version.
    pub fn coverage_parameters(&self) -> &'static ParameterCatalog {
        self.catalog
    }

    fn coverage_key(&self) -> &'static str {
        match self.capabilities.family() {
            WcsFamily::V100 => "coverage",
            WcsFamily::V20 => "coverageID",
        }
    }

    /// Validate `args` and build the GetCoverage URL.
    ///
    /// Fails before any request when a required parameter is missing, the
    /// coverage is not offered, or (1.0.0) neither `RESX`+`RESY` nor
    /// `WIDTH`+`HEIGHT` is given.
    pub fn get_coverage_url(&self, args: &QueryArgs) -> OgcResult<String> {
        self.catalog.require(args)?;
        self.catalog.check_types(args)?;

        let key = self.coverage_key();
        let coverage = args
            .get_ignore_case(key)
            .map(|v| v.to_string())
            .unwrap_or_default();
        self.capabilities.require_coverage(&coverage)?;

        if self.capabilities.family() == WcsFamily::V100 {
            let resolution = args.has_value("RESX") && args.has_value("RESY");
            let size = args.has_value("WIDTH") && args.has_value("HEIGHT");
            if !resolution && !size {
                return Err(OgcError::RequestShape(coverage));
            }
        }

        let (recognized, excluded) = self.catalog.partition(args);
        warn_excluded(&excluded, &self.catalog.names(), "WCS", self.version());
        kvp_url(
            self.capabilities.base_url(),
            "WCS",
            self.version(),
            "GetCoverage",
            &recognized,
        )
    }

    /// Request a coverage. The payload is first saved to `save_to` when given
    /// (failures are logged), then the `WCS:` source is streamed.
    #[instrument(skip(self, args))]
    pub fn get_coverage(&self, args: &QueryArgs, save_to: Option<&Path>) -> OgcResult<FeatureStream> {
        let url = self.get_coverage_url(args)?;

        if let Some(path) = save_to {
            match self.http.get(&url, self.config.data_timeout()) {
                Ok(response) if response.is_success() => save_payload(path, &response.body),
                Ok(response) => warn!(status = response.status, "Coverage download failed"),
                Err(e) => warn!(error = %e, "Coverage download failed"),
            }
        }

        let source = self.access.open(&format!("{}{}", WCS_DRIVER, url))?;
        Ok(FeatureStream::single(Segment::new(url, source, Selection::All)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryAccess, MemoryLayer};
    use ogc_common::ArgValue;
    use test_utils::fixtures::{wcs, wcs_legacy};
    use test_utils::MockHttp;

    fn client(http: Arc<MockHttp>, base: &str, version: &str) -> (CoverageClient, Arc<MemoryAccess>) {
        let access = Arc::new(MemoryAccess::new().with_source(
            "WCS:https://example.org/",
            vec![MemoryLayer::new("coverage", Vec::new())],
        ));
        let client =
            CoverageClient::connect(base, version, http, access.clone(), ClientConfig::default()).unwrap();
        (client, access)
    }

    #[test]
    fn test_unknown_coverage_is_rejected_before_any_request() {
        let http = Arc::new(wcs::mock());
        let (client, access) = client(http.clone(), wcs::BASE_URL, "2.0.1");
        let args = QueryArgs::new()
            .with("coverageID", "Unknown")
            .with("format", "image/tiff")
            .with("subset", ArgValue::from(vec!["Lat(40,41)"]));

        let result = client.get_coverage(&args, None);
        assert!(matches!(result, Err(OgcError::CoverageNotFound(ref id)) if id == "Unknown"));
        assert_eq!(http.count_containing("GetCoverage"), 0);
        assert!(access.log().opened.is_empty());
    }

    #[test]
    fn test_missing_parameters_reported_together() {
        let (client, _) = client(Arc::new(wcs::mock()), wcs::BASE_URL, "2.0.1");
        match client.get_coverage(&QueryArgs::new().with("coverageID", "Elevacion4258_5"), None) {
            Err(OgcError::MissingParameter(missing)) => assert_eq!(missing, vec!["format", "subset"]),
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_get_coverage_opens_wcs_source() {
        let (client, access) = client(Arc::new(wcs::mock()), wcs::BASE_URL, "2.0.1");
        let args = QueryArgs::new()
            .with("coverageID", "Elevacion4258_5")
            .with("format", "image/tiff")
            .with("subset", ArgValue::from(vec!["Lat(40,41)", "Long(-4,-3)"]))
            .with("colour", "red");
        let stream = client.get_coverage(&args, None).unwrap();
        assert_eq!(stream.count(), 0);

        let opened = access.log().opened;
        assert_eq!(opened.len(), 1);
        assert!(opened[0].starts_with("WCS:https://example.org/wcs?service=WCS&version=2.0.1&request=GetCoverage"));
        assert_eq!(opened[0].matches("SUBSET=").count(), 2);
        assert!(!opened[0].contains("COLOUR"));
    }

    #[test]
    fn test_get_coverage_saves_payload() {
        let dir = test_utils::temp_test_dir_with_prefix("coverage_");
        let path = test_utils::nested_output(dir.path(), "mdt/elevacion.tif");
        let http = Arc::new(wcs::mock().route_prefix(
            "https://example.org/wcs?service=WCS&version=2.0.1&request=GetCoverage",
            &b"II*\0tiff"[..],
        ));
        let (client, _) = client(http, wcs::BASE_URL, "2.0.1");
        let args = QueryArgs::new()
            .with("coverageID", "Elevacion4258_5")
            .with("format", "image/tiff")
            .with("subset", ArgValue::from(vec!["Lat(40,41)"]));
        client.get_coverage(&args, Some(&path)).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"II*\0tiff");
    }

    #[test]
    fn test_legacy_shape_rule() {
        let (client, _) = client(Arc::new(wcs_legacy::mock()), wcs_legacy::BASE_URL, "1.0.0");
        let base = QueryArgs::new()
            .with("coverage", "MDT05")
            .with("crs", "EPSG:25830")
            .with("format", "GeoTIFF");

        let result = client.get_coverage_url(&base.clone().with("RESX", 5.0));
        assert!(matches!(result, Err(OgcError::RequestShape(_))));

        let url = client
            .get_coverage_url(&base.clone().with("width", 100i64).with("height", 100i64))
            .unwrap();
        assert!(url.contains("WIDTH=100&HEIGHT=100"));
        assert!(client.get_coverage_url(&base.with("RESX", 5.0).with("RESY", 5.0)).is_ok());
    }

    #[test]
    fn test_catalog_version_for_wcs_200() {
        assert_eq!(catalog_version("2.0.0"), "2.0.1");
        assert_eq!(catalog_version("1.0.0"), "1.0.0");
    }
}

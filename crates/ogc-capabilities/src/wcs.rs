//! WCS capabilities for the 1.0.0 and 2.0.x schema families.
//!
//! Both families list coverages in the capabilities document and need one
//! DescribeCoverage round trip per coverage to fill in the spatial domain,
//! range and supported CRS/format/interpolation sets. Describe calls are
//! sequential; a failing one leaves the coverage with its summary data.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use ogc_common::{with_query, HttpClient, OgcError, OgcResult};

use crate::coverage::{Coverage, Envelope, RangeField, RectifiedGrid, SpatialDomain, Supported};
use crate::fetch::fetch_xml;
use crate::ows::{self, ServiceInfo};
use crate::xml::{NamespaceTable, Node, XmlDocument};
use crate::FetchOptions;

/// The two incompatible WCS schema families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WcsFamily {
    /// WCS 1.0.0: `CoverageOfferingBrief` / `CoverageOffering`.
    V100,
    /// WCS 2.0.0 and 2.0.1: `wcs:CoverageSummary` / `wcs:CoverageDescription`.
    V20,
}

impl WcsFamily {
    pub fn for_version(version: &str) -> OgcResult<Self> {
        match version {
            "1.0.0" => Ok(WcsFamily::V100),
            "2.0.0" | "2.0.1" => Ok(WcsFamily::V20),
            other => Err(OgcError::UnsupportedVersion {
                service: "WCS".to_string(),
                version: other.to_string(),
            }),
        }
    }
}

/// A parsed WCS capabilities document with its described coverages.
#[derive(Debug, Clone)]
pub struct WcsCapabilities {
    base_url: String,
    version: String,
    family: WcsFamily,
    doc: XmlDocument,
    coverages: Vec<Coverage>,
}

impl WcsCapabilities {
    /// Fetch the capabilities document, then describe every listed coverage.
    #[instrument(skip(http, options))]
    pub fn fetch(
        http: &dyn HttpClient,
        base_url: &str,
        version: &str,
        options: &FetchOptions,
    ) -> OgcResult<Self> {
        let family = WcsFamily::for_version(version)?;
        let url = with_query(
            base_url,
            [
                ("service", "WCS"),
                ("version", version),
                ("request", "GetCapabilities"),
            ],
        )?;
        let doc = fetch_xml(http, &url, options.capabilities_timeout)?;

        let mut capabilities = Self::from_document(doc, base_url, version)?;
        let total = capabilities.coverages.len();
        let mut skipped = 0usize;
        for index in 0..total {
            if index >= options.max_coverages {
                skipped += 1;
                continue;
            }
            capabilities.describe(http, index, options.describe_timeout);
        }
        if skipped > 0 {
            warn!(
                skipped,
                max_coverages = options.max_coverages,
                "Coverage description limit reached; remaining coverages keep their summary only"
            );
        }

        info!(coverages = total, family = ?family, "WCS capabilities loaded");
        Ok(capabilities)
    }

    /// Build from an already fetched capabilities document, without describe calls.
    pub fn from_document(doc: XmlDocument, base_url: &str, version: &str) -> OgcResult<Self> {
        let family = WcsFamily::for_version(version)?;
        let mut capabilities = Self {
            base_url: base_url.to_string(),
            version: version.to_string(),
            family,
            doc,
            coverages: Vec::new(),
        };
        capabilities.coverages = match family {
            WcsFamily::V100 => capabilities.summaries_v100(),
            WcsFamily::V20 => capabilities.summaries_v20(),
        };
        Ok(capabilities)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn family(&self) -> WcsFamily {
        self.family
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn namespaces(&self) -> &NamespaceTable {
        self.doc.namespaces()
    }

    /// Service information: `Service` name/label/description for 1.0.0,
    /// `ows:ServiceIdentification` for 2.0.
    pub fn service_info(&self) -> Option<ServiceInfo> {
        let root = self.doc.root();
        match self.family {
            WcsFamily::V100 => {
                let service = root.find(".//Service")?;
                Some(ServiceInfo {
                    name: service.find_text("name").map(str::to_string),
                    title: service.find_text("label").map(str::to_string),
                    abstract_text: service.find_text("description").map(str::to_string),
                    version: root.attr("version").map(str::to_string),
                })
            }
            WcsFamily::V20 => ows::service_identification(root),
        }
    }

    pub fn operations(&self) -> Vec<String> {
        ows::operations(self.doc.root())
    }

    pub fn constraints(&self) -> Vec<ows::Constraint> {
        ows::constraints(self.doc.root())
    }

    /// Service-level supported CRS (2.0 CRS extension). Empty for 1.0.0, where
    /// CRS are listed per coverage.
    pub fn supported_crs(&self) -> Vec<String> {
        if self.family == WcsFamily::V100 {
            return Vec::new();
        }
        texts(
            self.doc.root(),
            ".//wcs:ServiceMetadata/wcs:Extension/crs:CrsMetadata/crs:crsSupported",
        )
    }

    /// Service-level supported formats (2.0). Empty for 1.0.0.
    pub fn supported_formats(&self) -> Vec<String> {
        if self.family == WcsFamily::V100 {
            return Vec::new();
        }
        texts(self.doc.root(), ".//wcs:ServiceMetadata/wcs:formatSupported")
    }

    pub fn coverages(&self) -> &[Coverage] {
        &self.coverages
    }

    /// Names (1.0.0) or identifiers (2.0) of every listed coverage.
    pub fn list_coverages(&self) -> Vec<&str> {
        self.coverages.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn has_coverage(&self, name: &str) -> bool {
        self.coverages.iter().any(|c| c.name == name)
    }

    pub fn describe_coverage(&self, name: &str) -> Option<&Coverage> {
        self.coverages.iter().find(|c| c.name == name)
    }

    /// The coverage, or `CoverageNotFound`.
    pub fn require_coverage(&self, name: &str) -> OgcResult<&Coverage> {
        self.describe_coverage(name)
            .ok_or_else(|| OgcError::CoverageNotFound(name.to_string()))
    }

    fn summaries_v100(&self) -> Vec<Coverage> {
        self.doc
            .root()
            .find_all(".//CoverageOfferingBrief")
            .into_iter()
            .filter_map(|brief| {
                let name = brief.find_text("name")?.to_string();
                Some(Coverage {
                    name,
                    label: brief.find_text("label").map(str::to_string),
                    description: brief.find_text("description").map(str::to_string),
                    lon_lat_envelope: brief.find("lonLatEnvelope").and_then(Envelope::read),
                    ..Coverage::default()
                })
            })
            .collect()
    }

    fn summaries_v20(&self) -> Vec<Coverage> {
        let crs = self.supported_crs();
        let formats = self.supported_formats();
        self.doc
            .root()
            .find_all(".//wcs:CoverageSummary")
            .into_iter()
            .filter_map(|summary| {
                let name = summary.find_text("wcs:CoverageId")?.to_string();
                Some(Coverage {
                    name,
                    subtype: summary.find_text("wcs:CoverageSubtype").map(str::to_string),
                    lon_lat_envelope: summary
                        .find("ows:WGS84BoundingBox")
                        .and_then(Envelope::read_wgs84),
                    crs: Supported {
                        native: None,
                        supported: crs.clone(),
                    },
                    formats: Supported {
                        native: None,
                        supported: formats.clone(),
                    },
                    ..Coverage::default()
                })
            })
            .collect()
    }

    /// Describe the coverage at `index` in place; failures are logged.
    fn describe(&mut self, http: &dyn HttpClient, index: usize, timeout: Duration) {
        let name = self.coverages[index].name.clone();
        let key = match self.family {
            WcsFamily::V100 => "coverage",
            WcsFamily::V20 => "coverageID",
        };
        let result = with_query(
            &self.base_url,
            [
                ("service", "WCS"),
                ("version", self.version.as_str()),
                ("request", "DescribeCoverage"),
                (key, name.as_str()),
            ],
        )
        .and_then(|url| fetch_xml(http, &url, timeout));

        let doc = match result {
            Ok(doc) => doc,
            Err(e) => {
                warn!(coverage = %name, error = %e, "DescribeCoverage failed; keeping summary");
                return;
            }
        };

        let coverage = &mut self.coverages[index];
        let applied = match self.family {
            WcsFamily::V100 => apply_offering(coverage, doc.root()),
            WcsFamily::V20 => apply_description(coverage, doc.root()),
        };
        if applied {
            coverage.described = true;
            debug!(coverage = %name, "Coverage described");
        } else {
            warn!(coverage = %name, "DescribeCoverage response has no description");
        }
    }
}

fn texts(node: Node<'_>, path: &str) -> Vec<String> {
    node.find_all(path)
        .iter()
        .map(|n| n.text().to_string())
        .collect()
}

/// Fill `coverage` from a WCS 1.0.0 `CoverageOffering`.
fn apply_offering(coverage: &mut Coverage, root: Node<'_>) -> bool {
    let offering = match root.find(".//CoverageOffering") {
        Some(offering) => offering,
        None => return false,
    };

    let mut domain = SpatialDomain::default();
    for domain_set in offering.find_all(".//domainSet") {
        if let Some(spatial) = domain_set.find("spatialDomain") {
            domain
                .envelopes
                .extend(spatial.find_all("gml:Envelope").into_iter().filter_map(Envelope::read));
            domain
                .rectified_grids
                .extend(spatial.find_all("gml:RectifiedGrid").into_iter().map(RectifiedGrid::read));
        }
    }
    coverage.spatial_domain = domain;

    coverage.range_set = offering
        .find_all(".//RangeSet")
        .into_iter()
        .map(|range| RangeField {
            name: range.find_text("name").map(str::to_string),
            label: range.find_text("label").map(str::to_string),
            uom: None,
        })
        .collect();

    coverage.crs = Supported {
        native: offering.find_text(".//nativeCRSs").map(str::to_string),
        supported: texts(offering, ".//requestResponseCRSs"),
    };

    if let Some(formats) = offering.find(".//supportedFormats") {
        coverage.formats = Supported {
            native: formats.attr("nativeFormat").map(str::to_string),
            supported: texts(formats, "formats"),
        };
    }

    if let Some(interpolations) = offering.find(".//supportedInterpolations") {
        coverage.interpolations = Supported {
            native: interpolations.attr("default").map(str::to_string),
            supported: texts(interpolations, "interpolationMethod"),
        };
    }

    if coverage.label.is_none() {
        coverage.label = offering.find_text("label").map(str::to_string);
    }
    if coverage.description.is_none() {
        coverage.description = offering.find_text("description").map(str::to_string);
    }
    true
}

/// Fill `coverage` from a WCS 2.0 `wcs:CoverageDescription`.
fn apply_description(coverage: &mut Coverage, root: Node<'_>) -> bool {
    let description = match root.find(".//wcs:CoverageDescription") {
        Some(description) => description,
        None => return false,
    };

    coverage.spatial_domain = SpatialDomain {
        envelopes: description
            .find_all(".//gml:Envelope")
            .into_iter()
            .filter_map(Envelope::read)
            .collect(),
        rectified_grids: description
            .find_all(".//gml:RectifiedGrid")
            .into_iter()
            .map(RectifiedGrid::read)
            .collect(),
    };

    coverage.range_set = description
        .find_all(".//gmlcov:rangeType/swe:DataRecord/swe:field")
        .into_iter()
        .map(|field| RangeField {
            name: field.attr("name").map(str::to_string),
            label: field.find_text(".//swe:label").map(str::to_string),
            uom: field
                .find(".//swe:uom")
                .and_then(|uom| uom.attr("code"))
                .map(str::to_string),
        })
        .collect();

    if coverage.crs.native.is_none() {
        coverage.crs.native = coverage
            .spatial_domain
            .envelopes
            .first()
            .and_then(|e| e.srs_name.clone());
    }
    if let Some(native) = description.find_text(".//wcs:ServiceParameters/wcs:nativeFormat") {
        coverage.formats.native = Some(native.to_string());
    }
    if coverage.subtype.is_none() {
        coverage.subtype = description
            .find_text(".//wcs:ServiceParameters/wcs:CoverageSubtype")
            .map(str::to_string);
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    const CAPS_V100: &str = r#"<WCS_Capabilities xmlns="http://www.opengis.net/wcs" xmlns:gml="http://www.opengis.net/gml" version="1.0.0">
  <Service><name>WCS</name><label>MDT</label><description>Elevation models</description></Service>
  <Capability><Request><GetCapabilities/><DescribeCoverage/><GetCoverage/></Request></Capability>
  <ContentMetadata>
    <CoverageOfferingBrief>
      <name>Elevacion4258_5</name><label>MDT05</label><description>5 m grid</description>
      <lonLatEnvelope srsName="urn:ogc:def:crs:OGC:1.3:CRS84"><gml:pos>-19 26</gml:pos><gml:pos>5 44</gml:pos></lonLatEnvelope>
    </CoverageOfferingBrief>
  </ContentMetadata>
</WCS_Capabilities>"#;

    const OFFERING: &str = r#"<CoverageDescription xmlns="http://www.opengis.net/wcs" xmlns:gml="http://www.opengis.net/gml" version="1.0.0">
  <CoverageOffering>
    <name>Elevacion4258_5</name>
    <domainSet><spatialDomain>
      <gml:Envelope srsName="EPSG:4258"><gml:pos>-19 26</gml:pos><gml:pos>5 44</gml:pos></gml:Envelope>
      <gml:RectifiedGrid dimension="2">
        <gml:limits><gml:GridEnvelope><gml:low>0 0</gml:low><gml:high>99 99</gml:high></gml:GridEnvelope></gml:limits>
        <gml:axisName>x</gml:axisName><gml:axisName>y</gml:axisName>
        <gml:origin><gml:pos>-19 44</gml:pos></gml:origin>
        <gml:offsetVector>0.1 0</gml:offsetVector><gml:offsetVector>0 -0.1</gml:offsetVector>
      </gml:RectifiedGrid>
    </spatialDomain></domainSet>
    <rangeSet><RangeSet><name>height</name><label>Height</label></RangeSet></rangeSet>
    <supportedCRSs>
      <requestResponseCRSs>EPSG:4258</requestResponseCRSs>
      <requestResponseCRSs>EPSG:25830</requestResponseCRSs>
      <nativeCRSs>EPSG:4258</nativeCRSs>
    </supportedCRSs>
    <supportedFormats nativeFormat="GeoTIFF"><formats>GeoTIFF</formats><formats>ArcGrid</formats></supportedFormats>
    <supportedInterpolations default="nearest neighbor"><interpolationMethod>nearest neighbor</interpolationMethod></supportedInterpolations>
  </CoverageOffering>
</CoverageDescription>"#;

    #[test]
    fn test_v100_summaries_and_service() {
        let doc = XmlDocument::parse(CAPS_V100.as_bytes()).unwrap();
        let caps = WcsCapabilities::from_document(doc, "https://example.org/wcs", "1.0.0").unwrap();
        assert_eq!(caps.list_coverages(), vec!["Elevacion4258_5"]);
        let coverage = caps.describe_coverage("Elevacion4258_5").unwrap();
        assert_eq!(coverage.label.as_deref(), Some("MDT05"));
        assert!(coverage.lon_lat_envelope.is_some());
        assert!(!coverage.described);

        let service = caps.service_info().unwrap();
        assert_eq!(service.title.as_deref(), Some("MDT"));
        assert_eq!(
            caps.operations(),
            vec!["GetCapabilities", "DescribeCoverage", "GetCoverage"]
        );
        assert!(caps.supported_crs().is_empty());
    }

    #[test]
    fn test_v100_offering() {
        let doc = XmlDocument::parse(OFFERING.as_bytes()).unwrap();
        let mut coverage = Coverage {
            name: "Elevacion4258_5".to_string(),
            ..Coverage::default()
        };
        assert!(apply_offering(&mut coverage, doc.root()));

        assert_eq!(coverage.spatial_domain.envelopes.len(), 1);
        let grid = &coverage.spatial_domain.rectified_grids[0];
        assert_eq!(grid.axis_names, vec!["x", "y"]);
        assert_eq!(grid.origin, Some(vec![-19.0, 44.0]));
        assert_eq!(coverage.range_set[0].name.as_deref(), Some("height"));
        assert_eq!(coverage.crs.native.as_deref(), Some("EPSG:4258"));
        assert_eq!(coverage.crs.supported, vec!["EPSG:4258", "EPSG:25830"]);
        assert_eq!(coverage.formats.native.as_deref(), Some("GeoTIFF"));
        assert_eq!(coverage.formats.supported, vec!["GeoTIFF", "ArcGrid"]);
        assert_eq!(coverage.interpolations.native.as_deref(), Some("nearest neighbor"));
    }

    #[test]
    fn test_require_coverage() {
        let doc = XmlDocument::parse(CAPS_V100.as_bytes()).unwrap();
        let caps = WcsCapabilities::from_document(doc, "https://example.org/wcs", "1.0.0").unwrap();
        assert!(caps.require_coverage("Elevacion4258_5").is_ok());
        assert!(matches!(
            caps.require_coverage("Unknown"),
            Err(OgcError::CoverageNotFound(_))
        ));
    }

    #[test]
    fn test_unsupported_version() {
        assert!(WcsFamily::for_version("1.1.1").is_err());
        assert_eq!(WcsFamily::for_version("2.0.0").unwrap(), WcsFamily::V20);
    }
}

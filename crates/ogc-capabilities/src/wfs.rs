//! WFS capabilities (1.0.0, 1.1.0, 2.0.0).
//!
//! Element names are looked up in the namespace of the document root so that
//! 1.0.0/1.1.0 documents (`http://www.opengis.net/wfs`) and 2.0.0 documents
//! (`http://www.opengis.net/wfs/2.0`) go through the same code.

use serde::Serialize;
use tracing::{info, instrument};

use ogc_common::{with_query, HttpClient, OgcResult};

use crate::fetch::fetch_xml;
use crate::ows::{self, Constraint, ServiceInfo};
use crate::stored_query::{self, StoredQueryCatalog};
use crate::xml::{NamespaceTable, XmlDocument};
use crate::FetchOptions;

/// Constraint holding the server-side default result count.
pub const COUNT_DEFAULT: &str = "CountDefault";
/// Constraint advertising server-side paging.
pub const IMPLEMENTS_RESULT_PAGING: &str = "ImplementsResultPaging";

/// A feature type listed in the capabilities document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeatureType {
    pub name: String,
    pub title: String,
}

/// CRS and output format details of one feature type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeatureTypeDetail {
    pub name: String,
    pub title: String,
    pub default_crs: Option<String>,
    pub other_crs: Vec<String>,
    pub output_formats: Vec<String>,
}

/// A parsed WFS capabilities document.
#[derive(Debug, Clone)]
pub struct WfsCapabilities {
    base_url: String,
    version: String,
    doc: XmlDocument,
    stored_queries: StoredQueryCatalog,
}

impl WfsCapabilities {
    /// Fetch the capabilities document and, when advertised, the stored queries.
    #[instrument(skip(http, options))]
    pub fn fetch(
        http: &dyn HttpClient,
        base_url: &str,
        version: &str,
        options: &FetchOptions,
    ) -> OgcResult<Self> {
        let url = with_query(
            base_url,
            [
                ("service", "WFS"),
                ("version", version),
                ("request", "GetCapabilities"),
            ],
        )?;
        let doc = fetch_xml(http, &url, options.capabilities_timeout)?;
        let mut capabilities = Self::from_document(doc, base_url, version);

        if capabilities.supports_operation("ListStoredQueries") {
            capabilities.stored_queries = stored_query::discover(
                http,
                base_url,
                options.describe_timeout,
                &options.default_language,
            );
        }

        info!(
            feature_types = capabilities.feature_types().len(),
            stored_queries = capabilities.stored_queries.len(),
            "WFS capabilities loaded"
        );
        Ok(capabilities)
    }

    /// Build from an already fetched document. Stored queries start empty.
    pub fn from_document(doc: XmlDocument, base_url: &str, version: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            version: version.to_string(),
            doc,
            stored_queries: StoredQueryCatalog::default(),
        }
    }

    pub fn with_stored_queries(mut self, stored_queries: StoredQueryCatalog) -> Self {
        self.stored_queries = stored_queries;
        self
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn namespaces(&self) -> &NamespaceTable {
        self.doc.namespaces()
    }

    /// `{wfs-namespace}local` for the namespace of the document root.
    fn wfs(&self, local: &str) -> String {
        match self.doc.root().namespace() {
            Some(ns) => format!("{{{}}}{}", ns, local),
            None => format!("{{}}{}", local),
        }
    }

    /// Title, abstract and version from `ows:ServiceIdentification`, or the
    /// 1.0.0 `Service` section.
    pub fn service_info(&self) -> Option<ServiceInfo> {
        let root = self.doc.root();
        if let Some(info) = ows::service_identification(root) {
            return Some(info);
        }
        let service = root.find(&self.wfs("Service"))?;
        Some(ServiceInfo {
            name: service.find_text(&self.wfs("Name")).map(str::to_string),
            title: service.find_text(&self.wfs("Title")).map(str::to_string),
            abstract_text: service.find_text(&self.wfs("Abstract")).map(str::to_string),
            version: root.attr("version").map(str::to_string),
        })
    }

    pub fn operations(&self) -> Vec<String> {
        ows::operations(self.doc.root())
    }

    pub fn supports_operation(&self, name: &str) -> bool {
        self.operations().iter().any(|op| op == name)
    }

    pub fn parameters(&self) -> Vec<Constraint> {
        ows::parameters(self.doc.root())
    }

    pub fn constraints(&self) -> Vec<Constraint> {
        ows::constraints(self.doc.root())
    }

    pub fn constraint(&self, name: &str) -> Option<Constraint> {
        self.constraints().into_iter().find(|c| c.name == name)
    }

    /// `CountDefault` when advertised with a numeric default.
    pub fn count_default(&self) -> Option<u64> {
        self.constraint(COUNT_DEFAULT)?.default_as()
    }

    /// True only when `ImplementsResultPaging` defaults to `TRUE`.
    pub fn implements_result_paging(&self) -> bool {
        self.constraint(IMPLEMENTS_RESULT_PAGING)
            .map_or(false, |c| c.is_true())
    }

    pub fn feature_types(&self) -> Vec<FeatureType> {
        let name_path = self.wfs("Name");
        let title_path = self.wfs("Title");
        self.doc
            .root()
            .find_all(&format!(".//{}", self.wfs("FeatureType")))
            .into_iter()
            .filter_map(|ft| {
                let name = ft.find_text(&name_path)?.to_string();
                let title = ft.find_text(&title_path).unwrap_or_default().to_string();
                Some(FeatureType { name, title })
            })
            .collect()
    }

    /// CRS and output formats of the feature type `name`.
    ///
    /// The default CRS is `DefaultCRS` (2.0.0), `DefaultSRS` (1.1.0) or `SRS` (1.0.0).
    pub fn describe_feature_type(&self, name: &str) -> Option<FeatureTypeDetail> {
        let name_path = self.wfs("Name");
        let feature_type = self
            .doc
            .root()
            .find_all(&format!(".//{}", self.wfs("FeatureType")))
            .into_iter()
            .find(|ft| ft.find_text(&name_path) == Some(name))?;

        let default_crs = ["DefaultCRS", "DefaultSRS", "SRS"]
            .iter()
            .find_map(|local| feature_type.find_text(&self.wfs(local)))
            .map(str::to_string);

        let mut other_crs = Vec::new();
        for local in ["OtherCRS", "OtherSRS"] {
            other_crs.extend(
                feature_type
                    .find_all(&self.wfs(local))
                    .iter()
                    .map(|n| n.text().to_string()),
            );
        }

        let output_formats = feature_type
            .find_all(&format!("{}/{}", self.wfs("OutputFormats"), self.wfs("Format")))
            .iter()
            .map(|n| n.text().to_string())
            .collect();

        Some(FeatureTypeDetail {
            name: name.to_string(),
            title: feature_type
                .find_text(&self.wfs("Title"))
                .unwrap_or_default()
                .to_string(),
            default_crs,
            other_crs,
            output_formats,
        })
    }

    pub fn stored_queries(&self) -> &StoredQueryCatalog {
        &self.stored_queries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CAPS_V200: &str = r#"<wfs:WFS_Capabilities xmlns:wfs="http://www.opengis.net/wfs/2.0" xmlns:ows="http://www.opengis.net/ows/1.1" version="2.0.0">
  <ows:ServiceIdentification>
    <ows:Title>Nomenclator Geografico</ows:Title>
    <ows:Abstract>Place names</ows:Abstract>
    <ows:ServiceTypeVersion>2.0.0</ows:ServiceTypeVersion>
  </ows:ServiceIdentification>
  <ows:OperationsMetadata>
    <ows:Operation name="GetCapabilities"/>
    <ows:Operation name="GetFeature"/>
    <ows:Operation name="ListStoredQueries"/>
    <ows:Constraint name="ImplementsResultPaging"><ows:NoValues/><ows:DefaultValue>FALSE</ows:DefaultValue></ows:Constraint>
    <ows:Constraint name="CountDefault"><ows:NoValues/><ows:DefaultValue>100</ows:DefaultValue></ows:Constraint>
  </ows:OperationsMetadata>
  <wfs:FeatureTypeList>
    <wfs:FeatureType>
      <wfs:Name>gn:NamedPlace</wfs:Name>
      <wfs:Title>Named places</wfs:Title>
      <wfs:DefaultCRS>urn:ogc:def:crs:EPSG::4258</wfs:DefaultCRS>
      <wfs:OtherCRS>urn:ogc:def:crs:EPSG::25830</wfs:OtherCRS>
      <wfs:OutputFormats><wfs:Format>application/gml+xml; version=3.2</wfs:Format></wfs:OutputFormats>
    </wfs:FeatureType>
  </wfs:FeatureTypeList>
</wfs:WFS_Capabilities>"#;

    const CAPS_V100: &str = r#"<WFS_Capabilities xmlns="http://www.opengis.net/wfs" version="1.0.0">
  <Service><Name>WFS</Name><Title>Legacy</Title></Service>
  <Capability><Request><GetCapabilities/><DescribeFeatureType/><GetFeature/></Request></Capability>
  <FeatureTypeList>
    <FeatureType><Name>au:AdministrativeUnit</Name><Title>Units</Title><SRS>EPSG:4258</SRS></FeatureType>
  </FeatureTypeList>
</WFS_Capabilities>"#;

    fn caps(body: &str, version: &str) -> WfsCapabilities {
        let doc = XmlDocument::parse(body.as_bytes()).unwrap();
        WfsCapabilities::from_document(doc, "https://example.org/wfs", version)
    }

    #[test]
    fn test_v200_sections() {
        let caps = caps(CAPS_V200, "2.0.0");
        assert_eq!(
            caps.service_info().unwrap().title.as_deref(),
            Some("Nomenclator Geografico")
        );
        assert!(caps.supports_operation("ListStoredQueries"));
        assert_eq!(caps.count_default(), Some(100));
        assert!(!caps.implements_result_paging());
        assert_eq!(
            caps.feature_types(),
            vec![FeatureType {
                name: "gn:NamedPlace".to_string(),
                title: "Named places".to_string()
            }]
        );
    }

    #[test]
    fn test_describe_feature_type() {
        let caps = caps(CAPS_V200, "2.0.0");
        let detail = caps.describe_feature_type("gn:NamedPlace").unwrap();
        assert_eq!(detail.default_crs.as_deref(), Some("urn:ogc:def:crs:EPSG::4258"));
        assert_eq!(detail.other_crs, vec!["urn:ogc:def:crs:EPSG::25830"]);
        assert_eq!(detail.output_formats.len(), 1);
        assert!(caps.describe_feature_type("gn:Unknown").is_none());
    }

    #[test]
    fn test_v100_document() {
        let caps = caps(CAPS_V100, "1.0.0");
        assert_eq!(caps.service_info().unwrap().title.as_deref(), Some("Legacy"));
        assert_eq!(caps.operations().len(), 3);
        assert_eq!(caps.count_default(), None);
        let detail = caps.describe_feature_type("au:AdministrativeUnit").unwrap();
        assert_eq!(detail.default_crs.as_deref(), Some("EPSG:4258"));
        assert!(detail.output_formats.is_empty());
    }
}

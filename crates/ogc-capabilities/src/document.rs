//! The capabilities document of a remote service.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::instrument;

use ogc_common::{normalize_base, HttpClient, OgcError, OgcResult};

use crate::ows::{Constraint, ServiceInfo};
use crate::openapi::OpenApiDocument;
use crate::wcs::{WcsCapabilities, WcsFamily};
use crate::wfs::WfsCapabilities;
use crate::xml::NamespaceTable;

/// Kind of download service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceType {
    /// WFS
    Feature,
    /// WCS
    Coverage,
    OgcApi,
    Atom,
}

impl ServiceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::Feature => "WFS",
            ServiceType::Coverage => "WCS",
            ServiceType::OgcApi => "OGCAPI",
            ServiceType::Atom => "ATOM",
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ServiceType {
    type Err = OgcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "WFS" | "FEATURE" => Ok(ServiceType::Feature),
            "WCS" | "COVERAGE" => Ok(ServiceType::Coverage),
            "OGCAPI" | "OGC-API" | "OGC_API" => Ok(ServiceType::OgcApi),
            "ATOM" => Ok(ServiceType::Atom),
            other => Err(OgcError::Config(format!("Unknown service type: {}", other))),
        }
    }
}

/// Timeouts and limits applied while fetching capabilities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
    pub capabilities_timeout: Duration,
    pub describe_timeout: Duration,
    /// `xml:lang` of the stored-query abstract to keep.
    pub default_language: String,
    /// Maximum number of DescribeCoverage calls per capabilities fetch.
    pub max_coverages: usize,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            capabilities_timeout: Duration::from_secs(30),
            describe_timeout: Duration::from_secs(30),
            default_language: "en".to_string(),
            max_coverages: 100,
        }
    }
}

/// What a client knows about the service it talks to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceDescriptor {
    pub base_url: String,
    pub service_type: ServiceType,
    pub version: String,
    pub namespaces: NamespaceTable,
}

impl ServiceDescriptor {
    pub fn new(base_url: &str, service_type: ServiceType, version: &str) -> Self {
        Self {
            base_url: normalize_base(base_url),
            service_type,
            version: version.to_string(),
            namespaces: NamespaceTable::default(),
        }
    }
}

/// Capabilities of one service, one variant per schema family.
#[derive(Debug, Clone)]
pub enum CapabilitiesDocument {
    Wfs(WfsCapabilities),
    Wcs100(WcsCapabilities),
    Wcs20(WcsCapabilities),
    OgcApi(OpenApiDocument),
}

impl CapabilitiesDocument {
    /// Fetch and parse the capabilities of the service at `base_url`.
    ///
    /// Atom feeds have no capabilities document and are rejected here.
    #[instrument(skip(http, options))]
    pub fn fetch(
        http: &dyn HttpClient,
        service_type: ServiceType,
        version: &str,
        base_url: &str,
        options: &FetchOptions,
    ) -> OgcResult<Self> {
        let base_url = normalize_base(base_url);
        match service_type {
            ServiceType::Feature => match version {
                "1.0.0" | "1.1.0" | "2.0.0" => Ok(CapabilitiesDocument::Wfs(
                    WfsCapabilities::fetch(http, &base_url, version, options)?,
                )),
                other => Err(unsupported(service_type, other)),
            },
            ServiceType::Coverage => {
                let capabilities = WcsCapabilities::fetch(http, &base_url, version, options)?;
                Ok(match capabilities.family() {
                    WcsFamily::V100 => CapabilitiesDocument::Wcs100(capabilities),
                    WcsFamily::V20 => CapabilitiesDocument::Wcs20(capabilities),
                })
            }
            ServiceType::OgcApi => Ok(CapabilitiesDocument::OgcApi(OpenApiDocument::fetch(
                http, &base_url, options,
            )?)),
            ServiceType::Atom => Err(unsupported(service_type, version)),
        }
    }

    pub fn service_type(&self) -> ServiceType {
        match self {
            CapabilitiesDocument::Wfs(_) => ServiceType::Feature,
            CapabilitiesDocument::Wcs100(_) | CapabilitiesDocument::Wcs20(_) => {
                ServiceType::Coverage
            }
            CapabilitiesDocument::OgcApi(_) => ServiceType::OgcApi,
        }
    }

    pub fn version(&self) -> &str {
        match self {
            CapabilitiesDocument::Wfs(caps) => caps.version(),
            CapabilitiesDocument::Wcs100(caps) | CapabilitiesDocument::Wcs20(caps) => {
                caps.version()
            }
            CapabilitiesDocument::OgcApi(_) => "",
        }
    }

    pub fn descriptor(&self) -> ServiceDescriptor {
        let (base_url, namespaces) = match self {
            CapabilitiesDocument::Wfs(caps) => (caps.base_url(), caps.namespaces().clone()),
            CapabilitiesDocument::Wcs100(caps) | CapabilitiesDocument::Wcs20(caps) => {
                (caps.base_url(), caps.namespaces().clone())
            }
            CapabilitiesDocument::OgcApi(doc) => (doc.base_url(), NamespaceTable::default()),
        };
        ServiceDescriptor {
            base_url: base_url.to_string(),
            service_type: self.service_type(),
            version: self.version().to_string(),
            namespaces,
        }
    }

    pub fn service_info(&self) -> Option<ServiceInfo> {
        match self {
            CapabilitiesDocument::Wfs(caps) => caps.service_info(),
            CapabilitiesDocument::Wcs100(caps) | CapabilitiesDocument::Wcs20(caps) => {
                caps.service_info()
            }
            CapabilitiesDocument::OgcApi(doc) => {
                let info = doc.info();
                let text = |key: &str| info.get(key).and_then(|v| v.as_str()).map(str::to_string);
                Some(ServiceInfo {
                    name: None,
                    title: text("title"),
                    abstract_text: text("description"),
                    version: text("version"),
                })
            }
        }
    }

    /// Operation names, or OpenAPI paths for OGC API services.
    pub fn operations(&self) -> Vec<String> {
        match self {
            CapabilitiesDocument::Wfs(caps) => caps.operations(),
            CapabilitiesDocument::Wcs100(caps) | CapabilitiesDocument::Wcs20(caps) => {
                caps.operations()
            }
            CapabilitiesDocument::OgcApi(doc) => doc.operations(),
        }
    }

    /// OWS constraints (empty for OGC API).
    pub fn constraints(&self) -> Vec<Constraint> {
        match self {
            CapabilitiesDocument::Wfs(caps) => caps.constraints(),
            CapabilitiesDocument::Wcs100(caps) | CapabilitiesDocument::Wcs20(caps) => {
                caps.constraints()
            }
            CapabilitiesDocument::OgcApi(_) => Vec::new(),
        }
    }

    pub fn as_wfs(&self) -> Option<&WfsCapabilities> {
        match self {
            CapabilitiesDocument::Wfs(caps) => Some(caps),
            _ => None,
        }
    }

    pub fn as_wcs(&self) -> Option<&WcsCapabilities> {
        match self {
            CapabilitiesDocument::Wcs100(caps) | CapabilitiesDocument::Wcs20(caps) => Some(caps),
            _ => None,
        }
    }

    pub fn as_ogc_api(&self) -> Option<&OpenApiDocument> {
        match self {
            CapabilitiesDocument::OgcApi(doc) => Some(doc),
            _ => None,
        }
    }
}

fn unsupported(service_type: ServiceType, version: &str) -> OgcError {
    OgcError::UnsupportedVersion {
        service: service_type.to_string(),
        version: version.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_type_parsing() {
        assert_eq!("wfs".parse::<ServiceType>().unwrap(), ServiceType::Feature);
        assert_eq!("OGC-API".parse::<ServiceType>().unwrap(), ServiceType::OgcApi);
        assert!("wms".parse::<ServiceType>().is_err());
    }

    #[test]
    fn test_descriptor_normalizes_base() {
        let descriptor = ServiceDescriptor::new(
            "https://www.ign.es/wcs-inspire/mdt?",
            ServiceType::Coverage,
            "2.0.1",
        );
        assert_eq!(descriptor.base_url, "https://www.ign.es/wcs-inspire/mdt");
    }
}

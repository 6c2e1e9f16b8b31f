//! One client per kind of download service.

use std::sync::Arc;

use ogc_capabilities::{ServiceDescriptor, ServiceType};
use ogc_common::{HttpClient, OgcResult};

use crate::access::DataAccess;
use crate::atom::AtomClient;
use crate::config::ClientConfig;
use crate::ogcapi::OgcApiClient;
use crate::wcs::CoverageClient;
use crate::wfs::FeatureClient;

pub enum ServiceClient {
    Feature(FeatureClient),
    Coverage(CoverageClient),
    OgcApi(OgcApiClient),
    Atom(AtomClient),
}

impl ServiceClient {
    /// Connect to the service at `base_url`. Feature, coverage and OGC API
    /// services fetch their capabilities here; Atom feeds are read on demand.
    pub fn connect(
        service_type: ServiceType,
        version: &str,
        base_url: &str,
        http: Arc<dyn HttpClient>,
        access: Arc<dyn DataAccess>,
        config: ClientConfig,
    ) -> OgcResult<Self> {
        Ok(match service_type {
            ServiceType::Feature => {
                ServiceClient::Feature(FeatureClient::connect(base_url, version, http, access, config)?)
            }
            ServiceType::Coverage => {
                ServiceClient::Coverage(CoverageClient::connect(base_url, version, http, access, config)?)
            }
            ServiceType::OgcApi => {
                ServiceClient::OgcApi(OgcApiClient::connect(base_url, http, access, config)?)
            }
            ServiceType::Atom => ServiceClient::Atom(AtomClient::new(base_url, http, access, config)),
        })
    }

    pub fn service_type(&self) -> ServiceType {
        match self {
            ServiceClient::Feature(_) => ServiceType::Feature,
            ServiceClient::Coverage(_) => ServiceType::Coverage,
            ServiceClient::OgcApi(_) => ServiceType::OgcApi,
            ServiceClient::Atom(_) => ServiceType::Atom,
        }
    }

    /// Base URL, version and namespace table of the service.
    pub fn descriptor(&self) -> ServiceDescriptor {
        match self {
            ServiceClient::Feature(client) => {
                let caps = client.capabilities();
                ServiceDescriptor {
                    namespaces: caps.namespaces().clone(),
                    ..ServiceDescriptor::new(caps.base_url(), ServiceType::Feature, caps.version())
                }
            }
            ServiceClient::Coverage(client) => {
                let caps = client.capabilities();
                ServiceDescriptor {
                    namespaces: caps.namespaces().clone(),
                    ..ServiceDescriptor::new(caps.base_url(), ServiceType::Coverage, caps.version())
                }
            }
            ServiceClient::OgcApi(client) => {
                ServiceDescriptor::new(client.document().base_url(), ServiceType::OgcApi, "")
            }
            ServiceClient::Atom(client) => ServiceDescriptor::new(client.source(), ServiceType::Atom, ""),
        }
    }
}

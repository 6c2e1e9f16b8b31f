//! Capability negotiation for OGC download services.
//!
//! Supports:
//! - WFS 1.0.0, 1.1.0 and 2.0.0 (including stored queries)
//! - WCS 1.0.0 and 2.0.x (with per-coverage DescribeCoverage)
//! - OGC API Features, Coverages and Maps described by OpenAPI
//!
//! Every XML document is parsed in two passes: the namespace table is built
//! first, and element paths are resolved through it afterwards.

pub mod coverage;
pub mod crs;
pub mod document;
pub mod exception;
pub mod fetch;
pub mod openapi;
pub mod ows;
pub mod parameters;
pub mod stored_query;
pub mod wcs;
pub mod wfs;
pub mod xml;

pub use coverage::{Coverage, Envelope, GridLimits, RangeField, RectifiedGrid, SpatialDomain, Supported};
pub use crs::resolve_crs_identifier;
pub use document::{CapabilitiesDocument, FetchOptions, ServiceDescriptor, ServiceType};
pub use exception::ServiceException;
pub use openapi::{ApiKind, CollectionSummary, OpenApiDocument, OperationParameter, ParameterLocation};
pub use ows::{Constraint, ServiceInfo};
pub use parameters::{ParamType, ParameterCatalog, ParameterSpec, Protocol};
pub use stored_query::{StoredQuery, StoredQueryCatalog, StoredQueryParameter};
pub use wcs::{WcsCapabilities, WcsFamily};
pub use wfs::{FeatureType, FeatureTypeDetail, WfsCapabilities};
pub use xml::{NamespaceTable, Node, XmlDocument};

//! Clients for OGC download services.
//!
//! A client validates a request against the capabilities of its service,
//! hands the request URL to the data-access layer and returns a lazy
//! [`FeatureStream`] of [`Record`]s.
//!
//! - [`FeatureClient`]: WFS 1.0.0, 1.1.0 and 2.0.0, including stored queries
//! - [`CoverageClient`]: WCS 1.0.0 and 2.0.x
//! - [`OgcApiClient`]: OGC API Features, Coverages and Maps
//! - [`AtomClient`]: Atom bulk-download feeds

pub mod access;
pub mod atom;
pub mod client;
pub mod config;
pub mod feed;
pub mod memory;
pub mod ogcapi;
pub mod record;
pub mod request;
pub mod stream;
pub mod wcs;
pub mod wfs;

pub use access::{DataAccess, DataSource, Feature, FieldDefn, FieldType, FieldValue, Geometry, ResultSet};
pub use atom::AtomClient;
pub use client::ServiceClient;
pub use config::ClientConfig;
pub use feed::{AtomFeedResolver, FeedLink};
pub use memory::{AccessLog, MemoryAccess, MemoryLayer};
pub use ogcapi::{CoveragePayload, OgcApiClient};
pub use record::{Record, Violation};
pub use stream::{Ceiling, FeatureStream, Segment, Selection};
pub use wcs::CoverageClient;
pub use wfs::FeatureClient;

//! Shared test utilities for the ogc-fetch workspace.
//!
//! This crate provides:
//! - A recording HTTP transport answering from canned routes
//! - Capabilities, OpenAPI and Atom documents of fictional services
//! - Payload generators (zip archives, GML collections)
//!
//! # Usage
//!
//! ```ignore
//! use test_utils::{fixtures, MockHttp};
//!
//! let http = fixtures::wcs::mock();
//! ```

pub mod fixtures;
pub mod generators;
pub mod http;
pub mod paths;

pub use generators::*;
pub use http::MockHttp;
pub use paths::*;

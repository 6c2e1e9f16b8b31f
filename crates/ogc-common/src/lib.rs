//! Common types and utilities shared by the OGC download-service crates.

pub mod args;
pub mod bbox;
pub mod crs;
pub mod endpoint;
pub mod error;
pub mod http;
pub mod time;

pub use args::{ArgValue, QueryArgs};
pub use bbox::BoundingBox;
pub use crs::{is_uri_notation, CrsNotation, OGC_CRS_URI_PREFIX};
pub use endpoint::{file_name, join_path, normalize_base, with_query};
pub use error::{OgcError, OgcResult};
pub use http::{HttpClient, HttpResponse, ReqwestHttp};
pub use time::{day_ranges, month_ranges};

//! Error types for OGC download-service clients.

use thiserror::Error;

/// Result type alias using OgcError.
pub type OgcResult<T> = Result<T, OgcError>;

/// Primary error type for capability negotiation and data retrieval.
#[derive(Debug, Error)]
pub enum OgcError {
    // === Pre-flight validation errors ===
    #[error("The following mandatory parameters are missing: {}", .0.join(", "))]
    MissingParameter(Vec<String>),

    #[error("Invalid parameter value for '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    #[error("Either both RESX and RESY, or both WIDTH and HEIGHT, must be provided: {0}")]
    RequestShape(String),

    #[error("The stored query {0} does not exist")]
    StoredQueryNotFound(String),

    #[error("Stored query title '{title}' is shared by several identifiers: {}", .identifiers.join(", "))]
    AmbiguousStoredQuery {
        title: String,
        identifiers: Vec<String>,
    },

    #[error("The requested coverage {0} is not found")]
    CoverageNotFound(String),

    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    #[error("CRS {crs} is not supported by collection {collection}")]
    UnsupportedCrs { collection: String, crs: String },

    #[error("Operation requires an OGC API {expected} service, found {actual}")]
    ApiKindMismatch { expected: String, actual: String },

    #[error("Not an Atom feed: {0}")]
    NotAtomFeed(String),

    #[error("Unsupported {service} version: {version}")]
    UnsupportedVersion { service: String, version: String },

    // === Transport and document errors ===
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Service exception [{code}]: {text}")]
    ServiceException { code: String, text: String },

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    // === Data access errors ===
    #[error("Data access error: {0}")]
    DataAccess(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl OgcError {
    /// True for errors raised before any data request is issued.
    pub fn is_preflight(&self) -> bool {
        matches!(
            self,
            OgcError::MissingParameter(_)
                | OgcError::InvalidParameter { .. }
                | OgcError::RequestShape(_)
                | OgcError::StoredQueryNotFound(_)
                | OgcError::AmbiguousStoredQuery { .. }
                | OgcError::CoverageNotFound(_)
                | OgcError::CollectionNotFound(_)
                | OgcError::UnsupportedCrs { .. }
                | OgcError::ApiKindMismatch { .. }
                | OgcError::NotAtomFeed(_)
                | OgcError::UnsupportedVersion { .. }
        )
    }

    /// Get the OGC exception code closest to this error.
    pub fn exception_code(&self) -> &'static str {
        match self {
            OgcError::MissingParameter(_) => "MissingParameterValue",
            OgcError::InvalidParameter { .. } | OgcError::RequestShape(_) => {
                "InvalidParameterValue"
            }
            OgcError::CoverageNotFound(_) => "NoSuchCoverage",
            OgcError::UnsupportedCrs { .. } => "InvalidCRS",
            OgcError::UnsupportedVersion { .. } => "VersionNegotiationFailed",
            OgcError::StoredQueryNotFound(_) | OgcError::AmbiguousStoredQuery { .. } => {
                "InvalidParameterValue"
            }
            _ => "NoApplicableCode",
        }
    }

    /// Wrap a transport failure that happened while fetching a capabilities document.
    pub fn unavailable(url: &str, reason: impl std::fmt::Display) -> Self {
        OgcError::ServiceUnavailable(format!("{}: {}", url, reason))
    }
}

impl From<serde_json::Error> for OgcError {
    fn from(err: serde_json::Error) -> Self {
        OgcError::MalformedDocument(format!("JSON error: {}", err))
    }
}

impl From<quick_xml::Error> for OgcError {
    fn from(err: quick_xml::Error) -> Self {
        OgcError::MalformedDocument(format!("XML error: {}", err))
    }
}

impl From<reqwest::Error> for OgcError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            OgcError::Http(format!("request timed out: {}", err))
        } else {
            OgcError::Http(err.to_string())
        }
    }
}

impl From<zip::result::ZipError> for OgcError {
    fn from(err: zip::result::ZipError) -> Self {
        OgcError::DataAccess(format!("Archive error: {}", err))
    }
}

impl From<url::ParseError> for OgcError {
    fn from(err: url::ParseError) -> Self {
        OgcError::InvalidUrl(err.to_string())
    }
}

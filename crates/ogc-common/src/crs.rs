//! Coordinate Reference System notation helpers.
//!
//! The client never transforms coordinates; it only needs to recognise the
//! notations services use so it can compare a requested CRS with an
//! advertised list.

use std::fmt;

/// Prefix of the OGC CRS URI notation required by OGC API `crs` arguments.
pub const OGC_CRS_URI_PREFIX: &str = "http://www.opengis.net/def/crs/";

/// Notation a CRS identifier was written in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrsNotation {
    /// `http://www.opengis.net/def/crs/EPSG/0/4326`
    Uri { authority: String, code: String },
    /// `urn:ogc:def:crs:EPSG::4326`
    Urn { authority: String, code: String },
    /// `EPSG:4326`
    Short { authority: String, code: String },
    /// Anything else, kept verbatim.
    Other(String),
}

impl CrsNotation {
    /// Parse a CRS identifier in any of the common OGC notations.
    pub fn parse(s: &str) -> Self {
        let trimmed = s.trim();

        if let Some(rest) = trimmed.strip_prefix(OGC_CRS_URI_PREFIX) {
            let parts: Vec<&str> = rest.split('/').filter(|p| !p.is_empty()).collect();
            if let [authority, _version, code] = parts.as_slice() {
                return CrsNotation::Uri {
                    authority: authority.to_uppercase(),
                    code: code.to_string(),
                };
            }
        }

        let lower = trimmed.to_lowercase();
        if lower.starts_with("urn:ogc:def:crs:") {
            let parts: Vec<&str> = trimmed.split(':').collect();
            if parts.len() >= 6 {
                return CrsNotation::Urn {
                    authority: parts[4].to_uppercase(),
                    code: parts[parts.len() - 1].to_string(),
                };
            }
        }

        if let Some((authority, code)) = trimmed.split_once(':') {
            if !authority.is_empty()
                && !code.is_empty()
                && authority.chars().all(|c| c.is_ascii_alphabetic())
                && !code.contains(':')
                && !code.starts_with("//")
            {
                return CrsNotation::Short {
                    authority: authority.to_uppercase(),
                    code: code.to_string(),
                };
            }
        }

        CrsNotation::Other(trimmed.to_string())
    }

    /// True when written in the OGC URI notation.
    pub fn is_uri(&self) -> bool {
        matches!(self, CrsNotation::Uri { .. })
    }

    /// `(authority, code)` for the structured notations.
    pub fn authority_code(&self) -> Option<(&str, &str)> {
        match self {
            CrsNotation::Uri { authority, code }
            | CrsNotation::Urn { authority, code }
            | CrsNotation::Short { authority, code } => Some((authority, code)),
            CrsNotation::Other(_) => None,
        }
    }

    /// Two identifiers denote the same CRS, regardless of notation.
    pub fn same_crs(&self, other: &CrsNotation) -> bool {
        match (self.authority_code(), other.authority_code()) {
            (Some(a), Some(b)) => a == b,
            _ => self.to_string() == other.to_string(),
        }
    }
}

impl fmt::Display for CrsNotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrsNotation::Uri { authority, code } => {
                write!(f, "{}{}/0/{}", OGC_CRS_URI_PREFIX, authority, code)
            }
            CrsNotation::Urn { authority, code } => {
                write!(f, "urn:ogc:def:crs:{}::{}", authority, code)
            }
            CrsNotation::Short { authority, code } => write!(f, "{}:{}", authority, code),
            CrsNotation::Other(s) => write!(f, "{}", s),
        }
    }
}

/// True when `crs` is written in the OGC URI notation.
pub fn is_uri_notation(crs: &str) -> bool {
    crs.starts_with(OGC_CRS_URI_PREFIX)
}

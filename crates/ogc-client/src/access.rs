//! Interface of the vector/raster access layer.
//!
//! The access layer opens a scheme-prefixed request URL (`WFS:https://...`)
//! or an in-memory document, exposes its layers, and runs SQL-like filters.
//! Geometries are opaque to this crate.

use std::fmt;

use bytes::Bytes;
use serde::Serialize;

use ogc_common::OgcResult;

/// Type of an attribute field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FieldType {
    Integer,
    Real,
    String,
    Date,
    DateTime,
    Binary,
    Other,
}

/// Definition of an attribute field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDefn {
    pub name: String,
    pub field_type: FieldType,
    pub nullable: bool,
    pub unique: bool,
}

impl FieldDefn {
    /// A nullable, non-unique field.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            nullable: true,
            unique: false,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}

/// Value of an attribute field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Integer(i64),
    Real(f64),
    String(String),
    Binary(Vec<u8>),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => write!(f, "NULL"),
            FieldValue::Integer(v) => write!(f, "{}", v),
            FieldValue::Real(v) => write!(f, "{}", v),
            FieldValue::String(v) => write!(f, "{}", v),
            FieldValue::Binary(v) => write!(f, "<{} bytes>", v.len()),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::String(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::String(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Integer(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Real(v)
    }
}

/// Opaque geometry payload, passed through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Geometry {
    /// Encoding of `data` as reported by the access layer (`WKB`, `GML`, ...).
    pub encoding: String,
    #[serde(skip)]
    pub data: Bytes,
}

/// A feature as produced by the access layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Feature {
    pub fid: Option<i64>,
    pub fields: Vec<(FieldDefn, FieldValue)>,
    pub geometry: Option<Geometry>,
}

impl Feature {
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(defn, _)| defn.name == name)
            .map(|(_, value)| value)
    }
}

/// A forward-only set of features: a layer or the result of a filter.
pub trait ResultSet: Send {
    fn name(&self) -> &str;

    /// Number of features, as reported by the source.
    fn feature_count(&self) -> u64;

    fn next_feature(&mut self) -> OgcResult<Option<Feature>>;
}

/// An opened data source.
pub trait DataSource: Send {
    fn layer_names(&self) -> Vec<String>;

    fn layer(&mut self, name: &str) -> OgcResult<Box<dyn ResultSet>>;

    /// Run a filter expression in the source's SQL dialect.
    fn execute_sql(&mut self, sql: &str) -> OgcResult<Box<dyn ResultSet>>;

    /// Release a result set obtained from [`DataSource::execute_sql`].
    fn release_result_set(&mut self, result: Box<dyn ResultSet>);

    fn close(&mut self);
}

/// Entry point of the access layer.
pub trait DataAccess: Send + Sync {
    /// Open a scheme-prefixed request URL.
    fn open(&self, source: &str) -> OgcResult<Box<dyn DataSource>>;

    /// Open a document held in memory under `name`.
    fn open_memory(&self, name: &str, data: &[u8]) -> OgcResult<Box<dyn DataSource>>;
}

//! In-memory access layer.
//!
//! Sources are registered under a key: `open` matches the longest key that
//! prefixes the request URL, `open_memory` matches the document name. Filters
//! support `field <op> literal` clauses joined by `AND`. Every call is logged
//! so callers can inspect what was opened, queried and released.

use std::cmp::Ordering;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

use ogc_common::{OgcError, OgcResult};

use crate::access::{DataAccess, DataSource, Feature, FieldValue, ResultSet};
use crate::stream::strip_namespace;

/// A named layer of features.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryLayer {
    pub name: String,
    pub features: Vec<Feature>,
}

impl MemoryLayer {
    pub fn new(name: impl Into<String>, features: Vec<Feature>) -> Self {
        Self {
            name: name.into(),
            features,
        }
    }
}

/// Calls received by a [`MemoryAccess`].
#[derive(Debug, Clone, Default)]
pub struct AccessLog {
    pub opened: Vec<String>,
    pub memory_documents: Vec<(String, Vec<u8>)>,
    pub queries: Vec<String>,
    pub released: usize,
    pub closed: usize,
}

#[derive(Default)]
pub struct MemoryAccess {
    sources: Vec<(String, Vec<MemoryLayer>)>,
    log: Arc<Mutex<AccessLog>>,
}

impl MemoryAccess {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `layers` under `key`.
    pub fn with_source(mut self, key: impl Into<String>, layers: Vec<MemoryLayer>) -> Self {
        self.sources.push((key.into(), layers));
        self
    }

    pub fn log(&self) -> AccessLog {
        lock(&self.log).clone()
    }

    fn find(&self, matches: impl Fn(&str) -> bool) -> Option<Vec<MemoryLayer>> {
        self.sources
            .iter()
            .filter(|(key, _)| matches(key))
            .max_by_key(|(key, _)| key.len())
            .map(|(_, layers)| layers.clone())
    }

    fn source(&self, layers: Vec<MemoryLayer>) -> Box<dyn DataSource> {
        Box::new(MemorySource {
            layers,
            log: Arc::clone(&self.log),
        })
    }
}

fn lock(log: &Mutex<AccessLog>) -> MutexGuard<'_, AccessLog> {
    log.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl DataAccess for MemoryAccess {
    fn open(&self, source: &str) -> OgcResult<Box<dyn DataSource>> {
        lock(&self.log).opened.push(source.to_string());
        let layers = self
            .find(|key| source.starts_with(key))
            .ok_or_else(|| OgcError::DataAccess(format!("Unable to open {}", source)))?;
        debug!(source, layers = layers.len(), "Opened in-memory source");
        Ok(self.source(layers))
    }

    fn open_memory(&self, name: &str, data: &[u8]) -> OgcResult<Box<dyn DataSource>> {
        lock(&self.log)
            .memory_documents
            .push((name.to_string(), data.to_vec()));
        let layers = self
            .find(|key| key == name)
            .ok_or_else(|| OgcError::DataAccess(format!("Unable to open {}", name)))?;
        Ok(self.source(layers))
    }
}

struct MemorySource {
    layers: Vec<MemoryLayer>,
    log: Arc<Mutex<AccessLog>>,
}

impl MemorySource {
    fn find_layer(&self, name: &str) -> OgcResult<&MemoryLayer> {
        self.layers
            .iter()
            .find(|l| l.name == name || strip_namespace(&l.name) == name)
            .ok_or_else(|| OgcError::DataAccess(format!("No such layer: {}", name)))
    }
}

impl DataSource for MemorySource {
    fn layer_names(&self) -> Vec<String> {
        self.layers.iter().map(|l| l.name.clone()).collect()
    }

    fn layer(&mut self, name: &str) -> OgcResult<Box<dyn ResultSet>> {
        let layer = self.find_layer(name)?;
        Ok(Box::new(MemoryResultSet::new(&layer.name, layer.features.clone())))
    }

    fn execute_sql(&mut self, sql: &str) -> OgcResult<Box<dyn ResultSet>> {
        lock(&self.log).queries.push(sql.to_string());
        let (layer_name, predicate) = parse_select(sql)?;
        let layer = self.find_layer(layer_name)?;
        let mut features = Vec::new();
        for feature in &layer.features {
            if predicate.matches(feature) {
                features.push(feature.clone());
            }
        }
        Ok(Box::new(MemoryResultSet::new(&layer.name, features)))
    }

    fn release_result_set(&mut self, _result: Box<dyn ResultSet>) {
        lock(&self.log).released += 1;
    }

    fn close(&mut self) {
        lock(&self.log).closed += 1;
    }
}

struct MemoryResultSet {
    name: String,
    count: u64,
    features: VecDeque<Feature>,
}

impl MemoryResultSet {
    fn new(name: &str, features: Vec<Feature>) -> Self {
        Self {
            name: name.to_string(),
            count: features.len() as u64,
            features: features.into(),
        }
    }
}

impl ResultSet for MemoryResultSet {
    fn name(&self) -> &str {
        &self.name
    }

    fn feature_count(&self) -> u64 {
        self.count
    }

    fn next_feature(&mut self) -> OgcResult<Option<Feature>> {
        Ok(self.features.pop_front())
    }
}

/// Find `needle` (ASCII, any case) in `haystack`.
fn find_ignore_case(haystack: &str, needle: &str) -> Option<usize> {
    haystack
        .to_ascii_uppercase()
        .find(&needle.to_ascii_uppercase())
}

/// Split `SELECT * FROM layer [WHERE predicate]`.
fn parse_select(sql: &str) -> OgcResult<(&str, Predicate)> {
    let invalid = || OgcError::DataAccess(format!("Unsupported statement: {}", sql));
    let from = find_ignore_case(sql, " FROM ").ok_or_else(invalid)?;
    let rest = &sql[from + " FROM ".len()..];
    match find_ignore_case(rest, " WHERE ") {
        Some(at) => Ok((
            rest[..at].trim(),
            Predicate::parse(&rest[at + " WHERE ".len()..])?,
        )),
        None => Ok((rest.trim(), Predicate::default())),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Default)]
struct Predicate {
    clauses: Vec<(String, Op, FieldValue)>,
}

impl Predicate {
    fn parse(text: &str) -> OgcResult<Self> {
        let mut clauses = Vec::new();
        let mut rest = text.trim();
        loop {
            let (clause, tail) = match find_ignore_case(rest, " AND ") {
                Some(at) => (&rest[..at], Some(&rest[at + " AND ".len()..])),
                None => (rest, None),
            };
            clauses.push(parse_clause(clause.trim())?);
            match tail {
                Some(tail) => rest = tail.trim(),
                None => break,
            }
        }
        Ok(Self { clauses })
    }

    fn matches(&self, feature: &Feature) -> bool {
        self.clauses.iter().all(|(field, op, literal)| {
            feature
                .get(field)
                .and_then(|value| compare(value, literal))
                .map_or(false, |ordering| match op {
                    Op::Eq => ordering == Ordering::Equal,
                    Op::Ne => ordering != Ordering::Equal,
                    Op::Lt => ordering == Ordering::Less,
                    Op::Le => ordering != Ordering::Greater,
                    Op::Gt => ordering == Ordering::Greater,
                    Op::Ge => ordering != Ordering::Less,
                })
        })
    }
}

const OPERATORS: [(&str, Op); 7] = [
    (">=", Op::Ge),
    ("<=", Op::Le),
    ("<>", Op::Ne),
    ("!=", Op::Ne),
    ("=", Op::Eq),
    (">", Op::Gt),
    ("<", Op::Lt),
];

fn parse_clause(clause: &str) -> OgcResult<(String, Op, FieldValue)> {
    for (symbol, op) in OPERATORS {
        if let Some((field, literal)) = clause.split_once(symbol) {
            return Ok((field.trim().to_string(), op, parse_literal(literal.trim())));
        }
    }
    Err(OgcError::DataAccess(format!("Unsupported filter clause: {}", clause)))
}

fn parse_literal(literal: &str) -> FieldValue {
    if let Some(quoted) = literal.strip_prefix('\'').and_then(|l| l.strip_suffix('\'')) {
        return FieldValue::String(quoted.replace("''", "'"));
    }
    if literal.eq_ignore_ascii_case("NULL") {
        return FieldValue::Null;
    }
    if let Ok(v) = literal.parse::<i64>() {
        return FieldValue::Integer(v);
    }
    if let Ok(v) = literal.parse::<f64>() {
        return FieldValue::Real(v);
    }
    FieldValue::String(literal.to_string())
}

fn compare(value: &FieldValue, literal: &FieldValue) -> Option<Ordering> {
    match (value, literal) {
        (FieldValue::Integer(a), FieldValue::Integer(b)) => Some(a.cmp(b)),
        (FieldValue::Integer(a), FieldValue::Real(b)) => (*a as f64).partial_cmp(b),
        (FieldValue::Real(a), FieldValue::Integer(b)) => a.partial_cmp(&(*b as f64)),
        (FieldValue::Real(a), FieldValue::Real(b)) => a.partial_cmp(b),
        (FieldValue::String(a), FieldValue::String(b)) => Some(a.as_str().cmp(b.as_str())),
        (FieldValue::Null, FieldValue::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::{FieldDefn, FieldType};

    fn place(id: i64, name: &str) -> Feature {
        Feature {
            fid: Some(id),
            fields: vec![
                (FieldDefn::new("id", FieldType::Integer), FieldValue::Integer(id)),
                (FieldDefn::new("name", FieldType::String), FieldValue::from(name)),
            ],
            geometry: None,
        }
    }

    fn access() -> MemoryAccess {
        MemoryAccess::new().with_source(
            "WFS:https://example.org/wfs",
            vec![MemoryLayer::new(
                "gn:NamedPlace",
                vec![place(1, "Madrid"), place(2, "Zaragoza"), place(3, "Madrid")],
            )],
        )
    }

    #[test]
    fn test_open_by_prefix() {
        let access = access();
        let source = access
            .open("WFS:https://example.org/wfs?service=WFS&request=GetFeature")
            .unwrap();
        assert_eq!(source.layer_names(), vec!["gn:NamedPlace"]);
        assert!(access.open("WFS:https://other.org").is_err());
        assert_eq!(access.log().opened.len(), 2);
    }

    #[test]
    fn test_execute_sql() {
        let access = access();
        let mut source = access.open("WFS:https://example.org/wfs").unwrap();
        let mut result = source
            .execute_sql("SELECT * FROM NamedPlace WHERE name = 'Madrid' AND id > 1")
            .unwrap();
        assert_eq!(result.feature_count(), 1);
        assert_eq!(result.next_feature().unwrap().unwrap().fid, Some(3));
        assert!(result.next_feature().unwrap().is_none());
        source.release_result_set(result);
        source.close();

        let log = access.log();
        assert_eq!(log.queries.len(), 1);
        assert_eq!(log.released, 1);
        assert_eq!(log.closed, 1);
    }

    #[test]
    fn test_unsupported_statement() {
        let access = access();
        let mut source = access.open("WFS:https://example.org/wfs").unwrap();
        assert!(source.execute_sql("DELETE NamedPlace").is_err());
        assert!(source
            .execute_sql("SELECT * FROM NamedPlace WHERE name LIKE 'M%'")
            .is_err());
    }
}

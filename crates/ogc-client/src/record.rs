//! Records yielded by a feature stream, with their validation diagnostics.

use std::cell::OnceCell;
use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::Serialize;

use crate::access::Feature;

/// A constraint of the field definition that a record breaks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "field")]
pub enum Violation {
    /// Null value in a non-nullable field.
    Nullable(String),
    /// Value already seen in a unique field of the same layer.
    Unique(String),
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::Nullable(field) => write!(f, "field '{}' is not nullable", field),
            Violation::Unique(field) => write!(f, "field '{}' must be unique", field),
        }
    }
}

/// A feature plus the diagnostics attached to it. Violations never fail
/// the stream.
#[derive(Debug, Clone)]
pub struct Record {
    layer: String,
    feature: Feature,
    nullable: OnceCell<Vec<String>>,
    unique: Vec<String>,
}

impl Record {
    pub(crate) fn new(layer: &str, feature: Feature, unique: Vec<String>) -> Self {
        Self {
            layer: layer.to_string(),
            feature,
            nullable: OnceCell::new(),
            unique,
        }
    }

    /// Name of the layer the feature was read from.
    pub fn layer(&self) -> &str {
        &self.layer
    }

    pub fn feature(&self) -> &Feature {
        &self.feature
    }

    pub fn into_feature(self) -> Feature {
        self.feature
    }

    /// Non-nullable fields holding a null, computed on first access.
    pub fn nullable_violations(&self) -> &[String] {
        self.nullable.get_or_init(|| {
            self.feature
                .fields
                .iter()
                .filter(|(defn, value)| !defn.nullable && value.is_null())
                .map(|(defn, _)| defn.name.clone())
                .collect()
        })
    }

    /// Unique fields whose value appeared earlier in the same stream and layer.
    pub fn unique_violations(&self) -> &[String] {
        &self.unique
    }

    pub fn violations(&self) -> Vec<Violation> {
        self.nullable_violations()
            .iter()
            .cloned()
            .map(Violation::Nullable)
            .chain(self.unique.iter().cloned().map(Violation::Unique))
            .collect()
    }

    pub fn is_valid(&self) -> bool {
        self.unique.is_empty() && self.nullable_violations().is_empty()
    }
}

/// Values seen so far per layer and unique field.
#[derive(Debug, Default)]
pub(crate) struct UniquenessTracker {
    seen: HashMap<(String, String), HashSet<String>>,
}

impl UniquenessTracker {
    /// Record the unique-field values of `feature` and return the fields
    /// whose value was already seen.
    pub(crate) fn check(&mut self, layer: &str, feature: &Feature) -> Vec<String> {
        let mut repeated = Vec::new();
        for (defn, value) in &feature.fields {
            if !defn.unique || value.is_null() {
                continue;
            }
            let seen = self
                .seen
                .entry((layer.to_string(), defn.name.clone()))
                .or_default();
            if !seen.insert(value.to_string()) {
                repeated.push(defn.name.clone());
            }
        }
        repeated
    }
}

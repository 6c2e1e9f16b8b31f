//! OGC API services described by an OpenAPI document.
//!
//! The OpenAPI document gives the API kind, the operations and their
//! parameters; the collection list always comes from `{base}/collections`.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info, instrument, warn};

use ogc_common::{is_uri_notation, join_path, with_query, HttpClient, OgcError, OgcResult};

use crate::fetch::fetch_json;
use crate::FetchOptions;

/// Chained `$ref` pointers are followed at most this many times.
const MAX_REF_DEPTH: usize = 8;

/// Collection CRS entry that stands for the listing-level CRS list.
const GLOBAL_CRS_REF: &str = "#/crs";

/// OGC API flavour, inferred from the OpenAPI paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ApiKind {
    Features,
    Coverages,
    Maps,
    Unknown,
}

impl ApiKind {
    /// First match wins: `/items`, then `/coverage`, then `/map`.
    pub fn detect<'a>(paths: impl IntoIterator<Item = &'a str> + Clone) -> Self {
        let has = |suffix: &str| paths.clone().into_iter().any(|p| p.ends_with(suffix));
        if has("/items") {
            ApiKind::Features
        } else if has("/coverage") {
            ApiKind::Coverages
        } else if has("/map") {
            ApiKind::Maps
        } else {
            ApiKind::Unknown
        }
    }

    /// Path suffix of the data resource of a collection.
    pub fn resource(&self) -> Option<&'static str> {
        match self {
            ApiKind::Features => Some("items"),
            ApiKind::Coverages => Some("coverage"),
            ApiKind::Maps => Some("map"),
            ApiKind::Unknown => None,
        }
    }
}

impl fmt::Display for ApiKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ApiKind::Features => "Features",
            ApiKind::Coverages => "Coverages",
            ApiKind::Maps => "Maps",
            ApiKind::Unknown => "Unknown",
        };
        write!(f, "{}", name)
    }
}

/// Where an OpenAPI parameter is carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Query,
    Path,
    Header,
    Cookie,
    Other,
}

impl ParameterLocation {
    fn parse(s: Option<&str>) -> Self {
        match s {
            Some("query") => ParameterLocation::Query,
            Some("path") => ParameterLocation::Path,
            Some("header") => ParameterLocation::Header,
            Some("cookie") => ParameterLocation::Cookie,
            _ => ParameterLocation::Other,
        }
    }
}

/// A resolved operation parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationParameter {
    pub name: String,
    pub location: ParameterLocation,
    pub schema_type: Option<String>,
    pub required: bool,
    /// The resolved parameter object as found in the document.
    pub raw: Value,
}

impl OperationParameter {
    fn from_resolved(resolved: Value, fallback_name: Option<&str>) -> Option<Self> {
        let name = resolved
            .get("name")
            .and_then(Value::as_str)
            .or(fallback_name)?
            .to_string();
        Some(Self {
            name,
            location: ParameterLocation::parse(resolved.get("in").and_then(Value::as_str)),
            schema_type: resolved
                .pointer("/schema/type")
                .and_then(Value::as_str)
                .map(str::to_string),
            required: resolved
                .get("required")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            raw: resolved,
        })
    }
}

/// One entry of the collections listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionSummary {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub crs: Vec<String>,
}

impl CollectionSummary {
    /// Read a collection object; `#/crs` entries expand to `global_crs`.
    fn read(value: &Value, global_crs: &[String]) -> Option<Self> {
        let id = value.get("id").and_then(Value::as_str)?.to_string();
        let mut crs = Vec::new();
        for entry in value
            .get("crs")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Value::as_str)
        {
            if entry == GLOBAL_CRS_REF {
                crs.extend(global_crs.iter().cloned());
            } else {
                crs.push(entry.to_string());
            }
        }
        Some(Self {
            id,
            title: value.get("title").and_then(Value::as_str).map(str::to_string),
            description: value
                .get("description")
                .and_then(Value::as_str)
                .map(str::to_string),
            crs,
        })
    }

    pub fn supports_crs(&self, crs: &str) -> bool {
        self.crs.iter().any(|c| c == crs)
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Parse a `{base}/collections` response.
pub fn parse_collections(listing: &Value) -> Vec<CollectionSummary> {
    let global_crs = string_list(listing.get("crs"));
    listing
        .get("collections")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|c| CollectionSummary::read(c, &global_crs))
                .collect()
        })
        .unwrap_or_default()
}

/// An OGC API service: its OpenAPI document plus the collection listing.
#[derive(Debug, Clone)]
pub struct OpenApiDocument {
    base_url: String,
    spec_url: String,
    spec: Value,
    kind: ApiKind,
    global_crs: Vec<String>,
    collections: Vec<CollectionSummary>,
}

impl OpenApiDocument {
    /// Fetch `{base}/openapi?f=json` (falling back to `{base}/api?f=json`)
    /// and `{base}/collections?f=json`. Either failing is fatal.
    #[instrument(skip(http, options))]
    pub fn fetch(http: &dyn HttpClient, base_url: &str, options: &FetchOptions) -> OgcResult<Self> {
        let timeout = options.capabilities_timeout;

        let mut last_error = None;
        let mut found = None;
        for path in ["openapi", "api"] {
            let url = with_query(&join_path(base_url, path), [("f", "json")])?;
            match fetch_json(http, &url, timeout) {
                Ok(spec) => {
                    found = Some((url, spec));
                    break;
                }
                Err(e) => {
                    debug!(url = %url, error = %e, "OpenAPI document not available");
                    last_error = Some(e);
                }
            }
        }
        let (spec_url, spec) = match (found, last_error) {
            (Some(found), _) => found,
            (None, Some(e)) => return Err(e),
            (None, None) => return Err(OgcError::unavailable(base_url, "no OpenAPI document")),
        };

        let collections_url = with_query(&join_path(base_url, "collections"), [("f", "json")])?;
        let listing = fetch_json(http, &collections_url, timeout)?;

        let document = Self::from_parts(base_url, &spec_url, spec, &listing);
        info!(
            kind = %document.kind,
            collections = document.collections.len(),
            "OGC API document loaded"
        );
        Ok(document)
    }

    /// Assemble from an OpenAPI document and a collections listing.
    pub fn from_parts(base_url: &str, spec_url: &str, spec: Value, listing: &Value) -> Self {
        let kind = match spec.get("paths").and_then(Value::as_object) {
            Some(paths) => ApiKind::detect(paths.keys().map(String::as_str)),
            None => ApiKind::Unknown,
        };
        Self {
            base_url: base_url.to_string(),
            spec_url: spec_url.to_string(),
            spec,
            kind,
            global_crs: string_list(listing.get("crs")),
            collections: parse_collections(listing),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL the OpenAPI document was read from.
    pub fn spec_url(&self) -> &str {
        &self.spec_url
    }

    pub fn kind(&self) -> ApiKind {
        self.kind
    }

    /// The `info` object (empty when absent).
    pub fn info(&self) -> Value {
        self.spec
            .get("info")
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new()))
    }

    fn paths(&self) -> Option<&Map<String, Value>> {
        self.spec.get("paths").and_then(Value::as_object)
    }

    /// Every path of the document.
    pub fn operations(&self) -> Vec<String> {
        self.paths()
            .map(|paths| paths.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Follow local `$ref` pointers until a parameter object is reached.
    ///
    /// Objects without `$ref` are returned unchanged. Unresolvable or too
    /// deeply chained references resolve to an empty object.
    pub fn resolve_parameter(&self, param: &Value) -> Value {
        let mut current = param;
        for _ in 0..MAX_REF_DEPTH {
            let reference = match current.get("$ref").and_then(Value::as_str) {
                Some(reference) => reference,
                None => return current.clone(),
            };
            match reference
                .strip_prefix('#')
                .and_then(|pointer| self.spec.pointer(pointer))
            {
                Some(target) => current = target,
                None => {
                    warn!(reference, "Unresolvable parameter reference");
                    return Value::Object(Map::new());
                }
            }
        }
        if current.get("$ref").is_some() {
            warn!("Parameter reference chain too deep");
            return Value::Object(Map::new());
        }
        current.clone()
    }

    /// The path item for `operation`, matched literally or against templated
    /// segments (`/collections/{collectionId}/items`).
    fn path_item(&self, operation: &str) -> Option<&Value> {
        let paths = self.paths()?;
        if let Some(item) = paths.get(operation) {
            return Some(item);
        }
        let wanted: Vec<&str> = operation.trim_matches('/').split('/').collect();
        paths.iter().find_map(|(template, item)| {
            let segments: Vec<&str> = template.trim_matches('/').split('/').collect();
            let matches = segments.len() == wanted.len()
                && segments
                    .iter()
                    .zip(&wanted)
                    .all(|(t, w)| (t.starts_with('{') && t.ends_with('}')) || t == w);
            matches.then_some(item)
        })
    }

    /// Resolved parameters of `operation`, path-level first, deduplicated by
    /// name and location. `None` when the path is unknown.
    pub fn operation_parameters(&self, operation: &str) -> Option<Vec<OperationParameter>> {
        let item = self.path_item(operation)?.as_object()?;
        Some(self.collect_parameters(item))
    }

    fn collect_parameters(&self, item: &Map<String, Value>) -> Vec<OperationParameter> {
        let mut raw: Vec<&Value> = item
            .get("parameters")
            .and_then(Value::as_array)
            .map(|p| p.iter().collect())
            .unwrap_or_default();
        for (key, method) in item {
            if key == "parameters" {
                continue;
            }
            if let Some(params) = method.get("parameters").and_then(Value::as_array) {
                raw.extend(params.iter());
            }
        }

        let mut out: Vec<OperationParameter> = Vec::new();
        for param in raw {
            let fallback = param
                .get("$ref")
                .and_then(Value::as_str)
                .and_then(|r| r.rsplit('/').next());
            let resolved = self.resolve_parameter(param);
            if let Some(parameter) = OperationParameter::from_resolved(resolved, fallback) {
                if !out
                    .iter()
                    .any(|p| p.name == parameter.name && p.location == parameter.location)
                {
                    out.push(parameter);
                }
            }
        }
        out
    }

    /// Query parameters of `operation`.
    pub fn operation_queryables(&self, operation: &str) -> Option<Vec<OperationParameter>> {
        self.operation_parameters(operation).map(|params| {
            params
                .into_iter()
                .filter(|p| p.location == ParameterLocation::Query)
                .collect()
        })
    }

    /// Query parameters of every path.
    pub fn queryables(&self) -> BTreeMap<String, Vec<OperationParameter>> {
        self.parameters_where(|p| p.location == ParameterLocation::Query)
    }

    /// Non-query parameters of every path.
    pub fn parameters(&self) -> BTreeMap<String, Vec<OperationParameter>> {
        self.parameters_where(|p| p.location != ParameterLocation::Query)
    }

    fn parameters_where(
        &self,
        keep: impl Fn(&OperationParameter) -> bool,
    ) -> BTreeMap<String, Vec<OperationParameter>> {
        let mut out = BTreeMap::new();
        for (path, item) in self.paths().into_iter().flatten() {
            let Some(item) = item.as_object() else {
                continue;
            };
            let params: Vec<_> = self
                .collect_parameters(item)
                .into_iter()
                .filter(|p| keep(p))
                .collect();
            if !params.is_empty() {
                out.insert(path.clone(), params);
            }
        }
        out
    }

    pub fn collections(&self) -> &[CollectionSummary] {
        &self.collections
    }

    pub fn collection_ids(&self) -> Vec<&str> {
        self.collections.iter().map(|c| c.id.as_str()).collect()
    }

    pub fn collection(&self, id: &str) -> Option<&CollectionSummary> {
        self.collections.iter().find(|c| c.id == id)
    }

    /// The listing entry, or `CollectionNotFound`.
    pub fn require_collection(&self, id: &str) -> OgcResult<&CollectionSummary> {
        self.collection(id)
            .ok_or_else(|| OgcError::CollectionNotFound(id.to_string()))
    }

    /// Fetch `{base}/collections/{id}?f=json`. A failed fetch falls back to
    /// the listing entry; an id missing from the listing is `CollectionNotFound`.
    #[instrument(skip(self, http, timeout))]
    pub fn describe_collection(
        &self,
        http: &dyn HttpClient,
        id: &str,
        timeout: Duration,
    ) -> OgcResult<CollectionSummary> {
        let listed = self.require_collection(id)?;
        let url = with_query(
            &join_path(&self.base_url, &format!("collections/{}", id)),
            [("f", "json")],
        )?;
        match fetch_json(http, &url, timeout) {
            Ok(value) => match CollectionSummary::read(&value, &self.global_crs) {
                Some(mut described) => {
                    if described.crs.is_empty() {
                        described.crs = listed.crs.clone();
                    }
                    Ok(described)
                }
                None => {
                    warn!(collection = id, "Collection description has no id; using listing");
                    Ok(listed.clone())
                }
            },
            Err(e) => {
                warn!(collection = id, error = %e, "Failed to describe collection; using listing");
                Ok(listed.clone())
            }
        }
    }

    /// True when the collection advertises `crs`, which must be a CRS URI.
    pub fn is_output_crs_supported(
        &self,
        http: &dyn HttpClient,
        collection: &str,
        crs: &str,
        timeout: Duration,
    ) -> OgcResult<bool> {
        if !is_uri_notation(crs) {
            return Err(OgcError::InvalidParameter {
                param: "crs".to_string(),
                message: format!("The crs must be a uri notation: {}", crs),
            });
        }
        Ok(self
            .describe_collection(http, collection, timeout)?
            .supports_crs(crs))
    }
}

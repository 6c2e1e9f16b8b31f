//! WFS 2.0 stored queries.
//!
//! Discovery is two sequential round trips: `ListStoredQueries` for the
//! identifiers, then one `DescribeStoredQueries` per identifier. Queries are
//! indexed by identifier; titles are metadata and may repeat.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;
use tracing::{info, instrument, warn};

use ogc_common::{with_query, HttpClient, OgcError, OgcResult};

use crate::fetch::fetch_xml;
use crate::xml::Node;

pub const NO_TITLE: &str = "No Title";
pub const NO_ABSTRACT: &str = "No Abstract";
pub const NO_DESCRIPTION: &str = "No Description";

/// A declared stored-query parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredQueryParameter {
    pub description: String,
    /// Declared type with its namespace prefix removed (`xsd:string` → `string`).
    #[serde(rename = "type")]
    pub param_type: String,
}

/// A server-side parameterized query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredQuery {
    pub identifier: String,
    pub title: String,
    /// Abstract in the default language, or [`NO_ABSTRACT`].
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    /// Every abstract by `xml:lang`.
    pub abstracts: BTreeMap<String, String>,
    pub parameters: BTreeMap<String, StoredQueryParameter>,
}

impl StoredQuery {
    /// True when `name` is a declared parameter.
    pub fn has_parameter(&self, name: &str) -> bool {
        self.parameters.contains_key(name)
    }

    /// Read a `wfs:StoredQueryDescription` element.
    pub fn from_description(
        node: Node<'_>,
        identifier: &str,
        default_language: &str,
    ) -> Self {
        let identifier = node.attr("id").unwrap_or(identifier).to_string();
        let title = node.find_text("wfs:Title").unwrap_or(NO_TITLE).to_string();

        let abstracts: BTreeMap<String, String> = node
            .find_all("wfs:Abstract")
            .iter()
            .filter_map(|a| Some((a.attr("xml:lang")?.to_string(), a.text().to_string())))
            .collect();
        let abstract_text = abstracts
            .get(default_language)
            .cloned()
            .unwrap_or_else(|| NO_ABSTRACT.to_string());

        let parameters = node
            .find_all("wfs:Parameter")
            .iter()
            .filter_map(|p| {
                let name = p.attr("name")?.to_string();
                let raw_type = p.attr("type").unwrap_or_default();
                let param_type = match raw_type.split(':').collect::<Vec<_>>().as_slice() {
                    [_, local] => local.to_string(),
                    _ => raw_type.to_string(),
                };
                let description = p
                    .find_text("wfs:Abstract")
                    .unwrap_or(NO_DESCRIPTION)
                    .to_string();
                Some((
                    name,
                    StoredQueryParameter {
                        description,
                        param_type,
                    },
                ))
            })
            .collect();

        Self {
            identifier,
            title,
            abstract_text,
            abstracts,
            parameters,
        }
    }
}

/// Stored queries of one service, indexed by identifier.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StoredQueryCatalog {
    queries: BTreeMap<String, StoredQuery>,
}

impl StoredQueryCatalog {
    pub fn new(queries: impl IntoIterator<Item = StoredQuery>) -> Self {
        Self {
            queries: queries
                .into_iter()
                .map(|q| (q.identifier.clone(), q))
                .collect(),
        }
    }

    pub fn get(&self, identifier: &str) -> Option<&StoredQuery> {
        self.queries.get(identifier)
    }

    /// Find a query by identifier, or else by its title.
    ///
    /// A title shared by several queries is ambiguous and rejected.
    pub fn resolve(&self, name: &str) -> OgcResult<&StoredQuery> {
        if let Some(query) = self.queries.get(name) {
            return Ok(query);
        }

        let by_title: Vec<&StoredQuery> = self.queries.values().filter(|q| q.title == name).collect();
        match by_title.as_slice() {
            [] => Err(OgcError::StoredQueryNotFound(name.to_string())),
            [query] => Ok(query),
            many => Err(OgcError::AmbiguousStoredQuery {
                title: name.to_string(),
                identifiers: many.iter().map(|q| q.identifier.clone()).collect(),
            }),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &StoredQuery> {
        self.queries.values()
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.queries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }
}

/// List then describe every stored query of the service at `base_url`.
///
/// A failed listing gives an empty catalog; a failed description skips that
/// query. Neither is propagated.
#[instrument(skip(http, timeout))]
pub fn discover(
    http: &dyn HttpClient,
    base_url: &str,
    timeout: Duration,
    default_language: &str,
) -> StoredQueryCatalog {
    let identifiers = match list_identifiers(http, base_url, timeout) {
        Ok(ids) => ids,
        Err(e) => {
            warn!(error = %e, "Failed to list stored queries");
            return StoredQueryCatalog::default();
        }
    };

    let mut queries = Vec::with_capacity(identifiers.len());
    for identifier in &identifiers {
        match describe(http, base_url, identifier, timeout, default_language) {
            Ok(Some(query)) => queries.push(query),
            Ok(None) => warn!(identifier = %identifier, "Stored query has no description"),
            Err(e) => warn!(identifier = %identifier, error = %e, "Failed to describe stored query"),
        }
    }

    info!(count = queries.len(), "Stored queries discovered");
    StoredQueryCatalog::new(queries)
}

fn list_identifiers(http: &dyn HttpClient, base_url: &str, timeout: Duration) -> OgcResult<Vec<String>> {
    let url = with_query(
        base_url,
        [
            ("service", "WFS"),
            ("version", "2.0.0"),
            ("request", "ListStoredQueries"),
        ],
    )?;
    let doc = fetch_xml(http, &url, timeout)?;
    Ok(doc
        .root()
        .find_all(".//wfs:StoredQuery")
        .iter()
        .filter_map(|q| q.attr("id"))
        .map(str::to_string)
        .collect())
}

fn describe(
    http: &dyn HttpClient,
    base_url: &str,
    identifier: &str,
    timeout: Duration,
    default_language: &str,
) -> OgcResult<Option<StoredQuery>> {
    let url = with_query(
        base_url,
        [
            ("service", "WFS"),
            ("version", "2.0.0"),
            ("request", "DescribeStoredQueries"),
            ("storedQuery_ID", identifier),
        ],
    )?;
    let doc = fetch_xml(http, &url, timeout)?;
    let description = doc.root().find(".//wfs:StoredQueryDescription");
    Ok(description.map(|node| StoredQuery::from_description(node, identifier, default_language)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::XmlDocument;

    const DESCRIPTION: &str = r#"<wfs:DescribeStoredQueriesResponse xmlns:wfs="http://www.opengis.net/wfs/2.0" xmlns:xsd="http://www.w3.org/2001/XMLSchema">
  <wfs:StoredQueryDescription id="urn:x-inspire:storedQuery:GetPlaceByName">
    <wfs:Title>GetPlaceByName</wfs:Title>
    <wfs:Abstract xml:lang="es">Busca por nombre</wfs:Abstract>
    <wfs:Abstract xml:lang="en">Search by name</wfs:Abstract>
    <wfs:Parameter name="name" type="xsd:string">
      <wfs:Abstract>Geographical name</wfs:Abstract>
    </wfs:Parameter>
    <wfs:Parameter name="limit" type="int"/>
  </wfs:StoredQueryDescription>
</wfs:DescribeStoredQueriesResponse>"#;

    fn query(identifier: &str, title: &str) -> StoredQuery {
        StoredQuery {
            identifier: identifier.to_string(),
            title: title.to_string(),
            abstract_text: NO_ABSTRACT.to_string(),
            abstracts: BTreeMap::new(),
            parameters: BTreeMap::new(),
        }
    }

    #[test]
    fn test_from_description() {
        let doc = XmlDocument::parse(DESCRIPTION.as_bytes()).unwrap();
        let node = doc.root().find(".//wfs:StoredQueryDescription").unwrap();
        let query = StoredQuery::from_description(node, "ignored", "en");

        assert_eq!(query.identifier, "urn:x-inspire:storedQuery:GetPlaceByName");
        assert_eq!(query.title, "GetPlaceByName");
        assert_eq!(query.abstract_text, "Search by name");
        assert_eq!(query.abstracts.len(), 2);
        assert_eq!(query.parameters["name"].param_type, "string");
        assert_eq!(query.parameters["name"].description, "Geographical name");
        assert_eq!(query.parameters["limit"].param_type, "int");
        assert_eq!(query.parameters["limit"].description, NO_DESCRIPTION);
        assert!(query.has_parameter("name"));
        assert!(!query.has_parameter("bogus"));
    }

    #[test]
    fn test_missing_language_uses_placeholder() {
        let doc = XmlDocument::parse(DESCRIPTION.as_bytes()).unwrap();
        let node = doc.root().find(".//wfs:StoredQueryDescription").unwrap();
        let query = StoredQuery::from_description(node, "ignored", "fr");
        assert_eq!(query.abstract_text, NO_ABSTRACT);
    }

    #[test]
    fn test_resolve_by_identifier_then_title() {
        let catalog = StoredQueryCatalog::new(vec![
            query("urn:a", "GetPlaceByName"),
            query("urn:b", "GetPlaceById"),
        ]);
        assert_eq!(catalog.resolve("urn:b").unwrap().title, "GetPlaceById");
        assert_eq!(catalog.resolve("GetPlaceByName").unwrap().identifier, "urn:a");
        assert!(matches!(
            catalog.resolve("Unknown"),
            Err(OgcError::StoredQueryNotFound(_))
        ));
    }

    #[test]
    fn test_duplicate_titles_are_ambiguous() {
        let catalog = StoredQueryCatalog::new(vec![
            query("urn:a", "Same"),
            query("urn:b", "Same"),
        ]);
        match catalog.resolve("Same") {
            Err(OgcError::AmbiguousStoredQuery { identifiers, .. }) => {
                assert_eq!(identifiers, vec!["urn:a", "urn:b"]);
            }
            other => panic!("unexpected result: {:?}", other.map(|q| &q.identifier)),
        }
    }
}

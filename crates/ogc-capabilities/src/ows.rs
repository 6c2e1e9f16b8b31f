//! OWS Common sections shared by WFS and WCS capabilities.

use std::str::FromStr;

use serde::Serialize;

use crate::xml::Node;

/// General information about a service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ServiceInfo {
    /// Short machine name (WCS 1.0.0 `Service/name`).
    pub name: Option<String>,
    pub title: Option<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    /// Service type version advertised in the identification section.
    pub version: Option<String>,
}

/// A named constraint or parameter with its allowed and default values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Constraint {
    pub name: String,
    pub allowed_values: Vec<String>,
    pub default_value: Option<String>,
}

impl Constraint {
    /// Parse the default value.
    pub fn default_as<T: FromStr>(&self) -> Option<T> {
        self.default_value.as_deref()?.trim().parse().ok()
    }

    /// True when the default value is `TRUE` (any case).
    pub fn is_true(&self) -> bool {
        self.default_value
            .as_deref()
            .map_or(false, |v| v.trim().eq_ignore_ascii_case("true"))
    }

    fn read(node: Node<'_>) -> Option<Self> {
        let name = node.attr("name")?.to_string();
        let mut allowed_values: Vec<String> = node
            .find_all("ows:AllowedValues/ows:Value")
            .iter()
            .map(|v| v.text().to_string())
            .collect();
        // OWS 1.0.0 lists values directly under the parameter
        allowed_values.extend(node.find_all("ows:Value").iter().map(|v| v.text().to_string()));

        Some(Self {
            name,
            allowed_values,
            default_value: node.find_text("ows:DefaultValue").map(str::to_string),
        })
    }
}

/// `ows:ServiceIdentification` title, abstract and type version.
pub fn service_identification(root: Node<'_>) -> Option<ServiceInfo> {
    let section = root.find("ows:ServiceIdentification")?;
    Some(ServiceInfo {
        name: section.find_text("ows:ServiceType").map(str::to_string),
        title: section.find_text("ows:Title").map(str::to_string),
        abstract_text: section.find_text("ows:Abstract").map(str::to_string),
        version: section.find_text("ows:ServiceTypeVersion").map(str::to_string),
    })
}

/// Operation names from `ows:OperationsMetadata`, or the 1.0.0 `Request` section.
pub fn operations(root: Node<'_>) -> Vec<String> {
    let operations: Vec<String> = root
        .find_all(".//ows:OperationsMetadata/ows:Operation")
        .iter()
        .filter_map(|op| op.attr("name"))
        .map(str::to_string)
        .collect();
    if !operations.is_empty() {
        return operations;
    }

    root.find(".//Request")
        .map(|request| {
            request
                .children()
                .map(|op| op.local_name().to_string())
                .collect()
        })
        .unwrap_or_default()
}

/// Every `ows:Parameter`, in document order.
pub fn parameters(root: Node<'_>) -> Vec<Constraint> {
    root.find_all(".//ows:Parameter")
        .into_iter()
        .filter_map(Constraint::read)
        .collect()
}

/// Service-level constraints first, then operation-level ones not already seen.
pub fn constraints(root: Node<'_>) -> Vec<Constraint> {
    let mut out: Vec<Constraint> = root
        .find_all(".//ows:OperationsMetadata/ows:Constraint")
        .into_iter()
        .filter_map(Constraint::read)
        .collect();

    for constraint in root
        .find_all(".//ows:Operation//ows:Constraint")
        .into_iter()
        .filter_map(Constraint::read)
    {
        if !out.iter().any(|c| c.name == constraint.name) {
            out.push(constraint);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::XmlDocument;

    const DOC: &str = r#"<wfs:WFS_Capabilities xmlns:wfs="http://www.opengis.net/wfs/2.0" xmlns:ows="http://www.opengis.net/ows/1.1">
  <ows:ServiceIdentification>
    <ows:Title>Nomenclator</ows:Title>
    <ows:Abstract>Place names</ows:Abstract>
    <ows:ServiceType>WFS</ows:ServiceType>
    <ows:ServiceTypeVersion>2.0.0</ows:ServiceTypeVersion>
  </ows:ServiceIdentification>
  <ows:OperationsMetadata>
    <ows:Operation name="GetCapabilities">
      <ows:Parameter name="AcceptVersions">
        <ows:AllowedValues><ows:Value>2.0.0</ows:Value><ows:Value>1.1.0</ows:Value></ows:AllowedValues>
      </ows:Parameter>
    </ows:Operation>
    <ows:Operation name="GetFeature">
      <ows:Constraint name="CountDefault"><ows:NoValues/><ows:DefaultValue>500</ows:DefaultValue></ows:Constraint>
    </ows:Operation>
    <ows:Constraint name="ImplementsResultPaging"><ows:NoValues/><ows:DefaultValue>FALSE</ows:DefaultValue></ows:Constraint>
    <ows:Constraint name="CountDefault"><ows:NoValues/><ows:DefaultValue>100</ows:DefaultValue></ows:Constraint>
  </ows:OperationsMetadata>
</wfs:WFS_Capabilities>"#;

    #[test]
    fn test_service_identification() {
        let doc = XmlDocument::parse(DOC.as_bytes()).unwrap();
        let info = service_identification(doc.root()).unwrap();
        assert_eq!(info.title.as_deref(), Some("Nomenclator"));
        assert_eq!(info.version.as_deref(), Some("2.0.0"));
    }

    #[test]
    fn test_operations_and_parameters() {
        let doc = XmlDocument::parse(DOC.as_bytes()).unwrap();
        assert_eq!(operations(doc.root()), vec!["GetCapabilities", "GetFeature"]);
        let params = parameters(doc.root());
        assert_eq!(params[0].name, "AcceptVersions");
        assert_eq!(params[0].allowed_values, vec!["2.0.0", "1.1.0"]);
    }

    #[test]
    fn test_service_level_constraints_win() {
        let doc = XmlDocument::parse(DOC.as_bytes()).unwrap();
        let constraints = constraints(doc.root());
        assert_eq!(constraints.len(), 2);
        let count = constraints.iter().find(|c| c.name == "CountDefault").unwrap();
        assert_eq!(count.default_as::<u64>(), Some(100));
        let paging = constraints
            .iter()
            .find(|c| c.name == "ImplementsResultPaging")
            .unwrap();
        assert!(!paging.is_true());
    }

    #[test]
    fn test_legacy_request_section() {
        let body = r#"<WFS_Capabilities xmlns="http://www.opengis.net/wfs" version="1.0.0">
  <Capability><Request><GetCapabilities/><DescribeFeatureType/><GetFeature/></Request></Capability>
</WFS_Capabilities>"#;
        let doc = XmlDocument::parse(body.as_bytes()).unwrap();
        assert_eq!(
            operations(doc.root()),
            vec!["GetCapabilities", "DescribeFeatureType", "GetFeature"]
        );
    }
}

//! OWS exception report detection.
//!
//! Services answer failed requests with HTTP 200 and an `ExceptionReport`
//! body (OWS 1.x) or a `ServiceExceptionReport` (WFS/WCS 1.0.0).

use ogc_common::OgcError;

use crate::xml::{Node, XmlDocument};

/// The first exception carried by a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceException {
    pub code: String,
    pub locator: Option<String>,
    pub text: String,
}

impl From<ServiceException> for OgcError {
    fn from(e: ServiceException) -> Self {
        let text = match e.locator {
            Some(locator) => format!("{} (locator: {})", e.text, locator),
            None => e.text,
        };
        OgcError::ServiceException { code: e.code, text }
    }
}

/// Extract the exception when `doc` is an exception report.
pub fn exception_report(doc: &XmlDocument) -> Option<ServiceException> {
    let root = doc.root();
    match root.local_name() {
        "ExceptionReport" => {
            let exception = child_named(root, "Exception")?;
            let text = exception
                .children()
                .filter(|c| c.local_name() == "ExceptionText")
                .map(|c| c.text())
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join("; ");
            Some(ServiceException {
                code: exception
                    .attr("exceptionCode")
                    .unwrap_or("NoApplicableCode")
                    .to_string(),
                locator: exception.attr("locator").map(str::to_string),
                text,
            })
        }
        "ServiceExceptionReport" => {
            let exception = child_named(root, "ServiceException")?;
            Some(ServiceException {
                code: exception.attr("code").unwrap_or("NoApplicableCode").to_string(),
                locator: exception.attr("locator").map(str::to_string),
                text: exception.text().to_string(),
            })
        }
        _ => None,
    }
}

fn child_named<'a>(node: Node<'a>, local: &str) -> Option<Node<'a>> {
    node.children().find(|c| c.local_name() == local)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ows_exception_report() {
        let body = r#"<ows:ExceptionReport xmlns:ows="http://www.opengis.net/ows/1.1" version="2.0.0">
  <ows:Exception exceptionCode="InvalidParameterValue" locator="typeNames">
    <ows:ExceptionText>Unknown feature type</ows:ExceptionText>
  </ows:Exception>
</ows:ExceptionReport>"#;
        let doc = XmlDocument::parse(body.as_bytes()).unwrap();
        let exception = exception_report(&doc).unwrap();
        assert_eq!(exception.code, "InvalidParameterValue");
        assert_eq!(exception.locator.as_deref(), Some("typeNames"));
        assert_eq!(exception.text, "Unknown feature type");

        let err: OgcError = exception.into();
        assert!(err.to_string().contains("InvalidParameterValue"));
    }

    #[test]
    fn test_legacy_service_exception_report() {
        let body = r#"<ServiceExceptionReport version="1.2.0" xmlns="http://www.opengis.net/ogc">
  <ServiceException code="CoverageNotDefined">No such coverage</ServiceException>
</ServiceExceptionReport>"#;
        let doc = XmlDocument::parse(body.as_bytes()).unwrap();
        let exception = exception_report(&doc).unwrap();
        assert_eq!(exception.code, "CoverageNotDefined");
        assert_eq!(exception.text, "No such coverage");
    }

    #[test]
    fn test_regular_document_is_not_a_report() {
        let doc = XmlDocument::parse(b"<WCS_Capabilities/>").unwrap();
        assert!(exception_report(&doc).is_none());
    }
}

//! Coverage descriptions assembled from WCS capabilities and DescribeCoverage.

use serde::Serialize;
use tracing::warn;

use ogc_common::BoundingBox;

use crate::xml::Node;

/// A bounding envelope of a coverage domain.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    pub bbox: BoundingBox,
    pub srs_name: Option<String>,
    pub axis_labels: Vec<String>,
}

impl Envelope {
    /// Read an envelope written as two `gml:pos` (WCS 1.0.0) or as
    /// `gml:lowerCorner` / `gml:upperCorner` (WCS 2.0). `None` when incomplete.
    pub fn read(node: Node<'_>) -> Option<Self> {
        let srs_name = node.attr("srsName").map(str::to_string);
        let axis_labels = node
            .attr("axisLabels")
            .map(|labels| labels.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();

        let positions = node.find_all("gml:pos");
        let corners = if positions.len() == 2 {
            Some((positions[0].text(), positions[1].text()))
        } else {
            match (node.find("gml:lowerCorner"), node.find("gml:upperCorner")) {
                (Some(lower), Some(upper)) => Some((lower.text(), upper.text())),
                _ => None,
            }
        };

        let bbox = corners.and_then(|(lower, upper)| {
            let lower = BoundingBox::parse_position(lower).ok()?;
            let upper = BoundingBox::parse_position(upper).ok()?;
            BoundingBox::from_corners(&lower, &upper)
        });

        match bbox {
            Some(bbox) => Some(Self {
                bbox,
                srs_name,
                axis_labels,
            }),
            None => {
                warn!(element = node.local_name(), "Invalid or incomplete envelope element");
                None
            }
        }
    }

    /// Read an `ows:WGS84BoundingBox`.
    pub fn read_wgs84(node: Node<'_>) -> Option<Self> {
        let lower = BoundingBox::parse_position(node.find_text("ows:LowerCorner")?).ok()?;
        let upper = BoundingBox::parse_position(node.find_text("ows:UpperCorner")?).ok()?;
        Some(Self {
            bbox: BoundingBox::from_corners(&lower, &upper)?,
            srs_name: Some("urn:ogc:def:crs:OGC:1.3:CRS84".to_string()),
            axis_labels: Vec::new(),
        })
    }
}

/// Index limits of a grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GridLimits {
    pub low: Vec<i64>,
    pub high: Vec<i64>,
}

/// A `gml:RectifiedGrid`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RectifiedGrid {
    pub limits: Option<GridLimits>,
    pub axis_names: Vec<String>,
    pub origin: Option<Vec<f64>>,
    pub offset_vectors: Vec<Vec<f64>>,
}

impl RectifiedGrid {
    /// Read a grid. Axis names come from `gml:axisName` elements (WCS 1.0.0)
    /// or the `gml:axisLabels` list (WCS 2.0); the origin from `gml:origin/gml:pos`
    /// or `gml:origin/gml:Point/gml:pos`.
    pub fn read(node: Node<'_>) -> Self {
        let limits = node.find(".//gml:GridEnvelope").and_then(|envelope| {
            Some(GridLimits {
                low: parse_integers(envelope.find_text(".//gml:low")?)?,
                high: parse_integers(envelope.find_text(".//gml:high")?)?,
            })
        });

        let mut axis_names: Vec<String> = node
            .find_all("gml:axisName")
            .iter()
            .map(|a| a.text().to_string())
            .collect();
        if axis_names.is_empty() {
            if let Some(labels) = node.find_text("gml:axisLabels") {
                axis_names = labels.split_whitespace().map(str::to_string).collect();
            }
        }

        let origin = node
            .find_text("gml:origin/gml:pos")
            .or_else(|| node.find_text("gml:origin/gml:Point/gml:pos"))
            .and_then(|pos| BoundingBox::parse_position(pos).ok());

        let offset_vectors = node
            .find_all("gml:offsetVector")
            .iter()
            .filter_map(|v| BoundingBox::parse_position(v.text()).ok())
            .collect();

        Self {
            limits,
            axis_names,
            origin,
            offset_vectors,
        }
    }
}

fn parse_integers(text: &str) -> Option<Vec<i64>> {
    text.split_whitespace().map(|v| v.parse().ok()).collect()
}

/// Spatial domain of a coverage.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SpatialDomain {
    pub envelopes: Vec<Envelope>,
    pub rectified_grids: Vec<RectifiedGrid>,
}

/// One field of the coverage range.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RangeField {
    pub name: Option<String>,
    pub label: Option<String>,
    pub uom: Option<String>,
}

/// Native and supported values of a coverage property.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Supported {
    pub native: Option<String>,
    pub supported: Vec<String>,
}

/// A coverage offered by a WCS.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Coverage {
    /// Coverage name (1.0.0) or identifier (2.0).
    pub name: String,
    pub label: Option<String>,
    pub description: Option<String>,
    /// `wcs:CoverageSubtype` (2.0).
    pub subtype: Option<String>,
    /// Summary envelope from the capabilities document.
    pub lon_lat_envelope: Option<Envelope>,
    pub spatial_domain: SpatialDomain,
    pub range_set: Vec<RangeField>,
    pub crs: Supported,
    pub formats: Supported,
    /// `native` holds the default interpolation method.
    pub interpolations: Supported,
    /// False when the DescribeCoverage call failed or was skipped.
    pub described: bool,
}

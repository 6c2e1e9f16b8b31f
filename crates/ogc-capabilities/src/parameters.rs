//! Static request-parameter catalogs for WFS and WCS.
//!
//! Each protocol version has a fixed schema of recognized KVP parameters.
//! Catalogs never touch the network: validation is a pure function of the
//! version and the names the caller supplied.

use std::collections::BTreeSet;

use serde::Serialize;

use ogc_common::{ArgValue, OgcError, OgcResult, QueryArgs};

/// Parameters intrinsic to the transport, never reported as missing.
pub const TRANSPORT_PARAMETERS: [&str; 3] = ["service", "request", "version"];

/// Service protocol a catalog belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Protocol {
    Wfs,
    Wcs,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Wfs => "WFS",
            Protocol::Wcs => "WCS",
        }
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declared value type of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParamType {
    String,
    Integer,
    Double,
    StringList,
    DoubleList,
}

impl ParamType {
    pub fn label(&self) -> &'static str {
        match self {
            ParamType::String => "String",
            ParamType::Integer => "Integer",
            ParamType::Double => "Double",
            ParamType::StringList => "List of Strings",
            ParamType::DoubleList => "List of Doubles",
        }
    }

    /// True when every value of `value` parses as this type.
    fn accepts(&self, value: &ArgValue) -> bool {
        let values = value.values();
        match self {
            ParamType::String | ParamType::StringList => true,
            ParamType::Integer => values.iter().all(|v| v.trim().parse::<i64>().is_ok()),
            ParamType::Double | ParamType::DoubleList => values.iter().all(|v| {
                v.split(',')
                    .filter(|part| !part.trim().is_empty())
                    .all(|part| part.trim().parse::<f64>().is_ok())
            }),
        }
    }
}

/// One recognized request parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ParameterSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub param_type: ParamType,
    pub required: bool,
}

const fn param(
    name: &'static str,
    description: &'static str,
    param_type: ParamType,
    required: bool,
) -> ParameterSpec {
    ParameterSpec {
        name,
        description,
        param_type,
        required,
    }
}

const OUTPUT_FORMAT: &str = "Specifies the format used to encode resources in the response to a query operation. With WFS 2.0, the default outputFormat is \"application/gml+xml; version=3.2\".";
const RESULT_TYPE: &str = "Either the complete response document (results) or an empty container carrying the number of matching resources (hits). With WFS 2.0, the default resultType is results.";
const PROPERTY_NAME: &str = "Returns feature instances with only the specified property included.";
const COUNT: &str = "Limits the number of features in the response.";
const SRS_NAME: &str = "Spatial reference system used to encode feature geometries. Allowed systems per feature type are listed in the GetCapabilities response.";
const FILTER: &str = "XML encoded filter as specified in ISO 19143, Clause 7.";
const BBOX: &str = "Comma-separated list of four numbers with the minimum and maximum bounding coordinates of the returned feature instances.";
const SORT_BY: &str = "Returns feature instances in a sequence determined by the specified property.";
const FEATURE_ID: &str = "Filters the features returned by the request by identifier.";

const WFS_100: &[ParameterSpec] = &[
    param("service", "Service name. Value is WFS.", ParamType::String, true),
    param("request", "Operation name.", ParamType::String, true),
    param("version", "Service version. Value is 1.0.0", ParamType::String, false),
    param("typeName", "Collection of feature instances to return.", ParamType::String, false),
    param("featureID", FEATURE_ID, ParamType::String, false),
    param("outputFormat", OUTPUT_FORMAT, ParamType::String, false),
    param("resultType", RESULT_TYPE, ParamType::String, false),
    param("propertyName", PROPERTY_NAME, ParamType::String, false),
    param("maxFeatures", COUNT, ParamType::Integer, false),
    param("srsName", SRS_NAME, ParamType::String, false),
    param("filter", FILTER, ParamType::String, false),
    param("bbox", BBOX, ParamType::String, false),
    param("sortBy", SORT_BY, ParamType::String, false),
];

const WFS_110: &[ParameterSpec] = &[
    param("service", "Service name. Value is WFS.", ParamType::String, true),
    param("request", "Operation name.", ParamType::String, true),
    param("version", "Service version. Value is 1.1.0", ParamType::String, false),
    param("typeName", "Collection of feature instances to return.", ParamType::String, false),
    param("featureID", FEATURE_ID, ParamType::String, false),
    param("outputFormat", OUTPUT_FORMAT, ParamType::String, false),
    param("resultType", RESULT_TYPE, ParamType::String, false),
    param("propertyName", PROPERTY_NAME, ParamType::String, false),
    param("maxFeatures", COUNT, ParamType::Integer, false),
    param("srsName", SRS_NAME, ParamType::String, false),
    param("filter", FILTER, ParamType::String, false),
    param("bbox", BBOX, ParamType::String, false),
    param("sortBy", SORT_BY, ParamType::String, false),
];

const WFS_200: &[ParameterSpec] = &[
    param("service", "Service name. Value is WFS.", ParamType::String, true),
    param("request", "Operation name.", ParamType::String, true),
    param("version", "Service version. Value is 2.0.0", ParamType::String, false),
    param("typeNames", "Collection of feature instances to return.", ParamType::String, false),
    param("resourceID", FEATURE_ID, ParamType::String, false),
    param("outputFormat", OUTPUT_FORMAT, ParamType::String, false),
    param("resultType", RESULT_TYPE, ParamType::String, false),
    param("propertyName", PROPERTY_NAME, ParamType::String, false),
    param("count", COUNT, ParamType::Integer, false),
    param("srsName", SRS_NAME, ParamType::String, false),
    param("filter", FILTER, ParamType::String, false),
    param("bbox", BBOX, ParamType::String, false),
    param("sortBy", SORT_BY, ParamType::String, false),
];

const WCS_100: &[ParameterSpec] = &[
    param("service", "Service name: Value is WCS.", ParamType::String, true),
    param("request", "Operation name.", ParamType::String, true),
    param("version", "Service version. Value is 1.0.0", ParamType::String, true),
    param("coverage", "Name of an available coverage.", ParamType::String, true),
    param("crs", "Coordinate Reference System in which the request is expressed.", ParamType::String, true),
    param("response_crs", "Coordinate Reference System of the coverage response. Defaults to the request CRS.", ParamType::String, false),
    param("bbox", "Subset bounding box, ordered according to the CRS parameter. One of BBOX or TIME is required.", ParamType::String, false),
    param("time", "Time instants or intervals in extended ISO 8601 syntax. One of BBOX or TIME is required.", ParamType::String, false),
    param("width", "Width of the grid. Either WIDTH and HEIGHT or RESX and RESY are required.", ParamType::Integer, false),
    param("height", "Height of the grid. Either WIDTH and HEIGHT or RESX and RESY are required.", ParamType::Integer, false),
    param("depth", "Depth of the grid for 3D coverages.", ParamType::Integer, false),
    param("RESX", "Resolution along the X axis. Either RESX and RESY or WIDTH and HEIGHT are required.", ParamType::Double, false),
    param("RESY", "Resolution along the Y axis. Either RESX and RESY or WIDTH and HEIGHT are required.", ParamType::Double, false),
    param("RESZ", "Resolution along the Z axis for 3D grids.", ParamType::Double, false),
    param("interpolation", "Interpolation method for resampling coverage values. Defaults to the server method.", ParamType::String, false),
    param("format", "Requested output format (e.g. image/tiff).", ParamType::String, true),
    param("exceptions", "Format for reporting exceptions.", ParamType::String, false),
];

const WCS_201: &[ParameterSpec] = &[
    param("service", "Service name: Value is WCS.", ParamType::String, true),
    param("request", "Operation name. Value is GetCoverage.", ParamType::String, true),
    param("version", "Service version. Value is 2.0.1.", ParamType::String, true),
    param("coverageID", "Identifier of the requested coverage.", ParamType::String, true),
    param("format", "Requested output format (e.g. image/tiff).", ParamType::String, true),
    param("subset", "Trims or slices along named axes such as Long, Lat or Time.", ParamType::StringList, true),
    param("rangeSubset", "Range subset of the coverage, such as specific bands or fields.", ParamType::String, false),
    param("outputCRS", "Coordinate Reference System of the output coverage.", ParamType::String, false),
    param("resolution", "Resolution of the requested coverage, per axis.", ParamType::DoubleList, false),
    param("interpolation", "Interpolation method for resampling coverage values. Defaults to the server method.", ParamType::String, false),
    param("mediaType", "Media type of the output.", ParamType::String, false),
    param("exceptions", "Format for reporting exceptions.", ParamType::String, false),
];

/// The recognized-parameter schema of one protocol version.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ParameterCatalog {
    pub protocol: Protocol,
    pub version: &'static str,
    pub parameters: &'static [ParameterSpec],
}

static CATALOGS: [ParameterCatalog; 5] = [
    ParameterCatalog {
        protocol: Protocol::Wfs,
        version: "1.0.0",
        parameters: WFS_100,
    },
    ParameterCatalog {
        protocol: Protocol::Wfs,
        version: "1.1.0",
        parameters: WFS_110,
    },
    ParameterCatalog {
        protocol: Protocol::Wfs,
        version: "2.0.0",
        parameters: WFS_200,
    },
    ParameterCatalog {
        protocol: Protocol::Wcs,
        version: "1.0.0",
        parameters: WCS_100,
    },
    ParameterCatalog {
        protocol: Protocol::Wcs,
        version: "2.0.1",
        parameters: WCS_201,
    },
];

impl ParameterCatalog {
    /// Catalog for `protocol` at `version`.
    pub fn for_version(protocol: Protocol, version: &str) -> OgcResult<&'static ParameterCatalog> {
        CATALOGS
            .iter()
            .find(|c| c.protocol == protocol && c.version == version)
            .ok_or_else(|| OgcError::UnsupportedVersion {
                service: protocol.to_string(),
                version: version.to_string(),
            })
    }

    /// Every catalog, in protocol then version order.
    pub fn all() -> &'static [ParameterCatalog] {
        &CATALOGS
    }

    /// Case-insensitive lookup.
    pub fn get(&self, name: &str) -> Option<&'static ParameterSpec> {
        self.parameters
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.parameters.iter().map(|p| p.name).collect()
    }

    /// Required parameters the caller did not supply with a non-empty value.
    ///
    /// Transport parameters are never reported. The result is sorted, so it
    /// does not depend on the order arguments were supplied in.
    pub fn missing(&self, args: &QueryArgs) -> Vec<String> {
        let missing: BTreeSet<&str> = self
            .parameters
            .iter()
            .filter(|p| p.required)
            .filter(|p| {
                !TRANSPORT_PARAMETERS
                    .iter()
                    .any(|t| t.eq_ignore_ascii_case(p.name))
            })
            .filter(|p| !args.has_value(p.name))
            .map(|p| p.name)
            .collect();
        missing.into_iter().map(str::to_string).collect()
    }

    /// Fail with every missing name at once.
    pub fn require(&self, args: &QueryArgs) -> OgcResult<()> {
        let missing = self.missing(args);
        if missing.is_empty() {
            Ok(())
        } else {
            Err(OgcError::MissingParameter(missing))
        }
    }

    /// Split `args` into (recognized, unrecognized), keeping the caller's order.
    ///
    /// Recognized arguments are renamed to the catalog's spelling.
    pub fn partition(&self, args: &QueryArgs) -> (QueryArgs, QueryArgs) {
        let mut recognized = QueryArgs::new();
        let mut unrecognized = QueryArgs::new();
        for (name, value) in args.iter() {
            match self.get(name) {
                Some(spec) => recognized.insert(spec.name, value.clone()),
                None => unrecognized.insert(name, value.clone()),
            }
        }
        (recognized, unrecognized)
    }

    /// Reject recognized arguments whose values do not parse as the declared type.
    pub fn check_types(&self, args: &QueryArgs) -> OgcResult<()> {
        for (name, value) in args.iter() {
            if let Some(spec) = self.get(name) {
                if !value.is_empty() && !spec.param_type.accepts(value) {
                    return Err(OgcError::InvalidParameter {
                        param: spec.name.to_string(),
                        message: format!("expected {}, got '{}'", spec.param_type.label(), value),
                    });
                }
            }
        }
        Ok(())
    }
}

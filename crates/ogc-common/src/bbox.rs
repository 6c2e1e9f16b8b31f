//! Bounding box types.

use serde::{Deserialize, Serialize};

/// A geographic or projected bounding box as advertised by a service.
///
/// Axis order is whatever the advertising document uses; no swapping is done.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Create a new bounding box from corner coordinates.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Build from lower/upper corner positions; extra dimensions are ignored.
    pub fn from_corners(lower: &[f64], upper: &[f64]) -> Option<Self> {
        match (lower, upper) {
            ([lx, ly, ..], [ux, uy, ..]) => Some(Self::new(*lx, *ly, *ux, *uy)),
            _ => None,
        }
    }

    /// Parse a whitespace separated GML position list ("x y" or "x y z").
    pub fn parse_position(text: &str) -> Result<Vec<f64>, BboxParseError> {
        text.split_whitespace()
            .map(|part| {
                part.parse::<f64>()
                    .map_err(|_| BboxParseError::InvalidNumber(part.to_string()))
            })
            .collect()
    }

    /// `[min_x, min_y, max_x, max_y]`
    pub fn to_array(&self) -> [f64; 4] {
        [self.min_x, self.min_y, self.max_x, self.max_y]
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BboxParseError {
    #[error("Invalid number in position: {0}")]
    InvalidNumber(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_corners() {
        let bbox = BoundingBox::from_corners(&[-9.5, 35.9], &[4.4, 43.8]).unwrap();
        assert_eq!(bbox.to_array(), [-9.5, 35.9, 4.4, 43.8]);
    }

    #[test]
    fn test_from_corners_ignores_third_axis() {
        let bbox = BoundingBox::from_corners(&[0.0, 1.0, 5.0], &[2.0, 3.0, 9.0]).unwrap();
        assert_eq!(bbox, BoundingBox::new(0.0, 1.0, 2.0, 3.0));
    }

    #[test]
    fn test_from_corners_too_short() {
        assert!(BoundingBox::from_corners(&[0.0], &[1.0, 2.0]).is_none());
    }

    #[test]
    fn test_parse_position() {
        assert_eq!(
            BoundingBox::parse_position(" -3.70379  40.41678 ").unwrap(),
            vec![-3.70379, 40.41678]
        );
        assert!(matches!(
            BoundingBox::parse_position("1.0 abc"),
            Err(BboxParseError::InvalidNumber(_))
        ));
    }
}

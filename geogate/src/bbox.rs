//! Bounding boxes as sent to WMS `GetMap`.

use std::fmt;
use std::str::FromStr;

use crate::error::{GatewayError, Result};

/// A rectangular extent in the units of the request's spatial reference.
///
/// Always holds four finite numbers with `minx <= maxx` and `miny <= maxy`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Western (minimum x) edge.
    pub minx: f64,
    /// Southern (minimum y) edge.
    pub miny: f64,
    /// Eastern (maximum x) edge.
    pub maxx: f64,
    /// Northern (maximum y) edge.
    pub maxy: f64,
}

impl BoundingBox {
    /// Create a bounding box, validating component order.
    pub fn new(minx: f64, miny: f64, maxx: f64, maxy: f64) -> Result<Self> {
        Self::from_components(&[minx, miny, maxx, maxy])
    }

    /// Build a bounding box from `[minx, miny, maxx, maxy]`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidBoundingBox`] when there are not
    /// exactly four components, any component is not finite, or a minimum
    /// exceeds its maximum.
    pub fn from_components(components: &[f64]) -> Result<Self> {
        let [minx, miny, maxx, maxy] = components else {
            return Err(invalid(format!(
                "expected 4 components, got {}",
                components.len()
            )));
        };

        if components.iter().any(|c| !c.is_finite()) {
            return Err(invalid("components must be finite numbers".to_string()));
        }
        if minx > maxx || miny > maxy {
            return Err(invalid("minimum exceeds maximum".to_string()));
        }

        Ok(Self {
            minx: *minx,
            miny: *miny,
            maxx: *maxx,
            maxy: *maxy,
        })
    }
}

impl FromStr for BoundingBox {
    type Err = GatewayError;

    /// Parse `"minx,miny,maxx,maxy"`. Whitespace around components is ignored.
    fn from_str(s: &str) -> Result<Self> {
        let components = s
            .split(',')
            .map(|part| {
                part.trim()
                    .parse::<f64>()
                    .map_err(|_| invalid(format!("'{}' is not a number", part.trim())))
            })
            .collect::<Result<Vec<f64>>>()?;

        Self::from_components(&components)
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.minx, self.miny, self.maxx, self.maxy)
    }
}

fn invalid(reason: String) -> GatewayError {
    GatewayError::InvalidBoundingBox { reason }
}

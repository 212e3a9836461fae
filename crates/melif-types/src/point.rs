//! Normalized weight vectors over relevance measures.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use crate::errors::ConfigError;

/// Per-coordinate tolerance used for both ordering and equality of points.
pub const POINT_EPSILON: f64 = 0.001;

/// A weight vector whose coordinates sum to 1.
///
/// Points compare coordinate by coordinate with tolerance [`POINT_EPSILON`]:
/// two points are equal when every coordinate differs by no more than the
/// tolerance, otherwise the first coordinate that differs by more decides the
/// order. The same comparison backs `Ord` and `PartialEq`, so points can be
/// kept in sorted sets for deduplication.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct Point {
    coordinates: Vec<f64>,
}

impl Point {
    /// Build a point from raw, non-negative weights, normalizing them to sum to 1.
    pub fn new(raw: impl Into<Vec<f64>>) -> Result<Self, ConfigError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(ConfigError::DegenerateWeights {
                coordinates: raw,
                message: "no coordinates".to_string(),
            });
        }
        if raw.iter().any(|c| !c.is_finite()) {
            return Err(ConfigError::DegenerateWeights {
                coordinates: raw,
                message: "coordinates must be finite".to_string(),
            });
        }
        match normalize(raw.clone()) {
            Some(coordinates) => Ok(Self { coordinates }),
            None => Err(ConfigError::DegenerateWeights {
                coordinates: raw,
                message: "coordinates must have a positive sum".to_string(),
            }),
        }
    }

    /// The all-equal point `[1/n, ..., 1/n]`; fails for `dimension == 0`.
    pub fn uniform(dimension: usize) -> Result<Self, ConfigError> {
        if dimension == 0 {
            return Err(ConfigError::DegenerateWeights {
                coordinates: Vec::new(),
                message: "no coordinates".to_string(),
            });
        }
        let weight = 1.0 / dimension as f64;
        Ok(Self {
            coordinates: vec![weight; dimension],
        })
    }

    /// The unit vector along `axis`; fails if `axis >= dimension`.
    pub fn unit(dimension: usize, axis: usize) -> Result<Self, ConfigError> {
        if axis >= dimension {
            return Err(ConfigError::DegenerateWeights {
                coordinates: vec![0.0; dimension],
                message: format!("axis {axis} is out of range for dimension {dimension}"),
            });
        }
        let mut coordinates = vec![0.0; dimension];
        coordinates[axis] = 1.0;
        Ok(Self { coordinates })
    }

    pub fn coordinates(&self) -> &[f64] {
        &self.coordinates
    }

    pub fn dimension(&self) -> usize {
        self.coordinates.len()
    }

    /// Move `delta` along `axis` and renormalize.
    ///
    /// Returns `None` when the shifted vector no longer has a positive sum
    /// (e.g. a minus step of `delta >= 1`), or when `axis` is out of range.
    pub fn shifted(&self, axis: usize, delta: f64) -> Option<Self> {
        if axis >= self.coordinates.len() {
            return None;
        }
        let mut coordinates = self.coordinates.clone();
        coordinates[axis] += delta;
        normalize(coordinates).map(|coordinates| Self { coordinates })
    }

    /// All axis-aligned neighbours at distance `delta`: for every dimension the
    /// plus step followed by the minus step. Neighbours that cannot be
    /// normalized are left out.
    pub fn neighbours(&self, delta: f64) -> Vec<Self> {
        let mut points = Vec::with_capacity(self.coordinates.len() * 2);
        for axis in 0..self.coordinates.len() {
            points.extend(self.shifted(axis, delta));
            points.extend(self.shifted(axis, -delta));
        }
        points
    }

    /// Coordinate-wise comparison with tolerance [`POINT_EPSILON`].
    pub fn compare(&self, other: &Self) -> Ordering {
        for (a, b) in self.coordinates.iter().zip(&other.coordinates) {
            let diff = a - b;
            if diff > POINT_EPSILON {
                return Ordering::Greater;
            }
            if diff < -POINT_EPSILON {
                return Ordering::Less;
            }
        }
        self.coordinates.len().cmp(&other.coordinates.len())
    }
}

fn normalize(mut coordinates: Vec<f64>) -> Option<Vec<f64>> {
    let sum: f64 = coordinates.iter().sum();
    if !sum.is_finite() || sum <= f64::EPSILON {
        return None;
    }
    coordinates.iter_mut().for_each(|c| *c /= sum);
    Some(coordinates)
}

impl PartialEq for Point {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other) == Ordering::Equal
    }
}

impl Eq for Point {}

impl PartialOrd for Point {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Point {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

impl TryFrom<Vec<f64>> for Point {
    type Error = ConfigError;

    fn try_from(raw: Vec<f64>) -> Result<Self, Self::Error> {
        Point::new(raw)
    }
}

impl From<Point> for Vec<f64> {
    fn from(point: Point) -> Self {
        point.coordinates
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, c) in self.coordinates.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{c:.3}")?;
        }
        write!(f, "]")
    }
}

//! Box geometry: corners, the fixed wireframe topology and projected points.

use nalgebra::{Vector2, Vector3};
use serde::{Deserialize, Serialize};
use std::fs;

use crate::camera::ProjectionError;

/// Number of corners of a box.
pub const NUM_CORNERS: usize = 8;

/// Wireframe connectivity over the corner indices produced by [`generate_corners`]:
/// front face, back face, then the four connecting edges.
pub const EDGES: [(usize, usize); 12] = [
    (0, 1),
    (1, 3),
    (3, 2),
    (2, 0),
    (4, 5),
    (5, 7),
    (7, 6),
    (6, 4),
    (0, 4),
    (1, 5),
    (2, 6),
    (3, 7),
];

/// A cuboid axis-aligned in its own frame: width along X, length along Y,
/// height along Z.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrientedBox {
    pub center: [f64; 3],
    pub length: f64,
    pub width: f64,
    pub height: f64,
}

impl OrientedBox {
    pub fn new(center: [f64; 3], length: f64, width: f64, height: f64) -> Self {
        OrientedBox {
            center,
            length,
            width,
            height,
        }
    }

    /// Checks that the center is finite and every dimension is finite and positive.
    pub fn validate(&self) -> Result<(), ProjectionError> {
        if self.center.iter().any(|v| !v.is_finite()) {
            return Err(ProjectionError::InvalidBox(
                "center must be finite".to_string(),
            ));
        }
        for (name, value) in [
            ("length", self.length),
            ("width", self.width),
            ("height", self.height),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ProjectionError::InvalidBox(format!(
                    "{name} must be finite and positive, got {value}"
                )));
            }
        }
        Ok(())
    }

    pub fn center(&self) -> Vector3<f64> {
        Vector3::from(self.center)
    }

    pub fn corners(&self) -> [Corner; NUM_CORNERS] {
        generate_corners(&self.center(), self.length, self.width, self.height)
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self, ProjectionError> {
        Ok(serde_yaml::from_str(contents)?)
    }

    pub fn load_from_yaml(path: &str) -> Result<Self, ProjectionError> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    pub fn from_json_str(contents: &str) -> Result<Self, ProjectionError> {
        Ok(serde_json::from_str(contents)?)
    }
}

/// One box corner and its position in the fixed corner ordering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Corner {
    pub index: usize,
    pub point: Vector3<f64>,
}

impl Corner {
    pub fn new(index: usize, point: Vector3<f64>) -> Self {
        Corner { index, point }
    }
}

/// Expands a center and dimensions into the eight box corners.
///
/// Bit 0 of the index selects the X side (width), bit 1 the Y side (length)
/// and bit 2 the Z side (height); a clear bit is the negative half-extent.
///
/// ```rust
/// use nalgebra::Vector3;
/// use cuboid_overlay::geometry::generate_corners;
///
/// let corners = generate_corners(&Vector3::zeros(), 4.0, 2.0, 1.0);
/// assert_eq!(corners[0].point, Vector3::new(-1.0, -2.0, -0.5));
/// assert_eq!(corners[7].point, Vector3::new(1.0, 2.0, 0.5));
/// ```
pub fn generate_corners(
    center: &Vector3<f64>,
    length: f64,
    width: f64,
    height: f64,
) -> [Corner; NUM_CORNERS] {
    let half = Vector3::new(width / 2.0, length / 2.0, height / 2.0);
    std::array::from_fn(|index| {
        let sign = |bit: usize| if index & (1 << bit) == 0 { -1.0 } else { 1.0 };
        let offset = Vector3::new(sign(0) * half.x, sign(1) * half.y, sign(2) * half.z);
        Corner::new(index, center + offset)
    })
}

/// A corner in pixel space with its camera-space depth.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectedPoint {
    pub x: f64,
    pub y: f64,
    pub depth: f64,
}

impl ProjectedPoint {
    pub fn pixel(&self) -> Vector2<f64> {
        Vector2::new(self.x, self.y)
    }
}

/// A wireframe edge in pixel space, ready for a drawing surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSegment {
    pub edge: (usize, usize),
    pub start: Vector2<f64>,
    pub end: Vector2<f64>,
}

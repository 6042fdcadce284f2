//! Camera calibration and the projection stages of the overlay pipeline.
//!
//! A box corner travels through these stages in order:
//! extrinsic transform ([`Extrinsics`]), perspective division
//! ([`perspective_divide`]), fisheye distortion and the intrinsic pixel
//! mapping ([`KannalaBrandtModel`]).

pub mod calibration;
pub mod extrinsics;
pub mod kannala_brandt;

pub use calibration::{CalibrationProfile, Camera};
pub use extrinsics::Extrinsics;
pub use kannala_brandt::KannalaBrandtModel;

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use crate::geometry::{Corner, ProjectedPoint};

/// Intrinsic parameters read from a row-major 3x3 matrix laid out as
/// `[fx, skew, cx, 0, fy, cy, 0, 0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Intrinsics {
    pub fx: f64,
    pub skew: f64,
    pub cx: f64,
    pub fy: f64,
    pub cy: f64,
}

impl Intrinsics {
    /// Number of entries in the row-major intrinsic matrix.
    pub const MATRIX_LEN: usize = 9;

    /// Reads the intrinsic parameters out of a row-major 3x3 matrix.
    ///
    /// # Errors
    ///
    /// * [`ProjectionError::InvalidCalibration`] if `values` does not hold exactly 9 entries.
    pub fn from_row_major(values: &[f64]) -> Result<Self, ProjectionError> {
        if values.len() != Self::MATRIX_LEN {
            return Err(ProjectionError::InvalidCalibration(format!(
                "intrinsic matrix requires {} values, got {}",
                Self::MATRIX_LEN,
                values.len()
            )));
        }

        Ok(Intrinsics {
            fx: values[0],
            skew: values[1],
            cx: values[2],
            fy: values[4],
            cy: values[5],
        })
    }

    /// Maps a distorted normalized point to pixel coordinates.
    ///
    /// The skew term only contributes to the horizontal coordinate:
    /// `x = fx * xd + skew * yd + cx`, `y = fy * yd + cy`.
    pub fn to_pixel(&self, distorted: &Vector2<f64>) -> Vector2<f64> {
        Vector2::new(
            self.fx * distorted.x + self.skew * distorted.y + self.cx,
            self.fy * distorted.y + self.cy,
        )
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ProjectionError {
    #[error("Invalid calibration: {0}")]
    InvalidCalibration(String),
    #[error("Invalid box: {0}")]
    InvalidBox(String),
    #[error("Corner {corner} has depth {depth}, it lies on or behind the camera plane")]
    DegenerateProjection { corner: usize, depth: f64 },
    #[error("Corner {corner} projected to a non-finite pixel")]
    NonFiniteProjection { corner: usize },
    #[error("Failed to parse YAML: {0}")]
    YamlError(String),
    #[error("Failed to parse JSON: {0}")]
    JsonError(String),
    #[error("IO Error: {0}")]
    IOError(String),
}

impl From<std::io::Error> for ProjectionError {
    fn from(err: std::io::Error) -> Self {
        ProjectionError::IOError(err.to_string())
    }
}

impl From<serde_yaml::Error> for ProjectionError {
    fn from(err: serde_yaml::Error) -> Self {
        ProjectionError::YamlError(err.to_string())
    }
}

impl From<serde_json::Error> for ProjectionError {
    fn from(err: serde_json::Error) -> Self {
        ProjectionError::JsonError(err.to_string())
    }
}

/// A corner on the normalized image plane, `(X/Z, Y/Z)`, with its
/// camera-space depth carried along.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedPoint {
    pub index: usize,
    pub xu: f64,
    pub yu: f64,
    pub depth: f64,
}

/// Divides a camera-space corner by its depth.
///
/// # Errors
///
/// * [`ProjectionError::DegenerateProjection`] if the depth is zero or negative
///   (the corner is on or behind the camera plane), or not a number.
pub fn perspective_divide(corner: &Corner) -> Result<NormalizedPoint, ProjectionError> {
    let depth = corner.point.z;
    if depth.is_nan() || depth <= 0.0 {
        return Err(ProjectionError::DegenerateProjection {
            corner: corner.index,
            depth,
        });
    }

    Ok(NormalizedPoint {
        index: corner.index,
        xu: corner.point.x / depth,
        yu: corner.point.y / depth,
        depth,
    })
}

/// Trait defining the projection of camera-space points to pixels.
pub trait CameraModel {
    /// Project a camera-space corner to pixel coordinates
    fn project(&self, corner: &Corner) -> Result<ProjectedPoint, ProjectionError>;

    /// Validate camera parameters
    fn validate_params(&self) -> Result<(), ProjectionError>;

    fn get_intrinsics(&self) -> Intrinsics;

    fn get_distortion(&self) -> Vec<f64>;
}

/// Common validation functions for camera parameters
pub mod validation {
    use super::*;

    pub fn validate_intrinsics(intrinsics: &Intrinsics) -> Result<(), ProjectionError> {
        let values = [
            intrinsics.fx,
            intrinsics.skew,
            intrinsics.cx,
            intrinsics.fy,
            intrinsics.cy,
        ];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ProjectionError::InvalidCalibration(
                "intrinsic parameters must be finite".to_string(),
            ));
        }
        if intrinsics.fx <= 0.0 || intrinsics.fy <= 0.0 {
            return Err(ProjectionError::InvalidCalibration(
                "focal length must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn ensure_finite(name: &str, values: &[f64]) -> Result<(), ProjectionError> {
        if let Some(pos) = values.iter().position(|v| !v.is_finite()) {
            return Err(ProjectionError::InvalidCalibration(format!(
                "{name}[{pos}] is not finite"
            )));
        }
        Ok(())
    }
}

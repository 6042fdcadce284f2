//! Rigid transform from the vehicle/world frame into camera space.

use nalgebra::{Matrix3, Vector3};

use crate::camera::ProjectionError;
use crate::geometry::Corner;

/// Rotation and translation placing world-frame points in camera space.
///
/// The rotation is applied as given; it is not orthonormalized or checked
/// for being a proper rotation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extrinsics {
    pub rotation: Matrix3<f64>,
    pub translation: Vector3<f64>,
}

impl Extrinsics {
    pub fn new(rotation: Matrix3<f64>, translation: Vector3<f64>) -> Self {
        Extrinsics {
            rotation,
            translation,
        }
    }

    /// Builds the transform from a row-major 3x3 rotation and a 3-vector translation.
    ///
    /// # Errors
    ///
    /// * [`ProjectionError::InvalidCalibration`] if `rotation` does not hold 9 values
    ///   or `translation` does not hold 3.
    pub fn from_slices(rotation: &[f64], translation: &[f64]) -> Result<Self, ProjectionError> {
        if rotation.len() != 9 {
            return Err(ProjectionError::InvalidCalibration(format!(
                "rotation matrix requires 9 values, got {}",
                rotation.len()
            )));
        }
        if translation.len() != 3 {
            return Err(ProjectionError::InvalidCalibration(format!(
                "translation requires 3 values, got {}",
                translation.len()
            )));
        }

        Ok(Extrinsics {
            rotation: Matrix3::from_row_slice(rotation),
            translation: Vector3::from_column_slice(translation),
        })
    }

    /// Returns `R * p + t`.
    pub fn transform_point(&self, point: &Vector3<f64>) -> Vector3<f64> {
        self.rotation * point + self.translation
    }

    /// Moves a corner into camera space, keeping its index.
    pub fn transform_corner(&self, corner: &Corner) -> Corner {
        Corner::new(corner.index, self.transform_point(&corner.point))
    }
}

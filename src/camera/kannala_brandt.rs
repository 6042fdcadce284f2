//! Equidistant (Kannala-Brandt style) fisheye model.
//!
//! The incidence angle `theta = atan(r)` of a normalized point is mapped to a
//! distorted radius by the odd polynomial
//! `theta * (k0 + k1 theta^2 + k2 theta^4 + k3 theta^6 + k4 theta^8)`,
//! and the point is scaled radially to that radius before the intrinsic
//! pixel mapping.

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use crate::camera::{
    perspective_divide, validation, CameraModel, Intrinsics, NormalizedPoint, ProjectionError,
};
use crate::geometry::{Corner, ProjectedPoint};

/// Fisheye camera: intrinsic pixel mapping plus five distortion coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KannalaBrandtModel {
    pub intrinsics: Intrinsics,
    pub coefficients: [f64; 5], // k0, k1, k2, k3, k4
}

impl KannalaBrandtModel {
    /// Number of distortion coefficients the model takes.
    pub const NUM_COEFFICIENTS: usize = 5;

    /// Creates a model from intrinsics and a distortion coefficient slice.
    ///
    /// # Errors
    ///
    /// * [`ProjectionError::InvalidCalibration`] if `distortion` does not hold exactly
    ///   5 coefficients, or any parameter fails `validate_params`.
    pub fn new(intrinsics: Intrinsics, distortion: &[f64]) -> Result<Self, ProjectionError> {
        let coefficients: [f64; 5] = distortion.try_into().map_err(|_| {
            ProjectionError::InvalidCalibration(format!(
                "distortion requires {} coefficients, got {}",
                Self::NUM_COEFFICIENTS,
                distortion.len()
            ))
        })?;

        let model = KannalaBrandtModel {
            intrinsics,
            coefficients,
        };
        model.validate_params()?;

        Ok(model)
    }

    /// Applies the radial fisheye distortion to a normalized point `(xu, yu)`.
    ///
    /// A point on the optical axis (`r == 0`) maps to `(0, 0)`: the scale factor
    /// `theta * poly(theta) / r` tends to `k0` there, so the product with the
    /// zero input is zero.
    ///
    /// The distorted radius is applied along the unit direction `(xu, yu) / r`,
    /// so very large normalized coordinates (corners just in front of the camera
    /// plane) saturate at `theta = pi/2` instead of collapsing to the origin.
    pub fn distort(&self, xu: f64, yu: f64) -> Vector2<f64> {
        let r = xu.hypot(yu);
        if r == 0.0 {
            return Vector2::zeros();
        }

        let [k0, k1, k2, k3, k4] = self.coefficients;
        let theta = r.atan();
        let theta2 = theta * theta;
        // Horner form of k0 + k1 t^2 + k2 t^4 + k3 t^6 + k4 t^8
        let poly = k0 + theta2 * (k1 + theta2 * (k2 + theta2 * (k3 + theta2 * k4)));
        let radius = theta * poly;

        Vector2::new(radius * (xu / r), radius * (yu / r))
    }

    /// Distorts a normalized point and maps it to pixel coordinates.
    ///
    /// # Errors
    ///
    /// * [`ProjectionError::NonFiniteProjection`] if the resulting pixel is NaN or infinite.
    pub fn normalized_to_pixel(
        &self,
        normalized: &NormalizedPoint,
    ) -> Result<ProjectedPoint, ProjectionError> {
        let distorted = self.distort(normalized.xu, normalized.yu);
        let pixel = self.intrinsics.to_pixel(&distorted);

        if !pixel.x.is_finite() || !pixel.y.is_finite() {
            return Err(ProjectionError::NonFiniteProjection {
                corner: normalized.index,
            });
        }

        Ok(ProjectedPoint {
            x: pixel.x,
            y: pixel.y,
            depth: normalized.depth,
        })
    }
}

impl CameraModel for KannalaBrandtModel {
    /// Projects a camera-space corner to pixel coordinates.
    ///
    /// # Errors
    ///
    /// * [`ProjectionError::DegenerateProjection`]: the corner is on or behind the camera plane.
    /// * [`ProjectionError::NonFiniteProjection`]: the pixel overflowed to a non-finite value.
    fn project(&self, corner: &Corner) -> Result<ProjectedPoint, ProjectionError> {
        let normalized = perspective_divide(corner)?;
        self.normalized_to_pixel(&normalized)
    }

    fn validate_params(&self) -> Result<(), ProjectionError> {
        validation::validate_intrinsics(&self.intrinsics)?;
        validation::ensure_finite("distortion", &self.coefficients)?;
        Ok(())
    }

    fn get_intrinsics(&self) -> Intrinsics {
        self.intrinsics
    }

    fn get_distortion(&self) -> Vec<f64> {
        self.coefficients.to_vec()
    }
}

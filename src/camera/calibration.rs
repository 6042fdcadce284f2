//! Calibration profiles as supplied by the caller, and their validated form.

use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;

use crate::camera::{
    validation, CameraModel, Extrinsics, Intrinsics, KannalaBrandtModel, ProjectionError,
};
use crate::geometry::{Corner, ProjectedPoint};

/// Raw calibration of one camera: four flat numeric arrays.
///
/// Field names follow snake_case; the capitalized vendor names (`Intrinsic`,
/// `Distortion`, `Rotation`, `Translation`, `TYPE`, `CAMERA`) are accepted when
/// deserializing.
///
/// # Examples
///
/// ```rust
/// use cuboid_overlay::camera::CalibrationProfile;
///
/// let json = r#"{
///     "TYPE": "CAL_TYPE_HD_04_NEW",
///     "CAMERA": "FR_SD_CMR_RH",
///     "Intrinsic": [988.16957, -1.179382, 1025.169915, 0.0, 978.203612, 635.074408, 0.0, 0.0, 1.0],
///     "Distortion": [1, 0.026121, -0.100987, 0.094122, -0.029356],
///     "Rotation": [-0.505164, 0.861079, -0.05789, 0.173734, 0.03576, -0.984142, -0.845355, -0.507212, -0.167663],
///     "Translation": [-0.97772, -0.208895, -0.272932]
/// }"#;
/// let profile = CalibrationProfile::from_json_str(json).unwrap();
/// let camera = profile.validate().unwrap();
/// assert_eq!(camera.model.intrinsics.fx, 988.16957);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationProfile {
    /// Calibration type tag, informational only.
    #[serde(
        default,
        alias = "TYPE",
        skip_serializing_if = "Option::is_none"
    )]
    pub calibration_type: Option<String>,
    /// Camera identifier, informational only.
    #[serde(default, alias = "CAMERA", skip_serializing_if = "Option::is_none")]
    pub camera: Option<String>,
    /// Row-major 3x3 `[fx, skew, cx, 0, fy, cy, 0, 0, 1]`.
    #[serde(alias = "Intrinsic")]
    pub intrinsic: Vec<f64>,
    /// `[k0, k1, k2, k3, k4]`.
    #[serde(alias = "Distortion")]
    pub distortion: Vec<f64>,
    /// Row-major 3x3 rotation, world to camera.
    #[serde(alias = "Rotation")]
    pub rotation: Vec<f64>,
    #[serde(alias = "Translation")]
    pub translation: Vec<f64>,
}

impl CalibrationProfile {
    pub fn new(
        intrinsic: Vec<f64>,
        distortion: Vec<f64>,
        rotation: Vec<f64>,
        translation: Vec<f64>,
    ) -> Self {
        CalibrationProfile {
            calibration_type: None,
            camera: None,
            intrinsic,
            distortion,
            rotation,
            translation,
        }
    }

    /// Checks array shapes and values and builds the [`Camera`] used for projection.
    ///
    /// # Errors
    ///
    /// * [`ProjectionError::InvalidCalibration`] if `distortion` does not hold 5 values,
    ///   `rotation` or `intrinsic` do not hold 9, `translation` does not hold 3, any value
    ///   is not finite, or a focal length is not positive.
    pub fn validate(&self) -> Result<Camera, ProjectionError> {
        validation::ensure_finite("intrinsic", &self.intrinsic)?;
        validation::ensure_finite("distortion", &self.distortion)?;
        validation::ensure_finite("rotation", &self.rotation)?;
        validation::ensure_finite("translation", &self.translation)?;

        let intrinsics = Intrinsics::from_row_major(&self.intrinsic)?;
        let model = KannalaBrandtModel::new(intrinsics, &self.distortion)?;
        let extrinsics = Extrinsics::from_slices(&self.rotation, &self.translation)?;

        debug!(
            "Validated calibration for camera {}: intrinsics {:?}, distortion {:?}",
            self.camera.as_deref().unwrap_or("<unnamed>"),
            model.get_intrinsics(),
            model.get_distortion()
        );

        Ok(Camera { extrinsics, model })
    }

    pub fn from_json_str(contents: &str) -> Result<Self, ProjectionError> {
        Ok(serde_json::from_str(contents)?)
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self, ProjectionError> {
        Ok(serde_yaml::from_str(contents)?)
    }

    /// Loads a calibration profile from a JSON file.
    ///
    /// The profile is not validated; call [`CalibrationProfile::validate`] before use.
    pub fn load_from_json(path: &str) -> Result<Self, ProjectionError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Loads a calibration profile from a YAML file.
    ///
    /// The profile is not validated; call [`CalibrationProfile::validate`] before use.
    pub fn load_from_yaml(path: &str) -> Result<Self, ProjectionError> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    pub fn save_to_yaml(&self, path: &str) -> Result<(), ProjectionError> {
        let yaml_string = serde_yaml::to_string(self)?;
        let mut file = fs::File::create(path)?;
        file.write_all(yaml_string.as_bytes())?;
        Ok(())
    }
}

/// A validated calibration: extrinsic transform plus fisheye camera model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub extrinsics: Extrinsics,
    pub model: KannalaBrandtModel,
}

impl Camera {
    /// Runs one world-frame corner through every projection stage.
    pub fn project_corner(&self, corner: &Corner) -> Result<ProjectedPoint, ProjectionError> {
        let camera_space = self.extrinsics.transform_corner(corner);
        let projected = self.model.project(&camera_space)?;
        debug!(
            "corner {}: depth {:.4}, pixel ({:.3}, {:.3})",
            corner.index, projected.depth, projected.x, projected.y
        );
        Ok(projected)
    }
}

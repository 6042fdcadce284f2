//! Wireframe projection of a box and drawing it onto a surface.

pub mod raster;

pub use raster::RasterSurface;

use image::Rgb;
use log::{debug, warn};

use crate::camera::{CalibrationProfile, Camera, ProjectionError};
use crate::geometry::{LineSegment, OrientedBox, ProjectedPoint, EDGES, NUM_CORNERS};

#[derive(thiserror::Error, Debug)]
pub enum OverlayError {
    #[error(transparent)]
    Projection(#[from] ProjectionError),
    #[error("Failed to load image asset: {0}")]
    AssetLoadFailure(String),
    #[error("Failed to encode image: {0}")]
    Encoding(String),
    #[error("Cache error: {0}")]
    Cache(String),
}

/// The projected corners of one box and its twelve pixel-space edges.
#[derive(Debug, Clone, PartialEq)]
pub struct Wireframe {
    pub corners: [ProjectedPoint; NUM_CORNERS],
    pub segments: Vec<LineSegment>,
}

impl Wireframe {
    fn from_corners(corners: [ProjectedPoint; NUM_CORNERS]) -> Self {
        let segments = EDGES
            .iter()
            .map(|&(a, b)| LineSegment {
                edge: (a, b),
                start: corners[a].pixel(),
                end: corners[b].pixel(),
            })
            .collect();
        Wireframe { corners, segments }
    }
}

/// Projects every corner of `oriented_box` through `camera`.
///
/// The whole box fails if any single corner fails: a corner on or behind the
/// camera plane yields [`ProjectionError::DegenerateProjection`] and no partial
/// wireframe is returned.
pub fn project_with_camera(
    camera: &Camera,
    oriented_box: &OrientedBox,
) -> Result<Wireframe, ProjectionError> {
    oriented_box.validate()?;

    let world_corners = oriented_box.corners();
    let mut projected = [ProjectedPoint {
        x: 0.0,
        y: 0.0,
        depth: 0.0,
    }; NUM_CORNERS];
    for (slot, corner) in projected.iter_mut().zip(world_corners.iter()) {
        *slot = camera.project_corner(corner).inspect_err(|e| {
            warn!("Rejecting box centered at {:?}: {e}", oriented_box.center);
        })?;
    }

    Ok(Wireframe::from_corners(projected))
}

/// Validates `calibration` and projects `oriented_box` into its image.
///
/// Calibration shape errors are reported before any corner is touched.
///
/// ```rust
/// use cuboid_overlay::camera::CalibrationProfile;
/// use cuboid_overlay::geometry::OrientedBox;
/// use cuboid_overlay::overlay::project_box;
///
/// let calibration = CalibrationProfile::new(
///     vec![500.0, 0.0, 320.0, 0.0, 500.0, 240.0, 0.0, 0.0, 1.0],
///     vec![1.0, 0.0, 0.0, 0.0, 0.0],
///     vec![1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
///     vec![0.0, 0.0, 10.0],
/// );
/// let oriented_box = OrientedBox::new([0.0, 0.0, 0.0], 2.0, 2.0, 2.0);
/// let wireframe = project_box(&calibration, &oriented_box).unwrap();
/// assert_eq!(wireframe.segments.len(), 12);
/// ```
pub fn project_box(
    calibration: &CalibrationProfile,
    oriented_box: &OrientedBox,
) -> Result<Wireframe, ProjectionError> {
    let camera = calibration.validate()?;
    project_with_camera(&camera, oriented_box)
}

/// Line style used when drawing a wireframe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub color: Rgb<u8>,
    pub width: u32,
}

impl Default for Stroke {
    fn default() -> Self {
        Stroke {
            color: Rgb([255, 0, 0]),
            width: 4,
        }
    }
}

/// A canvas the wireframe can be drawn on.
pub trait DrawingSurface {
    /// Canvas size in pixels, `(width, height)`
    fn size(&self) -> (u32, u32);

    fn draw_line(&mut self, segment: &LineSegment, stroke: &Stroke) -> Result<(), OverlayError>;

    /// Encode the current canvas into an image artifact
    fn encode(&self) -> Result<Vec<u8>, OverlayError>;
}

/// Hands every segment of `wireframe` to `surface`.
pub fn draw_wireframe<S>(
    surface: &mut S,
    wireframe: &Wireframe,
    stroke: &Stroke,
) -> Result<(), OverlayError>
where
    S: ?Sized + DrawingSurface,
{
    for segment in &wireframe.segments {
        debug!(
            "edge {:?}: ({:.1}, {:.1}) -> ({:.1}, {:.1})",
            segment.edge, segment.start.x, segment.start.y, segment.end.x, segment.end.y
        );
        surface.draw_line(segment, stroke)?;
    }
    Ok(())
}

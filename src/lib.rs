//! Cuboid Overlay Library
//!
//! Projects 3D boxes given in a vehicle/world frame onto images from a
//! calibrated fisheye camera and draws their wireframes.
//!
//! Each of the eight box corners goes through:
//! - the extrinsic transform (rotation + translation into camera space)
//! - perspective division
//! - equidistant fisheye distortion
//! - the intrinsic pixel mapping
//!
//! and the twelve box edges are handed to a drawing surface as line segments.

pub mod camera;
pub mod geometry;
pub mod overlay;
pub mod util;

// Re-export commonly used types
pub use camera::{
    CalibrationProfile, Camera, CameraModel, Extrinsics, Intrinsics, KannalaBrandtModel,
    ProjectionError,
};

pub use geometry::{Corner, LineSegment, OrientedBox, ProjectedPoint, EDGES};

pub use overlay::{
    draw_wireframe, project_box, project_with_camera, DrawingSurface, OverlayError,
    RasterSurface, Stroke, Wireframe,
};

pub use util::{
    cached_overlay, render_and_cache, render_overlay, DirectoryCache, FileImageLoader,
    ImageLoader, MemoryCache, MemoryImageLoader, OverlayCache, RenderedOverlay,
};

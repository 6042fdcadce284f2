//! Image loading, rendering and caching around the projection pipeline.
//!
//! Rendering is two-phase: the source image is acquired first through an
//! [`ImageLoader`], then the box is projected and its wireframe drawn on a
//! [`RasterSurface`]. The geometry phase ([`project_with_camera`]) does no I/O.

pub mod cache;

pub use cache::{DirectoryCache, MemoryCache, OverlayCache, DRAWN_IMAGE_KEY};

use image::RgbImage;
use log::info;
use std::path::{Path, PathBuf};

use crate::camera::CalibrationProfile;
use crate::geometry::OrientedBox;
use crate::overlay::{
    draw_wireframe, project_with_camera, DrawingSurface, OverlayError, RasterSurface, Stroke,
    Wireframe,
};

/// Source of the background raster an overlay is drawn on.
pub trait ImageLoader {
    fn load(&self) -> Result<RgbImage, OverlayError>;
}

/// Loads an image from disk.
#[derive(Debug, Clone)]
pub struct FileImageLoader {
    path: PathBuf,
}

impl FileImageLoader {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        FileImageLoader {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl ImageLoader for FileImageLoader {
    fn load(&self) -> Result<RgbImage, OverlayError> {
        let img = image::open(&self.path).map_err(|e| {
            OverlayError::AssetLoadFailure(format!("{}: {e}", self.path.display()))
        })?;

        Ok(img.to_rgb8())
    }
}

/// Decodes an image from encoded bytes already in memory.
#[derive(Debug, Clone)]
pub struct MemoryImageLoader {
    bytes: Vec<u8>,
}

impl MemoryImageLoader {
    pub fn new(bytes: Vec<u8>) -> Self {
        MemoryImageLoader { bytes }
    }
}

impl ImageLoader for MemoryImageLoader {
    fn load(&self) -> Result<RgbImage, OverlayError> {
        let img = image::load_from_memory(&self.bytes)
            .map_err(|e| OverlayError::AssetLoadFailure(e.to_string()))?;

        Ok(img.to_rgb8())
    }
}

/// A rendered overlay: the projected wireframe and the encoded PNG it was drawn into.
#[derive(Debug, Clone)]
pub struct RenderedOverlay {
    pub wireframe: Wireframe,
    pub width: u32,
    pub height: u32,
    pub png: Vec<u8>,
}

/// Loads the background image, projects `oriented_box` and draws its wireframe.
///
/// The calibration is validated before the image is requested. Any failure
/// aborts the whole overlay; nothing is drawn for a box with a degenerate corner.
pub fn render_overlay<L>(
    loader: &L,
    calibration: &CalibrationProfile,
    oriented_box: &OrientedBox,
    stroke: &Stroke,
) -> Result<RenderedOverlay, OverlayError>
where
    L: ?Sized + ImageLoader,
{
    let camera = calibration.validate()?;

    let image = loader.load()?;
    let mut surface = RasterSurface::new(image);

    let wireframe = project_with_camera(&camera, oriented_box)?;
    draw_wireframe(&mut surface, &wireframe, stroke)?;

    let (width, height) = surface.size();
    let png = surface.encode()?;
    info!(
        "Rendered overlay of {} edges on a {width}x{height} image",
        wireframe.segments.len()
    );

    Ok(RenderedOverlay {
        wireframe,
        width,
        height,
        png,
    })
}

/// Renders like [`render_overlay`] and stores the PNG under [`DRAWN_IMAGE_KEY`].
///
/// The cache is only written when rendering succeeded.
pub fn render_and_cache<L, C>(
    loader: &L,
    cache: &mut C,
    calibration: &CalibrationProfile,
    oriented_box: &OrientedBox,
    stroke: &Stroke,
) -> Result<RenderedOverlay, OverlayError>
where
    L: ?Sized + ImageLoader,
    C: ?Sized + OverlayCache,
{
    let rendered = render_overlay(loader, calibration, oriented_box, stroke)?;
    cache.set(DRAWN_IMAGE_KEY, &rendered.png)?;
    info!("Stored overlay under '{DRAWN_IMAGE_KEY}'");
    Ok(rendered)
}

/// Returns the overlay stored by a previous [`render_and_cache`], if any.
pub fn cached_overlay<C>(cache: &C) -> Result<Option<Vec<u8>>, OverlayError>
where
    C: ?Sized + OverlayCache,
{
    cache.get(DRAWN_IMAGE_KEY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::ProjectionError;
    use image::{ImageFormat, Rgb};
    use std::io::Cursor;

    fn encoded_background(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb([0, 0, 64]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn centered_profile(translation_z: f64) -> CalibrationProfile {
        CalibrationProfile::new(
            vec![100.0, 0.0, 64.0, 0.0, 100.0, 48.0, 0.0, 0.0, 1.0],
            vec![1.0, 0.0, 0.0, 0.0, 0.0],
            vec![1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
            vec![0.0, 0.0, translation_z],
        )
    }

    #[test]
    fn test_render_overlay_draws_edges() {
        let loader = MemoryImageLoader::new(encoded_background(128, 96));
        let oriented_box = OrientedBox::new([0.0, 0.0, 0.0], 1.0, 1.0, 1.0);
        let rendered = render_overlay(
            &loader,
            &centered_profile(5.0),
            &oriented_box,
            &Stroke::default(),
        )
        .unwrap();

        assert_eq!((rendered.width, rendered.height), (128, 96));
        let image = image::load_from_memory(&rendered.png).unwrap().to_rgb8();
        let corner = rendered.wireframe.corners[0];
        let pixel = image.get_pixel(corner.x.round() as u32, corner.y.round() as u32);
        assert_eq!(*pixel, Rgb([255, 0, 0]));
        // far from the box the background is untouched
        assert_eq!(*image.get_pixel(2, 2), Rgb([0, 0, 64]));
    }

    #[test]
    fn test_asset_failure_is_surfaced() {
        let loader = MemoryImageLoader::new(b"not an image".to_vec());
        let oriented_box = OrientedBox::new([0.0, 0.0, 0.0], 1.0, 1.0, 1.0);
        let result = render_overlay(
            &loader,
            &centered_profile(5.0),
            &oriented_box,
            &Stroke::default(),
        );
        assert!(matches!(result, Err(OverlayError::AssetLoadFailure(_))));

        let loader = FileImageLoader::new("samples/missing_frame.jpg");
        let result = render_overlay(
            &loader,
            &centered_profile(5.0),
            &oriented_box,
            &Stroke::default(),
        );
        assert!(matches!(result, Err(OverlayError::AssetLoadFailure(_))));
    }

    #[test]
    fn test_file_loader() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        std::fs::write(&path, encoded_background(8, 6)).unwrap();

        let image = FileImageLoader::new(&path).load().unwrap();
        assert_eq!(image.dimensions(), (8, 6));
    }

    #[test]
    fn test_degenerate_box_is_not_cached() {
        let loader = MemoryImageLoader::new(encoded_background(128, 96));
        let mut cache = MemoryCache::new();
        let oriented_box = OrientedBox::new([0.0, 0.0, 0.0], 1.0, 1.0, 1.0);

        let result = render_and_cache(
            &loader,
            &mut cache,
            &centered_profile(-5.0),
            &oriented_box,
            &Stroke::default(),
        );
        assert!(matches!(
            result,
            Err(OverlayError::Projection(
                ProjectionError::DegenerateProjection { .. }
            ))
        ));
        assert_eq!(cached_overlay(&cache).unwrap(), None);
    }

    #[test]
    fn test_render_and_cache() {
        let loader = MemoryImageLoader::new(encoded_background(128, 96));
        let mut cache = MemoryCache::new();
        let oriented_box = OrientedBox::new([0.0, 0.0, 0.0], 1.0, 1.0, 1.0);

        let rendered = render_and_cache(
            &loader,
            &mut cache,
            &centered_profile(5.0),
            &oriented_box,
            &Stroke::default(),
        )
        .unwrap();
        assert_eq!(cached_overlay(&cache).unwrap(), Some(rendered.png));
    }

    #[test]
    fn test_invalid_calibration_skips_loading() {
        struct PanickingLoader;
        impl ImageLoader for PanickingLoader {
            fn load(&self) -> Result<RgbImage, OverlayError> {
                panic!("image must not be requested for an invalid calibration");
            }
        }

        let mut profile = centered_profile(5.0);
        profile.rotation.truncate(8);
        let oriented_box = OrientedBox::new([0.0, 0.0, 0.0], 1.0, 1.0, 1.0);
        let result = render_overlay(&PanickingLoader, &profile, &oriented_box, &Stroke::default());
        assert!(matches!(
            result,
            Err(OverlayError::Projection(ProjectionError::InvalidCalibration(_)))
        ));
    }
}

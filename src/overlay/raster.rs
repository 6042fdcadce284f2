//! [`DrawingSurface`] backed by an in-memory RGB image.

use image::{ImageFormat, RgbImage};
use imageproc::drawing::draw_line_segment_mut;
use nalgebra::Vector2;
use std::io::Cursor;

use crate::camera::ProjectionError;
use crate::geometry::LineSegment;
use crate::overlay::{DrawingSurface, OverlayError, Stroke};

/// Widest stroke drawn, in pixels; wider strokes are clamped.
pub const MAX_STROKE_WIDTH: u32 = 256;

/// Draws wireframes onto a copy of the source image and encodes the result as PNG.
pub struct RasterSurface {
    image: RgbImage,
}

impl RasterSurface {
    /// The canvas takes the size of `image`.
    pub fn new(image: RgbImage) -> Self {
        RasterSurface { image }
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }
}

impl DrawingSurface for RasterSurface {
    fn size(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Draws `segment` as `2 * width - 1` parallel one-pixel lines spaced half a
    /// pixel apart along the segment normal.
    fn draw_line(&mut self, segment: &LineSegment, stroke: &Stroke) -> Result<(), OverlayError> {
        let finite = |p: &Vector2<f64>| p.x.is_finite() && p.y.is_finite();
        if !finite(&segment.start) || !finite(&segment.end) {
            return Err(ProjectionError::NonFiniteProjection {
                corner: segment.edge.0,
            }
            .into());
        }

        let stroke_width = stroke.width.clamp(1, MAX_STROKE_WIDTH);
        let (width, height) = self.size();
        let margin = stroke_width as f64;
        let Some((start, end)) = clip_to_canvas(
            segment.start,
            segment.end,
            (-margin, -margin),
            (width as f64 + margin, height as f64 + margin),
        ) else {
            return Ok(());
        };

        let direction = end - start;
        let length = direction.norm();
        let normal = if length > 0.0 {
            Vector2::new(-direction.y, direction.x) / length
        } else {
            Vector2::new(0.0, 1.0)
        };

        let passes = 2 * stroke_width - 1;
        let first_offset = -(passes as f64 - 1.0) / 4.0;
        for pass in 0..passes {
            let shift = normal * (first_offset + pass as f64 * 0.5);
            let a = start + shift;
            let b = end + shift;
            draw_line_segment_mut(
                &mut self.image,
                (a.x as f32, a.y as f32),
                (b.x as f32, b.y as f32),
                stroke.color,
            );
        }
        Ok(())
    }

    fn encode(&self) -> Result<Vec<u8>, OverlayError> {
        let mut bytes = Vec::new();
        self.image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(|e| OverlayError::Encoding(e.to_string()))?;
        Ok(bytes)
    }
}

/// Liang-Barsky clipping of the segment `start..end` against an axis-aligned
/// rectangle. Returns `None` when nothing of the segment lies inside.
pub fn clip_to_canvas(
    start: Vector2<f64>,
    end: Vector2<f64>,
    min: (f64, f64),
    max: (f64, f64),
) -> Option<(Vector2<f64>, Vector2<f64>)> {
    let d = end - start;
    let mut t0 = 0.0_f64;
    let mut t1 = 1.0_f64;

    for (p, q) in [
        (-d.x, start.x - min.0),
        (d.x, max.0 - start.x),
        (-d.y, start.y - min.1),
        (d.y, max.1 - start.y),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let t = q / p;
        if p < 0.0 {
            t0 = t0.max(t);
        } else {
            t1 = t1.min(t);
        }
        if t0 > t1 {
            return None;
        }
    }

    Some((start + d * t0, start + d * t1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use image::Rgb;

    fn segment(start: (f64, f64), end: (f64, f64)) -> LineSegment {
        LineSegment {
            edge: (0, 1),
            start: Vector2::new(start.0, start.1),
            end: Vector2::new(end.0, end.1),
        }
    }

    #[test]
    fn test_horizontal_line_width() {
        let mut surface = RasterSurface::new(RgbImage::new(20, 20));
        let stroke = Stroke {
            color: Rgb([255, 0, 0]),
            width: 3,
        };
        surface
            .draw_line(&segment((2.0, 10.0), (17.0, 10.0)), &stroke)
            .unwrap();

        let image = surface.image();
        assert_eq!(*image.get_pixel(10, 10), Rgb([255, 0, 0]));
        assert_eq!(*image.get_pixel(10, 9), Rgb([255, 0, 0]));
        assert_eq!(*image.get_pixel(10, 11), Rgb([255, 0, 0]));
        assert_eq!(*image.get_pixel(10, 14), Rgb([0, 0, 0]));
        assert_eq!(*image.get_pixel(10, 5), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_oversized_stroke_is_clamped() {
        let mut surface = RasterSurface::new(RgbImage::new(16, 16));
        let stroke = Stroke {
            color: Rgb([0, 255, 0]),
            width: u32::MAX,
        };
        surface
            .draw_line(&segment((0.0, 8.0), (15.0, 8.0)), &stroke)
            .unwrap();
        assert!(surface.image().pixels().all(|p| *p == Rgb([0, 255, 0])));
    }

    #[test]
    fn test_zero_width_stroke_draws_one_pixel_line() {
        let mut surface = RasterSurface::new(RgbImage::new(10, 10));
        let stroke = Stroke {
            color: Rgb([0, 0, 255]),
            width: 0,
        };
        surface
            .draw_line(&segment((1.0, 5.0), (8.0, 5.0)), &stroke)
            .unwrap();
        assert_eq!(*surface.image().get_pixel(4, 5), Rgb([0, 0, 255]));
        assert_eq!(*surface.image().get_pixel(4, 7), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_offscreen_segment_leaves_image_untouched() {
        let mut surface = RasterSurface::new(RgbImage::new(10, 10));
        surface
            .draw_line(&segment((1e9, 1e9), (2e9, 3e9)), &Stroke::default())
            .unwrap();
        assert!(surface.image().pixels().all(|p| *p == Rgb([0, 0, 0])));
    }

    #[test]
    fn test_non_finite_segment_is_an_error() {
        let mut surface = RasterSurface::new(RgbImage::new(10, 10));
        let result = surface.draw_line(&segment((f64::NAN, 0.0), (5.0, 5.0)), &Stroke::default());
        assert!(matches!(
            result,
            Err(OverlayError::Projection(
                ProjectionError::NonFiniteProjection { .. }
            ))
        ));
    }

    #[test]
    fn test_clip_to_canvas() {
        let clipped = clip_to_canvas(
            Vector2::new(-10.0, 5.0),
            Vector2::new(30.0, 5.0),
            (0.0, 0.0),
            (20.0, 10.0),
        )
        .unwrap();
        assert_relative_eq!(clipped.0, Vector2::new(0.0, 5.0));
        assert_relative_eq!(clipped.1, Vector2::new(20.0, 5.0));

        assert!(clip_to_canvas(
            Vector2::new(-10.0, -5.0),
            Vector2::new(-1.0, -1.0),
            (0.0, 0.0),
            (20.0, 10.0),
        )
        .is_none());

        let inside = clip_to_canvas(
            Vector2::new(1.0, 1.0),
            Vector2::new(2.0, 3.0),
            (0.0, 0.0),
            (20.0, 10.0),
        )
        .unwrap();
        assert_eq!(inside.0, Vector2::new(1.0, 1.0));
        assert_eq!(inside.1, Vector2::new(2.0, 3.0));
    }

    #[test]
    fn test_encode_png() {
        let surface = RasterSurface::new(RgbImage::new(4, 3));
        let bytes = surface.encode().unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");

        let decoded = image::load_from_memory(&bytes).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), (4, 3));
    }
}

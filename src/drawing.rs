//! This module provides functionality for drawing detected grids and region
//! boxes on images. It is feature-gated under the `drawing` feature and
//! requires the `imageproc` crate.
//!
//! # Examples
//!
//! ```rust
//! use image::{Rgba, RgbaImage};
//! use spritegrid::{drawing::*, GridSize};
//!
//! let mut img = RgbaImage::from_pixel(64, 64, Rgba([30, 30, 30, 255]));
//! let grid = GridSize::new(4, 4);
//!
//! let config = OverlayConfig {
//!     grid_color: Rgba([255, 0, 0, 255]),   // Red grid lines
//!     box_color: Rgba([0, 255, 0, 255]),    // Green region outlines
//!     line_color_provider: None,            // Use uniform grid color
//!     line_thickness: 1,
//! };
//! grid.draw(&mut img, &config).unwrap();
//! ```

use std::fmt;

use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;

use crate::regions::grid_cell;
use crate::{BoundingBox, GridSize, SpriteError};

/// Configuration for overlay drawing.
///
/// Users can specify a uniform color for grid lines or provide a custom color
/// provider function keyed by line index.
pub struct OverlayConfig {
    /// Color for grid seam lines.
    pub grid_color: Rgba<u8>,
    /// Color for region bounding-box outlines.
    pub box_color: Rgba<u8>,
    /// Optional function to provide per-line colors based on the line index.
    pub line_color_provider: Option<Box<dyn Fn(usize) -> Rgba<u8>>>,
    /// Thickness of drawn lines, in pixels.
    pub line_thickness: u32,
}

impl fmt::Debug for OverlayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverlayConfig")
            .field("grid_color", &self.grid_color)
            .field("box_color", &self.box_color)
            .field("line_color_provider", &"<function>")
            .field("line_thickness", &self.line_thickness)
            .finish()
    }
}

impl Default for OverlayConfig {
    fn default() -> Self {
        OverlayConfig {
            grid_color: Rgba([255, 0, 0, 255]),
            box_color: Rgba([0, 255, 0, 255]),
            line_color_provider: None,
            line_thickness: 1,
        }
    }
}

/// Trait for types that can be drawn as an overlay on an image.
pub trait Drawable {
    /// Draws the object on the provided image using the given configuration.
    ///
    /// # Errors
    /// Returns [`SpriteError`] if the object cannot be rendered on the image.
    fn draw(&self, image: &mut RgbaImage, config: &OverlayConfig) -> Result<(), SpriteError>;
}

impl Drawable for BoundingBox {
    fn draw(&self, image: &mut RgbaImage, config: &OverlayConfig) -> Result<(), SpriteError> {
        let clamped = match self.clamp_to(image.width(), image.height()) {
            Some(clamped) => clamped,
            None => return Ok(()),
        };
        for offset in 0..config.line_thickness {
            let width = clamped.width.saturating_sub(2 * offset);
            let height = clamped.height.saturating_sub(2 * offset);
            if width == 0 || height == 0 {
                break;
            }
            let rect = Rect::at((clamped.x + offset) as i32, (clamped.y + offset) as i32)
                .of_size(width, height);
            draw_hollow_rect_mut(image, rect, config.box_color);
        }
        Ok(())
    }
}

impl Drawable for [BoundingBox] {
    fn draw(&self, image: &mut RgbaImage, config: &OverlayConfig) -> Result<(), SpriteError> {
        for bounds in self {
            bounds.draw(image, config)?;
        }
        Ok(())
    }
}

impl Drawable for GridSize {
    fn draw(&self, image: &mut RgbaImage, config: &OverlayConfig) -> Result<(), SpriteError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Ok(());
        }

        // Horizontal seams between consecutive rows.
        for row in 0..self.rows.saturating_sub(1) {
            let cell = grid_cell(width, height, row, 0, self.rows, self.cols)?;
            let y = cell.bottom();
            let color = if let Some(ref provider) = config.line_color_provider {
                provider(row as usize)
            } else {
                config.grid_color
            };
            for offset in 0..config.line_thickness {
                draw_line_segment_mut(
                    image,
                    (0.0, (y + offset) as f32),
                    (width as f32, (y + offset) as f32),
                    color,
                );
            }
        }

        // Vertical seams between consecutive columns.
        for col in 0..self.cols.saturating_sub(1) {
            let cell = grid_cell(width, height, 0, col, self.rows, self.cols)?;
            let x = cell.right();
            let color = if let Some(ref provider) = config.line_color_provider {
                provider(col as usize)
            } else {
                config.grid_color
            };
            for offset in 0..config.line_thickness {
                draw_line_segment_mut(
                    image,
                    ((x + offset) as f32, 0.0),
                    ((x + offset) as f32, height as f32),
                    color,
                );
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_grid_overlay_marks_seams() {
        let mut img = RgbaImage::from_pixel(8, 8, Rgba([0, 0, 0, 255]));
        GridSize::new(2, 2)
            .draw(&mut img, &OverlayConfig::default())
            .unwrap();
        // Seams sit at the end of the first 4px cell.
        assert_eq!(*img.get_pixel(0, 4), Rgba([255, 0, 0, 255]));
        assert_eq!(*img.get_pixel(4, 0), Rgba([255, 0, 0, 255]));
        assert_eq!(*img.get_pixel(1, 1), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn test_single_cell_grid_draws_nothing() {
        let mut img = RgbaImage::from_pixel(8, 8, Rgba([7, 7, 7, 255]));
        let before = img.clone();
        GridSize::new(1, 1)
            .draw(&mut img, &OverlayConfig::default())
            .unwrap();
        assert_eq!(img, before);
    }

    #[test]
    fn test_box_overlay_outlines_region() {
        let mut img = RgbaImage::from_pixel(10, 10, Rgba([0, 0, 0, 255]));
        BoundingBox::new(2, 3, 4, 4)
            .draw(&mut img, &OverlayConfig::default())
            .unwrap();
        assert_eq!(*img.get_pixel(2, 3), Rgba([0, 255, 0, 255]));
        assert_eq!(*img.get_pixel(5, 6), Rgba([0, 255, 0, 255]));
        // Interior untouched.
        assert_eq!(*img.get_pixel(3, 4), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn test_box_outside_image_is_skipped() {
        let mut img = RgbaImage::from_pixel(5, 5, Rgba([1, 1, 1, 255]));
        let before = img.clone();
        BoundingBox::new(20, 20, 3, 3)
            .draw(&mut img, &OverlayConfig::default())
            .unwrap();
        assert_eq!(img, before);
    }

    #[test]
    fn test_line_color_provider() {
        let mut img = RgbaImage::from_pixel(9, 9, Rgba([0, 0, 0, 255]));
        let config = OverlayConfig {
            line_color_provider: Some(Box::new(|i| {
                if i == 0 {
                    Rgba([255, 255, 0, 255])
                } else {
                    Rgba([0, 255, 255, 255])
                }
            })),
            ..OverlayConfig::default()
        };
        GridSize::new(3, 1).draw(&mut img, &config).unwrap();
        assert_eq!(*img.get_pixel(0, 3), Rgba([255, 255, 0, 255]));
        assert_eq!(*img.get_pixel(0, 6), Rgba([0, 255, 255, 255]));
    }
}

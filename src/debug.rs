use image::RgbaImage;

use crate::drawing::{Drawable, OverlayConfig};
use crate::{BoundingBox, GridSize, SpriteError};

/// Saves the image with the detected grid drawn on it.
///
/// # Errors
/// Returns [`SpriteError`] if drawing or saving fails.
///
/// # Examples
///
/// ```rust,no_run
/// use image::{Rgba, RgbaImage};
/// use spritegrid::{auto_detect_grid, debug, drawing::OverlayConfig};
///
/// let img = RgbaImage::from_pixel(64, 64, Rgba([30, 30, 30, 255]));
/// let grid = auto_detect_grid(&img);
/// debug::save_image_with_grid(&img, &grid, "grid_overlay.png", &OverlayConfig::default())
///     .unwrap();
/// ```
pub fn save_image_with_grid(
    image: &RgbaImage,
    grid: &GridSize,
    output_path: &str,
    config: &OverlayConfig,
) -> Result<(), SpriteError> {
    let mut overlay = image.clone();
    grid.draw(&mut overlay, config)?;
    overlay
        .save(output_path)
        .map_err(|e| SpriteError::ImageSaveError(e.to_string()))
}

/// Saves the image with detected region boxes drawn on it.
///
/// # Errors
/// Returns [`SpriteError`] if drawing or saving fails.
pub fn save_image_with_boxes(
    image: &RgbaImage,
    boxes: &[BoundingBox],
    output_path: &str,
    config: &OverlayConfig,
) -> Result<(), SpriteError> {
    let mut overlay = image.clone();
    boxes.draw(&mut overlay, config)?;
    overlay
        .save(output_path)
        .map_err(|e| SpriteError::ImageSaveError(e.to_string()))
}

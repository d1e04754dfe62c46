//! Background/foreground pixel classification and luminance helpers.
//!
//! Every other stage of the pipeline reduces pixels either to a
//! background/foreground decision ([`is_background`]) or to a luminance value
//! ([`luminance`]); both live here so the thresholds stay in one place.

use image::{Rgba, RgbaImage};

/// Alpha values below this count as background in [`BackgroundMode::Transparent`].
/// Fixed threshold, matching the classifier contract.
pub const ALPHA_BACKGROUND_MAX: u8 = 10;

/// How background pixels are recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum BackgroundMode {
    /// Background is anything with alpha below [`ALPHA_BACKGROUND_MAX`].
    Transparent,
    /// Background is anything within `tolerance` of a reference color on
    /// every RGB channel (a Chebyshev distance test, not Euclidean).
    Color,
}

/// Background classification parameters shared by segmentation and cropping.
///
/// # Example
/// ```
/// use spritegrid::BackgroundSpec;
///
/// let spec = BackgroundSpec::default();
/// assert_eq!(spec.tolerance, 20);
///
/// let white = BackgroundSpec::color([255, 255, 255], 10);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct BackgroundSpec {
    pub mode: BackgroundMode,
    /// Reference color, only consulted in [`BackgroundMode::Color`].
    pub color: [u8; 3],
    /// Per-channel tolerance, only consulted in [`BackgroundMode::Color`].
    pub tolerance: u8,
}

impl BackgroundSpec {
    pub fn transparent() -> Self {
        Self {
            mode: BackgroundMode::Transparent,
            color: [255, 255, 255],
            tolerance: 20,
        }
    }

    pub fn color(color: [u8; 3], tolerance: u8) -> Self {
        Self {
            mode: BackgroundMode::Color,
            color,
            tolerance,
        }
    }
}

impl Default for BackgroundSpec {
    fn default() -> Self {
        BackgroundSpec::transparent()
    }
}

/// Decides whether the pixel at `(x, y)` is background.
///
/// Pure function of its inputs; `(x, y)` must be within the buffer bounds,
/// out-of-bounds coordinates are a caller error.
pub fn is_background(image: &RgbaImage, x: u32, y: u32, spec: &BackgroundSpec) -> bool {
    let Rgba([r, g, b, a]) = *image.get_pixel(x, y);
    match spec.mode {
        BackgroundMode::Transparent => a < ALPHA_BACKGROUND_MAX,
        BackgroundMode::Color => {
            let [bg_r, bg_g, bg_b] = spec.color;
            r.abs_diff(bg_r) <= spec.tolerance
                && g.abs_diff(bg_g) <= spec.tolerance
                && b.abs_diff(bg_b) <= spec.tolerance
        }
    }
}

/// Rec. 601 luma of an RGBA pixel; alpha is ignored.
pub fn luminance(pixel: &Rgba<u8>) -> f32 {
    let Rgba([r, g, b, _]) = *pixel;
    0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32
}

/// Luminance with out-of-bounds coordinates contributing 0, as the gradient
/// extractor expects at image borders.
pub fn luminance_at(image: &RgbaImage, x: i64, y: i64) -> f32 {
    if x < 0 || y < 0 || x >= image.width() as i64 || y >= image.height() as i64 {
        return 0.0;
    }
    luminance(image.get_pixel(x as u32, y as u32))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn single_pixel(rgba: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(1, 1, Rgba(rgba))
    }

    #[test_case([0, 0, 0, 0], true; "fully transparent")]
    #[test_case([0, 0, 0, 9], true; "just below threshold")]
    #[test_case([0, 0, 0, 10], false; "at threshold is foreground")]
    #[test_case([0, 0, 0, 255], false; "opaque")]
    fn test_transparent_mode(rgba: [u8; 4], expected: bool) {
        let img = single_pixel(rgba);
        let spec = BackgroundSpec::transparent();
        assert_eq!(is_background(&img, 0, 0, &spec), expected);
    }

    #[test_case([250, 250, 250, 255], true; "within tolerance on all channels")]
    #[test_case([235, 255, 255, 255], true; "at tolerance boundary")]
    #[test_case([234, 255, 255, 255], false; "one channel past tolerance")]
    #[test_case([0, 255, 255, 255], false; "far off on one channel")]
    fn test_color_mode(rgba: [u8; 4], expected: bool) {
        let img = single_pixel(rgba);
        let spec = BackgroundSpec::color([255, 255, 255], 20);
        assert_eq!(is_background(&img, 0, 0, &spec), expected);
    }

    #[test]
    fn test_color_mode_ignores_alpha() {
        let img = single_pixel([255, 255, 255, 0]);
        let spec = BackgroundSpec::color([255, 255, 255], 0);
        assert!(is_background(&img, 0, 0, &spec));
    }

    #[test]
    fn test_luminance_weights() {
        assert_eq!(luminance(&Rgba([255, 255, 255, 255])), 255.0);
        assert_eq!(luminance(&Rgba([0, 0, 0, 255])), 0.0);
        let red = luminance(&Rgba([255, 0, 0, 255]));
        assert!((red - 0.299 * 255.0).abs() < 1e-4);
    }

    #[test]
    fn test_luminance_at_out_of_bounds_is_zero() {
        let img = single_pixel([255, 255, 255, 255]);
        assert_eq!(luminance_at(&img, -1, 0), 0.0);
        assert_eq!(luminance_at(&img, 0, 1), 0.0);
        assert_eq!(luminance_at(&img, 0, 0), 255.0);
    }
}

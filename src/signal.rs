//! Signal extractors: reduce the 2-D pixel buffer to 1-D profiles per axis.
//!
//! Three independent extractors produce one value per scan line — transition
//! counts, perpendicular gradient strength, and local luminance variance.
//! Sprite boundaries in a packed sheet show up as rows/columns where these
//! profiles peak, which the peak pipeline then turns into a division count.

use image::{Rgba, RgbaImage};
use tracing::trace;

use crate::classify::{luminance, luminance_at};

/// Sliding-window radius for the local variance profile (7-sample window).
const VARIANCE_WINDOW_RADIUS: usize = 3;

/// Which axis a profile describes. A `Rows` profile has one value per image
/// row (length = height) and feeds the row estimate; `Cols` has one value per
/// column (length = width) and feeds the column estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Rows,
    Cols,
}

impl Axis {
    /// Length of a profile along this axis, in scan lines.
    pub fn size(self, image: &RgbaImage) -> u32 {
        match self {
            Axis::Rows => image.height(),
            Axis::Cols => image.width(),
        }
    }

    fn span(self, image: &RgbaImage) -> u32 {
        match self {
            Axis::Rows => image.width(),
            Axis::Cols => image.height(),
        }
    }

    /// Maps (scan line index, position along the line) to pixel coordinates.
    fn pixel(self, line: u32, pos: u32) -> (u32, u32) {
        match self {
            Axis::Rows => (pos, line),
            Axis::Cols => (line, pos),
        }
    }
}

/// Thresholds for the transition counter. Empirically tuned defaults; the
/// luma threshold is half the color threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionThresholds {
    /// Euclidean RGB distance above which two adjacent pixels differ.
    pub color: f32,
    /// Luminance difference above which two adjacent pixels differ.
    pub luma: f32,
}

impl TransitionThresholds {
    pub fn from_color(color: f32) -> Self {
        Self {
            color,
            luma: color * 0.5,
        }
    }
}

impl Default for TransitionThresholds {
    fn default() -> Self {
        TransitionThresholds::from_color(30.0)
    }
}

fn pixels_differ(a: &Rgba<u8>, b: &Rgba<u8>, thresholds: &TransitionThresholds) -> bool {
    let dr = a[0] as f32 - b[0] as f32;
    let dg = a[1] as f32 - b[1] as f32;
    let db = a[2] as f32 - b[2] as f32;
    let color_diff = (dr * dr + dg * dg + db * db).sqrt();
    if color_diff > thresholds.color {
        return true;
    }
    (luminance(a) - luminance(b)).abs() > thresholds.luma
}

/// Counts adjacent-pixel transitions along each scan line.
///
/// Higher values mean more internal sprite-boundary activity on that line.
pub fn transition_profile(
    image: &RgbaImage,
    axis: Axis,
    thresholds: &TransitionThresholds,
) -> Vec<f32> {
    let lines = axis.size(image);
    let span = axis.span(image);
    trace!(?axis, lines, span, "extracting transition profile");

    (0..lines)
        .map(|line| {
            let mut transitions = 0u32;
            let mut last: Option<Rgba<u8>> = None;
            for pos in 0..span {
                let (x, y) = axis.pixel(line, pos);
                let pixel = *image.get_pixel(x, y);
                if let Some(prev) = last {
                    if pixels_differ(&prev, &pixel, thresholds) {
                        transitions += 1;
                    }
                }
                last = Some(pixel);
            }
            transitions as f32
        })
        .collect()
}

/// Centered first-difference gradient across scan lines.
///
/// For each line, sums the luminance difference between the two neighboring
/// lines at every position, normalized by line length. This spikes exactly at
/// seams between sprite cells; samples outside the image contribute
/// luminance 0.
pub fn edge_profile(image: &RgbaImage, axis: Axis) -> Vec<f32> {
    let lines = axis.size(image);
    let span = axis.span(image);
    trace!(?axis, lines, span, "extracting edge profile");

    (0..lines)
        .map(|line| {
            let mut strength = 0.0f32;
            for pos in 0..span {
                let (x, y) = axis.pixel(line, pos);
                let (before, after) = match axis {
                    Axis::Rows => (
                        luminance_at(image, x as i64, y as i64 - 1),
                        luminance_at(image, x as i64, y as i64 + 1),
                    ),
                    Axis::Cols => (
                        luminance_at(image, x as i64 - 1, y as i64),
                        luminance_at(image, x as i64 + 1, y as i64),
                    ),
                };
                strength += (after - before).abs();
            }
            strength / span.max(1) as f32
        })
        .collect()
}

/// Local luminance variance along each scan line, averaged over interior
/// sliding-window positions. Uniform lines score 0.
pub fn variance_profile(image: &RgbaImage, axis: Axis) -> Vec<f32> {
    let lines = axis.size(image);
    let span = axis.span(image) as usize;
    let radius = VARIANCE_WINDOW_RADIUS;
    trace!(?axis, lines, span, "extracting variance profile");

    (0..lines)
        .map(|line| {
            let values: Vec<f32> = (0..span as u32)
                .map(|pos| {
                    let (x, y) = axis.pixel(line, pos);
                    luminance(image.get_pixel(x, y))
                })
                .collect();

            let mut total = 0.0f32;
            for center in radius..span.saturating_sub(radius) {
                let window = &values[center - radius..=center + radius];
                let mean = window.iter().sum::<f32>() / window.len() as f32;
                let local = window.iter().map(|v| (v - mean) * (v - mean)).sum::<f32>()
                    / window.len() as f32;
                total += local;
            }
            total / span.saturating_sub(2 * radius).max(1) as f32
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn two_band_sheet() -> RgbaImage {
        // 8x8, top half dark, bottom half light
        RgbaImage::from_fn(8, 8, |_, y| {
            if y < 4 {
                Rgba([10, 10, 10, 255])
            } else {
                Rgba([240, 240, 240, 255])
            }
        })
    }

    #[test]
    fn test_transition_profile_counts_per_line() {
        let img = two_band_sheet();
        let rows = transition_profile(&img, Axis::Rows, &TransitionThresholds::default());
        // No transitions along any row of a horizontally uniform sheet.
        assert_eq!(rows, vec![0.0; 8]);

        let cols = transition_profile(&img, Axis::Cols, &TransitionThresholds::default());
        // Every column crosses the dark/light seam exactly once.
        assert_eq!(cols, vec![1.0; 8]);
    }

    #[test]
    fn test_transition_profile_respects_thresholds() {
        let img = RgbaImage::from_fn(4, 1, |x, _| {
            if x < 2 {
                Rgba([100, 100, 100, 255])
            } else {
                Rgba([110, 110, 110, 255])
            }
        });
        let strict = transition_profile(&img, Axis::Rows, &TransitionThresholds::default());
        assert_eq!(strict, vec![0.0]);
        let loose = transition_profile(&img, Axis::Rows, &TransitionThresholds::from_color(10.0));
        assert_eq!(loose, vec![1.0]);
    }

    #[test]
    fn test_edge_profile_spikes_at_seam() {
        let img = two_band_sheet();
        let profile = edge_profile(&img, Axis::Rows);
        // The two rows straddling the seam carry the full dark/light contrast.
        assert!(profile[3] > profile[1]);
        assert!(profile[4] > profile[5]);
        assert_eq!(profile[2], 0.0);
        // Interior rows away from seam and borders are flat.
        assert_eq!(profile[5], 0.0);
    }

    #[test]
    fn test_edge_profile_uniform_interior_is_zero() {
        let img = RgbaImage::from_pixel(6, 6, Rgba([90, 90, 90, 255]));
        let profile = edge_profile(&img, Axis::Cols);
        for v in &profile[1..5] {
            assert_eq!(*v, 0.0);
        }
        // Border lines see the zero-luminance outside and report a gradient.
        assert!(profile[0] > 0.0);
    }

    #[test]
    fn test_variance_profile_uniform_is_zero() {
        let img = RgbaImage::from_pixel(10, 10, Rgba([50, 80, 120, 255]));
        let profile = variance_profile(&img, Axis::Rows);
        assert_eq!(profile, vec![0.0; 10]);
    }

    #[test]
    fn test_variance_profile_detects_busy_lines() {
        // Row 5 alternates black/white, the rest are flat.
        let img = RgbaImage::from_fn(16, 10, |x, y| {
            if y == 5 && x % 2 == 0 {
                Rgba([255, 255, 255, 255])
            } else {
                Rgba([0, 0, 0, 255])
            }
        });
        let profile = variance_profile(&img, Axis::Rows);
        assert!(profile[5] > 0.0);
        assert_eq!(profile[2], 0.0);
    }

    #[test]
    fn test_profiles_on_tiny_images() {
        let img = RgbaImage::from_pixel(1, 1, Rgba([1, 2, 3, 255]));
        assert_eq!(
            transition_profile(&img, Axis::Rows, &TransitionThresholds::default()),
            vec![0.0]
        );
        assert_eq!(variance_profile(&img, Axis::Cols), vec![0.0]);
        assert_eq!(edge_profile(&img, Axis::Rows).len(), 1);
    }
}

//! Sprite sheet analysis: uniform-grid inference and irregular-region segmentation.
//!
//! The crate consumes a decoded RGBA pixel buffer ([`image::RgbaImage`]) and produces
//! structured geometry: a detected [`GridSize`] for uniformly packed sheets, or a list of
//! [`BoundingBox`]es for irregular layouts, plus cropped sub-images for export. Decoding,
//! rendering and file download are left to the caller; every operation here is a pure,
//! synchronous function over a borrowed buffer.
//!
//! # Example
//! ```
//! use image::{Rgba, RgbaImage};
//! use spritegrid::auto_detect_grid;
//!
//! // A 2x2 sheet of 32x32 solid tiles.
//! let img = RgbaImage::from_fn(64, 64, |x, y| {
//!     if (x < 32) ^ (y < 32) {
//!         Rgba([200, 30, 30, 255])
//!     } else {
//!         Rgba([30, 30, 200, 255])
//!     }
//! });
//!
//! let grid = auto_detect_grid(&img);
//! assert_eq!((grid.rows, grid.cols), (2, 2));
//! ```

pub mod classify;
/// Feature-gated helpers that save an image with a detected grid or region
/// overlay drawn on it, for inspecting detection results.
#[cfg(feature = "drawing")]
pub mod debug;
pub mod detect;
/// Overlay rendering of detected grids and region boxes, feature-gated under
/// `drawing` and built on the `image` and `imageproc` crates.
#[cfg(feature = "drawing")]
pub mod drawing;
pub mod peaks;
pub mod regions;
pub mod segment;
pub mod signal;

use smallvec::SmallVec;
use thiserror::Error;

// Determined through benchmarking typical sheet layouts
const DEFAULT_SMALLVEC_SIZE: usize = 32;

/// A type alias for SmallVec with an optimized stack-allocated buffer size.
pub type SmallVecLine<T> = SmallVec<[T; DEFAULT_SMALLVEC_SIZE]>;

#[derive(Error, Debug)]
pub enum SpriteError {
    #[error("Invalid grid partition: rows={rows}, cols={cols}")]
    InvalidGrid { rows: u32, cols: u32 },

    #[error("Cell ({row}, {col}) out of range for a {rows}x{cols} grid")]
    CellOutOfRange {
        row: u32,
        col: u32,
        rows: u32,
        cols: u32,
    },

    #[error("No boxes selected")]
    EmptySelection,

    #[error("Failed to save image: {0}")]
    ImageSaveError(String),
}

/// An axis-aligned rectangle in image coordinates, origin top-left.
///
/// Equality is structural; boxes carry no identity beyond their value.
///
/// # Example
/// ```
/// use spritegrid::BoundingBox;
///
/// let outer = BoundingBox::new(0, 0, 10, 10);
/// let inner = BoundingBox::new(2, 3, 4, 5);
/// assert!(outer.contains(&inner));
/// assert_eq!(inner.area(), 20);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// One past the rightmost contained column.
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    /// One past the bottommost contained row.
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn contains(&self, other: &BoundingBox) -> bool {
        self.x <= other.x
            && self.y <= other.y
            && self.right() >= other.right()
            && self.bottom() >= other.bottom()
    }

    /// Clamps the box to an `image_width` x `image_height` canvas, returning
    /// `None` when nothing of it remains in bounds.
    pub fn clamp_to(&self, image_width: u32, image_height: u32) -> Option<BoundingBox> {
        if self.x >= image_width || self.y >= image_height {
            return None;
        }
        let width = self.width.min(image_width - self.x);
        let height = self.height.min(image_height - self.y);
        if width == 0 || height == 0 {
            return None;
        }
        Some(BoundingBox::new(self.x, self.y, width, height))
    }
}

/// A uniform row/column partition of a sheet.
///
/// Invariant: `rows >= 1` and `cols >= 1`; [`GridSize::new`] clamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct GridSize {
    pub rows: u32,
    pub cols: u32,
}

impl GridSize {
    pub fn new(rows: u32, cols: u32) -> Self {
        Self {
            rows: rows.max(1),
            cols: cols.max(1),
        }
    }

    pub fn cell_count(&self) -> u64 {
        self.rows as u64 * self.cols as u64
    }
}

impl Default for GridSize {
    fn default() -> Self {
        GridSize::new(1, 1)
    }
}

/// Outcome of one detection strategy: an estimated partition and a heuristic
/// quality score in `[0, 1]`. The score is used only to pick between
/// strategies; it is not a calibrated probability.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Detection {
    pub rows: u32,
    pub cols: u32,
    pub confidence: f32,
}

impl Detection {
    pub fn grid(&self) -> GridSize {
        GridSize::new(self.rows, self.cols)
    }
}

pub use classify::{is_background, BackgroundMode, BackgroundSpec};
pub use detect::{auto_detect_grid, detect_grid, DetectionStrategy, DetectorConfig};
pub use peaks::{estimate_divisions, snap_divisions, DivisionEstimate, Peak, PeakConfig};
pub use regions::{
    content_bounds, crop_to_content, grid_cell, merge_boxes, slice_detected_regions, slice_grid,
    slice_regions, sort_boxes, split_box, CropOptions, SliceOptions, SortBy, SplitOptions,
};
pub use segment::{detect_sprite_bounds, SegmentAlgorithm, SegmentOptions};
pub use signal::{edge_profile, transition_profile, variance_profile, Axis, TransitionThresholds};

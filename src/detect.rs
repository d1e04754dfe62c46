//! The grid detector: an ensemble of three independent signal strategies,
//! each scored per axis by the peak pipeline, reduced by max confidence.
//!
//! The ensemble is a deliberate voting design: transition counting, edge
//! gradients and local variance triangulate the same structural hypothesis,
//! and the single highest-confidence result wins. Additional strategies can
//! be added without changing the selection contract.

use image::RgbaImage;
use tracing::{debug, trace};

use crate::peaks::{estimate_divisions, DivisionEstimate, PeakConfig};
use crate::signal::{edge_profile, transition_profile, variance_profile, Axis, TransitionThresholds};
use crate::{Detection, GridSize};

/// Configuration for grid detection.
///
/// # Example
/// ```
/// use spritegrid::DetectorConfig;
///
/// let config = DetectorConfig::default();
/// assert!(config.enable_parallel);
/// assert_eq!(config.thresholds.color, 30.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectorConfig {
    /// Transition-counter thresholds (default: color 30, luma 15).
    pub thresholds: TransitionThresholds,
    /// Peak pipeline parameters.
    pub peaks: PeakConfig,
    /// Run the two axes of each strategy in parallel (default: true).
    pub enable_parallel: bool,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            thresholds: TransitionThresholds::default(),
            peaks: PeakConfig::default(),
            enable_parallel: true,
        }
    }
}

/// One member of the detection ensemble: extracts a per-axis profile that the
/// peak pipeline scores. Implementations must be stateless.
pub trait DetectionStrategy: Sync {
    fn name(&self) -> &'static str;

    /// Weight applied to the averaged axis confidence when competing against
    /// the other strategies.
    fn weight(&self) -> f32 {
        1.0
    }

    fn profile(&self, image: &RgbaImage, axis: Axis, config: &DetectorConfig) -> Vec<f32>;
}

/// Color-transition counting, the primary strategy.
pub struct TransitionStrategy;

impl DetectionStrategy for TransitionStrategy {
    fn name(&self) -> &'static str {
        "transitions"
    }

    fn profile(&self, image: &RgbaImage, axis: Axis, config: &DetectorConfig) -> Vec<f32> {
        transition_profile(image, axis, &config.thresholds)
    }
}

/// Luminance-gradient edges, weighted slightly below transitions.
pub struct EdgeStrategy;

impl DetectionStrategy for EdgeStrategy {
    fn name(&self) -> &'static str {
        "edges"
    }

    fn weight(&self) -> f32 {
        0.9
    }

    fn profile(&self, image: &RgbaImage, axis: Axis, _config: &DetectorConfig) -> Vec<f32> {
        edge_profile(image, axis)
    }
}

/// Local-variance profile, the lowest-priority strategy.
pub struct VarianceStrategy;

impl DetectionStrategy for VarianceStrategy {
    fn name(&self) -> &'static str {
        "variance"
    }

    fn weight(&self) -> f32 {
        0.8
    }

    fn profile(&self, image: &RgbaImage, axis: Axis, _config: &DetectorConfig) -> Vec<f32> {
        variance_profile(image, axis)
    }
}

/// The ensemble in evaluation order; earlier strategies win confidence ties.
pub fn strategies() -> [&'static dyn DetectionStrategy; 3] {
    [&TransitionStrategy, &EdgeStrategy, &VarianceStrategy]
}

fn run_strategy(
    strategy: &dyn DetectionStrategy,
    image: &RgbaImage,
    config: &DetectorConfig,
) -> Detection {
    let estimate_axis = |axis: Axis| -> DivisionEstimate {
        let profile = strategy.profile(image, axis, config);
        estimate_divisions(&profile, axis.size(image), &config.peaks)
    };

    let (rows, cols) = if config.enable_parallel {
        rayon::join(|| estimate_axis(Axis::Rows), || estimate_axis(Axis::Cols))
    } else {
        (estimate_axis(Axis::Rows), estimate_axis(Axis::Cols))
    };

    Detection {
        rows: rows.divisions.max(1),
        cols: cols.divisions.max(1),
        confidence: ((rows.confidence + cols.confidence) / 2.0 * strategy.weight()).min(1.0),
    }
}

/// Runs every strategy and keeps the single highest-confidence result.
///
/// Degenerate images (zero width or height) short-circuit to the conservative
/// `1x1` partition with zero confidence; absence of detectable structure is
/// never an error.
pub fn detect_grid(image: &RgbaImage, config: &DetectorConfig) -> Detection {
    if image.width() == 0 || image.height() == 0 {
        trace!("degenerate image, defaulting to 1x1");
        return Detection {
            rows: 1,
            cols: 1,
            confidence: 0.0,
        };
    }

    let mut best = Detection {
        rows: 1,
        cols: 1,
        confidence: 0.0,
    };
    for strategy in strategies() {
        let result = run_strategy(strategy, image, config);
        debug!(
            strategy = strategy.name(),
            rows = result.rows,
            cols = result.cols,
            confidence = result.confidence,
            "strategy result"
        );
        if result.confidence > best.confidence {
            best = result;
        }
    }
    best
}

/// Infers the most likely uniform partition of a sheet with default settings.
///
/// # Example
/// ```
/// use image::{Rgba, RgbaImage};
/// use spritegrid::auto_detect_grid;
///
/// let uniform = RgbaImage::from_pixel(100, 100, Rgba([80, 80, 80, 255]));
/// let grid = auto_detect_grid(&uniform);
/// assert_eq!((grid.rows, grid.cols), (1, 1));
/// ```
pub fn auto_detect_grid(image: &RgbaImage) -> GridSize {
    detect_grid(image, &DetectorConfig::default()).grid()
}

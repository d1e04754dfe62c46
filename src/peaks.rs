//! The peak pipeline: smooth a 1-D profile, find and score its peaks, and
//! turn the surviving peak count into a division estimate with a confidence
//! score.
//!
//! Stages run in a fixed order, each a pure transformation: Gaussian
//! smoothing, local-maxima search, prominence computation, prominence and
//! distance filtering, confidence scoring, then divisor snapping against
//! common sprite cell sizes.

use tracing::{debug, trace};

use crate::SmallVecLine;

/// Candidate sprite cell sizes tried by the divisor snap, in priority order.
pub const COMMON_CELL_SIZES: [u32; 9] = [8, 16, 24, 32, 48, 64, 96, 128, 256];

/// Plausible sprite cell size window for keeping or searching divisors.
const MIN_CELL_SIZE: u32 = 8;
const MAX_CELL_SIZE: u32 = 512;

/// Minimum peak spacing is `axis_size / 50` pixels (2% of the axis).
const MIN_DISTANCE_DIVISOR: u32 = 50;

/// A local maximum in a profile.
///
/// Prominence is how far the peak rises above its highest connecting valley;
/// it is always >= 0 and exactly 0 for peaks at the first or last index.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Peak {
    pub index: usize,
    pub value: f32,
    pub prominence: f32,
}

/// Tunable parameters of the pipeline.
///
/// # Example
/// ```
/// use spritegrid::PeakConfig;
///
/// let config = PeakConfig::default();
/// assert_eq!(config.smoothing_sigma, 1.5);
/// assert_eq!(config.prominence_ratio, 0.2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakConfig {
    /// Gaussian smoothing sigma (default: 1.5).
    pub smoothing_sigma: f32,
    /// Keep peaks whose prominence is at least this fraction of the maximum
    /// prominence (default: 0.2).
    pub prominence_ratio: f32,
}

impl Default for PeakConfig {
    fn default() -> Self {
        Self {
            smoothing_sigma: 1.5,
            prominence_ratio: 0.2,
        }
    }
}

/// A division count with its heuristic confidence.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DivisionEstimate {
    pub divisions: u32,
    pub confidence: f32,
}

/// Gaussian convolution with edge-aware normalization: each sample divides by
/// the sum of in-bounds kernel weights so edge samples are not damped.
pub fn gaussian_smooth(signal: &[f32], sigma: f32) -> Vec<f32> {
    if signal.is_empty() {
        return Vec::new();
    }
    let kernel_size = (((sigma * 6.0) as usize) | 1).max(3);
    let radius = (kernel_size / 2) as isize;
    let kernel: Vec<f32> = (-radius..=radius)
        .map(|i| (-((i * i) as f32) / (2.0 * sigma * sigma)).exp())
        .collect();

    (0..signal.len())
        .map(|i| {
            let mut acc = 0.0f32;
            let mut weight_sum = 0.0f32;
            for j in -radius..=radius {
                let idx = i as isize + j;
                if idx >= 0 && (idx as usize) < signal.len() {
                    let w = kernel[(j + radius) as usize];
                    acc += signal[idx as usize] * w;
                    weight_sum += w;
                }
            }
            acc / weight_sum
        })
        .collect()
}

/// Finds local maxima. A run of equal values rising on the left and falling
/// on the right counts as a single peak at the run's midpoint, so sheets with
/// exactly-equal smoothed samples still register their seams. A constant
/// signal has no peaks, and the first/last index never qualifies.
pub fn find_local_maxima(signal: &[f32]) -> SmallVecLine<Peak> {
    let mut peaks = SmallVecLine::new();
    if signal.len() < 3 {
        return peaks;
    }
    let mut i = 1;
    while i + 1 < signal.len() {
        if signal[i] > signal[i - 1] {
            let mut run_end = i;
            while run_end + 1 < signal.len() && signal[run_end + 1] == signal[i] {
                run_end += 1;
            }
            if run_end + 1 < signal.len() && signal[run_end + 1] < signal[i] {
                peaks.push(Peak {
                    index: (i + run_end) / 2,
                    value: signal[i],
                    prominence: 0.0,
                });
            }
            i = run_end + 1;
        } else {
            i += 1;
        }
    }
    peaks
}

/// Computes each peak's prominence: descend both slopes, tracking the lowest
/// value seen until a sample at or above the peak is met (or the signal
/// boundary); prominence is peak value minus the higher of the two key cols,
/// floored at 0. Edge-located peaks get exactly 0.
pub fn compute_prominences(peaks: &mut [Peak], signal: &[f32]) {
    for peak in peaks.iter_mut() {
        if peak.index == 0 || peak.index + 1 == signal.len() {
            peak.prominence = 0.0;
            continue;
        }
        let peak_value = peak.value;

        // Skip the plateau the peak sits on before walking each slope.
        let mut left_edge = peak.index;
        while left_edge > 0 && signal[left_edge - 1] == peak_value {
            left_edge -= 1;
        }
        let mut right_edge = peak.index;
        while right_edge + 1 < signal.len() && signal[right_edge + 1] == peak_value {
            right_edge += 1;
        }

        let mut left_key = peak_value;
        for i in (0..left_edge).rev() {
            if signal[i] >= peak_value {
                break;
            }
            left_key = left_key.min(signal[i]);
        }
        let mut right_key = peak_value;
        for i in right_edge + 1..signal.len() {
            if signal[i] >= peak_value {
                break;
            }
            right_key = right_key.min(signal[i]);
        }

        peak.prominence = (peak_value - left_key.max(right_key)).max(0.0);
    }
}

/// Keeps peaks whose prominence reaches `ratio` of the maximum prominence.
pub fn filter_by_prominence(peaks: SmallVecLine<Peak>, ratio: f32) -> SmallVecLine<Peak> {
    let max_prominence = peaks.iter().map(|p| p.prominence).fold(0.0f32, f32::max);
    let threshold = max_prominence * ratio;
    peaks
        .into_iter()
        .filter(|p| p.prominence >= threshold)
        .collect()
}

/// Greedily keeps peaks in descending-prominence order, rejecting any
/// candidate within `min_distance` of an already-accepted peak, then restores
/// positional order.
pub fn filter_by_distance(peaks: SmallVecLine<Peak>, min_distance: usize) -> SmallVecLine<Peak> {
    if peaks.is_empty() {
        return peaks;
    }
    let mut by_prominence: Vec<Peak> = peaks.into_iter().collect();
    by_prominence.sort_by(|a, b| b.prominence.total_cmp(&a.prominence));

    let mut kept: Vec<Peak> = Vec::with_capacity(by_prominence.len());
    for peak in by_prominence {
        if kept
            .iter()
            .all(|k| peak.index.abs_diff(k.index) >= min_distance)
        {
            kept.push(peak);
        }
    }
    kept.sort_by_key(|p| p.index);
    kept.into_iter().collect()
}

/// Heuristic confidence for a surviving peak set: peak strength relative to
/// 30% of the maximum prominence (weight 0.4), spacing regularity
/// (weight 0.4, two or more peaks), and a flat count bonus. Capped at 1.
pub fn confidence_score(peaks: &[Peak], max_prominence: f32) -> f32 {
    if peaks.is_empty() {
        return 0.1;
    }
    let mut confidence = 0.0f32;

    let avg_prominence = peaks.iter().map(|p| p.prominence).sum::<f32>() / peaks.len() as f32;
    if max_prominence > 0.0 {
        let strength = (avg_prominence / (max_prominence * 0.3)).min(1.0);
        confidence += strength * 0.4;
    }

    if peaks.len() > 1 {
        let distances: Vec<f32> = peaks
            .windows(2)
            .map(|pair| (pair[1].index - pair[0].index) as f32)
            .collect();
        let mean = distances.iter().sum::<f32>() / distances.len() as f32;
        let variance =
            distances.iter().map(|d| (d - mean) * (d - mean)).sum::<f32>() / distances.len() as f32;
        let regularity = (1.0 - variance / (mean * mean)).max(0.0);
        confidence += regularity * 0.4;
    }

    confidence += if (1..=20).contains(&peaks.len()) {
        0.2
    } else {
        0.1
    };
    confidence.min(1.0)
}

/// Snaps a division estimate toward common sprite cell sizes.
///
/// Tries each candidate cell size in [`COMMON_CELL_SIZES`] order and takes the
/// first whose rounded division count is within 1 of the estimate and evenly
/// divides the axis. Failing that, keeps the estimate when it yields an
/// integer cell size in the plausible window, then scans divisors within +-2,
/// then falls back to `max(1, estimate)`.
pub fn snap_divisions(divisions: u32, axis_size: u32) -> u32 {
    for cell in COMMON_CELL_SIZES {
        let candidate = (axis_size as f32 / cell as f32).round() as u32;
        if candidate == 0 {
            continue;
        }
        if candidate.abs_diff(divisions) <= 1 && axis_size % candidate == 0 {
            if candidate != divisions {
                debug!(divisions, candidate, cell, "snapped to common cell size");
            }
            return candidate;
        }
    }

    if divisions > 0 && axis_size % divisions == 0 {
        let cell = axis_size / divisions;
        if (MIN_CELL_SIZE..=MAX_CELL_SIZE).contains(&cell) {
            return divisions;
        }
    }

    for candidate in divisions.saturating_sub(2)..=divisions + 2 {
        if candidate > 0 && axis_size % candidate == 0 {
            let cell = axis_size / candidate;
            if (MIN_CELL_SIZE..=MAX_CELL_SIZE).contains(&cell) {
                debug!(divisions, candidate, "snapped to nearby even divisor");
                return candidate;
            }
        }
    }

    divisions.max(1)
}

/// Runs the whole pipeline on one profile.
///
/// Degenerate inputs (empty signal, zero axis) and structureless signals are
/// not errors; they produce the conservative single-division estimate with a
/// low confidence.
pub fn estimate_divisions(signal: &[f32], axis_size: u32, config: &PeakConfig) -> DivisionEstimate {
    if signal.is_empty() || axis_size == 0 {
        return DivisionEstimate {
            divisions: 1,
            confidence: 0.0,
        };
    }
    trace!(len = signal.len(), axis_size, "estimating divisions");

    let smoothed = gaussian_smooth(signal, config.smoothing_sigma);
    let mut peaks = find_local_maxima(&smoothed);
    if peaks.is_empty() {
        return DivisionEstimate {
            divisions: 1,
            confidence: 0.1,
        };
    }

    compute_prominences(&mut peaks, &smoothed);
    let max_prominence = peaks.iter().map(|p| p.prominence).fold(0.0f32, f32::max);

    let peaks = filter_by_prominence(peaks, config.prominence_ratio);
    let min_distance = (axis_size / MIN_DISTANCE_DIVISOR) as usize;
    let peaks = filter_by_distance(peaks, min_distance);
    trace!(surviving = peaks.len(), min_distance, "filtered peaks");

    let confidence = confidence_score(&peaks, max_prominence);
    let divisions = snap_divisions(peaks.len() as u32 + 1, axis_size);

    DivisionEstimate {
        divisions,
        confidence,
    }
}

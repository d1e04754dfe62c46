//! Region segmentation: find connected non-background regions and emit their
//! bounding boxes, for sheets whose sprites are packed irregularly rather
//! than on a uniform grid.
//!
//! Two interchangeable algorithms cover the same contract: an iterative
//! stack-based flood fill, and two-pass connected-component labeling with
//! union-find equivalence resolution. Both scan in row-major order and emit
//! boxes in discovery order.

use std::collections::HashMap;

use image::RgbaImage;
use tracing::{debug, trace};

use crate::classify::{is_background, BackgroundSpec};
use crate::BoundingBox;

/// Upper bound on pixels visited by a single flood-fill run. A soft limit:
/// the run stops and keeps the partial region instead of failing the scan.
pub const FLOOD_FILL_PIXEL_CAP: usize = 100_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentAlgorithm {
    FloodFill,
    ConnectedComponents,
}

/// Options shared by both segmentation algorithms.
///
/// # Example
/// ```
/// use spritegrid::SegmentOptions;
///
/// let options = SegmentOptions::default();
/// assert_eq!((options.min_width, options.min_height), (8, 8));
/// assert_eq!(options.max_sprites, 1000);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentOptions {
    pub background: BackgroundSpec,
    /// Regions narrower than this are discarded.
    pub min_width: u32,
    /// Regions shorter than this are discarded.
    pub min_height: u32,
    /// Stop after this many regions.
    pub max_sprites: usize,
    pub algorithm: SegmentAlgorithm,
}

impl Default for SegmentOptions {
    fn default() -> Self {
        Self {
            background: BackgroundSpec::default(),
            min_width: 8,
            min_height: 8,
            max_sprites: 1000,
            algorithm: SegmentAlgorithm::FloodFill,
        }
    }
}

/// Finds bounding boxes of connected non-background regions.
///
/// Boxes come back in row-major discovery order, not sorted by position;
/// callers wanting a spatial order sort via the post-processor.
///
/// # Example
/// ```
/// use image::{Rgba, RgbaImage};
/// use spritegrid::{detect_sprite_bounds, BoundingBox, SegmentOptions};
///
/// // One opaque 10x10 square on a transparent 20x20 canvas.
/// let img = RgbaImage::from_fn(20, 20, |x, y| {
///     if (5..15).contains(&x) && (5..15).contains(&y) {
///         Rgba([200, 40, 40, 255])
///     } else {
///         Rgba([0, 0, 0, 0])
///     }
/// });
///
/// let boxes = detect_sprite_bounds(&img, &SegmentOptions::default());
/// assert_eq!(boxes, vec![BoundingBox::new(5, 5, 10, 10)]);
/// ```
pub fn detect_sprite_bounds(image: &RgbaImage, options: &SegmentOptions) -> Vec<BoundingBox> {
    if image.width() == 0 || image.height() == 0 {
        return Vec::new();
    }
    let boxes = match options.algorithm {
        SegmentAlgorithm::FloodFill => flood_fill_bounds(image, options),
        SegmentAlgorithm::ConnectedComponents => connected_component_bounds(image, options),
    };
    debug!(
        algorithm = ?options.algorithm,
        regions = boxes.len(),
        "segmentation finished"
    );
    boxes
}

fn flood_fill_bounds(image: &RgbaImage, options: &SegmentOptions) -> Vec<BoundingBox> {
    let (width, height) = image.dimensions();
    let mut visited = vec![false; (width as usize) * (height as usize)];
    let mut boxes = Vec::new();

    for y in 0..height {
        for x in 0..width {
            if boxes.len() >= options.max_sprites {
                return boxes;
            }
            let index = (y * width + x) as usize;
            if visited[index] || is_background(image, x, y, &options.background) {
                continue;
            }
            let bounds = flood_fill(image, x, y, &mut visited, &options.background);
            if bounds.width >= options.min_width && bounds.height >= options.min_height {
                boxes.push(bounds);
            }
        }
    }
    boxes
}

/// Iterative stack-based fill from one seed, accumulating the region's
/// bounding extent. Capped at [`FLOOD_FILL_PIXEL_CAP`] pixels per run.
fn flood_fill(
    image: &RgbaImage,
    start_x: u32,
    start_y: u32,
    visited: &mut [bool],
    background: &BackgroundSpec,
) -> BoundingBox {
    let (width, height) = image.dimensions();
    let mut stack = vec![(start_x, start_y)];
    let (mut left, mut top, mut right, mut bottom) = (start_x, start_y, start_x, start_y);
    let mut pixel_count = 0usize;

    while let Some((x, y)) = stack.pop() {
        if pixel_count >= FLOOD_FILL_PIXEL_CAP {
            trace!(start_x, start_y, "flood fill pixel cap reached");
            break;
        }
        let index = (y * width + x) as usize;
        if visited[index] || is_background(image, x, y, background) {
            continue;
        }
        visited[index] = true;
        pixel_count += 1;

        left = left.min(x);
        right = right.max(x);
        top = top.min(y);
        bottom = bottom.max(y);

        if x + 1 < width {
            stack.push((x + 1, y));
        }
        if x > 0 {
            stack.push((x - 1, y));
        }
        if y + 1 < height {
            stack.push((x, y + 1));
        }
        if y > 0 {
            stack.push((x, y - 1));
        }
    }

    BoundingBox::new(left, top, right - left + 1, bottom - top + 1)
}

/// Disjoint-set over component labels with path compression. Union keeps the
/// smaller label as root, so every pixel resolves to the minimum label of its
/// equivalence class.
struct UnionFind {
    parent: Vec<u32>,
}

impl UnionFind {
    fn new() -> Self {
        // Label 0 is the background sentinel and its own root.
        Self { parent: vec![0] }
    }

    fn make_label(&mut self) -> u32 {
        let label = self.parent.len() as u32;
        self.parent.push(label);
        label
    }

    fn find(&mut self, label: u32) -> u32 {
        let mut root = label;
        while self.parent[root as usize] != root {
            root = self.parent[root as usize];
        }
        // Path compression
        let mut current = label;
        while self.parent[current as usize] != root {
            let next = self.parent[current as usize];
            self.parent[current as usize] = root;
            current = next;
        }
        root
    }

    fn union(&mut self, a: u32, b: u32) {
        let root_a = self.find(a);
        let root_b = self.find(b);
        if root_a == root_b {
            return;
        }
        let (low, high) = if root_a < root_b {
            (root_a, root_b)
        } else {
            (root_b, root_a)
        };
        self.parent[high as usize] = low;
    }
}

fn connected_component_bounds(image: &RgbaImage, options: &SegmentOptions) -> Vec<BoundingBox> {
    let (width, height) = image.dimensions();
    let mut labels = vec![0u32; (width as usize) * (height as usize)];
    let mut uf = UnionFind::new();

    // First pass: assign labels from left/top neighbors, recording
    // equivalences where they disagree.
    for y in 0..height {
        for x in 0..width {
            let index = (y * width + x) as usize;
            if is_background(image, x, y, &options.background) {
                continue;
            }
            let left = if x > 0 { labels[index - 1] } else { 0 };
            let top = if y > 0 {
                labels[index - width as usize]
            } else {
                0
            };
            labels[index] = match (left, top) {
                (0, 0) => uf.make_label(),
                (label, 0) | (0, label) => label,
                (left, top) => {
                    if left != top {
                        uf.union(left, top);
                    }
                    left.min(top)
                }
            };
        }
    }

    // Second pass: resolve each label to its class minimum and accumulate
    // bounding extents, keeping first-encounter order.
    let mut order: Vec<u32> = Vec::new();
    let mut extents: HashMap<u32, (u32, u32, u32, u32)> = HashMap::new();
    for y in 0..height {
        for x in 0..width {
            let index = (y * width + x) as usize;
            let label = labels[index];
            if label == 0 {
                continue;
            }
            let root = uf.find(label);
            match extents.get_mut(&root) {
                Some((min_x, min_y, max_x, max_y)) => {
                    *min_x = (*min_x).min(x);
                    *min_y = (*min_y).min(y);
                    *max_x = (*max_x).max(x);
                    *max_y = (*max_y).max(y);
                }
                None => {
                    order.push(root);
                    extents.insert(root, (x, y, x, y));
                }
            }
        }
    }

    let mut boxes = Vec::new();
    for root in order {
        if boxes.len() >= options.max_sprites {
            break;
        }
        let (min_x, min_y, max_x, max_y) = extents[&root];
        let bounds = BoundingBox::new(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1);
        if bounds.width >= options.min_width && bounds.height >= options.min_height {
            boxes.push(bounds);
        }
    }
    boxes
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use pretty_assertions::assert_eq;

    /// Three opaque 10x10 squares on a transparent 100x30 canvas.
    fn three_squares() -> RgbaImage {
        let squares = [(5u32, 5u32), (40, 10), (75, 12)];
        RgbaImage::from_fn(100, 30, |x, y| {
            for (i, (sx, sy)) in squares.iter().enumerate() {
                if (*sx..sx + 10).contains(&x) && (*sy..sy + 10).contains(&y) {
                    return Rgba([50 + 60 * i as u8, 80, 120, 255]);
                }
            }
            Rgba([0, 0, 0, 0])
        })
    }

    fn sorted(mut boxes: Vec<BoundingBox>) -> Vec<BoundingBox> {
        boxes.sort_by_key(|b| (b.y, b.x));
        boxes
    }

    #[test]
    fn test_flood_fill_finds_three_squares() {
        let boxes = detect_sprite_bounds(&three_squares(), &SegmentOptions::default());
        assert_eq!(boxes.len(), 3);
        for b in &boxes {
            assert_eq!((b.width, b.height), (10, 10));
        }
    }

    #[test]
    fn test_both_algorithms_agree() {
        let img = three_squares();
        let flood = detect_sprite_bounds(&img, &SegmentOptions::default());
        let components = detect_sprite_bounds(
            &img,
            &SegmentOptions {
                algorithm: SegmentAlgorithm::ConnectedComponents,
                ..SegmentOptions::default()
            },
        );
        assert_eq!(sorted(flood), sorted(components));
    }

    #[test]
    fn test_min_size_filter_drops_specks() {
        // A 3x3 speck next to a 10x10 sprite.
        let img = RgbaImage::from_fn(40, 20, |x, y| {
            let in_speck = (2..5).contains(&x) && (2..5).contains(&y);
            let in_sprite = (20..30).contains(&x) && (5..15).contains(&y);
            if in_speck || in_sprite {
                Rgba([255, 0, 0, 255])
            } else {
                Rgba([0, 0, 0, 0])
            }
        });
        for algorithm in [SegmentAlgorithm::FloodFill, SegmentAlgorithm::ConnectedComponents] {
            let boxes = detect_sprite_bounds(
                &img,
                &SegmentOptions {
                    algorithm,
                    ..SegmentOptions::default()
                },
            );
            assert_eq!(boxes, vec![BoundingBox::new(20, 5, 10, 10)]);
        }
    }

    #[test]
    fn test_max_sprites_caps_discovery() {
        let img = three_squares();
        for algorithm in [SegmentAlgorithm::FloodFill, SegmentAlgorithm::ConnectedComponents] {
            let boxes = detect_sprite_bounds(
                &img,
                &SegmentOptions {
                    max_sprites: 2,
                    algorithm,
                    ..SegmentOptions::default()
                },
            );
            assert_eq!(boxes.len(), 2);
        }
    }

    #[test]
    fn test_color_background_mode() {
        // Dark sprite on an off-white background, no alpha.
        let img = RgbaImage::from_fn(30, 30, |x, y| {
            if (10..20).contains(&x) && (10..20).contains(&y) {
                Rgba([20, 20, 20, 255])
            } else {
                Rgba([250, 252, 249, 255])
            }
        });
        let options = SegmentOptions {
            background: BackgroundSpec::color([255, 255, 255], 20),
            ..SegmentOptions::default()
        };
        let boxes = detect_sprite_bounds(&img, &options);
        assert_eq!(boxes, vec![BoundingBox::new(10, 10, 10, 10)]);
    }

    #[test]
    fn test_u_shaped_region_merges_labels() {
        // A U shape forces a label equivalence in the two-pass algorithm:
        // both uprights are labeled separately before the base joins them.
        let img = RgbaImage::from_fn(30, 30, |x, y| {
            let uprights = ((2..10).contains(&x) || (18..26).contains(&x)) && (2..26).contains(&y);
            let base = (2..26).contains(&x) && (18..26).contains(&y);
            if uprights || base {
                Rgba([10, 200, 10, 255])
            } else {
                Rgba([0, 0, 0, 0])
            }
        });
        let boxes = detect_sprite_bounds(
            &img,
            &SegmentOptions {
                algorithm: SegmentAlgorithm::ConnectedComponents,
                ..SegmentOptions::default()
            },
        );
        assert_eq!(boxes, vec![BoundingBox::new(2, 2, 24, 24)]);
    }

    #[test]
    fn test_diagonal_pixels_are_separate_regions() {
        // 4-connectivity: diagonally touching blocks stay distinct.
        let img = RgbaImage::from_fn(40, 40, |x, y| {
            let a = (0..10).contains(&x) && (0..10).contains(&y);
            let b = (10..20).contains(&x) && (10..20).contains(&y);
            if a || b {
                Rgba([255, 255, 255, 255])
            } else {
                Rgba([0, 0, 0, 0])
            }
        });
        for algorithm in [SegmentAlgorithm::FloodFill, SegmentAlgorithm::ConnectedComponents] {
            let boxes = detect_sprite_bounds(
                &img,
                &SegmentOptions {
                    algorithm,
                    ..SegmentOptions::default()
                },
            );
            assert_eq!(boxes.len(), 2);
        }
    }

    #[test]
    fn test_empty_and_degenerate_images() {
        let transparent = RgbaImage::from_pixel(50, 50, Rgba([0, 0, 0, 0]));
        assert!(detect_sprite_bounds(&transparent, &SegmentOptions::default()).is_empty());

        let zero = RgbaImage::new(0, 0);
        assert!(detect_sprite_bounds(&zero, &SegmentOptions::default()).is_empty());
    }

    #[test]
    fn test_union_find_resolves_to_minimum() {
        let mut uf = UnionFind::new();
        let a = uf.make_label();
        let b = uf.make_label();
        let c = uf.make_label();
        uf.union(c, b);
        uf.union(b, a);
        assert_eq!(uf.find(c), a);
        assert_eq!(uf.find(b), a);
    }
}

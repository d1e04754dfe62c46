//! Region post-processing: crop a region to its non-background content,
//! merge boxes into an enclosing box, split a box into an even sub-grid, and
//! slice regions or uniform grid cells out of a sheet as fresh images.

use std::cmp::Reverse;

use image::{imageops, RgbaImage};
use tracing::{debug, trace};

use crate::classify::{is_background, BackgroundSpec};
use crate::segment::{detect_sprite_bounds, SegmentOptions};
use crate::{BoundingBox, SpriteError};

/// Options for [`crop_to_content`].
///
/// The default background spec matches the original padding-removal behavior:
/// transparency with a tight color tolerance of 10.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropOptions {
    pub background: BackgroundSpec,
    /// Floor for the cropped width; an all-background region yields a
    /// `min_width x min_height` empty canvas instead of failing.
    pub min_width: u32,
    pub min_height: u32,
}

impl Default for CropOptions {
    fn default() -> Self {
        Self {
            background: BackgroundSpec {
                tolerance: 10,
                ..BackgroundSpec::default()
            },
            min_width: 1,
            min_height: 1,
        }
    }
}

/// Sort order applied to region boxes before slicing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortBy {
    /// Top-to-bottom, then left-to-right.
    #[default]
    Position,
    /// Largest combined width+height first.
    Size,
    /// Largest area first.
    Area,
}

/// Options for [`slice_regions`] and [`slice_grid`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SliceOptions {
    pub sort_by: SortBy,
    /// Crop each slice to its non-background content. Off in the derived
    /// `Default`; [`SliceOptions::new`] turns it on.
    pub crop_to_content: bool,
    pub crop: CropOptions,
}

impl SliceOptions {
    pub fn new() -> Self {
        Self {
            sort_by: SortBy::Position,
            crop_to_content: true,
            crop: CropOptions::default(),
        }
    }
}

/// Options for [`split_box`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitOptions {
    /// Round fractional cell geometry to whole pixels in simple-division
    /// mode; when false, fractional coordinates truncate.
    pub round_to_pixels: bool,
    /// Give each of the first `remainder` rows/columns one extra pixel so the
    /// cells exactly tile the box. Simple division does not guarantee that.
    pub distribute_remainder: bool,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            round_to_pixels: true,
            distribute_remainder: true,
        }
    }
}

/// Scans for the tight bounding box of non-background pixels; `None` when the
/// whole region is background.
pub fn content_bounds(image: &RgbaImage, background: &BackgroundSpec) -> Option<BoundingBox> {
    let (width, height) = image.dimensions();
    let mut bounds: Option<(u32, u32, u32, u32)> = None;
    for y in 0..height {
        for x in 0..width {
            if is_background(image, x, y, background) {
                continue;
            }
            bounds = Some(match bounds {
                None => (x, y, x, y),
                Some((min_x, min_y, max_x, max_y)) => {
                    (min_x.min(x), min_y.min(y), max_x.max(x), max_y.max(y))
                }
            });
        }
    }
    bounds.map(|(min_x, min_y, max_x, max_y)| {
        BoundingBox::new(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1)
    })
}

/// Crops an image to its non-background content.
///
/// An all-background input degrades to a transparent `min_width x min_height`
/// canvas; content smaller than the floor is padded up to it.
///
/// # Example
/// ```
/// use image::{Rgba, RgbaImage};
/// use spritegrid::{crop_to_content, CropOptions};
///
/// let img = RgbaImage::from_fn(10, 10, |x, y| {
///     if (3..7).contains(&x) && (4..9).contains(&y) {
///         Rgba([255, 0, 0, 255])
///     } else {
///         Rgba([0, 0, 0, 0])
///     }
/// });
/// let cropped = crop_to_content(&img, &CropOptions::default());
/// assert_eq!(cropped.dimensions(), (4, 5));
/// ```
pub fn crop_to_content(image: &RgbaImage, options: &CropOptions) -> RgbaImage {
    let min_width = options.min_width.max(1);
    let min_height = options.min_height.max(1);
    match content_bounds(image, &options.background) {
        Some(bounds) => {
            trace!(?bounds, "cropping to content");
            let cropped =
                imageops::crop_imm(image, bounds.x, bounds.y, bounds.width, bounds.height)
                    .to_image();
            if cropped.width() >= min_width && cropped.height() >= min_height {
                cropped
            } else {
                let mut canvas = RgbaImage::new(
                    cropped.width().max(min_width),
                    cropped.height().max(min_height),
                );
                imageops::replace(&mut canvas, &cropped, 0, 0);
                canvas
            }
        }
        None => {
            trace!("no content found, returning minimal canvas");
            RgbaImage::new(min_width, min_height)
        }
    }
}

/// Returns the smallest box enclosing the selected boxes, expanded by
/// `padding` and clamped to a non-negative origin.
///
/// Indices pointing outside `boxes` are ignored; an empty selection is a
/// caller error.
pub fn merge_boxes(
    boxes: &[BoundingBox],
    indices: &[usize],
    padding: u32,
) -> Result<BoundingBox, SpriteError> {
    let selected: Vec<&BoundingBox> = indices.iter().filter_map(|&i| boxes.get(i)).collect();
    if selected.is_empty() {
        return Err(SpriteError::EmptySelection);
    }

    let min_x = selected
        .iter()
        .map(|b| b.x)
        .min()
        .unwrap_or(0)
        .saturating_sub(padding);
    let min_y = selected
        .iter()
        .map(|b| b.y)
        .min()
        .unwrap_or(0)
        .saturating_sub(padding);
    let max_x = selected.iter().map(|b| b.right()).max().unwrap_or(0) + padding;
    let max_y = selected.iter().map(|b| b.bottom()).max().unwrap_or(0) + padding;

    Ok(BoundingBox::new(
        min_x,
        min_y,
        max_x - min_x,
        max_y - min_y,
    ))
}

/// Partitions a box into a `rows x cols` sub-grid.
///
/// With `distribute_remainder` the first `remainder` rows/columns each get
/// one extra pixel, so the cells exactly tile the source box for any
/// `rows, cols >= 1`. Zero rows or columns is a caller error.
///
/// # Example
/// ```
/// use spritegrid::{split_box, BoundingBox, SplitOptions};
///
/// let cells = split_box(
///     &BoundingBox::new(0, 0, 10, 10),
///     3,
///     3,
///     &SplitOptions::default(),
/// )
/// .unwrap();
/// assert_eq!(cells.len(), 9);
/// assert_eq!(cells.iter().map(|c| c.area()).sum::<u64>(), 100);
/// ```
pub fn split_box(
    bounds: &BoundingBox,
    rows: u32,
    cols: u32,
    options: &SplitOptions,
) -> Result<Vec<BoundingBox>, SpriteError> {
    if rows == 0 || cols == 0 {
        return Err(SpriteError::InvalidGrid { rows, cols });
    }
    let mut cells = Vec::with_capacity((rows as usize) * (cols as usize));

    if options.distribute_remainder {
        let base_width = bounds.width / cols;
        let extra_cols = bounds.width % cols;
        let base_height = bounds.height / rows;
        let extra_rows = bounds.height % rows;

        let mut current_y = bounds.y;
        for row in 0..rows {
            let cell_height = base_height + u32::from(row < extra_rows);
            let mut current_x = bounds.x;
            for col in 0..cols {
                let cell_width = base_width + u32::from(col < extra_cols);
                cells.push(BoundingBox::new(current_x, current_y, cell_width, cell_height));
                current_x += cell_width;
            }
            current_y += cell_height;
        }
    } else {
        let cell_width = bounds.width as f32 / cols as f32;
        let cell_height = bounds.height as f32 / rows as f32;
        let quantize = |v: f32| {
            if options.round_to_pixels {
                v.round() as u32
            } else {
                v as u32
            }
        };
        for row in 0..rows {
            for col in 0..cols {
                let cell_x = bounds.x as f32 + col as f32 * cell_width;
                let cell_y = bounds.y as f32 + row as f32 * cell_height;
                cells.push(BoundingBox::new(
                    quantize(cell_x),
                    quantize(cell_y),
                    quantize(cell_width),
                    quantize(cell_height),
                ));
            }
        }
    }
    Ok(cells)
}

/// The cell box of a uniform partition of an `image_width x image_height`
/// sheet. The last row and column absorb any remainder pixels.
pub fn grid_cell(
    image_width: u32,
    image_height: u32,
    row: u32,
    col: u32,
    rows: u32,
    cols: u32,
) -> Result<BoundingBox, SpriteError> {
    if rows == 0 || cols == 0 {
        return Err(SpriteError::InvalidGrid { rows, cols });
    }
    if row >= rows || col >= cols {
        return Err(SpriteError::CellOutOfRange {
            row,
            col,
            rows,
            cols,
        });
    }
    let cell_width = image_width / cols;
    let cell_height = image_height / rows;
    let x = col * cell_width;
    let y = row * cell_height;
    let width = if col + 1 == cols {
        image_width - x
    } else {
        cell_width
    };
    let height = if row + 1 == rows {
        image_height - y
    } else {
        cell_height
    };
    Ok(BoundingBox::new(x, y, width, height))
}

/// Sorts boxes in place by the requested order.
pub fn sort_boxes(boxes: &mut [BoundingBox], sort_by: SortBy) {
    match sort_by {
        SortBy::Position => boxes.sort_by_key(|b| (b.y, b.x)),
        SortBy::Size => boxes.sort_by_key(|b| Reverse(b.width + b.height)),
        SortBy::Area => boxes.sort_by_key(|b| Reverse(b.area())),
    }
}

/// Crops each box out of the sheet as a fresh image, in the requested order.
///
/// Boxes are clamped to the image; boxes entirely outside it are skipped.
/// Each returned pair carries the (clamped) source box alongside the pixels.
pub fn slice_regions(
    image: &RgbaImage,
    boxes: &[BoundingBox],
    options: &SliceOptions,
) -> Vec<(RgbaImage, BoundingBox)> {
    let mut ordered = boxes.to_vec();
    sort_boxes(&mut ordered, options.sort_by);

    ordered
        .into_iter()
        .filter_map(|bounds| {
            let clamped = bounds.clamp_to(image.width(), image.height())?;
            let view = imageops::crop_imm(image, clamped.x, clamped.y, clamped.width, clamped.height)
                .to_image();
            let sprite = if options.crop_to_content {
                crop_to_content(&view, &options.crop)
            } else {
                view
            };
            Some((sprite, clamped))
        })
        .collect()
}

/// Detects region bounds and slices them in one call.
pub fn slice_detected_regions(
    image: &RgbaImage,
    segment: &SegmentOptions,
    options: &SliceOptions,
) -> Vec<(RgbaImage, BoundingBox)> {
    let boxes = detect_sprite_bounds(image, segment);
    debug!(regions = boxes.len(), "slicing detected regions");
    slice_regions(image, &boxes, options)
}

/// Extracts every cell of a uniform partition, in row-major order.
pub fn slice_grid(
    image: &RgbaImage,
    rows: u32,
    cols: u32,
    options: &SliceOptions,
) -> Result<Vec<(RgbaImage, BoundingBox)>, SpriteError> {
    if rows == 0 || cols == 0 {
        return Err(SpriteError::InvalidGrid { rows, cols });
    }
    let mut slices = Vec::with_capacity((rows as usize) * (cols as usize));
    for row in 0..rows {
        for col in 0..cols {
            let bounds = grid_cell(image.width(), image.height(), row, col, rows, cols)?;
            let view = imageops::crop_imm(image, bounds.x, bounds.y, bounds.width, bounds.height)
                .to_image();
            let sprite = if options.crop_to_content {
                crop_to_content(&view, &options.crop)
            } else {
                view
            };
            slices.push((sprite, bounds));
        }
    }
    Ok(slices)
}

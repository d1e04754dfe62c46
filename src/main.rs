use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use spritegrid::{
    auto_detect_grid, detect_grid, slice_detected_regions, slice_grid, BackgroundSpec,
    DetectorConfig, SegmentAlgorithm, SegmentOptions, SliceOptions,
};

#[derive(Parser)]
#[command(name = "spritegrid", version, about = "Sprite sheet grid inference and slicing")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Detect the most likely uniform grid of a sheet.
    Detect {
        /// Path to the sprite sheet image.
        image: PathBuf,

        /// Save a copy of the sheet with the detected grid drawn on it.
        #[cfg(feature = "drawing")]
        #[arg(long)]
        overlay: Option<PathBuf>,
    },

    /// Slice a sheet into uniform grid cells and export them as PNG files.
    Slice {
        /// Path to the sprite sheet image.
        image: PathBuf,

        /// Number of rows; auto-detected when omitted.
        #[arg(long)]
        rows: Option<u32>,

        /// Number of columns; auto-detected when omitted.
        #[arg(long)]
        cols: Option<u32>,

        /// Directory for the exported cells.
        #[arg(long, default_value = "sprites")]
        out_dir: PathBuf,

        /// Filename prefix for the exported cells.
        #[arg(long, default_value = "sprite")]
        prefix: String,

        /// Keep full cell geometry instead of cropping to content.
        #[arg(long)]
        no_crop: bool,
    },

    /// Segment irregular sprite regions and export them as PNG files.
    Regions {
        /// Path to the sprite sheet image.
        image: PathBuf,

        /// Region segmentation algorithm.
        #[arg(long, value_enum, default_value_t = Algorithm::FloodFill)]
        algorithm: Algorithm,

        /// Minimum region width in pixels.
        #[arg(long, default_value_t = 8)]
        min_width: u32,

        /// Minimum region height in pixels.
        #[arg(long, default_value_t = 8)]
        min_height: u32,

        /// Stop after this many regions.
        #[arg(long, default_value_t = 1000)]
        max_sprites: usize,

        /// Treat this color as background instead of transparency, as "r,g,b".
        #[arg(long, value_delimiter = ',', num_args = 3)]
        background_color: Option<Vec<u8>>,

        /// Per-channel tolerance for background color matching.
        #[arg(long, default_value_t = 20)]
        tolerance: u8,

        /// Directory for the exported regions.
        #[arg(long, default_value = "sprites")]
        out_dir: PathBuf,

        /// Filename prefix for the exported regions.
        #[arg(long, default_value = "sprite")]
        prefix: String,

        /// Keep full region geometry instead of cropping to content.
        #[arg(long)]
        no_crop: bool,

        /// Save a copy of the sheet with the region boxes drawn on it.
        #[cfg(feature = "drawing")]
        #[arg(long)]
        overlay: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Algorithm {
    FloodFill,
    ConnectedComponents,
}

impl From<Algorithm> for SegmentAlgorithm {
    fn from(value: Algorithm) -> Self {
        match value {
            Algorithm::FloodFill => SegmentAlgorithm::FloodFill,
            Algorithm::ConnectedComponents => SegmentAlgorithm::ConnectedComponents,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    match Cli::parse().command {
        Command::Detect {
            image,
            #[cfg(feature = "drawing")]
            overlay,
        } => {
            let img = image::open(&image)
                .with_context(|| format!("Failed to open image {}", image.display()))?
                .to_rgba8();
            let detection = detect_grid(&img, &DetectorConfig::default());
            println!(
                "{} rows x {} cols (confidence {:.2})",
                detection.rows, detection.cols, detection.confidence
            );

            #[cfg(feature = "drawing")]
            if let Some(path) = overlay {
                let path = path.to_string_lossy();
                spritegrid::debug::save_image_with_grid(
                    &img,
                    &detection.grid(),
                    &path,
                    &spritegrid::drawing::OverlayConfig::default(),
                )
                .context("Failed to save grid overlay")?;
                println!("Overlay written to {path}");
            }
        }

        Command::Slice {
            image,
            rows,
            cols,
            out_dir,
            prefix,
            no_crop,
        } => {
            let img = image::open(&image)
                .with_context(|| format!("Failed to open image {}", image.display()))?
                .to_rgba8();

            let (rows, cols) = match (rows, cols) {
                (Some(r), Some(c)) => (r, c),
                _ => {
                    let grid = auto_detect_grid(&img);
                    (rows.unwrap_or(grid.rows), cols.unwrap_or(grid.cols))
                }
            };

            let options = SliceOptions {
                crop_to_content: !no_crop,
                ..SliceOptions::new()
            };
            let slices = slice_grid(&img, rows, cols, &options)?;

            fs::create_dir_all(&out_dir)
                .with_context(|| format!("Failed to create {}", out_dir.display()))?;
            for (index, (sprite, _)) in slices.iter().enumerate() {
                let (row, col) = (index as u32 / cols, index as u32 % cols);
                let path = out_dir.join(format!("{prefix}_r{row:02}_c{col:02}.png"));
                sprite
                    .save(&path)
                    .with_context(|| format!("Failed to save {}", path.display()))?;
            }
            println!(
                "Sliced {} cells ({rows} rows x {cols} cols) into {}",
                slices.len(),
                out_dir.display()
            );
        }

        Command::Regions {
            image,
            algorithm,
            min_width,
            min_height,
            max_sprites,
            background_color,
            tolerance,
            out_dir,
            prefix,
            no_crop,
            #[cfg(feature = "drawing")]
            overlay,
        } => {
            let img = image::open(&image)
                .with_context(|| format!("Failed to open image {}", image.display()))?
                .to_rgba8();

            let background = match background_color {
                Some(rgb) => BackgroundSpec::color([rgb[0], rgb[1], rgb[2]], tolerance),
                None => BackgroundSpec {
                    tolerance,
                    ..BackgroundSpec::transparent()
                },
            };
            let segment = SegmentOptions {
                background,
                min_width,
                min_height,
                max_sprites,
                algorithm: algorithm.into(),
            };
            let options = SliceOptions {
                crop_to_content: !no_crop,
                ..SliceOptions::new()
            };
            let slices = slice_detected_regions(&img, &segment, &options);

            fs::create_dir_all(&out_dir)
                .with_context(|| format!("Failed to create {}", out_dir.display()))?;
            for (index, (sprite, _)) in slices.iter().enumerate() {
                let path = out_dir.join(format!("{prefix}_{index:03}.png"));
                sprite
                    .save(&path)
                    .with_context(|| format!("Failed to save {}", path.display()))?;
            }
            println!("Extracted {} regions into {}", slices.len(), out_dir.display());

            #[cfg(feature = "drawing")]
            if let Some(path) = overlay {
                let boxes: Vec<_> = slices.iter().map(|(_, bounds)| *bounds).collect();
                let path = path.to_string_lossy();
                spritegrid::debug::save_image_with_boxes(
                    &img,
                    &boxes,
                    &path,
                    &spritegrid::drawing::OverlayConfig::default(),
                )
                .context("Failed to save region overlay")?;
                println!("Overlay written to {path}");
            }
        }
    }

    Ok(())
}

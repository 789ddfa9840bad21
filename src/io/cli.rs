//! Command-line interface for tiling and reassembling PNG files
//!
//! Each image is decomposed with the requested geometry and pieced back
//! together, producing a preview of what a reconstruction with that geometry
//! covers. Undefined cells show up as transparent pixels.

use crate::io::configuration::{
    DEFAULT_BORDER, DEFAULT_PATCH_SIZE, DEFAULT_STEP, OUTPUT_SUFFIX, PROGRESS_UPDATE_INTERVAL,
};
use crate::io::error::{Result, path_error};
use crate::io::image::{export_score_map, load_grayscale};
use crate::io::progress::ProgressManager;
use crate::pipeline::config::TilingConfig;
use crate::tiling::normalize::normalize_in_place;
use crate::tiling::reassemble::{
    MeanBlend, coverage_fraction, piece_together_observed, piece_together_par,
};
use crate::tiling::sampler::sample_patches;
use clap::Parser;
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "patchmaker")]
#[command(
    author,
    version,
    about = "Split images into overlapping patches and piece them back together"
)]
/// Command-line arguments for the tiling preview tool
// Each flag toggles an independent stage of the run
#[allow(clippy::struct_excessive_bools)]
pub struct Cli {
    /// Input PNG file or directory to process
    #[arg(value_name = "TARGET")]
    pub target: PathBuf,

    /// Edge length of the square patches
    #[arg(short, long, default_value_t = DEFAULT_PATCH_SIZE)]
    pub patch_size: usize,

    /// Anchor spacing (defaults to the interior width when a border is set)
    #[arg(short, long)]
    pub step: Option<usize>,

    /// Cells trimmed from each patch edge before reassembly
    #[arg(short, long, default_value_t = DEFAULT_BORDER)]
    pub border: usize,

    /// Min-max normalize every patch before reassembly
    #[arg(short, long)]
    pub normalize: bool,

    /// Accumulate patches on all cores (disables per-file progress)
    #[arg(long)]
    pub parallel: bool,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,

    /// Process files even if output exists
    #[arg(long)]
    pub no_skip: bool,
}

impl Cli {
    /// Check if existing output files should be skipped
    pub const fn skip_existing(&self) -> bool {
        !self.no_skip
    }

    /// Check if progress should be displayed
    pub const fn should_show_progress(&self) -> bool {
        !self.quiet
    }

    /// Default log filter for the chosen verbosity
    pub const fn log_level(&self) -> &'static str {
        if self.quiet { "warn" } else { "info" }
    }

    /// Tiling geometry described by the arguments
    ///
    /// Without an explicit step, a non-zero border derives the step from the
    /// patch interior so trimmed patches tile edge to edge.
    ///
    /// # Errors
    ///
    /// Returns `InvalidGeometry` if the geometry is unusable.
    pub fn tiling_config(&self) -> Result<TilingConfig> {
        let patch_shape = (self.patch_size, self.patch_size);
        let config = match (self.step, self.border) {
            (Some(step), border) => TilingConfig::new(patch_shape, step).with_border(border),
            (None, 0) => TilingConfig::new(patch_shape, DEFAULT_STEP),
            (None, border) => TilingConfig::from_border(patch_shape, border)?,
        };
        config.validate()?;
        Ok(config)
    }
}

/// Orchestrates batch processing of PNG files with progress tracking
pub struct FileProcessor {
    cli: Cli,
    config: TilingConfig,
    progress_manager: Option<ProgressManager>,
}

impl FileProcessor {
    /// Create a new file processor with the given CLI arguments
    ///
    /// # Errors
    ///
    /// Returns `InvalidGeometry` if the arguments describe an unusable tiling.
    pub fn new(cli: Cli) -> Result<Self> {
        let config = cli.tiling_config()?;
        let progress_manager = cli.should_show_progress().then(ProgressManager::new);

        Ok(Self {
            cli,
            config,
            progress_manager,
        })
    }

    /// Geometry used for every file
    pub const fn config(&self) -> &TilingConfig {
        &self.config
    }

    /// Process files according to CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if target validation or file processing fails
    pub fn process(&mut self) -> Result<()> {
        let files = self.collect_files()?;

        if files.is_empty() {
            return Ok(());
        }

        if let Some(ref mut pm) = self.progress_manager {
            pm.initialize(files.len());
        }

        for (index, file) in files.iter().enumerate() {
            self.process_file(file, index)?;
        }

        if let Some(ref mut pm) = self.progress_manager {
            pm.finish();
        }

        Ok(())
    }

    fn collect_files(&self) -> Result<Vec<PathBuf>> {
        if self.cli.target.is_file() {
            if Self::is_png(&self.cli.target) {
                if self.should_process_file(&self.cli.target) {
                    Ok(vec![self.cli.target.clone()])
                } else {
                    Ok(vec![])
                }
            } else {
                Err(path_error(&self.cli.target, "Target file must be a PNG image"))
            }
        } else if self.cli.target.is_dir() {
            let mut files = Vec::new();
            for entry in std::fs::read_dir(&self.cli.target)? {
                let path = entry?.path();
                if Self::is_png(&path)
                    && !Self::is_output(&path)
                    && self.should_process_file(&path)
                {
                    files.push(path);
                }
            }
            files.sort();
            Ok(files)
        } else {
            Err(path_error(
                &self.cli.target,
                "Target must be a PNG file or directory",
            ))
        }
    }

    fn is_png(path: &Path) -> bool {
        path.extension().and_then(|s| s.to_str()) == Some("png")
    }

    fn is_output(path: &Path) -> bool {
        path.file_stem()
            .and_then(|s| s.to_str())
            .is_some_and(|stem| stem.ends_with(OUTPUT_SUFFIX))
    }

    fn should_process_file(&self, input_path: &Path) -> bool {
        if !self.cli.skip_existing() {
            return true;
        }

        if Self::get_output_path(input_path).exists() {
            info!("Skipping: {} (output exists)", input_path.display());
            false
        } else {
            true
        }
    }

    fn process_file(&mut self, input_path: &Path, index: usize) -> Result<()> {
        let start_time = Instant::now();
        let output_path = Self::get_output_path(input_path);

        let image = load_grayscale(input_path)?;
        let coords = self.config.grid(image.dim())?.to_vec();
        let mut patches = sample_patches(&coords, &image, self.config.patch_shape)?;
        if self.cli.normalize {
            for patch in &mut patches {
                normalize_in_place(patch);
            }
        }

        if let Some(ref mut pm) = self.progress_manager {
            pm.start_file(index, input_path, coords.len());
        }

        let options = self.config.reassembly(Some(image.dim()));
        let reconstruction = if self.cli.parallel {
            piece_together_par(&patches, &coords, &options, &MeanBlend)?
        } else {
            let total = patches.len();
            let mut progress = self.progress_manager.as_mut();
            piece_together_observed(&patches, &coords, &options, &MeanBlend, |done| {
                if (done % PROGRESS_UPDATE_INTERVAL == 0 || done == total)
                    && let Some(pm) = progress.as_mut()
                {
                    pm.update_patches(index, done);
                }
            })?
        };

        export_score_map(&reconstruction, &output_path)?;

        let coverage = coverage_fraction(&reconstruction);
        if coverage < 1.0 {
            warn!(
                "{}: {:.2}% of cells received no patch data",
                input_path.display(),
                (1.0 - coverage) * 100.0
            );
        }
        info!(
            "{}: {} patches -> {} in {:.2?}",
            input_path.display(),
            coords.len(),
            output_path.display(),
            start_time.elapsed()
        );

        if let Some(ref mut pm) = self.progress_manager {
            pm.complete_file(index);
        }

        Ok(())
    }

    /// Output path for an input image (`<stem>_tiled.png` next to it)
    pub fn get_output_path(input_path: &Path) -> PathBuf {
        let stem = input_path.file_stem().unwrap_or_default();
        let output_name = format!("{}{}.png", stem.to_string_lossy(), OUTPUT_SUFFIX);

        if let Some(parent) = input_path.parent() {
            parent.join(output_name)
        } else {
            PathBuf::from(output_name)
        }
    }
}

//! Multi-file progress tracking with automatic batching for large sets

use crate::io::configuration::MAX_INDIVIDUAL_PROGRESS_BARS;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::LazyLock;

/// Reassembly progress of a single file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileState {
    /// Display name (file name, prefixed with a check mark when done)
    pub name: String,
    /// Patches accumulated so far
    pub patches_done: usize,
    /// Patches in the file's tiling
    pub patches_total: usize,
}

/// Coordinates progress display for batch operations
///
/// Shows one bar per file for small batches and adds an overall file counter
/// once the batch outgrows the visible bars.
pub struct ProgressManager {
    multi_progress: MultiProgress,
    batch_bar: Option<ProgressBar>,
    file_bars: Vec<ProgressBar>,
    file_states: Vec<FileState>,
}

impl Default for ProgressManager {
    fn default() -> Self {
        Self::new()
    }
}

static PATCH_STYLE: LazyLock<ProgressStyle> = LazyLock::new(|| {
    ProgressStyle::default_bar()
        .template("{msg} [{bar:30.cyan/blue}] {prefix}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏ ")
});

static BATCH_STYLE: LazyLock<ProgressStyle> = LazyLock::new(|| {
    ProgressStyle::default_bar()
        .template("[{elapsed_precise}] Files: [{bar:40.cyan/blue}] {pos}/{len}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
});

impl ProgressManager {
    /// Create a new progress manager
    pub fn new() -> Self {
        Self {
            multi_progress: MultiProgress::new(),
            batch_bar: None,
            file_bars: Vec::new(),
            file_states: Vec::new(),
        }
    }

    /// Create progress bars for `file_count` files
    pub fn initialize(&mut self, file_count: usize) {
        if file_count > MAX_INDIVIDUAL_PROGRESS_BARS + 1 {
            let batch_bar = ProgressBar::new(file_count as u64);
            batch_bar.set_style(BATCH_STYLE.clone());
            self.batch_bar = Some(self.multi_progress.add(batch_bar));
        }

        for _ in 0..file_count.min(MAX_INDIVIDUAL_PROGRESS_BARS) {
            let pb = ProgressBar::new(0);
            pb.set_style(PATCH_STYLE.clone());
            self.file_bars.push(self.multi_progress.add(pb));
        }
    }

    /// Register a file about to be reassembled from `patches_total` patches
    pub fn start_file(&mut self, index: usize, path: &Path, patches_total: usize) {
        let name = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        if index >= self.file_states.len() {
            self.file_states.resize(index + 1, FileState::default());
        }
        if let Some(state) = self.file_states.get_mut(index) {
            *state = FileState {
                name,
                patches_done: 0,
                patches_total,
            };
        }
        self.update_bars();
    }

    /// Report how many patches of a file have been accumulated
    pub fn update_patches(&mut self, index: usize, patches_done: usize) {
        if let Some(state) = self.file_states.get_mut(index) {
            state.patches_done = patches_done.min(state.patches_total);
        }
        self.update_bars();
    }

    /// Mark file as completed and update batch progress
    pub fn complete_file(&mut self, index: usize) {
        if let Some(ref batch_bar) = self.batch_bar {
            batch_bar.inc(1);
        }
        if let Some(state) = self.file_states.get_mut(index) {
            state.name = format!("✓ {}", state.name);
            state.patches_done = state.patches_total;
        }
        self.update_bars();
    }

    /// Tracked state of every started file
    pub fn file_states(&self) -> &[FileState] {
        &self.file_states
    }

    /// Clean up all progress displays
    pub fn finish(&self) {
        if let Some(ref batch_bar) = self.batch_bar {
            batch_bar.finish_with_message("All files processed");
        }
        let _ = self.multi_progress.clear();
    }

    // Show the most recently started files on the available bars
    fn update_bars(&self) {
        let active: Vec<&FileState> = self
            .file_states
            .iter()
            .filter(|state| !state.name.is_empty())
            .collect();
        let start = active.len().saturating_sub(MAX_INDIVIDUAL_PROGRESS_BARS);
        let visible = active.get(start..).unwrap_or(&[]);

        for (bar, state) in self.file_bars.iter().zip(visible) {
            bar.set_length(state.patches_total as u64);
            bar.set_position(state.patches_done as u64);
            let width = state.patches_total.to_string().len();
            bar.set_message(format!(
                "{:>width$}/{}",
                state.patches_done, state.patches_total
            ));
            bar.set_prefix(state.name.clone());
        }

        for bar in self.file_bars.iter().skip(visible.len()) {
            bar.set_length(0);
            bar.set_position(0);
            bar.set_message(String::new());
            bar.set_prefix(String::new());
        }
    }
}

//! Tiling constants and runtime configuration defaults

// Geometry used by the segmentation network the library was built for
/// Default patch edge length in pixels (patches are square by default)
pub const DEFAULT_PATCH_SIZE: usize = 48;
/// Default anchor spacing between neighbouring patches
pub const DEFAULT_STEP: usize = 10;
/// Default number of cells trimmed from each patch edge during reassembly
pub const DEFAULT_BORDER: usize = 0;

/// Added to the min-max range so constant patches normalize to zero
pub const NORMALIZE_EPSILON: f64 = 1e-10;

// Progress bar display settings
/// Threshold for switching to batch progress mode
pub const MAX_INDIVIDUAL_PROGRESS_BARS: usize = 5;

// Output settings
/// Suffix added to output filenames
pub const OUTPUT_SUFFIX: &str = "_tiled";
/// Alpha value written for cells that received data
pub const COVERED_ALPHA: u8 = 255;
/// Number of accumulated patches between progress bar refreshes
pub const PROGRESS_UPDATE_INTERVAL: usize = 64;

//! Patch tiling and reconstruction for large 2-D images
//!
//! Images are split into a regular grid of fixed-size, possibly overlapping
//! patches and later pieced back together from per-patch outputs. Overlaps are
//! averaged, patch borders can be trimmed, and cells no patch reaches are
//! reported as NaN.

#![forbid(unsafe_code)]

/// Input/output operations, configuration and error handling
pub mod io;
/// Batch construction and whole-image prediction on top of the tiling core
pub mod pipeline;
/// Coordinate generation, sampling, normalization and reassembly
pub mod tiling;

pub use io::error::{PatchError, Result};

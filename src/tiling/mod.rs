//! Patch tiling and reconstruction
//!
//! This module contains the array-level building blocks:
//! - Anchor generation for regular and random tilings
//! - Bounds-checked patch sampling and batch stacking
//! - Per-patch normalization and label encoding
//! - Overlap-averaging reassembly with border trimming

/// Patch anchor generation
pub mod coords;
/// Label patch preparation
pub mod labels;
/// Per-patch min-max normalization
pub mod normalize;
/// Accumulator-based reconstruction of full images
pub mod reassemble;
/// Patch extraction from source images
pub mod sampler;

pub use coords::{Coord, CoordinateGrid, generate};
pub use normalize::normalize;
pub use reassemble::{Accumulator, Blend, MeanBlend, ReassemblyOptions, piece_together};
pub use sampler::sample_patches;

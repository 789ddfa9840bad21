//! Error types for tiling, reassembly and file operations

use std::fmt;
use std::path::PathBuf;

use crate::tiling::coords::Coord;

/// Main error type for all patchmaker operations
#[derive(Debug)]
pub enum PatchError {
    /// Step, patch or shape parameters are nonsensical
    ///
    /// Raised for a zero step, a zero-sized patch, a patch larger than the
    /// image, mismatched patch/coordinate counts, or arrays with fewer than
    /// two axes.
    InvalidGeometry {
        /// Name of the offending parameter
        parameter: &'static str,
        /// Provided value that failed validation
        value: String,
        /// Explanation of why the value is invalid
        reason: String,
    },

    /// A coordinate's patch would read outside the source image
    OutOfBounds {
        /// Offending top-left anchor
        coord: Coord,
        /// Patch shape (rows, cols)
        patch_shape: (usize, usize),
        /// Spatial shape of the image being sampled (rows, cols)
        image_shape: (usize, usize),
    },

    /// Array shapes could not be combined
    Shape {
        /// Operation that produced the shape error
        operation: &'static str,
        /// Underlying ndarray error
        source: ndarray::ShapeError,
    },

    /// An external model returned unusable output
    Model {
        /// Description of what was wrong with the model output
        reason: String,
    },

    /// Failed to load source image from filesystem
    ImageLoad {
        /// Path to the image file
        path: PathBuf,
        /// Underlying image loading error
        source: image::ImageError,
    },

    /// Failed to save reconstructed image to disk
    ImageExport {
        /// Path where export was attempted
        path: PathBuf,
        /// Underlying image export error
        source: image::ImageError,
    },

    /// General file system operation failure
    FileSystem {
        /// Path involved in the operation
        path: PathBuf,
        /// Description of the operation that failed
        operation: &'static str,
        /// Underlying I/O error
        source: std::io::Error,
    },
}

impl fmt::Display for PatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidGeometry {
                parameter,
                value,
                reason,
            } => {
                write!(f, "Invalid geometry '{parameter}' = '{value}': {reason}")
            }
            Self::OutOfBounds {
                coord,
                patch_shape,
                image_shape,
            } => {
                write!(
                    f,
                    "Patch {}x{} at ({}, {}) exceeds image bounds {}x{}",
                    patch_shape.0,
                    patch_shape.1,
                    coord.row,
                    coord.col,
                    image_shape.0,
                    image_shape.1
                )
            }
            Self::Shape { operation, source } => {
                write!(f, "Shape error during {operation}: {source}")
            }
            Self::Model { reason } => {
                write!(f, "Model output rejected: {reason}")
            }
            Self::ImageLoad { path, source } => {
                write!(f, "Failed to load image '{}': {source}", path.display())
            }
            Self::ImageExport { path, source } => {
                write!(
                    f,
                    "Failed to export image to '{}': {source}",
                    path.display()
                )
            }
            Self::FileSystem {
                path,
                operation,
                source,
            } => {
                write!(
                    f,
                    "File system error during {operation} on '{}': {source}",
                    path.display()
                )
            }
        }
    }
}

impl std::error::Error for PatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ImageLoad { source, .. } | Self::ImageExport { source, .. } => Some(source),
            Self::FileSystem { source, .. } => Some(source),
            Self::Shape { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Convenience type alias for patchmaker results
pub type Result<T> = std::result::Result<T, PatchError>;

impl From<std::io::Error> for PatchError {
    fn from(err: std::io::Error) -> Self {
        Self::FileSystem {
            path: PathBuf::from("<unknown>"),
            operation: "unknown",
            source: err,
        }
    }
}

/// Create an invalid geometry error
pub fn invalid_geometry(
    parameter: &'static str,
    value: &impl ToString,
    reason: &impl ToString,
) -> PatchError {
    PatchError::InvalidGeometry {
        parameter,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Create a model output error
pub fn model_error(reason: &impl ToString) -> PatchError {
    PatchError::Model {
        reason: reason.to_string(),
    }
}

/// Create an invalid path error for CLI target validation
pub fn path_error(path: impl Into<PathBuf>, msg: &str) -> PatchError {
    PatchError::FileSystem {
        path: path.into(),
        operation: "validate target",
        source: std::io::Error::new(std::io::ErrorKind::InvalidInput, msg.to_string()),
    }
}

//! Explicit tiling geometry shared by decomposition and reconstruction

use crate::io::configuration::{DEFAULT_BORDER, DEFAULT_PATCH_SIZE, DEFAULT_STEP};
use crate::io::error::{Result, invalid_geometry};
use crate::tiling::coords::{CoordinateGrid, generate};
use crate::tiling::reassemble::ReassemblyOptions;

/// Patch geometry for one tiling run
///
/// Passed to every pipeline call so that sampling and reassembly always agree
/// on patch size, stride and trimmed border.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TilingConfig {
    /// Patch shape (rows, cols)
    pub patch_shape: (usize, usize),
    /// Anchor spacing on both axes
    pub step: usize,
    /// Cells discarded from each patch edge when reassembling
    pub border: usize,
}

impl Default for TilingConfig {
    fn default() -> Self {
        Self {
            patch_shape: (DEFAULT_PATCH_SIZE, DEFAULT_PATCH_SIZE),
            step: DEFAULT_STEP,
            border: DEFAULT_BORDER,
        }
    }
}

impl TilingConfig {
    /// Geometry with no border trimming
    pub const fn new(patch_shape: (usize, usize), step: usize) -> Self {
        Self {
            patch_shape,
            step,
            border: 0,
        }
    }

    /// Trim `border` cells from each patch edge during reassembly
    pub const fn with_border(mut self, border: usize) -> Self {
        self.border = border;
        self
    }

    /// Geometry whose trimmed interiors tile the image edge to edge
    ///
    /// The step is the interior width, `min(patch) - 2 * border`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidGeometry` if the border leaves no interior.
    pub fn from_border(patch_shape: (usize, usize), border: usize) -> Result<Self> {
        let step = border
            .checked_mul(2)
            .and_then(|trim| patch_shape.0.min(patch_shape.1).checked_sub(trim))
            .filter(|&step| step > 0)
            .ok_or_else(|| {
                invalid_geometry(
                    "border",
                    &border,
                    &format!(
                        "leaves no interior in a {}x{} patch",
                        patch_shape.0, patch_shape.1
                    ),
                )
            })?;
        Ok(Self {
            patch_shape,
            step,
            border,
        })
    }

    /// Check the geometry is usable independent of any image
    ///
    /// # Errors
    ///
    /// Returns `InvalidGeometry` if the step or a patch dimension is zero, or
    /// the border trims a patch away entirely.
    pub fn validate(&self) -> Result<()> {
        if self.step == 0 {
            return Err(invalid_geometry("step", &self.step, &"step must be positive"));
        }
        let (rows, cols) = self.patch_shape;
        if rows == 0 || cols == 0 {
            return Err(invalid_geometry(
                "patch_shape",
                &format!("{rows}x{cols}"),
                &"patch dimensions must be positive",
            ));
        }
        if self.border.saturating_mul(2) >= rows.min(cols) {
            return Err(invalid_geometry(
                "border",
                &self.border,
                &format!("leaves no interior in a {rows}x{cols} patch"),
            ));
        }
        Ok(())
    }

    /// Anchor grid for an image of the given spatial shape
    ///
    /// # Errors
    ///
    /// Returns `InvalidGeometry` if the geometry is invalid or the patch does
    /// not fit the image.
    pub fn grid(&self, shape: (usize, usize)) -> Result<CoordinateGrid> {
        self.validate()?;
        generate(shape, self.patch_shape, self.step)
    }

    /// Reassembly options matching this geometry
    pub const fn reassembly(&self, target_shape: Option<(usize, usize)>) -> ReassemblyOptions {
        ReassemblyOptions {
            target_shape,
            border: self.border,
        }
    }
}

//! Patch anchor generation
//!
//! Produces the top-left anchors of a regular tiling. The last anchor on each
//! axis is always pinned to the far edge so that no uncovered strip remains
//! when the free extent is not a multiple of the step.

use log::debug;
use rand::Rng;

use crate::io::error::{Result, invalid_geometry};

/// Top-left corner of a patch within an image
///
/// `row` runs along axis 0 and `col` along axis 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coord {
    /// Offset along axis 0
    pub row: usize,
    /// Offset along axis 1
    pub col: usize,
}

impl Coord {
    /// Create a coordinate from row and column offsets
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Check whether a patch anchored here stays inside `shape`
    ///
    /// Anchors so large that the patch end overflows never fit.
    pub const fn fits(&self, shape: (usize, usize), patch_shape: (usize, usize)) -> bool {
        match (
            self.row.checked_add(patch_shape.0),
            self.col.checked_add(patch_shape.1),
        ) {
            (Some(row_end), Some(col_end)) => row_end <= shape.0 && col_end <= shape.1,
            _ => false,
        }
    }
}

impl From<(usize, usize)> for Coord {
    fn from((row, col): (usize, usize)) -> Self {
        Self { row, col }
    }
}

/// Regular grid of patch anchors
///
/// Stores only the per-axis anchor lists; coordinates are produced lazily in
/// row-major order and the grid can be iterated any number of times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinateGrid {
    row_anchors: Vec<usize>,
    col_anchors: Vec<usize>,
}

impl CoordinateGrid {
    /// Anchors along axis 0
    pub fn row_anchors(&self) -> &[usize] {
        &self.row_anchors
    }

    /// Anchors along axis 1
    pub fn col_anchors(&self) -> &[usize] {
        &self.col_anchors
    }

    /// Total number of coordinates in the grid
    pub const fn len(&self) -> usize {
        self.row_anchors.len() * self.col_anchors.len()
    }

    /// Whether the grid holds no coordinates
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate coordinates row-major (outer rows, inner columns)
    pub fn iter(&self) -> impl Iterator<Item = Coord> + '_ {
        self.row_anchors.iter().flat_map(move |&row| {
            self.col_anchors
                .iter()
                .map(move |&col| Coord::new(row, col))
        })
    }

    /// Materialize the grid as an ordered coordinate set
    pub fn to_vec(&self) -> Vec<Coord> {
        self.iter().collect()
    }
}

impl<'a> IntoIterator for &'a CoordinateGrid {
    type Item = Coord;
    type IntoIter = Box<dyn Iterator<Item = Coord> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

fn validate_geometry(shape: (usize, usize), patch_shape: (usize, usize)) -> Result<()> {
    if patch_shape.0 == 0 || patch_shape.1 == 0 {
        return Err(invalid_geometry(
            "patch_shape",
            &format!("{}x{}", patch_shape.0, patch_shape.1),
            &"patch dimensions must be positive",
        ));
    }
    if patch_shape.0 > shape.0 || patch_shape.1 > shape.1 {
        return Err(invalid_geometry(
            "patch_shape",
            &format!("{}x{}", patch_shape.0, patch_shape.1),
            &format!("patch exceeds image shape {}x{}", shape.0, shape.1),
        ));
    }
    Ok(())
}

// Stride anchors plus the far edge when the stride misses it
fn axis_anchors(extent: usize, patch: usize, step: usize) -> Vec<usize> {
    let last = extent - patch;
    let mut anchors: Vec<usize> = (0..=last).step_by(step).collect();
    if anchors.last() != Some(&last) {
        anchors.push(last);
    }
    anchors
}

/// Generate a regular tiling of `shape` with patches of `patch_shape`
///
/// Anchors are placed every `step` cells on both axes starting at the origin,
/// and the final anchor on each axis is exactly `extent - patch`.
///
/// # Errors
///
/// Returns `InvalidGeometry` if:
/// - `step` is zero
/// - either patch dimension is zero
/// - the patch is larger than `shape` on either axis
pub fn generate(
    shape: (usize, usize),
    patch_shape: (usize, usize),
    step: usize,
) -> Result<CoordinateGrid> {
    if step == 0 {
        return Err(invalid_geometry(
            "step",
            &step,
            &"step must be positive",
        ));
    }
    validate_geometry(shape, patch_shape)?;

    let grid = CoordinateGrid {
        row_anchors: axis_anchors(shape.0, patch_shape.0, step),
        col_anchors: axis_anchors(shape.1, patch_shape.1, step),
    };
    debug!(
        "Generated {}x{} anchor grid for {}x{} image (patch {}x{}, step {step})",
        grid.row_anchors.len(),
        grid.col_anchors.len(),
        shape.0,
        shape.1,
        patch_shape.0,
        patch_shape.1
    );
    Ok(grid)
}

/// Draw `n` uniformly random in-bounds anchors
///
/// Used for building training batches where a regular grid would
/// over-represent the same image regions.
///
/// # Errors
///
/// Returns `InvalidGeometry` if either patch dimension is zero or the patch is
/// larger than `shape`.
pub fn random_coords<R: Rng + ?Sized>(
    shape: (usize, usize),
    patch_shape: (usize, usize),
    n: usize,
    rng: &mut R,
) -> Result<Vec<Coord>> {
    validate_geometry(shape, patch_shape)?;

    let max_row = shape.0 - patch_shape.0;
    let max_col = shape.1 - patch_shape.1;
    Ok((0..n)
        .map(|_| Coord::new(rng.random_range(0..=max_row), rng.random_range(0..=max_col)))
        .collect())
}

//! Bounds-checked patch extraction
//!
//! Patches are owned copies so they can be normalized or otherwise mutated
//! without touching the source image. Only the first two axes are windowed;
//! trailing channel axes are carried through whole.

use ndarray::{Array, ArrayBase, ArrayView, Axis, Data, Dimension, RemoveAxis, Slice};

use crate::io::error::{PatchError, Result, invalid_geometry};
use crate::tiling::coords::Coord;

/// Spatial extent (axis 0, axis 1) of an array with at least two axes
///
/// # Errors
///
/// Returns `InvalidGeometry` if the array has fewer than two axes.
pub fn spatial_shape<S, D>(array: &ArrayBase<S, D>) -> Result<(usize, usize)>
where
    S: Data,
    D: Dimension,
{
    if array.ndim() < 2 {
        return Err(invalid_geometry(
            "ndim",
            &array.ndim(),
            &"arrays need at least two spatial axes",
        ));
    }
    Ok((array.len_of(Axis(0)), array.len_of(Axis(1))))
}

// Caller guarantees the window lies within the array
pub(crate) fn spatial_window<A, S, D>(
    array: &ArrayBase<S, D>,
    origin: Coord,
    extent: (usize, usize),
) -> ArrayView<'_, A, D>
where
    S: Data<Elem = A>,
    D: Dimension,
{
    array.slice_each_axis(|axis| match axis.axis.index() {
        0 => Slice::from(origin.row..origin.row + extent.0),
        1 => Slice::from(origin.col..origin.col + extent.1),
        _ => Slice::from(..),
    })
}

/// Extract one patch per coordinate, in coordinate order
///
/// Every coordinate is checked before any copying happens, so a failing call
/// allocates nothing.
///
/// # Errors
///
/// Returns:
/// - `InvalidGeometry` if the image has fewer than two axes or a patch
///   dimension is zero
/// - `OutOfBounds` naming the first coordinate whose patch leaves the image
pub fn sample_patches<A, S, D>(
    coords: &[Coord],
    image: &ArrayBase<S, D>,
    patch_shape: (usize, usize),
) -> Result<Vec<Array<A, D>>>
where
    A: Clone,
    S: Data<Elem = A>,
    D: Dimension,
{
    let image_shape = spatial_shape(image)?;
    if patch_shape.0 == 0 || patch_shape.1 == 0 {
        return Err(invalid_geometry(
            "patch_shape",
            &format!("{}x{}", patch_shape.0, patch_shape.1),
            &"patch dimensions must be positive",
        ));
    }

    if let Some(&coord) = coords
        .iter()
        .find(|coord| !coord.fits(image_shape, patch_shape))
    {
        return Err(PatchError::OutOfBounds {
            coord,
            patch_shape,
            image_shape,
        });
    }

    Ok(coords
        .iter()
        .map(|&coord| spatial_window(image, coord, patch_shape).to_owned())
        .collect())
}

/// Stack equally shaped patches into a batch along a new leading axis
///
/// # Errors
///
/// Returns `InvalidGeometry` for an empty list and `Shape` if the patches do
/// not share one shape.
pub fn stack_patches<A, S, D>(patches: &[ArrayBase<S, D>]) -> Result<Array<A, D::Larger>>
where
    A: Clone,
    S: Data<Elem = A>,
    D: Dimension,
    D::Larger: RemoveAxis,
{
    if patches.is_empty() {
        return Err(invalid_geometry(
            "patches",
            &0,
            &"cannot stack an empty patch list",
        ));
    }
    let views: Vec<ArrayView<'_, A, D>> = patches.iter().map(|patch| patch.view()).collect();
    ndarray::stack(Axis(0), &views).map_err(|source| PatchError::Shape {
        operation: "stack patches",
        source,
    })
}

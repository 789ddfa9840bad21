//! Reconstruction of full images from per-coordinate patches
//!
//! Contributions are collected in an accumulator pair (running sum and
//! contribution count, both shaped like the canvas) and resolved cell by cell
//! once every patch has been added. Cells nobody wrote to resolve to NaN.
//!
//! Writes are clipped to the canvas rather than rejected: partial
//! reconstructions from coordinate sets that do not match the canvas exactly
//! are a normal use case. Only malformed inputs (count mismatch, empty input,
//! inconsistent channel axes) are errors.

use log::debug;
use ndarray::{Array, ArrayBase, Axis, AxisDescription, Data, Dimension, Slice, Zip};
use num_traits::Float;
use rayon::prelude::*;

use crate::io::error::{PatchError, Result, invalid_geometry};
use crate::tiling::coords::Coord;
use crate::tiling::sampler::spatial_shape;

/// Policy for combining overlapping contributions to one cell
///
/// Accumulation must be order independent: the parallel path folds disjoint
/// subsets and joins them with [`Blend::merge`].
pub trait Blend<A> {
    /// Fold `value` into `acc`, where `count` contributions were already folded
    fn accumulate(&self, acc: A, value: A, count: u32) -> A;

    /// Join two partial accumulators covering disjoint contribution sets
    fn merge(&self, left: A, left_count: u32, right: A, right_count: u32) -> A;

    /// Produce the final cell value; `count` is always positive
    fn resolve(&self, acc: A, count: u32) -> A;
}

/// Equal-weight arithmetic mean of all contributions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MeanBlend;

impl<A: Float> Blend<A> for MeanBlend {
    fn accumulate(&self, acc: A, value: A, _count: u32) -> A {
        acc + value
    }

    fn merge(&self, left: A, _left_count: u32, right: A, _right_count: u32) -> A {
        left + right
    }

    fn resolve(&self, acc: A, count: u32) -> A {
        acc / A::from(count).unwrap_or_else(A::one)
    }
}

/// Canvas and trimming parameters for one reassembly call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReassemblyOptions {
    /// Explicit canvas shape; inferred from patch extents when `None`
    pub target_shape: Option<(usize, usize)>,
    /// Cells trimmed from each of the four patch edges before accumulating
    pub border: usize,
}

impl ReassemblyOptions {
    /// Options with an inferred canvas and no trimming
    pub const fn new() -> Self {
        Self {
            target_shape: None,
            border: 0,
        }
    }

    /// Use an explicit canvas shape
    pub const fn with_target_shape(mut self, shape: (usize, usize)) -> Self {
        self.target_shape = Some(shape);
        self
    }

    /// Trim `border` cells from every patch edge
    pub const fn with_border(mut self, border: usize) -> Self {
        self.border = border;
        self
    }
}

// Source offset, destination offset and length of one clipped write along an axis
#[derive(Debug, Clone, Copy)]
struct Span {
    src: usize,
    dst: usize,
    len: usize,
}

impl Span {
    fn clipped(anchor: usize, extent: usize, border: usize, canvas: usize) -> Option<Self> {
        let interior = border
            .checked_mul(2)
            .and_then(|trim| extent.checked_sub(trim))
            .filter(|&interior| interior > 0)?;
        let dst = anchor.checked_add(border).filter(|&dst| dst < canvas)?;
        Some(Self {
            src: border,
            dst,
            len: interior.min(canvas - dst),
        })
    }
}

/// Running sum and contribution count over a canvas
///
/// Both buffers share the canvas shape, channel axes included.
#[derive(Debug, Clone)]
pub struct Accumulator<A, D: Dimension> {
    sum: Array<A, D>,
    count: Array<u32, D>,
}

impl<A: Float, D: Dimension> Accumulator<A, D> {
    /// Zero-filled accumulator over `canvas`
    ///
    /// # Errors
    ///
    /// Returns `InvalidGeometry` if the canvas has fewer than two axes.
    pub fn new(canvas: D) -> Result<Self> {
        if canvas.ndim() < 2 {
            return Err(invalid_geometry(
                "canvas",
                &format!("{:?}", canvas.slice()),
                &"canvas needs at least two spatial axes",
            ));
        }
        Ok(Self {
            sum: Array::zeros(canvas.clone()),
            count: Array::zeros(canvas),
        })
    }

    /// Full canvas shape
    pub fn shape(&self) -> &[usize] {
        self.sum.shape()
    }

    /// Number of contributions received by each cell
    pub const fn counts(&self) -> &Array<u32, D> {
        &self.count
    }

    /// Add the border-trimmed interior of `patch` anchored at `coord`
    ///
    /// The interior lands at `coord + border`; any part past the canvas edge is
    /// dropped. Returns whether any cell received a contribution.
    ///
    /// # Errors
    ///
    /// Returns `InvalidGeometry` if the patch's channel axes differ from the
    /// canvas's.
    pub fn add<S, B>(
        &mut self,
        patch: &ArrayBase<S, D>,
        coord: Coord,
        border: usize,
        blend: &B,
    ) -> Result<bool>
    where
        S: Data<Elem = A>,
        B: Blend<A> + ?Sized,
    {
        if patch.shape().get(2..) != self.sum.shape().get(2..) {
            return Err(invalid_geometry(
                "patch",
                &format!("{:?}", patch.shape()),
                &format!("channel axes do not match canvas {:?}", self.sum.shape()),
            ));
        }

        let rows = Span::clipped(
            coord.row,
            patch.len_of(Axis(0)),
            border,
            self.sum.len_of(Axis(0)),
        );
        let cols = Span::clipped(
            coord.col,
            patch.len_of(Axis(1)),
            border,
            self.sum.len_of(Axis(1)),
        );
        let (Some(rows), Some(cols)) = (rows, cols) else {
            return Ok(false);
        };

        let source = patch.slice_each_axis(|axis| match axis.axis.index() {
            0 => Slice::from(rows.src..rows.src + rows.len),
            1 => Slice::from(cols.src..cols.src + cols.len),
            _ => Slice::from(..),
        });
        let target = |axis: AxisDescription| match axis.axis.index() {
            0 => Slice::from(rows.dst..rows.dst + rows.len),
            1 => Slice::from(cols.dst..cols.dst + cols.len),
            _ => Slice::from(..),
        };

        Zip::from(self.sum.slice_each_axis_mut(target))
            .and(self.count.slice_each_axis_mut(target))
            .and(&source)
            .for_each(|sum, count, &value| {
                *sum = blend.accumulate(*sum, value, *count);
                *count += 1;
            });
        Ok(true)
    }

    /// Join another accumulator over the same canvas into this one
    ///
    /// # Errors
    ///
    /// Returns `InvalidGeometry` if the canvases differ.
    pub fn merge<B>(mut self, other: Self, blend: &B) -> Result<Self>
    where
        B: Blend<A> + ?Sized,
    {
        if self.sum.shape() != other.sum.shape() {
            return Err(invalid_geometry(
                "accumulator",
                &format!("{:?}", other.sum.shape()),
                &format!("canvas differs from {:?}", self.sum.shape()),
            ));
        }
        Zip::from(&mut self.sum)
            .and(&mut self.count)
            .and(&other.sum)
            .and(&other.count)
            .for_each(|sum, count, &other_sum, &other_count| {
                *sum = blend.merge(*sum, *count, other_sum, other_count);
                *count += other_count;
            });
        Ok(self)
    }

    /// Collapse the accumulator pair into the final image
    ///
    /// Cells without contributions become NaN.
    pub fn resolve<B>(self, blend: &B) -> Array<A, D>
    where
        B: Blend<A> + ?Sized,
    {
        Zip::from(&self.sum)
            .and(&self.count)
            .map_collect(|&sum, &count| {
                if count == 0 {
                    A::nan()
                } else {
                    blend.resolve(sum, count)
                }
            })
    }
}

/// Whether a reconstructed cell received no data
pub fn is_undefined<A: Float>(value: A) -> bool {
    value.is_nan()
}

/// Fraction of cells in a reconstruction that hold data
pub fn coverage_fraction<A, S, D>(image: &ArrayBase<S, D>) -> f64
where
    A: Float,
    S: Data<Elem = A>,
    D: Dimension,
{
    if image.is_empty() {
        return 0.0;
    }
    let defined = image.iter().filter(|&&value| !is_undefined(value)).count();
    defined as f64 / image.len() as f64
}

fn plan_canvas<S, D>(
    patches: &[ArrayBase<S, D>],
    coords: &[Coord],
    options: &ReassemblyOptions,
) -> Result<D>
where
    S: Data,
    D: Dimension,
{
    if patches.len() != coords.len() {
        return Err(invalid_geometry(
            "patches",
            &patches.len(),
            &format!("expected one patch per coordinate ({} coordinates)", coords.len()),
        ));
    }
    let first = patches.first().ok_or_else(|| {
        invalid_geometry(
            "patches",
            &0,
            &"at least one patch is needed to determine the canvas",
        )
    })?;
    spatial_shape(first)?;

    if let Some(odd) = patches
        .iter()
        .find(|patch| patch.shape().get(2..) != first.shape().get(2..))
    {
        return Err(invalid_geometry(
            "patches",
            &format!("{:?}", odd.shape()),
            &format!("channel axes differ from first patch {:?}", first.shape()),
        ));
    }

    let (rows, cols) = options.target_shape.unwrap_or_else(|| {
        patches
            .iter()
            .zip(coords)
            .fold((0, 0), |(rows, cols), (patch, coord)| {
                (
                    rows.max(coord.row.saturating_add(patch.len_of(Axis(0)))),
                    cols.max(coord.col.saturating_add(patch.len_of(Axis(1)))),
                )
            })
    });

    let mut canvas = first.raw_dim();
    if let [canvas_rows, canvas_cols, ..] = canvas.slice_mut() {
        *canvas_rows = rows;
        *canvas_cols = cols;
    }
    let cells = canvas
        .slice()
        .iter()
        .try_fold(1usize, |cells, &len| cells.checked_mul(len))
        .filter(|&cells| isize::try_from(cells).is_ok());
    if cells.is_none() {
        return Err(invalid_geometry(
            "canvas",
            &format!("{rows}x{cols}"),
            &"canvas is too large to allocate",
        ));
    }
    debug!(
        "Reassembling {} patches onto {rows}x{cols} canvas (border {}, {})",
        patches.len(),
        options.border,
        if options.target_shape.is_some() {
            "explicit shape"
        } else {
            "inferred shape"
        }
    );
    Ok(canvas)
}

/// Reassemble patches with a custom blending policy
///
/// # Errors
///
/// Returns `InvalidGeometry` if the patch and coordinate counts differ, no
/// patches are given, or patches disagree on their channel axes.
pub fn piece_together_with<A, S, D, B>(
    patches: &[ArrayBase<S, D>],
    coords: &[Coord],
    options: &ReassemblyOptions,
    blend: &B,
) -> Result<Array<A, D>>
where
    A: Float,
    S: Data<Elem = A>,
    D: Dimension,
    B: Blend<A> + ?Sized,
{
    piece_together_observed(patches, coords, options, blend, |_| {})
}

/// Reassemble patches sequentially, reporting progress after every patch
///
/// `on_patch` receives the number of patches accumulated so far, from 1 up to
/// `patches.len()`.
///
/// # Errors
///
/// Same conditions as [`piece_together_with`].
pub fn piece_together_observed<A, S, D, B, F>(
    patches: &[ArrayBase<S, D>],
    coords: &[Coord],
    options: &ReassemblyOptions,
    blend: &B,
    mut on_patch: F,
) -> Result<Array<A, D>>
where
    A: Float,
    S: Data<Elem = A>,
    D: Dimension,
    B: Blend<A> + ?Sized,
    F: FnMut(usize),
{
    let canvas = plan_canvas(patches, coords, options)?;
    let mut accumulator = Accumulator::new(canvas)?;

    let mut silent = 0usize;
    for (done, (patch, &coord)) in patches.iter().zip(coords).enumerate() {
        if !accumulator.add(patch, coord, options.border, blend)? {
            silent += 1;
        }
        on_patch(done + 1);
    }
    if silent > 0 {
        debug!(
            "{silent} of {} patches fell entirely outside the canvas or were trimmed away",
            patches.len()
        );
    }

    Ok(accumulator.resolve(blend))
}

/// Reassemble patches by averaging overlapping contributions
///
/// One patch per coordinate, in the same order. The canvas is
/// `options.target_shape` or the smallest shape covering every untrimmed
/// patch. Cells that receive no contribution are NaN.
///
/// # Errors
///
/// Returns `InvalidGeometry` if the patch and coordinate counts differ, no
/// patches are given, or patches disagree on their channel axes.
pub fn piece_together<A, S, D>(
    patches: &[ArrayBase<S, D>],
    coords: &[Coord],
    options: &ReassemblyOptions,
) -> Result<Array<A, D>>
where
    A: Float,
    S: Data<Elem = A>,
    D: Dimension,
{
    piece_together_with(patches, coords, options, &MeanBlend)
}

/// Parallel variant of [`piece_together_with`]
///
/// Each rayon worker fills its own accumulator pair; the partial pairs are
/// merged at the end. Matches the sequential result up to floating point
/// re-association of the sums.
///
/// # Errors
///
/// Same conditions as [`piece_together_with`].
pub fn piece_together_par<A, S, D, B>(
    patches: &[ArrayBase<S, D>],
    coords: &[Coord],
    options: &ReassemblyOptions,
    blend: &B,
) -> Result<Array<A, D>>
where
    A: Float + Send + Sync,
    S: Data<Elem = A>,
    ArrayBase<S, D>: Sync,
    D: Dimension,
    B: Blend<A> + Sync + ?Sized,
{
    let canvas = plan_canvas(patches, coords, options)?;
    let empty = Accumulator::new(canvas)?;

    let accumulator = patches
        .par_iter()
        .zip(coords.par_iter())
        .try_fold(
            || empty.clone(),
            |mut accumulator, (patch, &coord)| {
                accumulator.add(patch, coord, options.border, blend)?;
                Ok::<_, PatchError>(accumulator)
            },
        )
        .try_reduce(|| empty.clone(), |left, right| left.merge(right, blend))?;

    Ok(accumulator.resolve(blend))
}

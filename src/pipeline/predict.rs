//! Full-image prediction through an external patch model

use log::{debug, info};
use ndarray::{Array3, Array4, ArrayBase, ArrayView3, Axis, Data, Ix2};

use crate::io::error::{Result, model_error};
use crate::pipeline::batch::normalized_patches;
use crate::pipeline::config::TilingConfig;
use crate::tiling::reassemble::{coverage_fraction, piece_together};
use crate::tiling::sampler::stack_patches;

/// Anything that scores batches of normalized patches
pub trait PatchModel {
    /// Score a `(n, rows, cols)` batch, returning `(n, rows, cols, classes)`
    ///
    /// # Errors
    ///
    /// Implementations report their own failures as `PatchError::Model`.
    fn predict(&mut self, batch: ArrayView3<'_, f32>) -> Result<Array4<f32>>;
}

/// Model that echoes its input as a single-class score map
///
/// Useful for previewing what the network is fed and for checking the
/// reconstruction path without a trained model.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl PatchModel for Passthrough {
    fn predict(&mut self, batch: ArrayView3<'_, f32>) -> Result<Array4<f32>> {
        Ok(batch.insert_axis(Axis(3)).to_owned())
    }
}

/// Predict a per-class score map for a whole image
///
/// Tiles the image with `config`, normalizes each patch, scores the batch and
/// reassembles the per-patch scores onto a canvas of the image's shape with
/// `config.border` trimmed from every patch. Cells no trimmed patch reaches
/// are NaN.
///
/// # Errors
///
/// Returns:
/// - `InvalidGeometry` if the geometry is invalid or the image is smaller than
///   one patch
/// - `Model` if the model fails or returns scores of the wrong shape
pub fn predict_image<M, S>(
    model: &mut M,
    image: &ArrayBase<S, Ix2>,
    config: &TilingConfig,
) -> Result<Array3<f32>>
where
    M: PatchModel + ?Sized,
    S: Data<Elem = f32>,
{
    let coords = config.grid(image.dim())?.to_vec();
    let batch = stack_patches(&normalized_patches(image, &coords, config)?)?;

    let scores = model.predict(batch.view())?;
    let (count, rows, cols, classes) = scores.dim();
    if count != coords.len() {
        return Err(model_error(&format!(
            "expected {} score patches, got {count}",
            coords.len()
        )));
    }
    if (rows, cols) != config.patch_shape {
        return Err(model_error(&format!(
            "score patches are {rows}x{cols}, expected {}x{}",
            config.patch_shape.0, config.patch_shape.1
        )));
    }
    debug!("Model scored {count} patches with {classes} classes");

    let patches: Vec<ArrayView3<'_, f32>> = scores.outer_iter().collect();
    let score_map = piece_together(&patches, &coords, &config.reassembly(Some(image.dim())))?;
    info!(
        "Predicted {}x{} score map, {:.1}% covered",
        image.nrows(),
        image.ncols(),
        coverage_fraction(&score_map) * 100.0
    );
    Ok(score_map)
}

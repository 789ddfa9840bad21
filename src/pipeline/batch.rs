//! Model input and target batches from lists of images
//!
//! Every image is tiled with the same geometry. Input patches are normalized
//! individually; label patches are one-hot encoded with a class count shared
//! across the whole batch.

use log::debug;
use ndarray::{Array2, Array3, Array4, ArrayBase, Data, Ix2};
use num_traits::ToPrimitive;

use crate::io::error::{Result, invalid_geometry};
use crate::pipeline::config::TilingConfig;
use crate::tiling::coords::Coord;
use crate::tiling::labels::one_hot;
use crate::tiling::normalize::normalize_in_place;
use crate::tiling::sampler::{sample_patches, stack_patches};

// Sample and normalize the patches at `coords`
pub(crate) fn normalized_patches<S>(
    image: &ArrayBase<S, Ix2>,
    coords: &[Coord],
    config: &TilingConfig,
) -> Result<Vec<Array2<f32>>>
where
    S: Data<Elem = f32>,
{
    let mut patches = sample_patches(coords, image, config.patch_shape)?;
    for patch in &mut patches {
        normalize_in_place(patch);
    }
    Ok(patches)
}

/// Tile, normalize and stack images into an `(n, rows, cols)` batch
///
/// # Errors
///
/// Returns `InvalidGeometry` if the geometry is invalid, an image is smaller
/// than one patch, or no patches result.
pub fn build_input_batch<S>(images: &[ArrayBase<S, Ix2>], config: &TilingConfig) -> Result<Array3<f32>>
where
    S: Data<Elem = f32>,
{
    let mut patches = Vec::new();
    for image in images {
        let coords = config.grid(image.dim())?.to_vec();
        patches.extend(normalized_patches(image, &coords, config)?);
    }
    debug!(
        "Built input batch of {} patches from {} images",
        patches.len(),
        images.len()
    );
    stack_patches(&patches)
}

/// Tile label images and one-hot encode them into `(n, rows, cols, classes)`
///
/// With `classes = None` the class count is the largest label in any patch
/// plus one.
///
/// # Errors
///
/// Returns `InvalidGeometry` for invalid geometry, undersized images, invalid
/// labels, or an empty result.
pub fn build_label_batch<A, S>(
    labels: &[ArrayBase<S, Ix2>],
    config: &TilingConfig,
    classes: Option<usize>,
) -> Result<Array4<f32>>
where
    A: Copy + ToPrimitive,
    S: Data<Elem = A>,
{
    let mut patches = Vec::new();
    for label in labels {
        let coords = config.grid(label.dim())?.to_vec();
        patches.extend(sample_patches(&coords, label, config.patch_shape)?);
    }

    let classes = classes.or_else(|| {
        patches
            .iter()
            .flat_map(|patch| patch.iter())
            .filter_map(ToPrimitive::to_usize)
            .max()
            .map(|largest| largest + 1)
    });
    let encoded = patches
        .iter()
        .map(|patch| one_hot(patch, classes))
        .collect::<Result<Vec<_>>>()?;
    stack_patches(&encoded)
}

/// Paired input and target batches for training
///
/// # Errors
///
/// Returns `InvalidGeometry` if the lists differ in length or an image and its
/// label map differ in shape, plus any error of the two batch builders.
pub fn build_training_batch<S, T, A>(
    images: &[ArrayBase<S, Ix2>],
    labels: &[ArrayBase<T, Ix2>],
    config: &TilingConfig,
    classes: Option<usize>,
) -> Result<(Array3<f32>, Array4<f32>)>
where
    S: Data<Elem = f32>,
    A: Copy + ToPrimitive,
    T: Data<Elem = A>,
{
    if images.len() != labels.len() {
        return Err(invalid_geometry(
            "labels",
            &labels.len(),
            &format!("expected one label map per image ({} images)", images.len()),
        ));
    }
    if let Some((image, label)) = images
        .iter()
        .zip(labels)
        .find(|(image, label)| image.dim() != label.dim())
    {
        return Err(invalid_geometry(
            "labels",
            &format!("{:?}", label.dim()),
            &format!("label map does not match image shape {:?}", image.dim()),
        ));
    }

    Ok((
        build_input_batch(images, config)?,
        build_label_batch(labels, config, classes)?,
    ))
}

//! Segmentation label patches to per-class score targets

use ndarray::{Array3, ArrayBase, Axis, Data, DataMut, Dimension, Ix2, Zip};
use num_traits::ToPrimitive;

use crate::io::error::{Result, invalid_geometry};

/// Rewrite every occurrence of class `from` as class `into`
///
/// Used to fold annotation classes the model should not distinguish, such
/// as cell boundaries that are scored together with cell interiors.
pub fn merge_classes<A, S, D>(labels: &mut ArrayBase<S, D>, from: A, into: A)
where
    A: Copy + PartialEq,
    S: DataMut<Elem = A>,
    D: Dimension,
{
    labels.map_inplace(|label| {
        if *label == from {
            *label = into;
        }
    });
}

/// One-hot encode a 2-D label patch into `(rows, cols, classes)` scores
///
/// With `classes = None` the class count is the largest label plus one.
///
/// # Errors
///
/// Returns `InvalidGeometry` if:
/// - a label is not a non-negative integer (negative, fractional or NaN)
/// - a label is not below the class count
/// - `classes` is `None` and the patch is empty
pub fn one_hot<A, S>(labels: &ArrayBase<S, Ix2>, classes: Option<usize>) -> Result<Array3<f32>>
where
    A: Copy + ToPrimitive,
    S: Data<Elem = A>,
{
    let mut largest: Option<usize> = None;
    for label in labels {
        let index = label
            .to_usize()
            .filter(|&index| label.to_f64() == Some(index as f64))
            .ok_or_else(|| {
                invalid_geometry(
                    "labels",
                    &label.to_f64().unwrap_or(f64::NAN),
                    &"labels must be non-negative integers",
                )
            })?;
        largest = largest.max(Some(index));
    }

    let classes = match classes {
        Some(classes) => classes,
        None => largest.map(|index| index + 1).ok_or_else(|| {
            invalid_geometry(
                "labels",
                &"[]",
                &"cannot infer a class count from an empty patch",
            )
        })?,
    };
    if let Some(index) = largest.filter(|&index| index >= classes) {
        return Err(invalid_geometry(
            "labels",
            &index,
            &format!("label exceeds class count {classes}"),
        ));
    }

    let (rows, cols) = labels.dim();
    let mut scores = Array3::zeros((rows, cols, classes));
    Zip::from(scores.lanes_mut(Axis(2)))
        .and(labels)
        .for_each(|mut lane, label| {
            if let Some(score) = label.to_usize().and_then(|index| lane.get_mut(index)) {
                *score = 1.0;
            }
        });
    Ok(scores)
}

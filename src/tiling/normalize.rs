//! Per-patch min-max rescaling into the unit interval

use ndarray::{Array, ArrayBase, Data, DataMut, Dimension};
use num_traits::Float;

use crate::io::configuration::NORMALIZE_EPSILON;

/// Smallest and largest non-NaN values of an array
///
/// Returns `None` when the array is empty or holds only NaN.
pub fn value_range<A, S, D>(values: &ArrayBase<S, D>) -> Option<(A, A)>
where
    A: Float,
    S: Data<Elem = A>,
    D: Dimension,
{
    values
        .iter()
        .filter(|value| !value.is_nan())
        .fold(None, |range, &value| match range {
            None => Some((value, value)),
            Some((lo, hi)) => Some((lo.min(value), hi.max(value))),
        })
}

/// Rescale a patch in place to `(p - min) / (max - min + eps)`
///
/// Min and max are taken over every element, channels included. A constant
/// patch maps to zero. NaN elements are skipped when finding the range and
/// remain NaN.
pub fn normalize_in_place<A, S, D>(patch: &mut ArrayBase<S, D>)
where
    A: Float,
    S: DataMut<Elem = A>,
    D: Dimension,
{
    let Some((min, max)) = value_range(patch) else {
        return;
    };
    let eps = A::from(NORMALIZE_EPSILON).unwrap_or_else(A::epsilon);
    let scale = max - min + eps;
    patch.mapv_inplace(|value| (value - min) / scale);
}

/// Return a min-max normalized copy of a patch
pub fn normalize<A, S, D>(patch: &ArrayBase<S, D>) -> Array<A, D>
where
    A: Float,
    S: Data<Elem = A>,
    D: Dimension,
{
    let mut normalized = patch.to_owned();
    normalize_in_place(&mut normalized);
    normalized
}

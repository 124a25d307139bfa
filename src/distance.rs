//! The squared Euclidean distance and the minimum-distance search every
//! distance-based classifier is built on.

use crate::error::{ClassifyError, Result};
use ndarray::ArrayView1;

/// Sum of squared elementwise differences.
///
/// Callers are expected to have validated dimensionality beforehand; this is
/// the hot loop of every classifier.
pub fn squared_distance(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    debug_assert_eq!(a.len(), b.len(), "vectors of different dimensionality");
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum()
}

pub fn try_squared_distance(a: ArrayView1<f64>, b: ArrayView1<f64>) -> Result<f64> {
    if a.len() != b.len() {
        return Err(ClassifyError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }
    Ok(squared_distance(a, b))
}

/// Returns the key of the candidate closest to `x` with its squared distance.
///
/// Ties keep the earliest candidate: a later one replaces the current best
/// only when strictly closer. `None` when there are no candidates.
pub fn nearest<'a, K, I>(x: ArrayView1<f64>, candidates: I) -> Option<(K, f64)>
where
    I: IntoIterator<Item = (K, ArrayView1<'a, f64>)>,
{
    let mut best: Option<(K, f64)> = None;
    for (key, candidate) in candidates {
        let distance = squared_distance(x, candidate);
        match best {
            Some((_, min_distance)) if distance >= min_distance => {}
            _ => best = Some((key, distance)),
        }
    }
    best
}

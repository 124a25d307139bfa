//! Linear discriminant classifiers (perceptrons).
//!
//! This module provides:
//! - `MsePerceptron`: weights from the regularized least-squares solution,
//!   computed in one step
//! - `BackpropPerceptron`: weights refined iteratively from the misclassified
//!   training samples
//!
//! Both learn one column of a `D+1 x C` weight matrix per class (the last row
//! is the bias) against `+1`/`-1` targets, and predict the class whose output
//! is the largest positive activation. A sample with no positive activation
//! is handled by [`Fallback`].
//!
//! # Examples
//!
//! ```rust
//! use patrec::{Classifier, Element, FeatureStore, MsePerceptron};
//! use ndarray::array;
//!
//! let training = vec![
//!     Element::new(array![-2.0, -1.0], 0),
//!     Element::new(array![-1.5, -2.0], 0),
//!     Element::new(array![2.0, 1.5], 1),
//!     Element::new(array![1.0, 2.5], 1),
//! ];
//! let testing = vec![
//!     Element::new(array![-1.0, -1.0], 0),
//!     Element::new(array![1.5, 1.0], 1),
//! ];
//! let mut store = FeatureStore::from_elements(training, testing).unwrap();
//!
//! let mut model = MsePerceptron::new();
//! model.fit_classify(&mut store).unwrap();
//! assert_eq!(store.predictions(), vec![Some(0), Some(1)]);
//! ```

mod backprop;
mod mse;

pub use backprop::BackpropPerceptron;
pub use mse::MsePerceptron;

use crate::dataset::Element;
use crate::error::{ClassifyError, Result};
use crate::{ClassId, Matrix, Vector};
use ndarray::{ArrayView1, s};
use serde::{Deserialize, Serialize};

/// What a perceptron predicts when none of its outputs is positive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Fallback {
    /// Leave the predicted slot empty; the sample scores as wrong.
    #[default]
    Unclassified,
    /// Take the largest activation even though it is not positive.
    Argmax,
}

/// `C x N` matrix holding `+1` where sample `n` belongs to class `c` and `-1`
/// elsewhere.
pub(crate) fn target_matrix(labels: &[ClassId], classes: &[ClassId]) -> Matrix {
    Matrix::from_shape_fn((classes.len(), labels.len()), |(c, n)| {
        if labels[n] == classes[c] { 1.0 } else { -1.0 }
    })
}

/// Picks the class with the largest positive activation. Ties keep the
/// first class.
pub(crate) fn select_class(
    activations: ArrayView1<f64>,
    classes: &[ClassId],
    fallback: Fallback,
) -> Option<ClassId> {
    let mut best: Option<(usize, f64)> = None;
    for (c, &a) in activations.iter().enumerate() {
        match best {
            Some((_, max)) if a <= max => {}
            _ => best = Some((c, a)),
        }
    }

    match (best, fallback) {
        (Some((c, a)), _) if a > 0.0 => Some(classes[c]),
        (Some((c, _)), Fallback::Argmax) => Some(classes[c]),
        _ => None,
    }
}

/// Writes `Wᵗ[x, bias]` class decisions into every testing element and
/// returns how many were left unclassified.
pub(crate) fn classify_linear(
    weights: &Matrix,
    classes: &[ClassId],
    bias: f64,
    fallback: Fallback,
    testing: &mut [Element],
) -> Result<usize> {
    let dim = weights.nrows() - 1;
    let mut unclassified = 0;
    for element in testing.iter_mut() {
        if element.features.len() != dim {
            return Err(ClassifyError::DimensionMismatch {
                expected: dim,
                actual: element.features.len(),
            });
        }
        let activations = linear_activations(weights, &element.features, bias);
        element.predicted = select_class(activations.view(), classes, fallback);
        if element.predicted.is_none() {
            unclassified += 1;
        }
    }

    if unclassified > 0 {
        tracing::warn!(unclassified, "samples with no positive perceptron output");
    }
    Ok(unclassified)
}

/// `Wᵗ[x, bias]` without materialising the augmented vector.
pub(crate) fn linear_activations(weights: &Matrix, x: &Vector, bias: f64) -> Vector {
    let dim = weights.nrows() - 1;
    let mut activations = weights.slice(s![..dim, ..]).t().dot(x);
    activations.scaled_add(bias, &weights.row(dim));
    activations
}

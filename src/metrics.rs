use crate::ClassId;
use crate::dataset::Element;
use crate::error::{ClassifyError, Result};
use ndarray::Array2;

/// Fraction of testing elements whose prediction equals their label.
/// Unclassified elements count as wrong.
pub fn accuracy(testing: &[Element]) -> Result<f64> {
    if testing.is_empty() {
        return Err(ClassifyError::EmptyTestingSet);
    }

    let correct = testing.iter().filter(|e| e.is_correct()).count();
    Ok(correct as f64 / testing.len() as f64)
}

pub fn unclassified_count(testing: &[Element]) -> usize {
    testing.iter().filter(|e| e.predicted.is_none()).count()
}

/// Counts indexed `[truth, prediction]` in the order of `classes`.
/// Elements that are unclassified or carry an unknown id are skipped.
pub fn confusion_matrix(testing: &[Element], classes: &[ClassId]) -> Array2<usize> {
    let index = |class: ClassId| classes.iter().position(|&c| c == class);
    let mut counts = Array2::zeros((classes.len(), classes.len()));
    for element in testing {
        let cell = element
            .predicted
            .and_then(index)
            .zip(index(element.label));
        if let Some((predicted, truth)) = cell {
            counts[(truth, predicted)] += 1;
        }
    }
    counts
}

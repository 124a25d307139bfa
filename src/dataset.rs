use crate::error::{ClassifyError, Result};
use crate::{ClassId, Matrix, Vector};
use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::BTreeMap;

/// One sample: a feature vector, its ground-truth class and the class a
/// classifier assigned to it.
#[derive(Clone, Debug, PartialEq)]
pub struct Element {
    pub features: Vector,
    pub label: ClassId,
    pub predicted: Option<ClassId>,
}

impl Element {
    pub fn new(features: Vector, label: ClassId) -> Self {
        Self {
            features,
            label,
            predicted: None,
        }
    }

    pub fn is_correct(&self) -> bool {
        self.predicted == Some(self.label)
    }
}

/// Labeled training vectors grouped by class, plus the ordered testing set.
///
/// Every element has exactly `vector_size` features. Classes are kept in
/// ascending id order and elements in insertion order, so every algorithm
/// visits them deterministically.
#[derive(Clone, Debug)]
pub struct FeatureStore {
    training: BTreeMap<ClassId, Vec<Element>>,
    testing: Vec<Element>,
    vector_size: usize,
}

impl FeatureStore {
    pub fn new(vector_size: usize) -> Self {
        Self {
            training: BTreeMap::new(),
            testing: Vec::new(),
            vector_size,
        }
    }

    pub fn from_elements(training: Vec<Element>, testing: Vec<Element>) -> Result<Self> {
        let vector_size = training
            .first()
            .or(testing.first())
            .map(|e| e.features.len())
            .ok_or(ClassifyError::EmptyTrainingSet)?;

        let mut store = Self::new(vector_size);
        for element in training {
            store.push_training(element)?;
        }
        for element in testing {
            store.push_testing(element)?;
        }
        Ok(store)
    }

    /// Randomly splits `samples` class by class, keeping roughly
    /// `train_fraction` of each class for training and at least one sample.
    pub fn split_per_class<R: Rng + ?Sized>(
        samples: Vec<Element>,
        train_fraction: f64,
        rng: &mut R,
    ) -> Result<Self> {
        if !(train_fraction > 0.0 && train_fraction < 1.0) {
            return Err(ClassifyError::InvalidConfig(format!(
                "train_fraction must be in (0, 1), got {train_fraction}"
            )));
        }

        let mut by_class: BTreeMap<ClassId, Vec<Element>> = BTreeMap::new();
        for element in samples {
            by_class.entry(element.label).or_default().push(element);
        }

        let vector_size = by_class
            .values()
            .flatten()
            .next()
            .map(|e| e.features.len())
            .ok_or(ClassifyError::EmptyTrainingSet)?;
        let mut store = Self::new(vector_size);

        for (_, mut elements) in by_class {
            elements.shuffle(rng);
            let n_train = ((elements.len() as f64 * train_fraction).round() as usize)
                .clamp(1, elements.len());
            let testing = elements.split_off(n_train);
            for element in elements {
                store.push_training(element)?;
            }
            for element in testing {
                store.push_testing(element)?;
            }
        }

        Ok(store)
    }

    pub fn push_training(&mut self, element: Element) -> Result<()> {
        self.check_len(&element)?;
        self.training.entry(element.label).or_default().push(element);
        Ok(())
    }

    pub fn push_testing(&mut self, element: Element) -> Result<()> {
        self.check_len(&element)?;
        self.testing.push(element);
        Ok(())
    }

    pub fn training(&self) -> &BTreeMap<ClassId, Vec<Element>> {
        &self.training
    }

    pub fn testing(&self) -> &[Element] {
        &self.testing
    }

    pub fn testing_mut(&mut self) -> &mut [Element] {
        &mut self.testing
    }

    pub fn vector_size(&self) -> usize {
        self.vector_size
    }

    pub fn num_classes(&self) -> usize {
        self.training.len()
    }

    pub fn class_ids(&self) -> Vec<ClassId> {
        self.training.keys().copied().collect()
    }

    pub fn training_len(&self) -> usize {
        self.training.values().map(Vec::len).sum()
    }

    /// Training elements in class order, then insertion order.
    pub fn iter_training(&self) -> impl Iterator<Item = &Element> {
        self.training.values().flatten()
    }

    pub fn predictions(&self) -> Vec<Option<ClassId>> {
        self.testing.iter().map(|e| e.predicted).collect()
    }

    pub fn clear_predictions(&mut self) {
        for element in &mut self.testing {
            element.predicted = None;
        }
    }

    /// Checks that every element carries exactly `vector_size` features.
    pub fn validate(&self) -> Result<()> {
        self.iter_training()
            .chain(self.testing.iter())
            .try_for_each(|e| self.check_len(e))
    }

    /// Training vectors as the columns of a `D x N` matrix (or `D+1 x N`
    /// with `bias` appended as the last coordinate), with their labels.
    pub fn training_matrix(&self, bias: Option<f64>) -> (Matrix, Vec<ClassId>) {
        let rows = self.vector_size + usize::from(bias.is_some());
        let mut x = Matrix::zeros((rows, self.training_len()));
        let mut labels = Vec::with_capacity(x.ncols());

        for (n, element) in self.iter_training().enumerate() {
            let mut column = x.column_mut(n);
            column
                .slice_mut(ndarray::s![..self.vector_size])
                .assign(&element.features);
            if let Some(bias) = bias {
                column[self.vector_size] = bias;
            }
            labels.push(element.label);
        }

        (x, labels)
    }

    /// Rewrites every training and testing vector through `f`, which must
    /// map `vector_size`-length vectors to `new_size`-length ones.
    pub(crate) fn map_features<F>(&mut self, new_size: usize, mut f: F) -> Result<()>
    where
        F: FnMut(&Vector) -> Vector,
    {
        let elements = self
            .training
            .values_mut()
            .flatten()
            .chain(self.testing.iter_mut());
        let mut mapped = Vec::new();
        for element in elements {
            let features = f(&element.features);
            if features.len() != new_size {
                return Err(ClassifyError::DimensionMismatch {
                    expected: new_size,
                    actual: features.len(),
                });
            }
            mapped.push((element, features));
        }

        // Only commit once every vector mapped, so no element is left stale.
        for (element, features) in mapped {
            element.features = features;
        }
        self.vector_size = new_size;
        Ok(())
    }

    pub(crate) fn split_mut(&mut self) -> (&BTreeMap<ClassId, Vec<Element>>, &mut [Element]) {
        (&self.training, &mut self.testing)
    }

    fn check_len(&self, element: &Element) -> Result<()> {
        if element.features.len() != self.vector_size {
            return Err(ClassifyError::DimensionMismatch {
                expected: self.vector_size,
                actual: element.features.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn sample_store() -> FeatureStore {
        let training = vec![
            Element::new(array![1.0, 2.0], 1),
            Element::new(array![3.0, 4.0], 0),
            Element::new(array![5.0, 6.0], 1),
        ];
        let testing = vec![Element::new(array![0.0, 0.0], 0)];
        FeatureStore::from_elements(training, testing).unwrap()
    }

    #[test]
    fn test_store_creation() {
        let store = sample_store();
        assert_eq!(store.vector_size(), 2);
        assert_eq!(store.num_classes(), 2);
        assert_eq!(store.class_ids(), vec![0, 1]);
        assert_eq!(store.training_len(), 3);
        assert_eq!(store.testing().len(), 1);
        assert!(store.validate().is_ok());
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let mut store = FeatureStore::new(2);
        let err = store
            .push_training(Element::new(array![1.0, 2.0, 3.0], 0))
            .unwrap_err();
        assert!(matches!(err, ClassifyError::DimensionMismatch { expected: 2, actual: 3 }));
        assert!(store.push_testing(Element::new(array![1.0], 0)).is_err());
    }

    #[test]
    fn test_training_matrix_columns_follow_class_order() {
        let store = sample_store();
        let (x, labels) = store.training_matrix(None);
        assert_eq!(x.shape(), &[2, 3]);
        assert_eq!(labels, vec![0, 1, 1]);
        assert_eq!(x.column(0), array![3.0, 4.0]);
        assert_eq!(x.column(2), array![5.0, 6.0]);

        let (augmented, _) = store.training_matrix(Some(1.0));
        assert_eq!(augmented.shape(), &[3, 3]);
        assert_eq!(augmented.row(2), array![1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_map_features_updates_every_element() {
        let mut store = sample_store();
        store
            .map_features(1, |v| array![v.sum()])
            .unwrap();
        assert_eq!(store.vector_size(), 1);
        assert!(store.validate().is_ok());
        assert_eq!(store.testing()[0].features, array![0.0]);
    }

    #[test]
    fn test_map_features_failure_leaves_store_untouched() {
        let mut store = sample_store();
        assert!(store.map_features(1, |v| v.clone()).is_err());
        assert_eq!(store.vector_size(), 2);
        assert!(store.validate().is_ok());
    }

    #[test]
    fn test_split_per_class() {
        let samples: Vec<Element> = (0..20)
            .map(|i| Element::new(array![i as f64], i % 2))
            .collect();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let store = FeatureStore::split_per_class(samples, 0.7, &mut rng).unwrap();

        assert_eq!(store.training()[&0].len(), 7);
        assert_eq!(store.training()[&1].len(), 7);
        assert_eq!(store.testing().len(), 6);
    }

    #[test]
    fn test_split_rejects_bad_fraction() {
        let samples = vec![Element::new(array![1.0], 0)];
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert!(FeatureStore::split_per_class(samples, 1.0, &mut rng).is_err());
    }

    #[test]
    fn test_clear_predictions() {
        let mut store = sample_store();
        store.testing_mut()[0].predicted = Some(1);
        assert_eq!(store.predictions(), vec![Some(1)]);
        store.clear_predictions();
        assert_eq!(store.predictions(), vec![None]);
    }
}

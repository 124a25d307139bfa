use crate::dataset::{Element, FeatureStore};
use crate::distance::nearest;
use crate::error::{ClassifyError, Result};
use crate::{ClassId, Classifier, Vector};
use std::collections::BTreeMap;

/// Mean vectors keyed by `(class, subclass)`.
///
/// A plain class centroid lives at subclass 0. Iteration runs in ascending
/// key order, which fixes the tie-break order of [`CentroidSet::nearest_class`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CentroidSet {
    centroids: BTreeMap<(ClassId, usize), Vector>,
}

impl CentroidSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, class: ClassId, subclass: usize, centroid: Vector) {
        self.centroids.insert((class, subclass), centroid);
    }

    pub fn get(&self, class: ClassId, subclass: usize) -> Option<&Vector> {
        self.centroids.get(&(class, subclass))
    }

    pub fn len(&self) -> usize {
        self.centroids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.centroids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&(ClassId, usize), &Vector)> {
        self.centroids.iter()
    }

    pub fn dim(&self) -> Option<usize> {
        self.centroids.values().next().map(Vector::len)
    }

    /// Class id of the centroid closest to `x`; the subclass is discarded.
    pub fn nearest_class(&self, x: &Vector) -> Option<ClassId> {
        nearest(
            x.view(),
            self.centroids
                .iter()
                .map(|(&(class, _), centroid)| (class, centroid.view())),
        )
        .map(|(class, _)| class)
    }

    /// Assigns every testing element to the class of its nearest centroid.
    pub fn classify(&self, testing: &mut [Element]) -> Result<()> {
        let dim = self.dim().ok_or(ClassifyError::NotFitted("CentroidSet"))?;
        if let Some(element) = testing.iter().find(|e| e.features.len() != dim) {
            return Err(ClassifyError::DimensionMismatch {
                expected: dim,
                actual: element.features.len(),
            });
        }

        for element in testing.iter_mut() {
            element.predicted = self.nearest_class(&element.features);
        }
        Ok(())
    }
}

/// Arithmetic mean of `elements`' feature vectors.
pub(crate) fn mean_vector<'a, I>(elements: I, dim: usize) -> Option<Vector>
where
    I: IntoIterator<Item = &'a Vector>,
{
    let mut sum = Vector::zeros(dim);
    let mut count = 0usize;
    for features in elements {
        sum += features;
        count += 1;
    }
    (count > 0).then(|| sum / count as f64)
}

/// Nearest class centroid classifier.
#[derive(Clone, Debug, Default)]
pub struct NearestCentroid {
    pub centroids: Option<CentroidSet>,
}

impl NearestCentroid {
    pub fn new() -> Self {
        Self { centroids: None }
    }

    pub fn fit(&mut self, store: &FeatureStore) -> Result<()> {
        store.validate()?;
        if store.num_classes() == 0 {
            return Err(ClassifyError::EmptyTrainingSet);
        }

        let mut centroids = CentroidSet::new();
        for (&class, elements) in store.training() {
            let mean = mean_vector(elements.iter().map(|e| &e.features), store.vector_size())
                .ok_or(ClassifyError::EmptyClass(class))?;
            centroids.insert(class, 0, mean);
        }

        tracing::debug!(classes = centroids.len(), "class centroids computed");
        self.centroids = Some(centroids);
        Ok(())
    }

    pub fn classify(&self, store: &mut FeatureStore) -> Result<()> {
        let centroids = self
            .centroids
            .as_ref()
            .ok_or(ClassifyError::NotFitted("NearestCentroid"))?;
        centroids.classify(store.testing_mut())
    }
}

impl Classifier for NearestCentroid {
    fn name(&self) -> String {
        "nearest class centroid".to_string()
    }

    fn fit(&mut self, store: &FeatureStore) -> Result<()> {
        NearestCentroid::fit(self, store)
    }

    fn classify(&self, store: &mut FeatureStore) -> Result<()> {
        NearestCentroid::classify(self, store)
    }
}

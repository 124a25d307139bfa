use crate::config::{Config, KMEANS_MAX_DISTANCE, KMEANS_MAX_ITER};
use crate::dataset::{Element, FeatureStore};
use crate::distance::{nearest, squared_distance};
use crate::error::{ClassifyError, Result};
use crate::neighbors::CentroidSet;
use crate::{ClassId, Classifier, Matrix};

/// Nearest sub-class centroid classifier.
///
/// Every class is split into `n_subclasses` clusters by Lloyd's algorithm,
/// seeded with the class's first `n_subclasses` training vectors. Test
/// vectors take the class of the closest subcentroid.
#[derive(Clone, Debug)]
pub struct SubclassCentroid {
    pub centroids: Option<CentroidSet>,
    /// Iterations run per class, in class order.
    pub n_iter: Option<Vec<(ClassId, usize)>>,
    /// `false` when some class hit `max_iter` before settling.
    pub converged: Option<bool>,
    n_subclasses: usize,
    max_iter: usize,
    max_distance: f64,
}

impl SubclassCentroid {
    pub fn new(n_subclasses: usize) -> Self {
        if n_subclasses == 0 {
            panic!("n_subclasses must be > 0, got {}", n_subclasses);
        }

        Self {
            centroids: None,
            n_iter: None,
            converged: None,
            n_subclasses,
            max_iter: KMEANS_MAX_ITER,
            max_distance: KMEANS_MAX_DISTANCE,
        }
    }

    pub fn from_config(n_subclasses: usize, config: &Config) -> Self {
        Self::new(n_subclasses)
            .max_iter(config.kmeans.max_iter)
            .max_distance(config.kmeans.max_distance)
    }

    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Squared shift under which a subcentroid counts as settled.
    pub fn max_distance(mut self, max_distance: f64) -> Self {
        self.max_distance = max_distance;
        self
    }

    pub fn n_subclasses(&self) -> usize {
        self.n_subclasses
    }

    pub fn fit(&mut self, store: &FeatureStore) -> Result<()> {
        store.validate()?;
        if store.num_classes() == 0 {
            return Err(ClassifyError::EmptyTrainingSet);
        }

        // Reject undersized classes before doing any work.
        for (&class, elements) in store.training() {
            if elements.len() < self.n_subclasses {
                return Err(ClassifyError::NotEnoughSamples {
                    class,
                    available: elements.len(),
                    requested: self.n_subclasses,
                });
            }
        }

        let mut centroids = CentroidSet::new();
        let mut n_iter = Vec::with_capacity(store.num_classes());
        let mut all_converged = true;

        for (&class, elements) in store.training() {
            let run = self.cluster_class(elements, store.vector_size());
            if !run.converged {
                tracing::warn!(
                    class,
                    iterations = run.iterations,
                    max_shift = run.max_shift,
                    "k-means stopped at the iteration cap without converging"
                );
                all_converged = false;
            }
            tracing::debug!(class, iterations = run.iterations, "class subcentroids settled");

            for (k, centroid) in run.centroids.outer_iter().enumerate() {
                centroids.insert(class, k, centroid.to_owned());
            }
            n_iter.push((class, run.iterations));
        }

        self.centroids = Some(centroids);
        self.n_iter = Some(n_iter);
        self.converged = Some(all_converged);
        Ok(())
    }

    pub fn classify(&self, store: &mut FeatureStore) -> Result<()> {
        let centroids = self
            .centroids
            .as_ref()
            .ok_or(ClassifyError::NotFitted("SubclassCentroid"))?;
        centroids.classify(store.testing_mut())
    }

    fn cluster_class(&self, elements: &[Element], dim: usize) -> ClassRun {
        let k = self.n_subclasses;
        let mut centroids = Matrix::zeros((k, dim));
        for (i, element) in elements.iter().take(k).enumerate() {
            centroids.row_mut(i).assign(&element.features);
        }

        let mut assignments = vec![0usize; elements.len()];
        let mut iterations = 0;
        let mut max_shift = f64::INFINITY;

        while iterations < self.max_iter {
            iterations += 1;

            for (slot, element) in assignments.iter_mut().zip(elements) {
                *slot = nearest(
                    element.features.view(),
                    centroids.outer_iter().enumerate(),
                )
                .map_or(0, |(index, _)| index);
            }

            let previous = centroids.clone();
            let mut sums = Matrix::zeros((k, dim));
            let mut counts = vec![0usize; k];
            for (&cluster, element) in assignments.iter().zip(elements) {
                let mut row = sums.row_mut(cluster);
                row += &element.features;
                counts[cluster] += 1;
            }
            for (cluster, &count) in counts.iter().enumerate() {
                // An emptied subclass keeps its previous position.
                if count > 0 {
                    let mean = &sums.row(cluster) / count as f64;
                    centroids.row_mut(cluster).assign(&mean);
                }
            }

            max_shift = previous
                .outer_iter()
                .zip(centroids.outer_iter())
                .map(|(old, new)| squared_distance(old, new))
                .fold(0.0, f64::max);
            if max_shift <= self.max_distance {
                return ClassRun {
                    centroids,
                    iterations,
                    converged: true,
                    max_shift,
                };
            }
        }

        ClassRun {
            centroids,
            iterations,
            converged: false,
            max_shift,
        }
    }
}

struct ClassRun {
    centroids: Matrix,
    iterations: usize,
    converged: bool,
    max_shift: f64,
}

impl Classifier for SubclassCentroid {
    fn name(&self) -> String {
        format!("nearest subclass centroid (k={})", self.n_subclasses)
    }

    fn fit(&mut self, store: &FeatureStore) -> Result<()> {
        SubclassCentroid::fit(self, store)
    }

    fn classify(&self, store: &mut FeatureStore) -> Result<()> {
        SubclassCentroid::classify(self, store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::accuracy;
    use crate::neighbors::NearestCentroid;
    use ndarray::array;

    fn two_blob_class_store() -> FeatureStore {
        // class 0 lives in two separate blobs, class 1 sits between them
        let training = vec![
            Element::new(array![0.0, 0.0], 0),
            Element::new(array![20.0, 0.0], 0),
            Element::new(array![0.5, 0.0], 0),
            Element::new(array![20.5, 0.0], 0),
            Element::new(array![10.0, 6.0], 1),
            Element::new(array![10.5, 6.0], 1),
            Element::new(array![9.5, 6.0], 1),
            Element::new(array![10.0, 6.5], 1),
        ];
        let testing = vec![
            Element::new(array![0.2, 0.3], 0),
            Element::new(array![20.1, 0.4], 0),
            Element::new(array![10.2, 5.0], 1),
        ];
        FeatureStore::from_elements(training, testing).unwrap()
    }

    #[test]
    fn test_subclasses_per_class() {
        let store = two_blob_class_store();
        let mut model = SubclassCentroid::new(2);
        model.fit(&store).unwrap();

        let centroids = model.centroids.as_ref().unwrap();
        assert_eq!(centroids.len(), 2 * store.num_classes());
        assert_eq!(model.converged, Some(true));

        let a = centroids.get(0, 0).unwrap();
        let b = centroids.get(0, 1).unwrap();
        assert!((a[0] - 0.25).abs() < 1e-12);
        assert!((b[0] - 20.25).abs() < 1e-12);
    }

    #[test]
    fn test_multimodal_class_is_separated() {
        let mut store = two_blob_class_store();
        let mut model = SubclassCentroid::new(2);
        model.fit_classify(&mut store).unwrap();
        assert_eq!(accuracy(store.testing()).unwrap(), 1.0);
        assert_eq!(store.predictions(), vec![Some(0), Some(0), Some(1)]);
    }

    #[test]
    fn test_single_subclass_matches_nearest_centroid() {
        let mut store = two_blob_class_store();
        let mut subclass = SubclassCentroid::new(1);
        subclass.fit_classify(&mut store).unwrap();
        let subclass_predictions = store.predictions();

        let mut centroid = NearestCentroid::new();
        centroid.fit_classify(&mut store).unwrap();

        assert_eq!(subclass_predictions, store.predictions());
        let expected = centroid.centroids.as_ref().unwrap();
        let actual = subclass.centroids.as_ref().unwrap();
        for ((key_a, a), (key_b, b)) in expected.iter().zip(actual.iter()) {
            assert_eq!(key_a, key_b);
            assert!(a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() < 1e-12));
        }
    }

    #[test]
    fn test_deterministic_runs() {
        let store = two_blob_class_store();
        let mut first = SubclassCentroid::new(3);
        let mut second = SubclassCentroid::new(3);
        first.fit(&store).unwrap();
        second.fit(&store).unwrap();
        assert_eq!(first.centroids, second.centroids);
        assert_eq!(first.n_iter, second.n_iter);
    }

    #[test]
    fn test_too_many_subclasses() {
        let store = two_blob_class_store();
        let err = SubclassCentroid::new(5).fit(&store).unwrap_err();
        assert!(err.is_configuration());
        assert!(matches!(
            err,
            ClassifyError::NotEnoughSamples { class: 0, available: 4, requested: 5 }
        ));
    }

    #[test]
    fn test_iteration_cap_reports_partial_result() {
        let store = two_blob_class_store();
        // first two class-0 seeds are 0 and 20, so one pass already moves them
        let mut model = SubclassCentroid::new(2).max_iter(1).max_distance(0.0);
        model.fit(&store).unwrap();

        assert_eq!(model.converged, Some(false));
        assert_eq!(model.centroids.as_ref().unwrap().len(), 4);
        assert!(model.n_iter.as_ref().unwrap().iter().all(|&(_, n)| n == 1));
    }

    #[test]
    fn test_invalid_subclasses() {
        std::panic::catch_unwind(|| {
            SubclassCentroid::new(0);
        })
        .expect_err("Should panic on zero subclasses");
    }

    #[test]
    fn test_predict_without_fit() {
        let mut store = two_blob_class_store();
        assert!(SubclassCentroid::new(2).classify(&mut store).is_err());
    }
}

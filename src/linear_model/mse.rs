use super::{Fallback, classify_linear, target_matrix};
use crate::config::{Config, MSE_RIDGE};
use crate::dataset::FeatureStore;
use crate::error::{ClassifyError, Result};
use crate::linalg::{from_nalgebra, to_nalgebra};
use crate::{ClassId, Classifier, Matrix};

/// Perceptron trained by minimum squared error.
///
/// Solves `W = (X Xᵗ + λI)⁻¹ X Tᵗ` over the augmented training matrix `X`
/// (bias coordinate 1) and the `+1`/`-1` target matrix `T`. The ridge term
/// `λ` keeps `X Xᵗ` invertible when pixels are constant across the set.
#[derive(Clone, Debug)]
pub struct MsePerceptron {
    /// `D+1 x C`, last row is the bias.
    pub weights: Option<Matrix>,
    pub classes: Option<Vec<ClassId>>,
    ridge: f64,
    fallback: Fallback,
}

impl MsePerceptron {
    pub fn new() -> Self {
        Self {
            weights: None,
            classes: None,
            ridge: MSE_RIDGE,
            fallback: Fallback::Unclassified,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new()
            .ridge(config.perceptron.ridge)
            .fallback(config.perceptron.fallback)
    }

    pub fn ridge(mut self, ridge: f64) -> Self {
        if ridge < 0.0 {
            panic!("ridge must be non-negative, got {}", ridge);
        }
        self.ridge = ridge;
        self
    }

    pub fn fallback(mut self, fallback: Fallback) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn fit(&mut self, store: &FeatureStore) -> Result<()> {
        store.validate()?;
        if store.training_len() == 0 {
            return Err(ClassifyError::EmptyTrainingSet);
        }

        let (x, labels) = store.training_matrix(Some(1.0));
        let classes = store.class_ids();
        let t = target_matrix(&labels, &classes);

        let mut gram = x.dot(&x.t());
        for i in 0..gram.nrows() {
            gram[(i, i)] += self.ridge;
        }
        let rhs = x.dot(&t.t());

        let inverse = to_nalgebra(&gram).try_inverse().ok_or_else(|| {
            ClassifyError::SingularMatrix(format!(
                "{}x{} gram matrix with ridge {}",
                gram.nrows(),
                gram.ncols(),
                self.ridge
            ))
        })?;
        let weights = from_nalgebra(&(inverse * to_nalgebra(&rhs)));

        if weights.iter().any(|w| !w.is_finite()) {
            return Err(ClassifyError::Numerical(
                "least-squares weights are not finite".to_string(),
            ));
        }

        tracing::debug!(
            rows = weights.nrows(),
            classes = classes.len(),
            ridge = self.ridge,
            "mse weights solved"
        );
        self.weights = Some(weights);
        self.classes = Some(classes);
        Ok(())
    }

    pub fn classify(&self, store: &mut FeatureStore) -> Result<()> {
        let (weights, classes) = match (&self.weights, &self.classes) {
            (Some(w), Some(c)) => (w, c),
            _ => return Err(ClassifyError::NotFitted("MsePerceptron")),
        };
        classify_linear(weights, classes, 1.0, self.fallback, store.testing_mut())?;
        Ok(())
    }
}

impl Default for MsePerceptron {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier for MsePerceptron {
    fn name(&self) -> String {
        "perceptron (mse)".to_string()
    }

    fn fit(&mut self, store: &FeatureStore) -> Result<()> {
        MsePerceptron::fit(self, store)
    }

    fn classify(&self, store: &mut FeatureStore) -> Result<()> {
        MsePerceptron::classify(self, store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Element;
    use crate::metrics::accuracy;
    use ndarray::array;

    fn separable_store() -> FeatureStore {
        let training = vec![
            Element::new(array![1.0, 1.0], 0),
            Element::new(array![1.5, 0.5], 0),
            Element::new(array![0.5, 1.5], 0),
            Element::new(array![2.0, 1.0], 0),
            Element::new(array![6.0, 6.0], 1),
            Element::new(array![6.5, 5.5], 1),
            Element::new(array![5.5, 6.5], 1),
            Element::new(array![7.0, 6.0], 1),
        ];
        let testing = vec![
            Element::new(array![1.2, 0.8], 0),
            Element::new(array![0.8, 1.1], 0),
            Element::new(array![6.2, 5.8], 1),
            Element::new(array![5.9, 6.6], 1),
        ];
        FeatureStore::from_elements(training, testing).unwrap()
    }

    #[test]
    fn test_separable_classes_are_perfect() {
        let mut store = separable_store();
        let mut model = MsePerceptron::new();
        model.fit_classify(&mut store).unwrap();

        assert_eq!(model.weights.as_ref().unwrap().shape(), &[3, 2]);
        assert_eq!(accuracy(store.testing()).unwrap(), 1.0);
    }

    #[test]
    fn test_training_set_is_reproduced() {
        let store = separable_store();
        let mut model = MsePerceptron::new();
        model.fit(&store).unwrap();

        let mut replay = FeatureStore::new(2);
        for element in store.iter_training() {
            replay.push_testing(element.clone()).unwrap();
        }
        model.classify(&mut replay).unwrap();
        assert_eq!(accuracy(replay.testing()).unwrap(), 1.0);
    }

    #[test]
    fn test_ridge_rescues_constant_feature() {
        // the second coordinate never varies, so X Xᵗ is singular without λ
        let training = vec![
            Element::new(array![0.0, 0.0, 3.0], 0),
            Element::new(array![1.0, 0.0, 3.0], 0),
            Element::new(array![5.0, 0.0, 3.0], 1),
            Element::new(array![6.0, 0.0, 3.0], 1),
        ];
        let testing = vec![Element::new(array![5.5, 0.0, 3.0], 1)];
        let mut store = FeatureStore::from_elements(training, testing).unwrap();

        let mut model = MsePerceptron::new().ridge(1e-3);
        model.fit_classify(&mut store).unwrap();
        assert!(model.weights.as_ref().unwrap().iter().all(|w| w.is_finite()));
        assert_eq!(store.predictions(), vec![Some(1)]);
    }

    #[test]
    fn test_singular_without_ridge_is_an_error() {
        let training = vec![
            Element::new(array![1.0, 0.0], 0),
            Element::new(array![2.0, 0.0], 1),
        ];
        let store = FeatureStore::from_elements(training, vec![]).unwrap();

        let err = MsePerceptron::new().ridge(0.0).fit(&store).unwrap_err();
        assert!(err.is_numerical());
    }

    #[test]
    fn test_fallback_when_no_output_is_positive() {
        // the middle class cannot be cut off by one hyperplane, so at x = 4
        // every output is negative: about -0.14, -0.33 and -0.53
        let training = vec![
            Element::new(array![-0.5], 0),
            Element::new(array![0.5], 0),
            Element::new(array![4.5], 1),
            Element::new(array![5.5], 1),
            Element::new(array![9.5], 2),
            Element::new(array![10.5], 2),
        ];
        let testing = vec![Element::new(array![4.0], 1)];
        let mut store = FeatureStore::from_elements(training, testing).unwrap();

        MsePerceptron::new().fit_classify(&mut store).unwrap();
        assert_eq!(store.predictions(), vec![None]);

        MsePerceptron::new()
            .fallback(Fallback::Argmax)
            .fit_classify(&mut store)
            .unwrap();
        assert_eq!(store.predictions(), vec![Some(0)]);
    }

    #[test]
    fn test_classify_without_fit() {
        let mut store = separable_store();
        assert!(matches!(
            MsePerceptron::new().classify(&mut store).unwrap_err(),
            ClassifyError::NotFitted(_)
        ));
    }
}

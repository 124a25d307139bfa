use super::{Fallback, classify_linear, linear_activations, target_matrix};
use crate::config::{BACKPROP_INIT_RANGE, BACKPROP_LEARNING_RATE, BACKPROP_MAX_ITER, Config};
use crate::dataset::FeatureStore;
use crate::error::{ClassifyError, Result};
use crate::{ClassId, Classifier, Matrix, Vector};
use ndarray::s;
use ndarray_rand::RandomExt;
use ndarray_rand::rand_distr::Uniform;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Perceptron trained by iterative correction on misclassified samples.
///
/// Training vectors are augmented with a bias coordinate of 1. Each round
/// evaluates the criterion `t * wᵗx` for every (class, sample) pair and adds
/// `learning_rate * Σ t x` over the samples with a negative criterion to that
/// class's weights. Training stops when no sample is misclassified or after
/// `max_iter` rounds; the latter is not an error, `converged` is left false.
///
/// Testing vectors are augmented with `test_bias`, which defaults to 0 and so
/// ignores the learned bias row at prediction time.
#[derive(Clone, Debug)]
pub struct BackpropPerceptron {
    /// `D+1 x C`, last row is the bias.
    pub weights: Option<Matrix>,
    pub classes: Option<Vec<ClassId>>,
    pub n_iter: Option<usize>,
    pub converged: Option<bool>,
    /// Misclassified (class, sample) pairs left after the last round.
    pub misclassified: Option<usize>,
    learning_rate: f64,
    max_iter: usize,
    init_range: f64,
    seed: Option<u64>,
    test_bias: f64,
    fallback: Fallback,
}

impl BackpropPerceptron {
    pub fn new() -> Self {
        Self {
            weights: None,
            classes: None,
            n_iter: None,
            converged: None,
            misclassified: None,
            learning_rate: BACKPROP_LEARNING_RATE,
            max_iter: BACKPROP_MAX_ITER,
            init_range: BACKPROP_INIT_RANGE,
            seed: None,
            test_bias: 0.0,
            fallback: Fallback::Unclassified,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let p = &config.perceptron;
        let model = Self::new()
            .learning_rate(p.learning_rate)
            .max_iter(p.max_iter)
            .init_range(p.init_range)
            .test_bias(p.test_bias)
            .fallback(p.fallback);
        match p.seed {
            Some(seed) => model.seed(seed),
            None => model,
        }
    }

    pub fn learning_rate(mut self, learning_rate: f64) -> Self {
        if learning_rate <= 0.0 {
            panic!("learning_rate must be positive, got {}", learning_rate);
        }
        self.learning_rate = learning_rate;
        self
    }

    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn init_range(mut self, init_range: f64) -> Self {
        if init_range <= 0.0 {
            panic!("init_range must be positive, got {}", init_range);
        }
        self.init_range = init_range;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn test_bias(mut self, test_bias: f64) -> Self {
        self.test_bias = test_bias;
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

        let dim = store.vector_size();
        let (x, labels) = store.training_matrix(Some(1.0));
        let classes = store.class_ids();
        let t = target_matrix(&labels, &classes);

        let mut rng = match self.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        let mut weights = Matrix::zeros((dim + 1, classes.len()));
        weights.slice_mut(s![..dim, ..]).assign(&Matrix::random_using(
            (dim, classes.len()),
            Uniform::new(-self.init_range, self.init_range),
            &mut rng,
        ));

        let mut wrong = misclassified_per_class(&weights, &x, &t);
        let mut n_wrong: usize = wrong.iter().map(Vec::len).sum();
        let mut iterations = 0;

        while n_wrong > 0 && iterations < self.max_iter {
            for (c, samples) in wrong.iter().enumerate() {
                if samples.is_empty() {
                    continue;
                }
                let mut gradient = Vector::zeros(dim + 1);
                for &n in samples {
                    gradient.scaled_add(t[(c, n)], &x.column(n));
                }
                weights.column_mut(c).scaled_add(self.learning_rate, &gradient);
            }

            iterations += 1;
            wrong = misclassified_per_class(&weights, &x, &t);
            n_wrong = wrong.iter().map(Vec::len).sum();
            tracing::debug!(iteration = iterations, misclassified = n_wrong, "backprop round");
        }

        let converged = n_wrong == 0;
        if converged {
            tracing::info!(iterations, "backprop converged");
        } else {
            tracing::warn!(
                iterations,
                misclassified = n_wrong,
                "backprop stopped at the iteration cap"
            );
        }

        self.weights = Some(weights);
        self.classes = Some(classes);
        self.n_iter = Some(iterations);
        self.converged = Some(converged);
        self.misclassified = Some(n_wrong);
        Ok(())
    }

    /// Per-class outputs for one testing vector, augmented with `test_bias`.
    pub fn decision_function(&self, x: &Vector) -> Result<Vector> {
        let weights = self
            .weights
            .as_ref()
            .ok_or(ClassifyError::NotFitted("BackpropPerceptron"))?;
        if x.len() + 1 != weights.nrows() {
            return Err(ClassifyError::DimensionMismatch {
                expected: weights.nrows() - 1,
                actual: x.len(),
            });
        }
        Ok(linear_activations(weights, x, self.test_bias))
    }

    pub fn classify(&self, store: &mut FeatureStore) -> Result<()> {
        let (weights, classes) = match (&self.weights, &self.classes) {
            (Some(w), Some(c)) => (w, c),
            _ => return Err(ClassifyError::NotFitted("BackpropPerceptron")),
        };
        classify_linear(
            weights,
            classes,
            self.test_bias,
            self.fallback,
            store.testing_mut(),
        )?;
        Ok(())
    }
}

impl Default for BackpropPerceptron {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier for BackpropPerceptron {
    fn name(&self) -> String {
        "perceptron (backprop)".to_string()
    }

    fn fit(&mut self, store: &FeatureStore) -> Result<()> {
        BackpropPerceptron::fit(self, store)
    }

    fn classify(&self, store: &mut FeatureStore) -> Result<()> {
        BackpropPerceptron::classify(self, store)
    }
}

/// Indices of the samples with a negative criterion, one list per class.
fn misclassified_per_class(weights: &Matrix, x: &Matrix, t: &Matrix) -> Vec<Vec<usize>> {
    let criterion = t * &weights.t().dot(x);
    criterion
        .outer_iter()
        .map(|row| {
            row.iter()
                .enumerate()
                .filter(|&(_, &value)| value < 0.0)
                .map(|(n, _)| n)
                .collect()
        })
        .collect()
}

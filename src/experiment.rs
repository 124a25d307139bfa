//! Runs classifiers over a store and records how well and how fast they did.
//!
//! ```rust
//! use patrec::{Algorithm, Config, Element, FeatureStore};
//! use patrec::experiment::run;
//! use ndarray::array;
//!
//! let training = vec![
//!     Element::new(array![0.0, 0.0], 0),
//!     Element::new(array![5.0, 5.0], 1),
//! ];
//! let testing = vec![Element::new(array![4.0, 4.5], 1)];
//! let mut store = FeatureStore::from_elements(training, testing).unwrap();
//!
//! let record = run(&mut store, Algorithm::NearestCentroid, &Config::default()).unwrap();
//! assert_eq!(record.accuracy, 1.0);
//! ```

use crate::config::Config;
use crate::dataset::FeatureStore;
use crate::decomposition::PCA;
use crate::error::{ClassifyError, Result};
use crate::metrics;
use crate::{
    BackpropPerceptron, Classifier, MsePerceptron, NearestCentroid, NearestNeighbor,
    SubclassCentroid,
};
use serde::Serialize;
use std::fmt;
use std::time::Instant;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Algorithm {
    NearestCentroid,
    /// Nearest subclass centroid with `k` subclasses per class.
    SubclassCentroid(usize),
    NearestNeighbor,
    PerceptronBackprop,
    PerceptronMse,
}

impl Algorithm {
    /// The default sequence: centroid, one subclass run per configured `k`,
    /// parallel nearest neighbour, then both perceptrons.
    pub fn suite(config: &Config) -> Vec<Algorithm> {
        let mut algorithms = vec![Algorithm::NearestCentroid];
        algorithms.extend(
            config
                .experiment
                .subclass_counts
                .iter()
                .map(|&k| Algorithm::SubclassCentroid(k)),
        );
        algorithms.extend([
            Algorithm::NearestNeighbor,
            Algorithm::PerceptronBackprop,
            Algorithm::PerceptronMse,
        ]);
        algorithms
    }

    /// Builds a fresh classifier from `config`. Invalid settings come back
    /// as `InvalidConfig` rather than reaching the panicking builders.
    pub fn build(&self, config: &Config) -> Result<Box<dyn Classifier>> {
        config.validate()?;
        let model: Box<dyn Classifier> = match *self {
            Algorithm::NearestCentroid => Box::new(NearestCentroid::new()),
            Algorithm::SubclassCentroid(0) => {
                return Err(ClassifyError::InvalidConfig(
                    "subclass count must be > 0".to_string(),
                ));
            }
            Algorithm::SubclassCentroid(k) => Box::new(SubclassCentroid::from_config(k, config)),
            Algorithm::NearestNeighbor => {
                Box::new(NearestNeighbor::new().workers(config.neighbors.workers))
            }
            Algorithm::PerceptronBackprop => Box::new(BackpropPerceptron::from_config(config)),
            Algorithm::PerceptronMse => Box::new(MsePerceptron::from_config(config)),
        };
        Ok(model)
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Algorithm::NearestCentroid => write!(f, "nc"),
            Algorithm::SubclassCentroid(k) => write!(f, "nsc-{k}"),
            Algorithm::NearestNeighbor => write!(f, "nn"),
            Algorithm::PerceptronBackprop => write!(f, "perceptron-bp"),
            Algorithm::PerceptronMse => write!(f, "perceptron-mse"),
        }
    }
}

/// One row of a benchmark report.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RunRecord {
    pub dataset: String,
    pub algorithm: String,
    pub pca: bool,
    pub accuracy: f64,
    pub seconds: f64,
}

/// Fits and classifies with a fresh `algorithm`, timing both steps together.
///
/// The returned record carries no dataset name and `pca = false`;
/// [`run_suite`] fills those in.
pub fn run(store: &mut FeatureStore, algorithm: Algorithm, config: &Config) -> Result<RunRecord> {
    config.validate()?;
    let mut classifier = algorithm.build(config)?;
    store.clear_predictions();

    let start = Instant::now();
    classifier.fit_classify(store)?;
    let seconds = start.elapsed().as_secs_f64();

    let accuracy = metrics::accuracy(store.testing())?;
    tracing::info!(
        algorithm = %classifier.name(),
        accuracy,
        seconds,
        unclassified = metrics::unclassified_count(store.testing()),
        "run finished"
    );

    Ok(RunRecord {
        dataset: String::new(),
        algorithm: algorithm.to_string(),
        pca: false,
        accuracy,
        seconds,
    })
}

/// Runs [`Algorithm::suite`] in order on a copy of `store`, reduced with
/// PCA first when `pca` is set.
pub fn run_suite(
    dataset: &str,
    store: &FeatureStore,
    config: &Config,
    pca: bool,
) -> Result<Vec<RunRecord>> {
    config.validate()?;
    let mut store = store.clone();
    if pca {
        let mut reducer = PCA::from_config(config);
        reducer.fit_transform(&mut store)?;
        tracing::info!(
            dataset,
            components = store.vector_size(),
            "reduced with PCA"
        );
    }

    Algorithm::suite(config)
        .into_iter()
        .map(|algorithm| {
            let record = run(&mut store, algorithm, config)?;
            Ok(RunRecord {
                dataset: dataset.to_string(),
                pca,
                ..record
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Element;
    use ndarray::array;

    fn blobs() -> FeatureStore {
        let mut training = Vec::new();
        for (label, (cx, cy)) in [(0, (0.0, 0.0)), (1, (6.0, 0.0)), (2, (0.0, 6.0))] {
            for (dx, dy) in [(0.0, 0.0), (0.5, 0.2), (-0.3, 0.4), (0.2, -0.5), (-0.4, -0.1)] {
                training.push(Element::new(array![cx + dx, cy + dy, 1.0], label));
            }
        }
        let testing = vec![
            Element::new(array![0.1, 0.2, 1.0], 0),
            Element::new(array![5.8, 0.3, 1.0], 1),
            Element::new(array![0.2, 6.1, 1.0], 2),
        ];
        FeatureStore::from_elements(training, testing).unwrap()
    }

    fn config() -> Config {
        let mut config = Config::default();
        config.perceptron.seed = Some(5);
        config.perceptron.test_bias = 1.0;
        config.neighbors.workers = 2;
        config
    }

    #[test]
    fn test_suite_order() {
        let config = Config::default();
        let suite: Vec<String> = Algorithm::suite(&config).iter().map(|a| a.to_string()).collect();
        assert_eq!(
            suite,
            vec!["nc", "nsc-2", "nsc-3", "nsc-5", "nn", "perceptron-bp", "perceptron-mse"]
        );
    }

    #[test]
    fn test_build_names() {
        let config = config();
        let model = Algorithm::SubclassCentroid(3).build(&config).unwrap();
        assert_eq!(model.name(), "nearest subclass centroid (k=3)");
        let model = Algorithm::PerceptronMse.build(&config).unwrap();
        assert_eq!(model.name(), "perceptron (mse)");
    }

    #[test]
    fn test_run_scores_separable_blobs() {
        let mut store = blobs();
        for algorithm in [
            Algorithm::NearestCentroid,
            Algorithm::SubclassCentroid(2),
            Algorithm::NearestNeighbor,
        ] {
            let record = run(&mut store, algorithm, &config()).unwrap();
            assert_eq!(record.accuracy, 1.0, "{algorithm}");
            assert!(record.seconds >= 0.0);
        }
    }

    #[test]
    fn test_run_suite_labels_records() {
        let store = blobs();
        let records = run_suite("blobs", &store, &config(), false).unwrap();

        assert_eq!(records.len(), 7);
        assert!(records.iter().all(|r| r.dataset == "blobs" && !r.pca));
        assert!(records.iter().all(|r| (0.0..=1.0).contains(&r.accuracy)));
        assert_eq!(records[0].algorithm, "nc");
        // the caller's store is left untouched
        assert!(store.testing().iter().all(|e| e.predicted.is_none()));
    }

    #[test]
    fn test_run_suite_with_pca() {
        let records = run_suite("blobs", &blobs(), &config(), true).unwrap();
        assert!(records.iter().all(|r| r.pca));
        assert_eq!(records[0].accuracy, 1.0);
    }

    #[test]
    fn test_run_suite_propagates_errors() {
        let mut config = config();
        config.experiment.subclass_counts = vec![10];
        let err = run_suite("blobs", &blobs(), &config, false).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_zero_subclasses_is_a_config_error() {
        let mut store = blobs();
        let err = run(&mut store, Algorithm::SubclassCentroid(0), &config()).unwrap_err();
        assert!(matches!(err, ClassifyError::InvalidConfig(_)));
        assert!(store.testing().iter().all(|e| e.predicted.is_none()));
    }

    #[test]
    fn test_invalid_config_is_rejected_before_building() {
        let mut store = blobs();
        let mut config = config();
        config.neighbors.workers = 0;
        let err = run(&mut store, Algorithm::NearestNeighbor, &config).unwrap_err();
        assert!(err.is_configuration());
        assert!(Algorithm::NearestNeighbor.build(&config).is_err());

        let mut config = self::config();
        config.perceptron.learning_rate = 0.0;
        let err = run(&mut store, Algorithm::PerceptronBackprop, &config).unwrap_err();
        assert!(matches!(err, ClassifyError::InvalidConfig(_)));
    }
}

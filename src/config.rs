//! Tunable constants for every algorithm, loadable from TOML.
//!
//! ```rust
//! use patrec::Config;
//!
//! let config = Config::from_toml_str(
//!     r#"
//!     [kmeans]
//!     max_iter = 50
//!
//!     [perceptron]
//!     seed = 7
//!     fallback = "argmax"
//!     "#,
//! )
//! .unwrap();
//! assert_eq!(config.kmeans.max_iter, 50);
//! assert_eq!(config.neighbors.workers, 4);
//! ```

use crate::error::{ClassifyError, Result};
use crate::linear_model::Fallback;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Largest squared shift of any subcentroid still counted as converged.
pub const KMEANS_MAX_DISTANCE: f64 = 1e-6;
pub const KMEANS_MAX_ITER: usize = 300;
pub const MSE_RIDGE: f64 = 1e-4;
pub const BACKPROP_LEARNING_RATE: f64 = 0.01;
pub const BACKPROP_MAX_ITER: usize = 200;
pub const BACKPROP_INIT_RANGE: f64 = 0.1;
pub const NEIGHBOR_WORKERS: usize = 4;
pub const PCA_COMPONENTS: usize = 2;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub kmeans: KMeansConfig,
    pub perceptron: PerceptronConfig,
    pub neighbors: NeighborsConfig,
    pub pca: PcaConfig,
    pub experiment: ExperimentConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KMeansConfig {
    pub max_distance: f64,
    pub max_iter: usize,
}

impl Default for KMeansConfig {
    fn default() -> Self {
        Self {
            max_distance: KMEANS_MAX_DISTANCE,
            max_iter: KMEANS_MAX_ITER,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerceptronConfig {
    /// Added to the diagonal before inversion in the MSE solver.
    pub ridge: f64,
    pub learning_rate: f64,
    pub max_iter: usize,
    /// Initial weights are drawn uniformly from `[-init_range, init_range)`.
    pub init_range: f64,
    pub seed: Option<u64>,
    /// Bias coordinate appended to testing vectors by back-propagation.
    /// Training always uses 1.
    pub test_bias: f64,
    pub fallback: Fallback,
}

impl Default for PerceptronConfig {
    fn default() -> Self {
        Self {
            ridge: MSE_RIDGE,
            learning_rate: BACKPROP_LEARNING_RATE,
            max_iter: BACKPROP_MAX_ITER,
            init_range: BACKPROP_INIT_RANGE,
            seed: None,
            test_bias: 0.0,
            fallback: Fallback::Unclassified,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NeighborsConfig {
    pub workers: usize,
}

impl Default for NeighborsConfig {
    fn default() -> Self {
        Self {
            workers: NEIGHBOR_WORKERS,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PcaConfig {
    pub n_components: usize,
}

impl Default for PcaConfig {
    fn default() -> Self {
        Self {
            n_components: PCA_COMPONENTS,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    /// Subclass counts tried by the subclass-centroid runs, in order.
    pub subclass_counts: Vec<usize>,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            subclass_counts: vec![2, 3, 5],
        }
    }
}

impl Config {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| Err(ClassifyError::InvalidConfig(msg.to_string()));

        if !(self.kmeans.max_distance >= 0.0) {
            return invalid("kmeans.max_distance must be >= 0");
        }
        if self.kmeans.max_iter == 0 {
            return invalid("kmeans.max_iter must be > 0");
        }
        if !(self.perceptron.ridge > 0.0) {
            return invalid("perceptron.ridge must be > 0");
        }
        if !(self.perceptron.learning_rate > 0.0) {
            return invalid("perceptron.learning_rate must be > 0");
        }
        if self.perceptron.max_iter == 0 {
            return invalid("perceptron.max_iter must be > 0");
        }
        if !(self.perceptron.init_range > 0.0) {
            return invalid("perceptron.init_range must be > 0");
        }
        if self.neighbors.workers == 0 {
            return invalid("neighbors.workers must be > 0");
        }
        if self.pca.n_components == 0 {
            return invalid("pca.n_components must be > 0");
        }
        if self.experiment.subclass_counts.contains(&0) {
            return invalid("experiment.subclass_counts must all be > 0");
        }
        Ok(())
    }
}

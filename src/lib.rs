pub use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

pub mod cluster;
pub mod config;
pub mod dataset;
pub mod datasets;
pub mod decomposition;
pub mod distance;
pub mod error;
pub mod experiment;
mod linalg;
pub mod linear_model;
pub mod metrics;
pub mod neighbors;
pub mod report;

pub use cluster::SubclassCentroid;
pub use config::Config;
pub use dataset::{Element, FeatureStore};
pub use datasets::{DataSource, Mnist, Orl};
pub use decomposition::PCA;
pub use error::{ClassifyError, Result};
pub use experiment::{Algorithm, RunRecord};
pub use linear_model::{BackpropPerceptron, Fallback, MsePerceptron};
pub use neighbors::{CentroidSet, NearestCentroid, NearestNeighbor};

pub type Vector = Array1<f64>;
pub type Matrix = Array2<f64>;

/// Identifier of a ground-truth class.
pub type ClassId = usize;

/// A trainable classifier that writes its predictions into the testing
/// elements of a [`FeatureStore`].
pub trait Classifier {
    fn name(&self) -> String;

    /// Derives the model's transient state (centroids, weights) from the
    /// store's training data.
    fn fit(&mut self, store: &FeatureStore) -> Result<()>;

    /// Overwrites the predicted slot of every testing element.
    fn classify(&self, store: &mut FeatureStore) -> Result<()>;

    fn fit_classify(&mut self, store: &mut FeatureStore) -> Result<()> {
        self.fit(store)?;
        self.classify(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_types_work() {
        let vec = Vector::zeros(5);
        let mat = Matrix::zeros((3, 4));
        assert_eq!(vec.len(), 5);
        assert_eq!(mat.shape(), &[3, 4]);
    }

    #[test]
    fn classifiers_are_object_safe() {
        let models: Vec<Box<dyn Classifier>> = vec![
            Box::new(NearestCentroid::new()),
            Box::new(NearestNeighbor::new()),
        ];
        assert_eq!(models.len(), 2);
    }
}

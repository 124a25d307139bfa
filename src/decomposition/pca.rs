use crate::config::{Config, PCA_COMPONENTS};
use crate::dataset::FeatureStore;
use crate::error::{ClassifyError, Result};
use crate::linalg::to_nalgebra;
use crate::{Matrix, Vector};
use nalgebra::SymmetricEigen;
use std::cmp::Ordering;

const EIGEN_EPS: f64 = 1e-12;
const EIGEN_MAX_ITER: usize = 10_000;

/// Principal component projection of a whole [`FeatureStore`].
///
/// Fitted on the training vectors only: their mean is removed from every
/// training and testing vector, and everything is projected onto the
/// eigenvectors of the training covariance with the largest eigenvalues.
#[derive(Clone, Debug)]
pub struct PCA {
    /// `n_components x D`, strongest direction first.
    pub components: Option<Matrix>,
    pub explained_variance: Option<Vector>,
    pub explained_variance_ratio: Option<Vector>,
    pub mean: Option<Vector>,
    n_components: usize,
}

impl PCA {
    pub fn new() -> Self {
        Self {
            components: None,
            explained_variance: None,
            explained_variance_ratio: None,
            mean: None,
            n_components: PCA_COMPONENTS,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new().n_components(config.pca.n_components)
    }

    pub fn n_components(mut self, n_components: usize) -> Self {
        if n_components == 0 {
            panic!("n_components must be > 0, got {}", n_components);
        }
        self.n_components = n_components;
        self
    }

    pub fn fit(&mut self, store: &FeatureStore) -> Result<()> {
        store.validate()?;
        let n_samples = store.training_len();
        let n_features = store.vector_size();
        if n_samples == 0 {
            return Err(ClassifyError::EmptyTrainingSet);
        }
        if self.n_components > n_features {
            return Err(ClassifyError::InvalidConfig(format!(
                "n_components={} cannot be larger than the vector size {}",
                self.n_components, n_features
            )));
        }

        let (x, _) = store.training_matrix(None);
        let mean = x
            .mean_axis(ndarray::Axis(1))
            .ok_or(ClassifyError::EmptyTrainingSet)?;
        let centered = &x - &mean.view().insert_axis(ndarray::Axis(1));
        let covariance = centered.dot(&centered.t()) / n_samples as f64;

        let eigen = SymmetricEigen::try_new(to_nalgebra(&covariance), EIGEN_EPS, EIGEN_MAX_ITER)
            .ok_or_else(|| {
                ClassifyError::Numerical(format!(
                    "eigendecomposition of the {n_features}x{n_features} covariance did not converge"
                ))
            })?;

        // Solver order is arbitrary; sort ascending and take from the top.
        let mut order: Vec<usize> = (0..n_features).collect();
        order.sort_by(|&a, &b| {
            eigen.eigenvalues[a]
                .partial_cmp(&eigen.eigenvalues[b])
                .unwrap_or(Ordering::Equal)
        });

        let mut components = Matrix::zeros((self.n_components, n_features));
        let mut explained_variance = Vector::zeros(self.n_components);
        for (i, &index) in order.iter().rev().take(self.n_components).enumerate() {
            let column = eigen.eigenvectors.column(index);
            let norm = column.norm();
            for j in 0..n_features {
                components[(i, j)] = column[j] / norm;
            }
            explained_variance[i] = eigen.eigenvalues[index];
        }

        let total_variance = eigen.eigenvalues.sum();
        let explained_variance_ratio = if total_variance > 0.0 {
            &explained_variance / total_variance
        } else {
            Vector::zeros(self.n_components)
        };

        tracing::debug!(
            n_features,
            n_components = self.n_components,
            retained = explained_variance_ratio.sum(),
            "pca fitted"
        );
        self.components = Some(components);
        self.explained_variance = Some(explained_variance);
        self.explained_variance_ratio = Some(explained_variance_ratio);
        self.mean = Some(mean);
        Ok(())
    }

    /// Projects one vector onto the fitted components.
    pub fn project(&self, x: &Vector) -> Result<Vector> {
        let components = self.components.as_ref().ok_or(ClassifyError::NotFitted("PCA"))?;
        let mean = self.mean.as_ref().ok_or(ClassifyError::NotFitted("PCA"))?;
        if x.len() != mean.len() {
            return Err(ClassifyError::DimensionMismatch {
                expected: mean.len(),
                actual: x.len(),
            });
        }
        Ok(components.dot(&(x - mean)))
    }

    /// Replaces every training and testing vector by its projection. The
    /// store's vector size becomes `n_components`; this cannot be undone.
    pub fn transform(&self, store: &mut FeatureStore) -> Result<()> {
        let components = self.components.as_ref().ok_or(ClassifyError::NotFitted("PCA"))?;
        let mean = self.mean.as_ref().ok_or(ClassifyError::NotFitted("PCA"))?;
        if store.vector_size() != mean.len() {
            return Err(ClassifyError::DimensionMismatch {
                expected: mean.len(),
                actual: store.vector_size(),
            });
        }
        store.validate()?;

        store.map_features(components.nrows(), |x| components.dot(&(x - mean)))
    }

    pub fn fit_transform(&mut self, store: &mut FeatureStore) -> Result<()> {
        self.fit(store)?;
        self.transform(store)
    }
}

impl Default for PCA {
    fn default() -> Self {
        Self::new()
    }
}

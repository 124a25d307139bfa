//! Dimensionality reduction.
//!
//! `PCA` projects every vector of a [`FeatureStore`](crate::FeatureStore)
//! onto the strongest principal directions of its training data (two by
//! default), in place. Any classifier run afterwards works on the reduced
//! vectors only.
//!
//! # Examples
//!
//! ```rust
//! use patrec::{Element, FeatureStore, PCA};
//! use ndarray::array;
//!
//! let training = vec![
//!     Element::new(array![1.0, 2.0, 3.0], 0),
//!     Element::new(array![4.0, 5.0, 6.5], 0),
//!     Element::new(array![7.0, 8.5, 9.0], 1),
//!     Element::new(array![10.0, 11.0, 12.0], 1),
//! ];
//! let testing = vec![Element::new(array![2.0, 2.0, 2.0], 0)];
//! let mut store = FeatureStore::from_elements(training, testing).unwrap();
//!
//! let mut pca = PCA::new();
//! pca.fit_transform(&mut store).unwrap();
//!
//! assert_eq!(store.vector_size(), 2);
//! let ratio = pca.explained_variance_ratio.as_ref().unwrap();
//! assert!(ratio[0] > 0.9);
//! ```

mod pca;

pub use pca::PCA;

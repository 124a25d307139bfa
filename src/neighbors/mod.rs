//! Minimum-distance classifiers.
//!
//! This module provides:
//! - `NearestCentroid`: one mean vector per class, each test vector takes the
//!   class of its closest mean
//! - `NearestNeighbor`: each test vector takes the class of its closest
//!   training vector, optionally scanning the testing set on several workers
//!
//! All of them break exact distance ties in favour of the candidate seen
//! first (classes in ascending id order, then insertion order).
//!
//! # Examples
//!
//! ```rust
//! use patrec::{Classifier, Element, FeatureStore, NearestCentroid, NearestNeighbor};
//! use ndarray::array;
//!
//! let training = vec![
//!     Element::new(array![0.0, 0.0], 0),
//!     Element::new(array![0.5, 0.0], 0),
//!     Element::new(array![10.0, 10.0], 1),
//!     Element::new(array![10.5, 10.0], 1),
//! ];
//! let testing = vec![
//!     Element::new(array![0.2, 0.1], 0),
//!     Element::new(array![9.0, 9.5], 1),
//! ];
//! let mut store = FeatureStore::from_elements(training, testing).unwrap();
//!
//! let mut centroid = NearestCentroid::new();
//! centroid.fit_classify(&mut store).unwrap();
//! assert_eq!(store.predictions(), vec![Some(0), Some(1)]);
//!
//! let mut neighbor = NearestNeighbor::new().workers(2);
//! neighbor.fit_classify(&mut store).unwrap();
//! assert_eq!(store.predictions(), vec![Some(0), Some(1)]);
//! ```

mod centroid;
mod nearest;

pub use centroid::{CentroidSet, NearestCentroid};
pub use nearest::NearestNeighbor;

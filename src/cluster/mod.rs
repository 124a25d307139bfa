//! Sub-class discovery by clustering.
//!
//! `SubclassCentroid` runs K-means inside every class independently and then
//! classifies against all `k x C` subcentroids, reporting the parent class
//! of the winner. Initialization is deterministic, so two runs on the same
//! store always produce the same centroids.
//!
//! # Examples
//!
//! ```rust
//! use patrec::{Classifier, Element, FeatureStore, SubclassCentroid};
//! use ndarray::array;
//!
//! let training = vec![
//!     Element::new(array![0.0, 0.0], 0),
//!     Element::new(array![8.0, 8.0], 0),
//!     Element::new(array![0.5, 0.5], 0),
//!     Element::new(array![8.5, 8.5], 0),
//!     Element::new(array![4.0, 4.5], 1),
//!     Element::new(array![4.5, 4.0], 1),
//! ];
//! let testing = vec![Element::new(array![8.2, 8.1], 0)];
//! let mut store = FeatureStore::from_elements(training, testing).unwrap();
//!
//! let mut model = SubclassCentroid::new(2);
//! model.fit_classify(&mut store).unwrap();
//!
//! assert_eq!(model.centroids.as_ref().unwrap().len(), 4);
//! assert_eq!(store.predictions(), vec![Some(0)]);
//! ```

mod kmeans;

pub use kmeans::SubclassCentroid;

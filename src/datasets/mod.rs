//! Loaders that populate a [`FeatureStore`] from files on disk.
//!
//! The algorithms only ever see the store; each dataset kind implements
//! [`DataSource`]:
//! - `Mnist`: the handwritten digit set in IDX binary format
//! - `Orl`: the ORL face set as tab-delimited text, split per class

mod mnist;
mod orl;

pub use mnist::Mnist;
pub use orl::{Layout, Orl};

use crate::dataset::FeatureStore;
use crate::error::Result;

pub trait DataSource {
    /// Short name used in reports.
    fn name(&self) -> &str;

    fn load(&self) -> Result<FeatureStore>;
}

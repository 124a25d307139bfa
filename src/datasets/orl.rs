use super::DataSource;
use crate::dataset::{Element, FeatureStore};
use crate::error::{ClassifyError, Result};
use crate::{ClassId, Vector};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::path::{Path, PathBuf};

const DATA_FILE: &str = "orl_data.txt";
const LABELS_FILE: &str = "orl_lbls.txt";

/// How the values in `orl_data.txt` are ordered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Layout {
    /// All values of the first image, then the second image, and so on.
    #[default]
    SampleMajor,
    /// One row per feature, one column per image.
    FeatureMajor,
}

/// ORL faces: whitespace-delimited pixel values plus one label per image.
///
/// The set ships unsplit, so `load` splits every class at random into
/// training and testing, keeping `train_fraction` of each class for training.
#[derive(Clone, Debug)]
pub struct Orl {
    dir: PathBuf,
    train_fraction: f64,
    seed: u64,
    layout: Layout,
}

impl Orl {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            train_fraction: 0.7,
            seed: 0,
            layout: Layout::default(),
        }
    }

    pub fn train_fraction(mut self, train_fraction: f64) -> Self {
        if !(train_fraction > 0.0 && train_fraction < 1.0) {
            panic!("train_fraction must be in (0, 1)");
        }
        self.train_fraction = train_fraction;
        self
    }

    /// Seed of the per-class shuffle.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    fn samples(&self) -> Result<Vec<Element>> {
        let values: Vec<f64> = read_tokens(&self.dir.join(DATA_FILE))?;
        let labels: Vec<ClassId> = read_tokens(&self.dir.join(LABELS_FILE))?;
        split_samples(&values, &labels, self.layout)
    }
}

impl DataSource for Orl {
    fn name(&self) -> &str {
        "ORL"
    }

    fn load(&self) -> Result<FeatureStore> {
        tracing::info!(dir = %self.dir.display(), layout = ?self.layout, "loading ORL");
        let samples = self.samples()?;
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let store = FeatureStore::split_per_class(samples, self.train_fraction, &mut rng)?;
        tracing::info!(
            training = store.training_len(),
            testing = store.testing().len(),
            classes = store.num_classes(),
            vector_size = store.vector_size(),
            "ORL loaded"
        );
        Ok(store)
    }
}

fn read_tokens<T>(path: &Path) -> Result<Vec<T>>
where
    T: std::str::FromStr,
    ClassifyError: From<T::Err>,
{
    let raw = std::fs::read_to_string(path)?;
    raw.split_whitespace()
        .map(|token| token.parse::<T>().map_err(ClassifyError::from))
        .collect()
}

/// Cuts the flat value list into one vector per label.
fn split_samples(values: &[f64], labels: &[ClassId], layout: Layout) -> Result<Vec<Element>> {
    let n_samples = labels.len();
    if n_samples == 0 {
        return Err(ClassifyError::InvalidData(format!("{LABELS_FILE} holds no labels")));
    }
    if values.is_empty() || values.len() % n_samples != 0 {
        return Err(ClassifyError::InvalidData(format!(
            "{} values cannot be split evenly into {n_samples} images",
            values.len()
        )));
    }
    let size = values.len() / n_samples;

    let elements = labels
        .iter()
        .enumerate()
        .map(|(i, &label)| {
            let features: Vector = match layout {
                Layout::SampleMajor => values[i * size..(i + 1) * size].iter().copied().collect(),
                Layout::FeatureMajor => (0..size).map(|j| values[j * n_samples + i]).collect(),
            };
            Element::new(features, label)
        })
        .collect();
    Ok(elements)
}

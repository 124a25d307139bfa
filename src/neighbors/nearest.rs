use crate::dataset::{Element, FeatureStore};
use crate::distance::nearest;
use crate::error::{ClassifyError, Result};
use crate::{ClassId, Classifier};
use rayon::ThreadPool;
use std::collections::BTreeMap;
use std::sync::Arc;

/// 1-nearest-neighbour classifier over the whole training set.
///
/// With `workers > 1` the testing set is cut into that many contiguous
/// slices of near-equal length, each scanned on its own pool thread. The
/// slices are disjoint so the workers never share mutable state, and
/// `classify` returns only once every slice is done.
///
/// The worker pool is built once by `fit` and reused by every later
/// `classify`; clones share it.
#[derive(Clone, Debug)]
pub struct NearestNeighbor {
    workers: usize,
    pool: Option<Arc<ThreadPool>>,
}

impl NearestNeighbor {
    pub fn new() -> Self {
        Self {
            workers: 1,
            pool: None,
        }
    }

    pub fn workers(mut self, workers: usize) -> Self {
        if workers == 0 {
            panic!("workers must be > 0, got {}", workers);
        }
        self.workers = workers;
        self.pool = None;
        self
    }

    pub fn get_workers(&self) -> usize {
        self.workers
    }

    /// Checks the store and builds the worker pool when `workers > 1`. No
    /// model is learned; `classify` reads the training set directly.
    pub fn fit(&mut self, store: &FeatureStore) -> Result<()> {
        store.validate()?;
        if self.workers > 1 && self.pool.is_none() {
            self.pool = Some(Arc::new(build_pool(self.workers)?));
            tracing::debug!(workers = self.workers, "nearest neighbour pool built");
        }
        Ok(())
    }

    pub fn classify(&self, store: &mut FeatureStore) -> Result<()> {
        store.validate()?;
        if store.training_len() == 0 {
            return Err(ClassifyError::EmptyTrainingSet);
        }

        let (training, testing) = store.split_mut();
        if self.workers == 1 || testing.len() < 2 {
            classify_slice(training, testing);
        } else {
            self.classify_parallel(training, testing)?;
        }

        tracing::debug!(
            samples = testing.len(),
            workers = self.workers,
            "nearest neighbour scan complete"
        );
        Ok(())
    }

    fn classify_parallel(
        &self,
        training: &BTreeMap<ClassId, Vec<Element>>,
        testing: &mut [Element],
    ) -> Result<()> {
        // classify without fit still works, on a pool built for this call
        let owned;
        let pool = match &self.pool {
            Some(pool) => pool.as_ref(),
            None => {
                owned = build_pool(self.workers)?;
                &owned
            }
        };

        let slices = partition(testing, self.workers);
        pool.scope(|scope| {
            for slice in slices {
                scope.spawn(move |_| classify_slice(training, slice));
            }
        });
        Ok(())
    }
}

impl Default for NearestNeighbor {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier for NearestNeighbor {
    fn name(&self) -> String {
        if self.workers > 1 {
            format!("nearest neighbour ({} workers)", self.workers)
        } else {
            "nearest neighbour".to_string()
        }
    }

    fn fit(&mut self, store: &FeatureStore) -> Result<()> {
        NearestNeighbor::fit(self, store)
    }

    fn classify(&self, store: &mut FeatureStore) -> Result<()> {
        NearestNeighbor::classify(self, store)
    }
}

fn build_pool(workers: usize) -> Result<ThreadPool> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("nn-worker-{i}"))
        .build()?;
    Ok(pool)
}

fn classify_slice(training: &BTreeMap<ClassId, Vec<Element>>, testing: &mut [Element]) {
    for element in testing {
        element.predicted = nearest(
            element.features.view(),
            training
                .iter()
                .flat_map(|(&class, elements)| {
                    elements.iter().map(move |e| (class, e.features.view()))
                }),
        )
        .map(|(class, _)| class);
    }
}

/// Splits `items` into `parts` contiguous slices whose lengths differ by at
/// most one, longer slices first. Empty slices are dropped.
fn partition<T>(mut items: &mut [T], parts: usize) -> Vec<&mut [T]> {
    let base = items.len() / parts;
    let extra = items.len() % parts;
    let mut slices = Vec::with_capacity(parts);
    for i in 0..parts {
        let len = base + usize::from(i < extra);
        if len == 0 {
            break;
        }
        let (head, tail) = std::mem::take(&mut items).split_at_mut(len);
        slices.push(head);
        items = tail;
    }
    slices
}

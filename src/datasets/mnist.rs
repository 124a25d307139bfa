use super::DataSource;
use crate::dataset::{Element, FeatureStore};
use crate::error::{ClassifyError, Result};
use crate::Vector;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

const IMAGES_MAGIC: u32 = 2051;
const LABELS_MAGIC: u32 = 2049;

/// MNIST digits read from the four IDX files in `dir`.
///
/// Pixels are rescaled from `0..=255` to `[0, 1]`.
#[derive(Clone, Debug)]
pub struct Mnist {
    dir: PathBuf,
    max_training: Option<usize>,
    max_testing: Option<usize>,
}

impl Mnist {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            max_training: None,
            max_testing: None,
        }
    }

    /// Keeps only the first `n` training images.
    pub fn max_training(mut self, n: usize) -> Self {
        self.max_training = Some(n);
        self
    }

    pub fn max_testing(mut self, n: usize) -> Self {
        self.max_testing = Some(n);
        self
    }

    fn read_set(
        &self,
        images_file: &str,
        labels_file: &str,
        limit: Option<usize>,
    ) -> Result<(usize, Vec<Element>)> {
        let (size, images) = read_images(&self.dir.join(images_file), limit)?;
        let labels = read_labels(&self.dir.join(labels_file), limit)?;
        if images.len() != labels.len() {
            return Err(ClassifyError::InvalidData(format!(
                "{images_file} holds {} images but {labels_file} holds {} labels",
                images.len(),
                labels.len(),
            )));
        }

        let elements = images
            .into_iter()
            .zip(labels)
            .map(|(image, label)| Element::new(image, usize::from(label)))
            .collect();
        Ok((size, elements))
    }
}

impl DataSource for Mnist {
    fn name(&self) -> &str {
        "MNIST"
    }

    fn load(&self) -> Result<FeatureStore> {
        tracing::info!(dir = %self.dir.display(), "loading MNIST");
        let (size, training) = self.read_set(
            "train-images-idx3-ubyte",
            "train-labels-idx1-ubyte",
            self.max_training,
        )?;
        let (test_size, testing) = self.read_set(
            "t10k-images-idx3-ubyte",
            "t10k-labels-idx1-ubyte",
            self.max_testing,
        )?;
        if size != test_size {
            return Err(ClassifyError::DimensionMismatch {
                expected: size,
                actual: test_size,
            });
        }

        let mut store = FeatureStore::new(size);
        for element in training {
            store.push_training(element)?;
        }
        for element in testing {
            store.push_testing(element)?;
        }
        tracing::info!(
            training = store.training_len(),
            testing = store.testing().len(),
            classes = store.num_classes(),
            "MNIST loaded"
        );
        Ok(store)
    }
}

fn read_u32<R: Read>(reader: &mut R) -> Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_be_bytes(buf))
}

fn invalid(path: &Path, msg: impl std::fmt::Display) -> ClassifyError {
    ClassifyError::InvalidData(format!("{}: {msg}", path.display()))
}

/// Opens an IDX file, checks its magic number and returns the reader, the
/// item count from the header and the number of payload bytes after a
/// header of `header_len` bytes.
fn open(path: &Path, magic: u32, header_len: u64) -> Result<(BufReader<File>, usize, u64)> {
    let file = File::open(path)?;
    let file_len = file.metadata()?.len();
    let mut reader = BufReader::new(file);
    let found = read_u32(&mut reader)?;
    if found != magic {
        return Err(invalid(path, format!("bad magic number {found}, expected {magic}")));
    }
    let count = read_u32(&mut reader)? as usize;
    let payload = file_len
        .checked_sub(header_len)
        .ok_or_else(|| invalid(path, "truncated header"))?;
    Ok((reader, count, payload))
}

/// Fails unless `count` items of `item_len` bytes fit in `payload` bytes.
fn check_payload(path: &Path, count: usize, item_len: usize, payload: u64) -> Result<()> {
    let needed = count
        .checked_mul(item_len)
        .ok_or_else(|| invalid(path, format!("header declares {count} items of {item_len} bytes")))?;
    if needed as u64 > payload {
        return Err(invalid(
            path,
            format!("header declares {needed} bytes of data but the file holds {payload}"),
        ));
    }
    Ok(())
}

/// Returns the vector size (rows x columns) and one rescaled vector per image.
fn read_images(path: &Path, limit: Option<usize>) -> Result<(usize, Vec<Vector>)> {
    let (mut reader, count, payload) = open(path, IMAGES_MAGIC, 16)?;
    let rows = read_u32(&mut reader)? as usize;
    let cols = read_u32(&mut reader)? as usize;
    let size = rows
        .checked_mul(cols)
        .filter(|&size| size > 0)
        .ok_or_else(|| invalid(path, format!("bad image shape {rows}x{cols}")))?;
    check_payload(path, count, size, payload)?;
    let count = limit.map_or(count, |n| n.min(count));

    let mut buf = vec![0u8; size];
    let mut images = Vec::with_capacity(count);
    for _ in 0..count {
        reader.read_exact(&mut buf)?;
        images.push(buf.iter().map(|&p| f64::from(p) / 255.0).collect());
    }
    Ok((size, images))
}

fn read_labels(path: &Path, limit: Option<usize>) -> Result<Vec<u8>> {
    let (mut reader, count, payload) = open(path, LABELS_MAGIC, 8)?;
    check_payload(path, count, 1, payload)?;
    let count = limit.map_or(count, |n| n.min(count));
    let mut labels = vec![0u8; count];
    reader.read_exact(&mut labels)?;
    Ok(labels)
}

//! Error types shared by every algorithm in the crate.

use crate::ClassId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("class {class} has {available} training samples but {requested} subclasses were requested")]
    NotEnoughSamples {
        class: ClassId,
        available: usize,
        requested: usize,
    },

    #[error("class {0} has no training samples")]
    EmptyClass(ClassId),

    #[error("training set is empty")]
    EmptyTrainingSet,

    #[error("testing set is empty")]
    EmptyTestingSet,

    #[error("{0} not fitted, call fit() first")]
    NotFitted(&'static str),

    #[error("matrix is singular even after regularization: {0}")]
    SingularMatrix(String),

    #[error("numerical failure: {0}")]
    Numerical(String),

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    ParseFloat(#[from] std::num::ParseFloatError),

    #[error(transparent)]
    ParseInt(#[from] std::num::ParseIntError),

    #[error(transparent)]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl ClassifyError {
    /// Fatal misuse of an algorithm: bad parameters, bad shapes or empty inputs.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::InvalidConfig(_)
                | Self::DimensionMismatch { .. }
                | Self::NotEnoughSamples { .. }
                | Self::EmptyClass(_)
                | Self::EmptyTrainingSet
                | Self::EmptyTestingSet
                | Self::NotFitted(_)
        )
    }

    pub fn is_numerical(&self) -> bool {
        matches!(self, Self::SingularMatrix(_) | Self::Numerical(_))
    }
}

pub type Result<T> = std::result::Result<T, ClassifyError>;

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("not a DAOS path: {0}")]
    InvalidPathKind(String),
    #[error("buffer of {len} bytes from {path:?} is not a multiple of element size {element_size}")]
    BufferSizeMismatch {
        path: PathBuf,
        len: usize,
        element_size: usize,
    },
    #[error("shape {shape:?} needs {needed} bytes but {path:?} holds {available}")]
    ShapeMismatch {
        path: PathBuf,
        shape: Vec<usize>,
        needed: u64,
        available: u64,
    },
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{0} backend is not available in this build")]
    BackendUnavailable(&'static str),
    #[error("container error on {path:?}: {message}")]
    Container { path: PathBuf, message: String },
    #[error("unsupported dtype: {0}")]
    UnsupportedDType(String),
    #[error("tensor error: {0}")]
    Tensor(#[from] dt_tensor::TensorError),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TensorError {
    #[error("shape mismatch: shape {shape:?} holds {expected} elements, buffer holds {got}")]
    ShapeMismatch {
        shape: Vec<usize>,
        expected: usize,
        got: usize,
    },
    #[error("buffer of {len} bytes is not a multiple of element size {element_size} ({dtype})")]
    BufferSizeMismatch {
        len: usize,
        element_size: usize,
        dtype: String,
    },
    #[error("dtype mismatch: expected {expected}, got {got}")]
    DTypeMismatch { expected: String, got: String },
    #[error("index {index:?} out of bounds for shape {shape:?}")]
    IndexOutOfBounds { index: Vec<usize>, shape: Vec<usize> },
}

pub type Result<T> = std::result::Result<T, TensorError>;

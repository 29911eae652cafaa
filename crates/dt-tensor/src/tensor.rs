use crate::dtype::DType;
use crate::error::{Result, TensorError};
use crate::shape::Shape;
use crate::storage::{CpuStorage, Element};

/// A typed, shaped array backed by CPU storage.
///
/// Invariant: `storage.len() == shape.numel()`. Tensors built from bytes
/// with an unknown shape are one-dimensional.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    storage: CpuStorage,
    shape: Shape,
}

impl Tensor {
    /// Create a tensor from a typed vector and a shape.
    ///
    /// # Errors
    /// Returns `ShapeMismatch` if `data.len() != shape.numel()`.
    pub fn new<T: Element>(data: Vec<T>, shape: Shape) -> Result<Self> {
        Self::from_storage(T::into_storage(data), shape)
    }

    /// Wrap existing storage. An unknown (empty) shape flattens to 1-D.
    pub fn from_storage(storage: CpuStorage, shape: Shape) -> Result<Self> {
        let shape = if shape.is_unknown() {
            Shape::flat(storage.len())
        } else {
            shape
        };
        if shape.checked_numel() != Some(storage.len()) {
            return Err(TensorError::ShapeMismatch {
                expected: shape.checked_numel().unwrap_or(usize::MAX),
                shape: shape.dims().to_vec(),
                got: storage.len(),
            });
        }
        Ok(Tensor { storage, shape })
    }

    /// Reinterpret little-endian bytes as a tensor of `dtype` and `shape`.
    ///
    /// The byte count must be a multiple of the element size and, when the
    /// shape is known, hold exactly `shape.numel()` elements.
    pub fn from_le_bytes(bytes: &[u8], dtype: DType, shape: Shape) -> Result<Self> {
        let storage = CpuStorage::from_le_bytes(dtype, bytes)?;
        Self::from_storage(storage, shape)
    }

    /// Returns a reference to the tensor's shape.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Returns the tensor's element type.
    pub fn dtype(&self) -> DType {
        self.storage.dtype()
    }

    /// Number of elements.
    pub fn numel(&self) -> usize {
        self.storage.len()
    }

    /// Returns the underlying storage reference.
    pub fn storage(&self) -> &CpuStorage {
        &self.storage
    }

    /// Borrow the elements as a typed slice.
    ///
    /// # Errors
    /// Returns `DTypeMismatch` if `T` does not match the tensor's dtype.
    pub fn data<T: Element>(&self) -> Result<&[T]> {
        self.storage
            .as_slice::<T>()
            .ok_or_else(|| TensorError::DTypeMismatch {
                expected: T::DTYPE.to_string(),
                got: self.dtype().to_string(),
            })
    }

    /// Element at a multi-dimensional index.
    pub fn get<T: Element>(&self, index: &[usize]) -> Result<T> {
        let offset = self.shape.offset_of(index)?;
        Ok(self.data::<T>()?[offset])
    }

    /// Reshape the tensor, returning a new tensor with the same data but
    /// a different shape.
    ///
    /// The total number of elements must remain the same.
    pub fn reshape(&self, new_shape: Shape) -> Result<Tensor> {
        Self::from_storage(self.storage.clone(), new_shape)
    }

    /// Cast element-wise to `dtype`, keeping the shape.
    pub fn to_dtype(&self, dtype: DType) -> Tensor {
        Tensor {
            storage: self.storage.cast(dtype),
            shape: self.shape.clone(),
        }
    }

    /// Consuming variant of [`Tensor::to_dtype`]; avoids a copy when the
    /// dtype already matches.
    pub fn into_dtype(self, dtype: DType) -> Tensor {
        if self.dtype() == dtype {
            return self;
        }
        self.to_dtype(dtype)
    }

    /// Little-endian bytes of the elements in row-major order.
    pub fn to_le_bytes(&self) -> Vec<u8> {
        self.storage.to_le_bytes()
    }
}

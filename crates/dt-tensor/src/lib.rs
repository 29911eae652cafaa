//! `dt-tensor` - Typed tensors rebuilt from raw storage bytes.
//!
//! This crate provides:
//! - A `DType` covering the primitive numeric element types found in
//!   sidecar descriptors and HDF5 datasets
//! - A `Shape` with row-major stride helpers
//! - Typed `CpuStorage` with little-endian byte (de)serialization and
//!   element-wise casts
//! - A `Tensor` type tying storage, shape and dtype together

pub mod dtype;
pub mod error;
pub mod shape;
pub mod storage;
pub mod tensor;

// Re-export primary types at the crate root for convenience.
pub use dtype::DType;
pub use error::{Result, TensorError};
pub use shape::Shape;
pub use storage::CpuStorage;
pub use tensor::Tensor;

//! `dt-store` - Tensor loading from a DAOS object store through
//! filesystem-style paths.
//!
//! A path goes through the [`PathTranslator`] (mount path or `daos://` URI),
//! the backend is chosen from its extension ([`select_backend`]), the
//! [`MetadataResolver`] fills in shape and dtype where the backend needs
//! them, one of the three readers produces the bytes and the
//! [`assembler`] turns them into a [`dt_tensor::Tensor`].
//! [`TensorLoader`] is the boundary the host-framework adapters call.

pub mod assembler;
pub mod backend;
pub mod config;
pub mod error;
pub mod loader;
pub mod metadata;
pub mod path;
pub mod reader;

pub use backend::{select_backend, BackendKind};
pub use config::StoreConfig;
pub use error::{Result, StoreError};
pub use loader::TensorLoader;
pub use metadata::{Descriptor, DescriptorSource, MetadataResolver};
pub use path::{PathTranslator, StoragePath};
pub use reader::RawBuffer;

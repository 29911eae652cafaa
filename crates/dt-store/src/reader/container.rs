use std::fmt::Debug;
use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::error::{Result, StoreError};
use crate::metadata::Descriptor;

use super::RawBuffer;

/// A self-describing container format.
///
/// Implementations open the container read-only, load one dataset and
/// report its native shape and element type. The container handle must not
/// outlive the call, whatever the outcome.
pub trait ContainerFormat: Send + Sync + Debug {
    /// Returns the name of this format (e.g., "hdf5").
    fn name(&self) -> &str;

    /// Load `dataset` from the container at `path`.
    fn read_dataset(&self, path: &Path, dataset: &str) -> Result<(RawBuffer, Descriptor)>;
}

/// Stand-in used when the crate is built without any container support.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableFormat;

impl ContainerFormat for UnavailableFormat {
    fn name(&self) -> &str {
        "unavailable"
    }

    fn read_dataset(&self, _path: &Path, _dataset: &str) -> Result<(RawBuffer, Descriptor)> {
        Err(StoreError::BackendUnavailable("hdf5"))
    }
}

/// The container format compiled into this build.
pub fn default_format() -> Arc<dyn ContainerFormat> {
    #[cfg(feature = "hdf5")]
    {
        Arc::new(hdf5_format::Hdf5Format)
    }
    #[cfg(not(feature = "hdf5"))]
    {
        Arc::new(UnavailableFormat)
    }
}

/// Reads tensors stored as a named dataset in a container.
///
/// The container is authoritative for shape and dtype; sidecars are never
/// consulted.
#[derive(Debug, Clone)]
pub struct ContainerReader {
    format: Arc<dyn ContainerFormat>,
    dataset: String,
}

impl ContainerReader {
    pub fn new(format: Arc<dyn ContainerFormat>, dataset: impl Into<String>) -> Self {
        Self {
            format,
            dataset: dataset.into(),
        }
    }

    pub fn read(&self, path: &Path) -> Result<(RawBuffer, Descriptor)> {
        let (buffer, descriptor) = self.format.read_dataset(path, &self.dataset)?;
        debug!(
            ?path,
            format = self.format.name(),
            dataset = %self.dataset,
            shape = ?descriptor.shape,
            dtype = %descriptor.dtype,
            "container dataset read"
        );
        Ok((buffer, descriptor))
    }
}

#[cfg(feature = "hdf5")]
pub use hdf5_format::Hdf5Format;

#[cfg(feature = "hdf5")]
mod hdf5_format {
    use std::path::Path;

    use hdf5::types::{FloatSize, IntSize, TypeDescriptor};
    use hdf5::H5Type;
    use half::f16;

    use dt_tensor::storage::Element;
    use dt_tensor::DType;

    use super::ContainerFormat;
    use crate::error::{Result, StoreError};
    use crate::metadata::{Descriptor, DescriptorSource};
    use crate::reader::RawBuffer;

    /// HDF5 files on the DAOS POSIX mount, read through libhdf5.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct Hdf5Format;

    fn dtype_of(descriptor: &TypeDescriptor) -> Option<DType> {
        let dtype = match descriptor {
            TypeDescriptor::Boolean => DType::Bool,
            TypeDescriptor::Integer(IntSize::U1) => DType::I8,
            TypeDescriptor::Integer(IntSize::U2) => DType::I16,
            TypeDescriptor::Integer(IntSize::U4) => DType::I32,
            TypeDescriptor::Integer(IntSize::U8) => DType::I64,
            TypeDescriptor::Unsigned(IntSize::U1) => DType::U8,
            TypeDescriptor::Unsigned(IntSize::U2) => DType::U16,
            TypeDescriptor::Unsigned(IntSize::U4) => DType::U32,
            TypeDescriptor::Unsigned(IntSize::U8) => DType::U64,
            TypeDescriptor::Float(FloatSize::U2) => DType::F16,
            TypeDescriptor::Float(FloatSize::U4) => DType::F32,
            TypeDescriptor::Float(FloatSize::U8) => DType::F64,
            _ => return None,
        };
        Some(dtype)
    }

    fn read_bytes<T: H5Type + Element>(dataset: &hdf5::Dataset) -> hdf5::Result<Vec<u8>> {
        let values = dataset.read_raw::<T>()?;
        Ok(T::into_storage(values).to_le_bytes())
    }

    impl ContainerFormat for Hdf5Format {
        fn name(&self) -> &str {
            "hdf5"
        }

        fn read_dataset(&self, path: &Path, dataset: &str) -> Result<(RawBuffer, Descriptor)> {
            let container_err = |e: hdf5::Error| StoreError::Container {
                path: path.to_path_buf(),
                message: e.to_string(),
            };

            // Both handles are dropped when this scope ends, on every path.
            let file = hdf5::File::open(path).map_err(container_err)?;
            let ds = file.dataset(dataset).map_err(container_err)?;

            let shape = ds.shape();
            let type_descriptor = ds
                .dtype()
                .and_then(|t| t.to_descriptor())
                .map_err(container_err)?;
            let dtype = dtype_of(&type_descriptor)
                .ok_or_else(|| StoreError::UnsupportedDType(format!("{:?}", type_descriptor)))?;

            let bytes = match dtype {
                DType::Bool => ds
                    .read_raw::<bool>()
                    .map(|v| v.into_iter().map(u8::from).collect()),
                DType::U8 => read_bytes::<u8>(&ds),
                DType::I8 => read_bytes::<i8>(&ds),
                DType::U16 => read_bytes::<u16>(&ds),
                DType::I16 => read_bytes::<i16>(&ds),
                DType::U32 => read_bytes::<u32>(&ds),
                DType::I32 => read_bytes::<i32>(&ds),
                DType::F32 => read_bytes::<f32>(&ds),
                DType::U64 => read_bytes::<u64>(&ds),
                DType::I64 => read_bytes::<i64>(&ds),
                DType::F64 => read_bytes::<f64>(&ds),
                DType::F16 => read_bytes::<f16>(&ds),
            }
            .map_err(container_err)?;

            Ok((
                RawBuffer::new(bytes),
                Descriptor::new(shape, dtype, DescriptorSource::Container),
            ))
        }
    }

}

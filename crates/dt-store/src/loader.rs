use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use dt_tensor::{DType, Tensor};

use crate::assembler::assemble;
use crate::backend::{select_backend, BackendKind};
use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::metadata::{Descriptor, MetadataResolver};
use crate::path::PathTranslator;
use crate::reader::container::{default_format, ContainerFormat, ContainerReader};
use crate::reader::parallel::{MmapIo, ParallelIo, ParallelReader};
use crate::reader::{RawBuffer, RawBufferReader};

/// Entry point for host-framework adapters.
///
/// Owns the process configuration and one reader per backend. Every call
/// is independent: no state is shared between calls besides the read-only
/// configuration, so a loader can be used from many threads at once.
#[derive(Debug, Clone)]
pub struct TensorLoader {
    config: StoreConfig,
    raw: RawBufferReader,
    container: ContainerReader,
    parallel: ParallelReader,
}

impl TensorLoader {
    /// Loader with the container format compiled into this build and
    /// memory-mapped parallel I/O.
    pub fn new(config: StoreConfig) -> Self {
        let container = ContainerReader::new(default_format(), config.container_dataset.clone());
        let parallel = ParallelReader::new(Arc::new(MmapIo), config.stripe_size);
        Self {
            config,
            raw: RawBufferReader,
            container,
            parallel,
        }
    }

    /// Loader configured from `DAOS_POOL`, `DAOS_CONT` and `DAOS_MOUNT_PREFIX`.
    pub fn from_env() -> Self {
        Self::new(StoreConfig::from_env())
    }

    pub fn with_container_format(mut self, format: Arc<dyn ContainerFormat>) -> Self {
        self.container = ContainerReader::new(format, self.config.container_dataset.clone());
        self
    }

    pub fn with_parallel_io(mut self, io: Arc<dyn ParallelIo>) -> Self {
        self.parallel = ParallelReader::new(io, self.config.stripe_size);
        self
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn translator(&self) -> PathTranslator<'_> {
        PathTranslator::new(&self.config)
    }

    pub fn resolver(&self) -> MetadataResolver<'_> {
        MetadataResolver::new(&self.config)
    }

    /// Backend a path would be read with, without touching storage.
    pub fn classify(&self, path: &str) -> BackendKind {
        select_backend(path)
    }

    /// Physical location the backend reads `path` from.
    ///
    /// The raw backend goes through the (lossy) mount-path translation, the
    /// container and parallel backends through the object URI.
    fn locate(&self, path: &str, kind: BackendKind) -> Result<PathBuf> {
        let translator = self.translator();
        if !translator.is_object_backed(path) {
            return Err(StoreError::InvalidPathKind(path.to_string()));
        }
        let storage_path = match kind {
            BackendKind::Raw => translator.to_mount_path(path),
            BackendKind::Container | BackendKind::Parallel => translator.to_object_uri(path)?,
        };
        Ok(translator.physical_path(&storage_path))
    }

    /// Read the object's bytes and the descriptor that types them.
    fn load(&self, path: &str) -> Result<(RawBuffer, Descriptor)> {
        let kind = self.classify(path);
        let physical = self.locate(path, kind)?;
        debug!(path, backend = %kind, physical = ?physical, "loading object");

        match kind {
            BackendKind::Raw => {
                let descriptor = self.resolver().resolve(&physical, kind);
                let buffer = self.raw.read(&physical, &descriptor)?;
                Ok((buffer, descriptor))
            }
            BackendKind::Container => self.container.read(&physical),
            BackendKind::Parallel => {
                let descriptor = self.resolver().resolve(&physical, kind);
                self.parallel.read(&physical, &descriptor)
            }
        }
    }

    /// Read and fully decode a tensor, cast to `requested`.
    pub fn read_tensor(&self, path: &str, requested: DType) -> Result<Tensor> {
        let (buffer, descriptor) = self.load(path)?;
        assemble(&buffer, &descriptor, requested)
    }

    /// Read the object as opaque bytes.
    ///
    /// Raw objects are returned whole and unvalidated; containers yield the
    /// dataset's bytes; parallel objects yield the bytes covered by their
    /// resolved shape.
    pub fn read_raw_bytes(&self, path: &str) -> Result<RawBuffer> {
        let kind = self.classify(path);
        if kind == BackendKind::Raw {
            let physical = self.locate(path, kind)?;
            return self.raw.read_all(&physical);
        }
        Ok(self.load(path)?.0)
    }

    /// Decode a tensor and expose its little-endian bytes as an in-memory
    /// reader, for hosts that replace a file object with the decoded data.
    pub fn open_reader(&self, path: &str, dtype: DType) -> Result<Cursor<Vec<u8>>> {
        let tensor = self.read_tensor(path, dtype)?;
        Ok(Cursor::new(tensor.to_le_bytes()))
    }
}

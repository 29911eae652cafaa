use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{Result, StoreError};
use crate::metadata::Descriptor;

use super::RawBuffer;

/// Reads a whole object through the POSIX mount.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawBufferReader;

impl RawBufferReader {
    /// Read the entire object without validating it against any dtype.
    pub fn read_all(&self, path: &Path) -> Result<RawBuffer> {
        let bytes = fs::read(path).map_err(|e| StoreError::io(path, e))?;
        debug!(?path, len = bytes.len(), "raw object read");
        Ok(RawBuffer::new(bytes))
    }

    /// Read the object and check its length against the descriptor's dtype.
    ///
    /// The buffer is returned flat; reshaping is the assembler's job.
    ///
    /// # Errors
    /// `Io` if the object cannot be read, `BufferSizeMismatch` if its length
    /// is not a multiple of the element size.
    pub fn read(&self, path: &Path, descriptor: &Descriptor) -> Result<RawBuffer> {
        let buffer = self.read_all(path)?;
        let element_size = descriptor.element_size();
        if buffer.len() % element_size != 0 {
            return Err(StoreError::BufferSizeMismatch {
                path: path.to_path_buf(),
                len: buffer.len(),
                element_size,
            });
        }
        Ok(buffer)
    }
}

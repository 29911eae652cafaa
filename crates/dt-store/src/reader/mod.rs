//! Backend-specific physical readers.
//!
//! Each reader owns its physical handle for the duration of one call and
//! releases it on every exit path.

pub mod container;
pub mod parallel;
pub mod raw;

pub use container::{ContainerFormat, ContainerReader};
pub use parallel::{Communicator, MmapIo, ParallelFile, ParallelIo, ParallelReader};
pub use raw::RawBufferReader;

/// Immutable bytes read from physical storage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawBuffer(Vec<u8>);

impl RawBuffer {
    pub fn new(bytes: Vec<u8>) -> Self {
        RawBuffer(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }
}

impl From<Vec<u8>> for RawBuffer {
    fn from(bytes: Vec<u8>) -> Self {
        RawBuffer(bytes)
    }
}

impl AsRef<[u8]> for RawBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

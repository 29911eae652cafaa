use std::fmt::Debug;
use std::fs::File;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use memmap2::Mmap;
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::metadata::{Descriptor, DescriptorSource};

use super::RawBuffer;

/// Group of processes taking part in a collective open.
///
/// This layer only ever uses the single-process group: each call reads the
/// whole object itself and never coordinates with other workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Communicator {
    rank: u32,
    size: u32,
}

impl Communicator {
    /// The calling process alone (rank 0 of 1).
    pub fn single() -> Self {
        Communicator { rank: 0, size: 1 }
    }

    pub fn rank(&self) -> u32 {
        self.rank
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Byte range of a `total`-byte object that this rank is responsible for.
    pub fn partition(&self, total: u64) -> Range<u64> {
        let share = total.div_ceil(self.size as u64);
        let start = (share * self.rank as u64).min(total);
        let end = (start + share).min(total);
        start..end
    }
}

/// An open handle from a [`ParallelIo`] implementation.
///
/// Dropping the handle closes it.
pub trait ParallelFile: Send {
    /// Total size of the object in bytes (seek to end).
    fn size(&mut self) -> Result<u64>;

    /// Fill `buf` from `offset`. Short reads are errors.
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<()>;
}

/// Trait for pluggable parallel-I/O interfaces (memory-mapped POSIX, MPI-IO, ...).
pub trait ParallelIo: Send + Sync + Debug {
    /// Returns the name of this interface (e.g., "mmap").
    fn name(&self) -> &str;

    /// Open `path` read-only across `comm`.
    fn open(&self, path: &Path, comm: Communicator) -> Result<Box<dyn ParallelFile>>;
}

/// Parallel-I/O over a memory-mapped view of the POSIX mount.
#[derive(Debug, Clone, Copy, Default)]
pub struct MmapIo;

struct MmapFile {
    path: PathBuf,
    // None for empty objects, which cannot be mapped.
    map: Option<Mmap>,
}

impl ParallelIo for MmapIo {
    fn name(&self) -> &str {
        "mmap"
    }

    fn open(&self, path: &Path, comm: Communicator) -> Result<Box<dyn ParallelFile>> {
        let file = File::open(path).map_err(|e| StoreError::io(path, e))?;
        let len = file.metadata().map_err(|e| StoreError::io(path, e))?.len();
        let map = if len == 0 {
            None
        } else {
            // The mapping stays valid after `file` is closed.
            Some(unsafe { Mmap::map(&file) }.map_err(|e| StoreError::io(path, e))?)
        };
        debug!(?path, len, rank = comm.rank(), size = comm.size(), "parallel handle opened");
        Ok(Box::new(MmapFile {
            path: path.to_path_buf(),
            map,
        }))
    }
}

impl ParallelFile for MmapFile {
    fn size(&mut self) -> Result<u64> {
        Ok(self.map.as_ref().map_or(0, |m| m.len() as u64))
    }

    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let data: &[u8] = self.map.as_deref().unwrap_or_default();
        let start = usize::try_from(offset).unwrap_or(usize::MAX);
        let src = start
            .checked_add(buf.len())
            .and_then(|end| data.get(start..end))
            .ok_or_else(|| {
                StoreError::io(
                    &self.path,
                    std::io::Error::new(
                        std::io::ErrorKind::UnexpectedEof,
                        format!("read of {} bytes at offset {} past end", buf.len(), offset),
                    ),
                )
            })?;
        buf.copy_from_slice(src);
        Ok(())
    }
}

impl Drop for MmapFile {
    fn drop(&mut self) {
        debug!(path = ?self.path, "parallel handle closed");
    }
}

/// Reads striped objects through a [`ParallelIo`] interface.
#[derive(Debug, Clone)]
pub struct ParallelReader {
    io: Arc<dyn ParallelIo>,
    stripe_size: usize,
}

impl ParallelReader {
    pub fn new(io: Arc<dyn ParallelIo>, stripe_size: usize) -> Self {
        Self {
            io,
            stripe_size: stripe_size.max(1),
        }
    }

    /// Read an object described by `descriptor`.
    ///
    /// An unknown shape is probed from the object size as a flat array of
    /// `descriptor.dtype`; trailing bytes that do not fill an element are
    /// ignored. A known shape reads exactly `product(shape)` elements.
    /// Returns the bytes together with the resolved descriptor.
    ///
    /// # Errors
    /// `ShapeMismatch` if the object is shorter than the shape needs, `Io`
    /// on open or read failure. The handle is closed in every case.
    pub fn read(&self, path: &Path, descriptor: &Descriptor) -> Result<(RawBuffer, Descriptor)> {
        let comm = Communicator::single();
        let mut file = self.io.open(path, comm)?;
        let total = file.size()?;

        let mut descriptor = descriptor.clone();
        if !descriptor.is_shape_known() {
            let count = total / descriptor.element_size() as u64;
            descriptor.shape = vec![count as usize];
            descriptor.source = DescriptorSource::Probed;
        }

        let needed = descriptor.byte_len().unwrap_or(u64::MAX);
        if needed > total {
            return Err(StoreError::ShapeMismatch {
                path: path.to_path_buf(),
                shape: descriptor.shape,
                needed,
                available: total,
            });
        }

        let range = comm.partition(needed);
        let mut bytes = vec![0u8; (range.end - range.start) as usize];
        for (i, stripe) in bytes.chunks_mut(self.stripe_size).enumerate() {
            let offset = range.start + (i * self.stripe_size) as u64;
            file.read_at(offset, stripe)?;
        }
        drop(file);

        debug!(
            ?path,
            io = self.io.name(),
            shape = ?descriptor.shape,
            dtype = %descriptor.dtype,
            len = bytes.len(),
            "parallel read complete"
        );
        Ok((RawBuffer::new(bytes), descriptor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dt_tensor::DType;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    /// Wraps another interface, counting live handles and optionally
    /// failing every read.
    #[derive(Debug, Default)]
    struct Tracking {
        live: Arc<AtomicUsize>,
        fail_reads: bool,
    }

    struct TrackedFile {
        inner: Box<dyn ParallelFile>,
        live: Arc<AtomicUsize>,
        fail_reads: bool,
    }

    impl ParallelIo for Tracking {
        fn name(&self) -> &str {
            "tracking"
        }

        fn open(&self, path: &Path, comm: Communicator) -> Result<Box<dyn ParallelFile>> {
            let inner = MmapIo.open(path, comm)?;
            self.live.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(TrackedFile {
                inner,
                live: self.live.clone(),
                fail_reads: self.fail_reads,
            }))
        }
    }

    impl ParallelFile for TrackedFile {
        fn size(&mut self) -> Result<u64> {
            self.inner.size()
        }

        fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<()> {
            if self.fail_reads {
                return Err(StoreError::io(
                    "tracked",
                    std::io::Error::new(std::io::ErrorKind::Other, "injected"),
                ));
            }
            self.inner.read_at(offset, buf)
        }
    }

    impl Drop for TrackedFile {
        fn drop(&mut self) {
            self.live.fetch_sub(1, Ordering::SeqCst);
        }
    }

    fn object(dir: &TempDir, len: usize) -> PathBuf {
        let path = dir.path().join("x.bin");
        let bytes: Vec<u8> = (0..len).map(|i| i as u8).collect();
        fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn test_single_communicator_covers_everything() {
        let comm = Communicator::single();
        assert_eq!(comm.rank(), 0);
        assert_eq!(comm.size(), 1);
        assert_eq!(comm.partition(1000), 0..1000);
        assert_eq!(comm.partition(0), 0..0);
    }

    #[test]
    fn test_probe_unknown_shape() {
        let dir = TempDir::new().unwrap();
        let path = object(&dir, 1026);
        let reader = ParallelReader::new(Arc::new(MmapIo), 100);
        let (buf, d) = reader.read(&path, &Descriptor::unknown(DType::F32)).unwrap();
        assert_eq!(d.shape, vec![256]);
        assert_eq!(d.source, DescriptorSource::Probed);
        assert_eq!(buf.len(), 1024);
        assert_eq!(buf.as_bytes()[255], 255);
        assert_eq!(buf.as_bytes()[256], 0);
    }

    #[test]
    fn test_known_shape_reads_exactly() {
        let dir = TempDir::new().unwrap();
        let path = object(&dir, 64);
        let reader = ParallelReader::new(Arc::new(MmapIo), 7);
        let d = Descriptor::new(vec![2, 3], DType::U16, DescriptorSource::Sidecar);
        let (buf, resolved) = reader.read(&path, &d).unwrap();
        assert_eq!(buf.as_bytes(), &(0u8..12).collect::<Vec<_>>()[..]);
        assert_eq!(resolved, d);
    }

    #[test]
    fn test_empty_object() {
        let dir = TempDir::new().unwrap();
        let path = object(&dir, 0);
        let reader = ParallelReader::new(Arc::new(MmapIo), 16);
        let (buf, d) = reader.read(&path, &Descriptor::unknown(DType::F64)).unwrap();
        assert!(buf.is_empty());
        assert_eq!(d.shape, vec![0]);
    }

    #[test]
    fn test_handle_closed_on_success() {
        let dir = TempDir::new().unwrap();
        let path = object(&dir, 32);
        let io = Arc::new(Tracking::default());
        let reader = ParallelReader::new(io.clone(), 8);
        reader.read(&path, &Descriptor::unknown(DType::F32)).unwrap();
        assert_eq!(io.live.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_handle_closed_on_size_mismatch() {
        let dir = TempDir::new().unwrap();
        let path = object(&dir, 32);
        let io = Arc::new(Tracking::default());
        let reader = ParallelReader::new(io.clone(), 8);
        let d = Descriptor::new(vec![128, 128], DType::F32, DescriptorSource::Fallback);
        let err = reader.read(&path, &d).unwrap_err();
        assert!(matches!(
            err,
            StoreError::ShapeMismatch { needed: 65536, available: 32, .. }
        ));
        assert_eq!(io.live.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_handle_closed_on_io_failure() {
        let dir = TempDir::new().unwrap();
        let path = object(&dir, 32);
        let io = Arc::new(Tracking {
            fail_reads: true,
            ..Tracking::default()
        });
        let reader = ParallelReader::new(io.clone(), 8);
        let err = reader.read(&path, &Descriptor::unknown(DType::U8)).unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
        assert_eq!(io.live.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_open_failure() {
        let dir = TempDir::new().unwrap();
        let reader = ParallelReader::new(Arc::new(MmapIo), 8);
        let err = reader
            .read(&dir.path().join("missing.bin"), &Descriptor::unknown(DType::F32))
            .unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
    }
}

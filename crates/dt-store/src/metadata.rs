use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};

use dt_tensor::{DType, Shape};

use crate::backend::BackendKind;
use crate::config::StoreConfig;

/// Where a descriptor's information came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorSource {
    /// Read from a sidecar file.
    Sidecar,
    /// Shape derived from the object's byte length.
    Probed,
    /// Parallel backend compatibility shape.
    Fallback,
    /// Nothing known yet: default dtype, unknown shape.
    Default,
    /// Embedded in a self-describing container.
    Container,
}

/// Shape and element type used to reinterpret a raw byte buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    /// Dimension sizes; empty means unknown.
    pub shape: Vec<usize>,
    pub dtype: DType,
    pub source: DescriptorSource,
}

impl Descriptor {
    pub fn new(shape: Vec<usize>, dtype: DType, source: DescriptorSource) -> Self {
        Self {
            shape,
            dtype,
            source,
        }
    }

    /// Unknown shape with the given dtype.
    pub fn unknown(dtype: DType) -> Self {
        Self::new(Vec::new(), dtype, DescriptorSource::Default)
    }

    pub fn shape(&self) -> Shape {
        Shape::new(self.shape.clone())
    }

    pub fn is_shape_known(&self) -> bool {
        !self.shape.is_empty()
    }

    pub fn element_size(&self) -> usize {
        self.dtype.size_in_bytes()
    }

    /// Bytes covered by the shape, `None` if unknown or overflowing.
    pub fn byte_len(&self) -> Option<u64> {
        if !self.is_shape_known() {
            return None;
        }
        self.shape
            .iter()
            .try_fold(self.element_size() as u64, |acc, &d| acc.checked_mul(d as u64))
    }
}

/// State of the `shape` field in a sidecar.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ShapeField {
    Absent,
    Malformed,
    Valid(Vec<usize>),
}

/// Parsed sidecar record. Every field degrades instead of failing.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Sidecar {
    shape: ShapeField,
    dtype: Option<DType>,
}

impl Sidecar {
    fn empty() -> Self {
        Sidecar {
            shape: ShapeField::Absent,
            dtype: None,
        }
    }

    fn parse(text: &str, path: &Path) -> Self {
        let value: Value = match serde_json::from_str(text) {
            Ok(v) => v,
            Err(e) => {
                warn!(?path, error = %e, "sidecar is not valid JSON, using defaults");
                return Sidecar::empty();
            }
        };
        let Some(record) = value.as_object() else {
            warn!(?path, "sidecar is not a JSON object, using defaults");
            return Sidecar::empty();
        };

        let shape = match record.get("shape") {
            None | Some(Value::Null) => ShapeField::Absent,
            Some(Value::Array(dims)) => dims
                .iter()
                .map(|d| d.as_u64().and_then(|d| usize::try_from(d).ok()))
                .collect::<Option<Vec<usize>>>()
                .map(ShapeField::Valid)
                .unwrap_or(ShapeField::Malformed),
            Some(_) => ShapeField::Malformed,
        };
        if shape == ShapeField::Malformed {
            warn!(?path, "sidecar shape is malformed, treating shape as unknown");
        }

        let dtype = match record.get("dtype") {
            None | Some(Value::Null) => None,
            Some(Value::String(name)) => parse_dtype(name, path),
            // Nested or numeric values are coerced to their text form.
            Some(other) => parse_dtype(&other.to_string(), path),
        };

        Sidecar { shape, dtype }
    }
}

fn parse_dtype(name: &str, path: &Path) -> Option<DType> {
    let dtype = DType::parse(name);
    if dtype.is_none() {
        warn!(?path, dtype = name, "unrecognised sidecar dtype, using default");
    }
    dtype
}

/// Resolves the descriptor needed to reinterpret an object's bytes.
///
/// Resolution never fails: missing or broken metadata degrades to the
/// configured defaults.
#[derive(Debug, Clone, Copy)]
pub struct MetadataResolver<'a> {
    config: &'a StoreConfig,
}

impl<'a> MetadataResolver<'a> {
    pub fn new(config: &'a StoreConfig) -> Self {
        Self { config }
    }

    /// `<data_path><suffix>`, e.g. `x.bin.meta`.
    pub fn sidecar_path(&self, data_path: &Path) -> PathBuf {
        let mut s = OsString::from(data_path.as_os_str());
        s.push(&self.config.sidecar_suffix);
        PathBuf::from(s)
    }

    fn read_sidecar(&self, data_path: &Path) -> Option<Sidecar> {
        let path = self.sidecar_path(data_path);
        match fs::read_to_string(&path) {
            Ok(text) => Some(Sidecar::parse(&text, &path)),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                warn!(?path, error = %e, "sidecar unreadable, using defaults");
                Some(Sidecar::empty())
            }
        }
    }

    /// Resolve the descriptor of `data_path` for the given backend.
    ///
    /// - `Container`: no-op, the container's own metadata is authoritative.
    /// - sidecar present: its fields, with defaults for what is missing.
    ///   The parallel backend substitutes `parallel_fallback_shape` when
    ///   the sidecar has no `shape` at all.
    /// - no sidecar, `Raw`: one-dimensional shape probed from the file size.
    /// - no sidecar, `Parallel`: shape left unknown for the reader to probe
    ///   through its own handle.
    pub fn resolve(&self, data_path: &Path, kind: BackendKind) -> Descriptor {
        let default_dtype = self.config.default_dtype;
        if kind == BackendKind::Container {
            return Descriptor::new(Vec::new(), default_dtype, DescriptorSource::Container);
        }

        let descriptor = match self.read_sidecar(data_path) {
            Some(sidecar) => {
                let dtype = sidecar.dtype.unwrap_or(default_dtype);
                match (sidecar.shape, kind) {
                    (ShapeField::Valid(shape), _) => {
                        Descriptor::new(shape, dtype, DescriptorSource::Sidecar)
                    }
                    (ShapeField::Absent, BackendKind::Parallel) => {
                        match &self.config.parallel_fallback_shape {
                            Some(shape) => {
                                Descriptor::new(shape.clone(), dtype, DescriptorSource::Fallback)
                            }
                            None => Descriptor::new(Vec::new(), dtype, DescriptorSource::Sidecar),
                        }
                    }
                    _ => Descriptor::new(Vec::new(), dtype, DescriptorSource::Sidecar),
                }
            }
            None => match kind {
                BackendKind::Raw => self.probe(data_path, default_dtype),
                _ => Descriptor::unknown(default_dtype),
            },
        };

        debug!(
            path = ?data_path,
            backend = %kind,
            shape = ?descriptor.shape,
            dtype = %descriptor.dtype,
            source = ?descriptor.source,
            "descriptor resolved"
        );
        descriptor
    }

    fn probe(&self, data_path: &Path, dtype: DType) -> Descriptor {
        match fs::metadata(data_path) {
            Ok(meta) => {
                let count = meta.len() / dtype.size_in_bytes() as u64;
                Descriptor::new(vec![count as usize], dtype, DescriptorSource::Probed)
            }
            Err(e) => {
                // The reader will surface the I/O error itself.
                debug!(path = ?data_path, error = %e, "size probe failed");
                Descriptor::unknown(dtype)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, contents: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_sidecar_path() {
        let c = StoreConfig::default();
        let r = MetadataResolver::new(&c);
        assert_eq!(
            r.sidecar_path(Path::new("/mnt/daos/x.bin")),
            PathBuf::from("/mnt/daos/x.bin.meta")
        );
    }

    #[test]
    fn test_sidecar_full() {
        let dir = TempDir::new().unwrap();
        let data = write(&dir, "x.raw", &[0u8; 2048]);
        write(&dir, "x.raw.meta", br#"{"shape": [4, 4, 4], "dtype": "float64"}"#);
        let c = StoreConfig::default();
        let d = MetadataResolver::new(&c).resolve(&data, BackendKind::Raw);
        assert_eq!(d.shape, vec![4, 4, 4]);
        assert_eq!(d.dtype, DType::F64);
        assert_eq!(d.source, DescriptorSource::Sidecar);
        assert_eq!(d.byte_len(), Some(512));
    }

    #[test]
    fn test_sidecar_missing_fields_default() {
        let dir = TempDir::new().unwrap();
        let data = write(&dir, "x.img", &[0u8; 16]);
        write(&dir, "x.img.meta", b"{}");
        let c = StoreConfig::default();
        let d = MetadataResolver::new(&c).resolve(&data, BackendKind::Raw);
        assert!(d.shape.is_empty());
        assert_eq!(d.dtype, DType::F32);
    }

    #[test]
    fn test_sidecar_malformed_shape() {
        let dir = TempDir::new().unwrap();
        let data = write(&dir, "x.img", &[0u8; 16]);
        write(&dir, "x.img.meta", br#"{"shape": [2, -1], "dtype": "int32"}"#);
        let c = StoreConfig::default();
        let d = MetadataResolver::new(&c).resolve(&data, BackendKind::Raw);
        assert!(d.shape.is_empty());
        assert_eq!(d.dtype, DType::I32);

        write(&dir, "x.img.meta", br#"{"shape": "4x4"}"#);
        let d = MetadataResolver::new(&c).resolve(&data, BackendKind::Raw);
        assert!(d.shape.is_empty());
    }

    #[test]
    fn test_sidecar_nested_dtype_is_coerced_not_fatal() {
        let dir = TempDir::new().unwrap();
        let data = write(&dir, "x.bin", &[0u8; 16]);
        write(&dir, "x.bin.meta", br#"{"shape": [4], "dtype": ["float32"]}"#);
        let c = StoreConfig::default();
        let d = MetadataResolver::new(&c).resolve(&data, BackendKind::Parallel);
        assert_eq!(d.shape, vec![4]);
        assert_eq!(d.dtype, DType::F32);
    }

    #[test]
    fn test_sidecar_invalid_json() {
        let dir = TempDir::new().unwrap();
        let data = write(&dir, "x.img", &[0u8; 16]);
        write(&dir, "x.img.meta", b"shape=4");
        let c = StoreConfig::default();
        let d = MetadataResolver::new(&c).resolve(&data, BackendKind::Raw);
        assert!(d.shape.is_empty());
        assert_eq!(d.dtype, DType::F32);
        assert_eq!(d.source, DescriptorSource::Sidecar);
    }

    #[test]
    fn test_no_sidecar_raw_probes() {
        let dir = TempDir::new().unwrap();
        let data = write(&dir, "x.img", &[0u8; 1024]);
        let c = StoreConfig::default();
        let d = MetadataResolver::new(&c).resolve(&data, BackendKind::Raw);
        assert_eq!(d.shape, vec![256]);
        assert_eq!(d.source, DescriptorSource::Probed);
    }

    #[test]
    fn test_no_sidecar_missing_object_never_fails() {
        let dir = TempDir::new().unwrap();
        let c = StoreConfig::default();
        let d = MetadataResolver::new(&c).resolve(&dir.path().join("gone.img"), BackendKind::Raw);
        assert!(d.shape.is_empty());
        assert_eq!(d.source, DescriptorSource::Default);
    }

    #[test]
    fn test_no_sidecar_parallel_defers_probe() {
        let dir = TempDir::new().unwrap();
        let data = write(&dir, "x.dat", &[0u8; 64]);
        let c = StoreConfig::default();
        let d = MetadataResolver::new(&c).resolve(&data, BackendKind::Parallel);
        assert!(d.shape.is_empty());
        assert_eq!(d.dtype, DType::F32);
    }

    #[test]
    fn test_parallel_fallback_shape() {
        let dir = TempDir::new().unwrap();
        let data = write(&dir, "x.dat", &[0u8; 64]);
        write(&dir, "x.dat.meta", br#"{"dtype": "float32"}"#);
        let c = StoreConfig::default();
        let d = MetadataResolver::new(&c).resolve(&data, BackendKind::Parallel);
        assert_eq!(d.shape, vec![128, 128]);
        assert_eq!(d.source, DescriptorSource::Fallback);

        let c = StoreConfig {
            parallel_fallback_shape: None,
            ..StoreConfig::default()
        };
        let d = MetadataResolver::new(&c).resolve(&data, BackendKind::Parallel);
        assert!(d.shape.is_empty());
    }

    #[test]
    fn test_fallback_shape_only_for_parallel() {
        let dir = TempDir::new().unwrap();
        let data = write(&dir, "x.img", &[0u8; 64]);
        write(&dir, "x.img.meta", br#"{"dtype": "float32"}"#);
        let c = StoreConfig::default();
        let d = MetadataResolver::new(&c).resolve(&data, BackendKind::Raw);
        assert!(d.shape.is_empty());
    }

    #[test]
    fn test_container_is_noop() {
        let dir = TempDir::new().unwrap();
        let data = write(&dir, "x.h5", &[0u8; 8]);
        write(&dir, "x.h5.meta", br#"{"shape": [2], "dtype": "float64"}"#);
        let c = StoreConfig::default();
        let d = MetadataResolver::new(&c).resolve(&data, BackendKind::Container);
        assert!(d.shape.is_empty());
        assert_eq!(d.source, DescriptorSource::Container);
    }
}

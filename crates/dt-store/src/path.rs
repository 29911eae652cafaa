use std::fmt;
use std::path::PathBuf;

use tracing::warn;

use crate::config::{StoreConfig, DAOS_SCHEME};
use crate::error::{Result, StoreError};

/// The two surface forms a DAOS object can be addressed by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoragePath {
    /// A filesystem-style path in mount form, normally `<mount-prefix><relative>`.
    MountPath { path: String },
    /// `daos://<pool>/<container>/<key>`.
    ObjectUri {
        pool: String,
        container: String,
        key: String,
    },
}

impl StoragePath {
    /// Parse `daos://pool/container/key...`. Missing components are empty.
    fn parse_uri(uri: &str) -> Option<StoragePath> {
        let rest = uri.strip_prefix(DAOS_SCHEME)?;
        let mut parts = rest.splitn(3, '/');
        let pool = parts.next().unwrap_or_default().to_string();
        let container = parts.next().unwrap_or_default().to_string();
        let key = parts.next().unwrap_or_default().to_string();
        Some(StoragePath::ObjectUri {
            pool,
            container,
            key,
        })
    }
}

impl fmt::Display for StoragePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoragePath::MountPath { path } => write!(f, "{}", path),
            StoragePath::ObjectUri {
                pool,
                container,
                key,
            } => write!(f, "{}{}/{}/{}", DAOS_SCHEME, pool, container, key),
        }
    }
}

/// Converts between mount paths and object URIs using the process-wide
/// pool/container identifiers.
#[derive(Debug, Clone, Copy)]
pub struct PathTranslator<'a> {
    config: &'a StoreConfig,
}

impl<'a> PathTranslator<'a> {
    pub fn new(config: &'a StoreConfig) -> Self {
        Self { config }
    }

    fn mount_prefix(&self) -> &str {
        &self.config.mount_prefix
    }

    /// True if the path is a `daos://` URI or lives under the mount prefix.
    /// Anything else is a plain local path this layer does not touch.
    pub fn is_object_backed(&self, path: &str) -> bool {
        path.starts_with(DAOS_SCHEME) || path.starts_with(self.mount_prefix())
    }

    /// Convert a mount path to an object URI. URIs are returned as parsed.
    ///
    /// # Errors
    /// `InvalidPathKind` for paths that are neither form.
    pub fn to_object_uri(&self, path: &str) -> Result<StoragePath> {
        if let Some(uri) = StoragePath::parse_uri(path) {
            return Ok(uri);
        }
        match path.strip_prefix(self.mount_prefix()) {
            Some(relative) => Ok(StoragePath::ObjectUri {
                pool: self.config.pool.clone(),
                container: self.config.container.clone(),
                key: relative.to_string(),
            }),
            None => Err(StoreError::InvalidPathKind(path.to_string())),
        }
    }

    /// Convert a path to its mount form.
    ///
    /// A URI keeps **only its final path segment**: `daos://p/c/a/b/c.bin`
    /// becomes `<mount-prefix>c.bin`, not `<mount-prefix>a/b/c.bin`. This
    /// matches how existing deployments lay out their mounts and is kept for
    /// compatibility, but nested keys collide. Any other path that already
    /// contains the mount prefix, anywhere, is returned unchanged; one that
    /// does not gets the prefix prepended.
    pub fn to_mount_path(&self, path: &str) -> StoragePath {
        if let Some(rest) = path.strip_prefix(DAOS_SCHEME) {
            let last = path.rsplit('/').next().unwrap_or_default();
            // pool/container/key: more than two separators means the key had directories
            if rest.matches('/').count() > 2 {
                warn!(path, kept = last, "object key directories dropped in mount path translation");
            }
            return StoragePath::MountPath {
                path: format!("{}{}", self.mount_prefix(), last),
            };
        }
        let path = if path.contains(self.mount_prefix()) {
            path.to_string()
        } else {
            format!("{}{}", self.mount_prefix(), path)
        };
        StoragePath::MountPath { path }
    }

    /// Storage key relative to the pool/container or the mount prefix.
    ///
    /// A URI with fewer than three components has an empty key.
    pub fn relative_key(&self, path: &str) -> Result<String> {
        if let Some(StoragePath::ObjectUri { key, .. }) = StoragePath::parse_uri(path) {
            return Ok(key);
        }
        path.strip_prefix(self.mount_prefix())
            .map(str::to_string)
            .ok_or_else(|| StoreError::InvalidPathKind(path.to_string()))
    }

    /// String surface form of a storage path.
    pub fn render(&self, path: &StoragePath) -> String {
        path.to_string()
    }

    /// Location of the object on the local POSIX mount.
    ///
    /// dfuse exposes the configured container's namespace at the mount
    /// prefix, so a URI maps to the prefix joined with its full key.
    pub fn physical_path(&self, path: &StoragePath) -> PathBuf {
        match path {
            StoragePath::MountPath { path } => PathBuf::from(path),
            StoragePath::ObjectUri { key, .. } => {
                PathBuf::from(format!("{}{}", self.mount_prefix(), key))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> StoreConfig {
        StoreConfig::default().with_pool_container("pool0", "cont0")
    }

    #[test]
    fn test_is_object_backed() {
        let c = config();
        let t = PathTranslator::new(&c);
        assert!(t.is_object_backed("daos://pool0/cont0/x.bin"));
        assert!(t.is_object_backed("/mnt/daos/x.bin"));
        assert!(!t.is_object_backed("/home/user/x.bin"));
        assert!(!t.is_object_backed("x.bin"));
        assert!(!t.is_object_backed("/mnt/daosx/x.bin"));
    }

    #[test]
    fn test_mount_to_uri() {
        let c = config();
        let t = PathTranslator::new(&c);
        let uri = t.to_object_uri("/mnt/daos/foo/bar.bin").unwrap();
        assert_eq!(
            uri,
            StoragePath::ObjectUri {
                pool: "pool0".into(),
                container: "cont0".into(),
                key: "foo/bar.bin".into(),
            }
        );
        assert_eq!(t.render(&uri), "daos://pool0/cont0/foo/bar.bin");
    }

    #[test]
    fn test_uri_unchanged() {
        let c = config();
        let t = PathTranslator::new(&c);
        let uri = t.to_object_uri("daos://other/c2/k.h5").unwrap();
        assert_eq!(t.render(&uri), "daos://other/c2/k.h5");
    }

    #[test]
    fn test_to_object_uri_rejects_plain_path() {
        let c = config();
        let t = PathTranslator::new(&c);
        assert!(matches!(
            t.to_object_uri("/tmp/x.bin"),
            Err(StoreError::InvalidPathKind(_))
        ));
    }

    #[test]
    fn test_to_mount_path_keeps_only_last_segment() {
        let c = config();
        let t = PathTranslator::new(&c);
        let m = t.to_mount_path("daos://pool0/cont0/a/b/c.bin");
        assert_eq!(m, StoragePath::MountPath { path: "/mnt/daos/c.bin".into() });
        assert_eq!(t.render(&m), "/mnt/daos/c.bin");
    }

    #[test]
    fn test_round_trip_is_lossy_for_nested_keys() {
        let c = config();
        let t = PathTranslator::new(&c);
        let p = "/mnt/daos/a/b/c.bin";
        let uri = t.render(&t.to_object_uri(p).unwrap());
        let back = t.render(&t.to_mount_path(&uri));
        assert_eq!(back, "/mnt/daos/c.bin");
        assert_ne!(back, p);

        let flat = "/mnt/daos/c.bin";
        let uri = t.render(&t.to_object_uri(flat).unwrap());
        assert_eq!(t.render(&t.to_mount_path(&uri)), flat);
    }

    #[test]
    fn test_to_mount_path_prepends_prefix() {
        let c = config();
        let t = PathTranslator::new(&c);
        assert_eq!(t.render(&t.to_mount_path("/mnt/daos/x/y.raw")), "/mnt/daos/x/y.raw");
        assert_eq!(t.render(&t.to_mount_path("x/y.raw")), "/mnt/daos/x/y.raw");
    }

    #[test]
    fn test_to_mount_path_keeps_prefix_found_mid_path() {
        let c = config();
        let t = PathTranslator::new(&c);
        let m = t.to_mount_path("/data/mnt/daos/x.img");
        assert_eq!(m, StoragePath::MountPath { path: "/data/mnt/daos/x.img".into() });
        assert_eq!(t.render(&m), "/data/mnt/daos/x.img");
        assert_eq!(t.physical_path(&m), PathBuf::from("/data/mnt/daos/x.img"));
    }

    #[test]
    fn test_relative_key() {
        let c = config();
        let t = PathTranslator::new(&c);
        assert_eq!(t.relative_key("daos://p/c/dir/f.h5").unwrap(), "dir/f.h5");
        assert_eq!(t.relative_key("daos://p/c").unwrap(), "");
        assert_eq!(t.relative_key("/mnt/daos/dir/f.h5").unwrap(), "dir/f.h5");
        assert!(matches!(
            t.relative_key("/data/f.h5"),
            Err(StoreError::InvalidPathKind(_))
        ));
    }

    #[test]
    fn test_physical_path() {
        let c = config();
        let t = PathTranslator::new(&c);
        let uri = t.to_object_uri("daos://pool0/cont0/a/b.dat").unwrap();
        assert_eq!(t.physical_path(&uri), PathBuf::from("/mnt/daos/a/b.dat"));
        let m = t.to_mount_path("daos://pool0/cont0/a/b.dat");
        assert_eq!(t.physical_path(&m), PathBuf::from("/mnt/daos/b.dat"));
    }
}

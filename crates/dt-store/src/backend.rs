use std::fmt;

/// Physical access strategy for an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// Whole-object read through the POSIX mount, reinterpreted via a
    /// sidecar descriptor or the default dtype.
    Raw,
    /// Self-describing HDF5 container.
    Container,
    /// Striped read through the parallel-I/O interface.
    Parallel,
}

/// Extension table, checked in order. Anything not listed is `Raw`.
const EXTENSIONS: &[(&str, BackendKind)] = &[
    ("h5", BackendKind::Container),
    ("hdf5", BackendKind::Container),
    ("mpi", BackendKind::Parallel),
    ("bin", BackendKind::Parallel),
    ("dat", BackendKind::Parallel),
    ("raw", BackendKind::Parallel),
];

/// Final filename extension of a `/`-separated path, if any.
fn extension(path: &str) -> Option<&str> {
    let file_name = path.rsplit('/').next()?;
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() {
        // dotfile, e.g. ".bin"
        return None;
    }
    Some(ext)
}

/// Choose the backend from the path's final extension.
///
/// Works on either surface form since both end in the same file name.
/// Unknown or missing extensions select `Raw`; this never fails.
pub fn select_backend(path: &str) -> BackendKind {
    extension(path)
        .and_then(|ext| {
            EXTENSIONS
                .iter()
                .find(|(candidate, _)| *candidate == ext)
                .map(|(_, kind)| *kind)
        })
        .unwrap_or(BackendKind::Raw)
}

impl BackendKind {
    pub fn name(&self) -> &'static str {
        match self {
            BackendKind::Raw => "raw",
            BackendKind::Container => "container",
            BackendKind::Parallel => "parallel",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_extensions() {
        assert_eq!(select_backend("/mnt/daos/x.h5"), BackendKind::Container);
        assert_eq!(select_backend("daos://p/c/dir/x.hdf5"), BackendKind::Container);
    }

    #[test]
    fn test_parallel_extensions() {
        for ext in ["mpi", "bin", "dat", "raw"] {
            let path = format!("/mnt/daos/sample.{}", ext);
            assert_eq!(select_backend(&path), BackendKind::Parallel, "{}", ext);
        }
    }

    #[test]
    fn test_unknown_extension_is_raw() {
        assert_eq!(select_backend("/mnt/daos/x.xyz"), BackendKind::Raw);
        assert_eq!(select_backend("/mnt/daos/x.npy"), BackendKind::Raw);
        assert_eq!(select_backend("/mnt/daos/noext"), BackendKind::Raw);
        assert_eq!(select_backend("/mnt/daos/.bin"), BackendKind::Raw);
        assert_eq!(select_backend(""), BackendKind::Raw);
    }

    #[test]
    fn test_only_final_extension_counts() {
        assert_eq!(select_backend("/mnt/daos/x.h5.bak"), BackendKind::Raw);
        assert_eq!(select_backend("/mnt/daos/x.tar.bin"), BackendKind::Parallel);
        assert_eq!(select_backend("/mnt/daos/dir.h5/file"), BackendKind::Raw);
    }

    #[test]
    fn test_case_sensitive() {
        assert_eq!(select_backend("/mnt/daos/x.H5"), BackendKind::Raw);
    }
}

use serde::{Deserialize, Serialize};
use tracing::warn;

use dt_tensor::DType;

/// URI scheme of the object store.
pub const DAOS_SCHEME: &str = "daos://";

/// Where the DAOS container is mounted through dfuse by default.
pub const DEFAULT_MOUNT_PREFIX: &str = "/mnt/daos/";

/// Suffix appended to a data path to find its sidecar descriptor.
pub const DEFAULT_SIDECAR_SUFFIX: &str = ".meta";

/// Dataset read from HDF5 containers.
pub const DEFAULT_CONTAINER_DATASET: &str = "data";

/// Shape used by the parallel backend when a sidecar carries no shape.
pub const PARALLEL_FALLBACK_SHAPE: [usize; 2] = [128, 128];

pub const ENV_POOL: &str = "DAOS_POOL";
pub const ENV_CONTAINER: &str = "DAOS_CONT";
pub const ENV_MOUNT_PREFIX: &str = "DAOS_MOUNT_PREFIX";

/// Process-wide store configuration.
///
/// Built once at startup (usually with [`StoreConfig::from_env`]) and then
/// only ever borrowed; nothing in this crate mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// DAOS pool label or UUID.
    pub pool: String,
    /// DAOS container label or UUID.
    pub container: String,
    /// Local mount prefix, always ending in `/`.
    pub mount_prefix: String,
    /// Element type assumed when nothing else says otherwise.
    #[serde(with = "dtype_name")]
    pub default_dtype: DType,
    pub sidecar_suffix: String,
    pub container_dataset: String,
    /// Shape the parallel backend uses when a sidecar exists but has no
    /// `shape` field. `None` makes it probe the object instead.
    pub parallel_fallback_shape: Option<Vec<usize>>,
    /// Chunk size of the parallel backend's reads, in bytes.
    pub stripe_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            pool: String::new(),
            container: String::new(),
            mount_prefix: DEFAULT_MOUNT_PREFIX.to_string(),
            default_dtype: DType::F32,
            sidecar_suffix: DEFAULT_SIDECAR_SUFFIX.to_string(),
            container_dataset: DEFAULT_CONTAINER_DATASET.to_string(),
            parallel_fallback_shape: Some(PARALLEL_FALLBACK_SHAPE.to_vec()),
            stripe_size: 1 << 20,
        }
    }
}

impl StoreConfig {
    /// Build the configuration from the process environment.
    ///
    /// Reads `DAOS_POOL`, `DAOS_CONT` and optionally `DAOS_MOUNT_PREFIX`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = StoreConfig::default();
        match lookup(ENV_POOL) {
            Some(pool) => config.pool = pool,
            None => warn!(var = ENV_POOL, "not set, object URIs will have an empty pool"),
        }
        match lookup(ENV_CONTAINER) {
            Some(container) => config.container = container,
            None => warn!(var = ENV_CONTAINER, "not set, object URIs will have an empty container"),
        }
        if let Some(prefix) = lookup(ENV_MOUNT_PREFIX) {
            config = config.with_mount_prefix(prefix);
        }
        config
    }

    /// Set the mount prefix, adding the trailing `/` if missing.
    pub fn with_mount_prefix(mut self, prefix: impl Into<String>) -> Self {
        let mut prefix = prefix.into();
        if !prefix.ends_with('/') {
            prefix.push('/');
        }
        self.mount_prefix = prefix;
        self
    }

    pub fn with_pool_container(mut self, pool: impl Into<String>, container: impl Into<String>) -> Self {
        self.pool = pool.into();
        self.container = container.into();
        self
    }
}

/// Serializes a `DType` as its numpy name.
mod dtype_name {
    use dt_tensor::DType;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(dtype: &DType, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(dtype.name())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DType, D::Error> {
        let name = String::deserialize(deserializer)?;
        DType::parse(&name).ok_or_else(|| D::Error::custom(format!("unknown dtype '{}'", name)))
    }
}

use dt_store::TensorLoader;

/// Opaque context handle owning the loader and its configuration.
pub struct DTContext {
    pub loader: TensorLoader,
}

impl DTContext {
    pub fn new(loader: TensorLoader) -> Self {
        Self { loader }
    }

    /// Context configured from `DAOS_POOL`, `DAOS_CONT` and `DAOS_MOUNT_PREFIX`.
    pub fn from_env() -> Self {
        Self::new(TensorLoader::from_env())
    }
}

use dt_store::BackendKind;
use dt_tensor::DType;

/// Status codes returned by all FFI functions.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DTStatus {
    Ok = 0,
    ErrorInvalidArgument = 1,
    /// Not a `daos://` URI or mount path.
    ErrorInvalidPath = 2,
    /// Byte count does not fit the dtype or shape.
    ErrorSizeMismatch = 3,
    /// Open/seek/read failure from the storage medium.
    ErrorIo = 4,
    /// Backend or dtype not available in this build.
    ErrorUnsupported = 5,
    ErrorInternal = 6,
}

/// Backend a path is read with.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DTBackendKind {
    Raw = 0,
    Container = 1,
    Parallel = 2,
}

impl From<BackendKind> for DTBackendKind {
    fn from(kind: BackendKind) -> Self {
        match kind {
            BackendKind::Raw => DTBackendKind::Raw,
            BackendKind::Container => DTBackendKind::Container,
            BackendKind::Parallel => DTBackendKind::Parallel,
        }
    }
}

/// Element type codes. Passed across the boundary as `uint32_t`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DTDType {
    Bool = 0,
    U8 = 1,
    I8 = 2,
    U16 = 3,
    I16 = 4,
    F16 = 5,
    U32 = 6,
    I32 = 7,
    F32 = 8,
    U64 = 9,
    I64 = 10,
    F64 = 11,
}

impl DTDType {
    /// Decode a raw code; `None` for unknown values.
    pub fn from_code(code: u32) -> Option<DTDType> {
        DType::ALL.get(code as usize).map(|&d| d.into())
    }
}

impl From<DType> for DTDType {
    fn from(dtype: DType) -> Self {
        match dtype {
            DType::Bool => DTDType::Bool,
            DType::U8 => DTDType::U8,
            DType::I8 => DTDType::I8,
            DType::U16 => DTDType::U16,
            DType::I16 => DTDType::I16,
            DType::F16 => DTDType::F16,
            DType::U32 => DTDType::U32,
            DType::I32 => DTDType::I32,
            DType::F32 => DTDType::F32,
            DType::U64 => DTDType::U64,
            DType::I64 => DTDType::I64,
            DType::F64 => DTDType::F64,
        }
    }
}

impl From<DTDType> for DType {
    fn from(dtype: DTDType) -> Self {
        DType::ALL[dtype as usize]
    }
}

/// Heap byte buffer handed to the caller; free with `dt_buffer_free`.
#[repr(C)]
#[derive(Debug)]
pub struct DTBuffer {
    pub data: *mut u8,
    pub len: usize,
}

impl DTBuffer {
    pub fn empty() -> Self {
        Self {
            data: std::ptr::null_mut(),
            len: 0,
        }
    }
}

/// Decoded tensor handed to the caller; free with `dt_tensor_free`.
///
/// `data` holds `len` little-endian bytes in row-major order.
#[repr(C)]
#[derive(Debug)]
pub struct DTTensor {
    pub data: *mut u8,
    pub len: usize,
    pub shape: *mut usize,
    pub ndim: usize,
    pub dtype: DTDType,
}

impl DTTensor {
    pub fn empty() -> Self {
        Self {
            data: std::ptr::null_mut(),
            len: 0,
            shape: std::ptr::null_mut(),
            ndim: 0,
            dtype: DTDType::F32,
        }
    }
}

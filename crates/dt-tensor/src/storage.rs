use half::f16;

use crate::dtype::DType;
use crate::error::{Result, TensorError};

/// CPU-side tensor storage, one variant per element type.
///
/// Storage is always contiguous and row-major. Byte conversions are
/// little-endian.
///
/// Booleans keep the byte they were read from; any non-zero byte is true.
/// Casts to bool produce 0 and 1.
#[derive(Debug, Clone, PartialEq)]
pub enum CpuStorage {
    Bool(Vec<u8>),
    U8(Vec<u8>),
    I8(Vec<i8>),
    U16(Vec<u16>),
    I16(Vec<i16>),
    F16(Vec<f16>),
    U32(Vec<u32>),
    I32(Vec<i32>),
    F32(Vec<f32>),
    U64(Vec<u64>),
    I64(Vec<i64>),
    F64(Vec<f64>),
}

/// Applies `$body` to the inner vector of any storage variant.
macro_rules! visit {
    ($storage:expr, $v:ident => $body:expr) => {
        match $storage {
            CpuStorage::Bool($v) => $body,
            CpuStorage::U8($v) => $body,
            CpuStorage::I8($v) => $body,
            CpuStorage::U16($v) => $body,
            CpuStorage::I16($v) => $body,
            CpuStorage::F16($v) => $body,
            CpuStorage::U32($v) => $body,
            CpuStorage::I32($v) => $body,
            CpuStorage::F32($v) => $body,
            CpuStorage::U64($v) => $body,
            CpuStorage::I64($v) => $body,
            CpuStorage::F64($v) => $body,
        }
    };
}

/// Decodes little-endian fixed-width values from exact-size chunks.
macro_rules! decode_le {
    ($bytes:expr, $t:ty) => {
        $bytes
            .chunks_exact(std::mem::size_of::<$t>())
            .map(|chunk| {
                let mut raw = [0u8; std::mem::size_of::<$t>()];
                raw.copy_from_slice(chunk);
                <$t>::from_le_bytes(raw)
            })
            .collect()
    };
}

impl CpuStorage {
    /// Number of elements in this storage.
    pub fn len(&self) -> usize {
        visit!(self, v => v.len())
    }

    /// Returns true if the storage contains no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the dtype of this storage.
    pub fn dtype(&self) -> DType {
        match self {
            CpuStorage::Bool(_) => DType::Bool,
            CpuStorage::U8(_) => DType::U8,
            CpuStorage::I8(_) => DType::I8,
            CpuStorage::U16(_) => DType::U16,
            CpuStorage::I16(_) => DType::I16,
            CpuStorage::F16(_) => DType::F16,
            CpuStorage::U32(_) => DType::U32,
            CpuStorage::I32(_) => DType::I32,
            CpuStorage::F32(_) => DType::F32,
            CpuStorage::U64(_) => DType::U64,
            CpuStorage::I64(_) => DType::I64,
            CpuStorage::F64(_) => DType::F64,
        }
    }

    /// Reinterpret a little-endian byte buffer as a flat array of `dtype`.
    ///
    /// # Errors
    /// Returns `BufferSizeMismatch` if `bytes.len()` is not a multiple of
    /// the element size.
    pub fn from_le_bytes(dtype: DType, bytes: &[u8]) -> Result<Self> {
        let element_size = dtype.size_in_bytes();
        if bytes.len() % element_size != 0 {
            return Err(TensorError::BufferSizeMismatch {
                len: bytes.len(),
                element_size,
                dtype: dtype.to_string(),
            });
        }
        let storage = match dtype {
            DType::Bool => CpuStorage::Bool(bytes.to_vec()),
            DType::U8 => CpuStorage::U8(bytes.to_vec()),
            DType::I8 => CpuStorage::I8(bytes.iter().map(|&b| b as i8).collect()),
            DType::U16 => CpuStorage::U16(decode_le!(bytes, u16)),
            DType::I16 => CpuStorage::I16(decode_le!(bytes, i16)),
            DType::F16 => CpuStorage::F16(decode_le!(bytes, f16)),
            DType::U32 => CpuStorage::U32(decode_le!(bytes, u32)),
            DType::I32 => CpuStorage::I32(decode_le!(bytes, i32)),
            DType::F32 => CpuStorage::F32(decode_le!(bytes, f32)),
            DType::U64 => CpuStorage::U64(decode_le!(bytes, u64)),
            DType::I64 => CpuStorage::I64(decode_le!(bytes, i64)),
            DType::F64 => CpuStorage::F64(decode_le!(bytes, f64)),
        };
        Ok(storage)
    }

    /// Serialize the elements back to little-endian bytes.
    pub fn to_le_bytes(&self) -> Vec<u8> {
        match self {
            CpuStorage::Bool(v) => v.clone(),
            CpuStorage::U8(v) => v.clone(),
            CpuStorage::I8(v) => v.iter().map(|&x| x as u8).collect(),
            CpuStorage::U16(v) => v.iter().flat_map(|x| x.to_le_bytes()).collect(),
            CpuStorage::I16(v) => v.iter().flat_map(|x| x.to_le_bytes()).collect(),
            CpuStorage::F16(v) => v.iter().flat_map(|x| x.to_le_bytes()).collect(),
            CpuStorage::U32(v) => v.iter().flat_map(|x| x.to_le_bytes()).collect(),
            CpuStorage::I32(v) => v.iter().flat_map(|x| x.to_le_bytes()).collect(),
            CpuStorage::F32(v) => v.iter().flat_map(|x| x.to_le_bytes()).collect(),
            CpuStorage::U64(v) => v.iter().flat_map(|x| x.to_le_bytes()).collect(),
            CpuStorage::I64(v) => v.iter().flat_map(|x| x.to_le_bytes()).collect(),
            CpuStorage::F64(v) => v.iter().flat_map(|x| x.to_le_bytes()).collect(),
        }
    }

    /// Element-wise cast to `dtype`.
    ///
    /// Integer narrowing wraps, float to integer saturates (Rust `as`
    /// semantics), anything to bool is `x != 0`.
    pub fn cast(&self, dtype: DType) -> CpuStorage {
        match self {
            _ if self.dtype() == dtype => self.clone(),
            CpuStorage::Bool(v) => {
                let flags: Vec<bool> = v.iter().map(|&b| b != 0).collect();
                convert(&flags, dtype)
            }
            _ => visit!(self, v => convert(v, dtype)),
        }
    }

    /// Returns the data as a typed slice, or `None` if `T` is not the
    /// storage's element type.
    pub fn as_slice<T: Element>(&self) -> Option<&[T]> {
        T::slice(self)
    }
}

fn convert<S: Scalar>(src: &[S], dtype: DType) -> CpuStorage {
    fn map<S: Scalar, T: Scalar>(src: &[S]) -> Vec<T> {
        src.iter().map(|&x| T::from_repr(x.to_repr())).collect()
    }
    match dtype {
        DType::Bool => CpuStorage::Bool(map::<S, bool>(src).into_iter().map(u8::from).collect()),
        DType::U8 => CpuStorage::U8(map(src)),
        DType::I8 => CpuStorage::I8(map(src)),
        DType::U16 => CpuStorage::U16(map(src)),
        DType::I16 => CpuStorage::I16(map(src)),
        DType::F16 => CpuStorage::F16(map(src)),
        DType::U32 => CpuStorage::U32(map(src)),
        DType::I32 => CpuStorage::I32(map(src)),
        DType::F32 => CpuStorage::F32(map(src)),
        DType::U64 => CpuStorage::U64(map(src)),
        DType::I64 => CpuStorage::I64(map(src)),
        DType::F64 => CpuStorage::F64(map(src)),
    }
}

/// Widest lossless-enough representation of a single element, used as the
/// pivot for casts.
#[derive(Clone, Copy)]
pub(crate) enum Repr {
    Bool(bool),
    Int(i128),
    Float(f64),
}

pub(crate) trait Scalar: Copy {
    fn to_repr(self) -> Repr;
    fn from_repr(repr: Repr) -> Self;
}

macro_rules! impl_int_scalar {
    ($($t:ty),*) => {$(
        impl Scalar for $t {
            fn to_repr(self) -> Repr {
                Repr::Int(self as i128)
            }
            fn from_repr(repr: Repr) -> Self {
                match repr {
                    Repr::Bool(b) => b as $t,
                    Repr::Int(i) => i as $t,
                    Repr::Float(f) => f as $t,
                }
            }
        }
    )*};
}

impl_int_scalar!(u8, i8, u16, i16, u32, i32, u64, i64);

macro_rules! impl_float_scalar {
    ($($t:ty),*) => {$(
        impl Scalar for $t {
            fn to_repr(self) -> Repr {
                Repr::Float(self as f64)
            }
            fn from_repr(repr: Repr) -> Self {
                match repr {
                    Repr::Bool(b) => b as u8 as $t,
                    Repr::Int(i) => i as $t,
                    Repr::Float(f) => f as $t,
                }
            }
        }
    )*};
}

impl_float_scalar!(f32, f64);

impl Scalar for f16 {
    fn to_repr(self) -> Repr {
        Repr::Float(self.to_f64())
    }
    fn from_repr(repr: Repr) -> Self {
        match repr {
            Repr::Bool(b) => f16::from_f64(b as u8 as f64),
            Repr::Int(i) => f16::from_f64(i as f64),
            Repr::Float(f) => f16::from_f64(f),
        }
    }
}

impl Scalar for bool {
    fn to_repr(self) -> Repr {
        Repr::Bool(self)
    }
    fn from_repr(repr: Repr) -> Self {
        match repr {
            Repr::Bool(b) => b,
            Repr::Int(i) => i != 0,
            Repr::Float(f) => f != 0.0,
        }
    }
}

/// Rust element types that map one-to-one onto a `DType`.
///
/// `bool` storage holds raw bytes and is read through `to_le_bytes`.
pub trait Element: Copy + 'static {
    const DTYPE: DType;

    /// Borrow the storage as `&[Self]` if the variant matches.
    fn slice(storage: &CpuStorage) -> Option<&[Self]>;

    /// Wrap an owned vector in the matching storage variant.
    fn into_storage(data: Vec<Self>) -> CpuStorage;
}

macro_rules! impl_element {
    ($($t:ty => $variant:ident),* $(,)?) => {$(
        impl Element for $t {
            const DTYPE: DType = DType::$variant;

            fn slice(storage: &CpuStorage) -> Option<&[Self]> {
                match storage {
                    CpuStorage::$variant(v) => Some(v.as_slice()),
                    _ => None,
                }
            }

            fn into_storage(data: Vec<Self>) -> CpuStorage {
                CpuStorage::$variant(data)
            }
        }
    )*};
}

impl_element!(
    u8 => U8,
    i8 => I8,
    u16 => U16,
    i16 => I16,
    f16 => F16,
    u32 => U32,
    i32 => I32,
    f32 => F32,
    u64 => U64,
    i64 => I64,
    f64 => F64,
);

use std::fmt;

/// Element types a tensor can be stored as.
///
/// The set mirrors the primitive numeric types that appear in sidecar
/// descriptors and HDF5 datasets. Variants are ordered by element width.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DType {
    /// Boolean, one byte per element (0 = false).
    Bool,
    U8,
    I8,
    U16,
    I16,
    /// 16-bit floating point (IEEE 754 half-precision, via the `half` crate).
    F16,
    U32,
    I32,
    /// 32-bit floating point. The default element type for untyped objects.
    #[default]
    F32,
    U64,
    I64,
    F64,
}

impl DType {
    /// All supported element types.
    pub const ALL: [DType; 12] = [
        DType::Bool,
        DType::U8,
        DType::I8,
        DType::U16,
        DType::I16,
        DType::F16,
        DType::U32,
        DType::I32,
        DType::F32,
        DType::U64,
        DType::I64,
        DType::F64,
    ];

    /// Returns the size in bytes of a single element.
    pub fn size_in_bytes(&self) -> usize {
        match self {
            DType::Bool | DType::U8 | DType::I8 => 1,
            DType::U16 | DType::I16 | DType::F16 => 2,
            DType::U32 | DType::I32 | DType::F32 => 4,
            DType::U64 | DType::I64 | DType::F64 => 8,
        }
    }

    /// Parses a numpy-style dtype name.
    ///
    /// Accepts full names (`float32`), array-protocol type codes with an
    /// optional little-endian or native byte-order marker (`f4`, `<f4`,
    /// `|u1`, `=i8`), and the common aliases numpy resolves on 64-bit
    /// Linux (`float` and `double` are float64, `int` is int64).
    /// Big-endian codes are rejected.
    pub fn parse(name: &str) -> Option<DType> {
        let name = name.trim();
        let name = name
            .strip_prefix('<')
            .or_else(|| name.strip_prefix('|'))
            .or_else(|| name.strip_prefix('='))
            .unwrap_or(name);

        let dtype = match name {
            "bool" | "bool_" | "?" | "b1" => DType::Bool,
            "uint8" | "u1" | "B" | "ubyte" => DType::U8,
            "int8" | "i1" | "b" | "byte" => DType::I8,
            "uint16" | "u2" | "H" | "ushort" => DType::U16,
            "int16" | "i2" | "h" | "short" => DType::I16,
            "float16" | "f2" | "e" | "half" => DType::F16,
            "uint32" | "u4" | "I" | "uintc" => DType::U32,
            "int32" | "i4" | "i" | "intc" => DType::I32,
            "float32" | "f4" | "f" | "single" => DType::F32,
            "uint64" | "u8" | "L" | "uint" => DType::U64,
            "int64" | "i8" | "l" | "int" | "int_" => DType::I64,
            "float64" | "f8" | "d" | "double" | "float" | "float_" => DType::F64,
            _ => return None,
        };
        Some(dtype)
    }

    /// Returns the canonical numpy name of this dtype.
    pub fn name(&self) -> &'static str {
        match self {
            DType::Bool => "bool",
            DType::U8 => "uint8",
            DType::I8 => "int8",
            DType::U16 => "uint16",
            DType::I16 => "int16",
            DType::F16 => "float16",
            DType::U32 => "uint32",
            DType::I32 => "int32",
            DType::F32 => "float32",
            DType::U64 => "uint64",
            DType::I64 => "int64",
            DType::F64 => "float64",
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_in_bytes() {
        assert_eq!(DType::Bool.size_in_bytes(), 1);
        assert_eq!(DType::F16.size_in_bytes(), 2);
        assert_eq!(DType::F32.size_in_bytes(), 4);
        assert_eq!(DType::I64.size_in_bytes(), 8);
        assert_eq!(DType::F64.size_in_bytes(), 8);
    }

    #[test]
    fn test_parse_names() {
        for dtype in DType::ALL {
            assert_eq!(DType::parse(dtype.name()), Some(dtype));
        }
    }

    #[test]
    fn test_parse_type_codes() {
        assert_eq!(DType::parse("<f4"), Some(DType::F32));
        assert_eq!(DType::parse("f8"), Some(DType::F64));
        assert_eq!(DType::parse("|u1"), Some(DType::U8));
        assert_eq!(DType::parse("=i8"), Some(DType::I64));
        assert_eq!(DType::parse(" float16 "), Some(DType::F16));
    }

    #[test]
    fn test_parse_aliases() {
        assert_eq!(DType::parse("float"), Some(DType::F64));
        assert_eq!(DType::parse("double"), Some(DType::F64));
        assert_eq!(DType::parse("int"), Some(DType::I64));
        assert_eq!(DType::parse("single"), Some(DType::F32));
    }

    #[test]
    fn test_parse_rejects() {
        assert_eq!(DType::parse(">f4"), None);
        assert_eq!(DType::parse("complex64"), None);
        assert_eq!(DType::parse("[\"f4\"]"), None);
        assert_eq!(DType::parse(""), None);
    }

    #[test]
    fn test_default_is_f32() {
        assert_eq!(DType::default(), DType::F32);
        assert_eq!(DType::F32.to_string(), "float32");
    }
}

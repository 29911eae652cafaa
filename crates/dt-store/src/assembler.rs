//! Turns a raw buffer plus its descriptor into the tensor the caller asked for.

use dt_tensor::{DType, Tensor};

use crate::error::Result;
use crate::metadata::Descriptor;
use crate::reader::RawBuffer;

/// Reinterpret `buffer` as `descriptor.dtype`, reshape to
/// `descriptor.shape` (flat if unknown) and cast to `requested`.
///
/// # Errors
/// `TensorError::BufferSizeMismatch` if the byte count is not a multiple of
/// the element size, `TensorError::ShapeMismatch` if a known shape does not
/// hold exactly the buffer's element count. No partial tensor is returned.
pub fn assemble(buffer: &RawBuffer, descriptor: &Descriptor, requested: DType) -> Result<Tensor> {
    let tensor = Tensor::from_le_bytes(buffer.as_bytes(), descriptor.dtype, descriptor.shape())?;
    Ok(tensor.into_dtype(requested))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::metadata::DescriptorSource;
    use approx::assert_relative_eq;
    use dt_tensor::TensorError;

    fn sidecar(shape: &[usize], dtype: DType) -> Descriptor {
        Descriptor::new(shape.to_vec(), dtype, DescriptorSource::Sidecar)
    }

    #[test]
    fn test_flat_when_shape_unknown() {
        let buf = RawBuffer::new(vec![0u8; 1024]);
        let t = assemble(&buf, &Descriptor::unknown(DType::F32), DType::F32).unwrap();
        assert_eq!(t.shape().dims(), &[256]);
    }

    #[test]
    fn test_reshape_and_cast() {
        let values: Vec<f64> = (0..64).map(|i| i as f64 / 3.0).collect();
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        let buf = RawBuffer::new(bytes);
        let t = assemble(&buf, &sidecar(&[4, 4, 4], DType::F64), DType::F32).unwrap();
        assert_eq!(t.shape().dims(), &[4, 4, 4]);
        assert_eq!(t.dtype(), DType::F32);
        assert_relative_eq!(t.get::<f32>(&[1, 2, 3]).unwrap(), (27.0f64 / 3.0) as f32);
    }

    #[test]
    fn test_no_cast_keeps_bytes() {
        let bytes: Vec<u8> = (0..32).collect();
        let buf = RawBuffer::new(bytes.clone());
        let t = assemble(&buf, &sidecar(&[8], DType::I32), DType::I32).unwrap();
        assert_eq!(t.to_le_bytes(), bytes);
    }

    #[test]
    fn test_succeeds_iff_sizes_agree() {
        let cases: &[(&[usize], DType, usize)] = &[
            (&[4, 4], DType::F32, 64),
            (&[4, 4], DType::F32, 60),
            (&[4, 4], DType::F32, 68),
            (&[3], DType::F64, 24),
            (&[3], DType::F64, 20),
            (&[2, 0], DType::U16, 0),
            (&[5], DType::U8, 5),
            (&[], DType::I64, 16),
            (&[], DType::I64, 12),
        ];
        for &(shape, dtype, len) in cases {
            let d = sidecar(shape, dtype);
            let buf = RawBuffer::new(vec![0u8; len]);
            let ok = assemble(&buf, &d, DType::F32).is_ok();
            let expected = len % dtype.size_in_bytes() == 0
                && (shape.is_empty() || shape.iter().product::<usize>() * dtype.size_in_bytes() == len);
            assert_eq!(ok, expected, "{:?} {} {}", shape, dtype, len);
        }
    }

    #[test]
    fn test_error_kinds() {
        let d = sidecar(&[3, 3], DType::F32);
        let err = assemble(&RawBuffer::new(vec![0u8; 10]), &d, DType::F32).unwrap_err();
        assert!(matches!(err, StoreError::Tensor(TensorError::BufferSizeMismatch { .. })));
        let err = assemble(&RawBuffer::new(vec![0u8; 40]), &d, DType::F32).unwrap_err();
        assert!(matches!(err, StoreError::Tensor(TensorError::ShapeMismatch { .. })));
    }
}

use crate::dtype::DType;
use crate::tensor::Buffer;
use half::f16;

/// Scalar trait is implemented for all [dtypes](DType)
pub trait Scalar: Copy + Send + Sync + PartialEq + core::fmt::Debug + 'static {
    /// From f64, rounding to nearest
    fn from_f64(t: f64) -> Self;
    /// Convert self into f64, exact for all dtypes
    fn into_f64(self) -> f64;
    /// Get dtype of Self
    fn dtype() -> DType;
    /// Get zero of Self
    fn zero() -> Self;
    /// Borrow buffer as slice of Self, None if the buffer holds a different dtype
    fn slice(buffer: &Buffer) -> Option<&[Self]>;
    /// Mutably borrow buffer as slice of Self
    fn slice_mut(buffer: &mut Buffer) -> Option<&mut [Self]>;
    /// Wrap vector of Self into buffer
    fn into_buffer(data: Vec<Self>) -> Buffer;
    /// Append little endian bytes of self
    fn write_le(self, out: &mut Vec<u8>);
    /// Read from little endian bytes
    fn read_le(bytes: &[u8]) -> Self;

    /// Cast to another scalar type.
    /// Every value is exactly representable as f64, so this rounds only once.
    fn cast<T: Scalar>(self) -> T {
        T::from_f64(self.into_f64())
    }
}

impl Scalar for f16 {
    fn from_f64(t: f64) -> Self {
        f16::from_f64(t)
    }

    fn into_f64(self) -> f64 {
        self.to_f64()
    }

    fn dtype() -> DType {
        DType::F16
    }

    fn zero() -> Self {
        f16::ZERO
    }

    fn slice(buffer: &Buffer) -> Option<&[Self]> {
        match buffer {
            Buffer::F16(data) => Some(data.as_slice()),
            _ => None,
        }
    }

    fn slice_mut(buffer: &mut Buffer) -> Option<&mut [Self]> {
        match buffer {
            Buffer::F16(data) => Some(data.as_mut_slice()),
            _ => None,
        }
    }

    fn into_buffer(data: Vec<Self>) -> Buffer {
        Buffer::F16(data)
    }

    fn write_le(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&f16::to_le_bytes(self));
    }

    fn read_le(bytes: &[u8]) -> Self {
        f16::from_le_bytes([bytes[0], bytes[1]])
    }
}

impl Scalar for f32 {
    #[allow(clippy::cast_possible_truncation)]
    fn from_f64(t: f64) -> Self {
        t as f32
    }

    fn into_f64(self) -> f64 {
        f64::from(self)
    }

    fn dtype() -> DType {
        DType::F32
    }

    fn zero() -> Self {
        0.
    }

    fn slice(buffer: &Buffer) -> Option<&[Self]> {
        match buffer {
            Buffer::F32(data) => Some(data.as_slice()),
            _ => None,
        }
    }

    fn slice_mut(buffer: &mut Buffer) -> Option<&mut [Self]> {
        match buffer {
            Buffer::F32(data) => Some(data.as_mut_slice()),
            _ => None,
        }
    }

    fn into_buffer(data: Vec<Self>) -> Buffer {
        Buffer::F32(data)
    }

    fn write_le(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&f32::to_le_bytes(self));
    }

    fn read_le(bytes: &[u8]) -> Self {
        f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
    }
}

impl Scalar for f64 {
    fn from_f64(t: f64) -> Self {
        t
    }

    fn into_f64(self) -> f64 {
        self
    }

    fn dtype() -> DType {
        DType::F64
    }

    fn zero() -> Self {
        0.
    }

    fn slice(buffer: &Buffer) -> Option<&[Self]> {
        match buffer {
            Buffer::F64(data) => Some(data.as_slice()),
            _ => None,
        }
    }

    fn slice_mut(buffer: &mut Buffer) -> Option<&mut [Self]> {
        match buffer {
            Buffer::F64(data) => Some(data.as_mut_slice()),
            _ => None,
        }
    }

    fn into_buffer(data: Vec<Self>) -> Buffer {
        Buffer::F64(data)
    }

    fn write_le(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&f64::to_le_bytes(self));
    }

    fn read_le(bytes: &[u8]) -> Self {
        let mut b = [0; 8];
        b.copy_from_slice(&bytes[..8]);
        f64::from_le_bytes(b)
    }
}

/// Rounds f32 to the 10 bit mantissa used by tf32 multiplies, ties to even.
pub fn round_tf32(x: f32) -> f32 {
    if !x.is_finite() {
        return x;
    }
    let bits = x.to_bits();
    let lsb = (bits >> 13) & 1;
    f32::from_bits(bits.wrapping_add(0xfff + lsb) & !0x1fff)
}

#[cfg(test)]
mod tests {
    use super::{round_tf32, Scalar};
    use half::f16;

    #[test]
    fn cast_rounds_once() {
        let x = 1.0f64 + 2f64.powi(-11) + 2f64.powi(-30);
        // Just above the halfway point between two f16 values, must round up
        let y: f16 = x.cast();
        assert_eq!(y, f16::from_f64(1.0 + 2f64.powi(-10)));
        let z: f64 = y.cast();
        assert_eq!(z, 1.0 + 2f64.powi(-10));
    }

    #[test]
    fn tf32_rounding() {
        assert_eq!(round_tf32(1.0), 1.0);
        // 13 low mantissa bits are dropped
        let x = f32::from_bits(1.0f32.to_bits() | 0x0fff);
        assert_eq!(round_tf32(x), 1.0);
        let x = f32::from_bits(1.0f32.to_bits() | 0x1001);
        assert_eq!(round_tf32(x), f32::from_bits(1.0f32.to_bits() | 0x2000));
        assert!(round_tf32(f32::NAN).is_nan());
        assert_eq!(round_tf32(f32::INFINITY), f32::INFINITY);
        assert_eq!(round_tf32(-2.5), -2.5);
    }
}

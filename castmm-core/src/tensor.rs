use crate::dtype::DType;
use crate::error::CastmmError;
use crate::rng::Rng;
use crate::scalar::Scalar;
use half::f16;
use std::sync::Arc;

/// Typed storage of a tensor
#[derive(Debug, Clone, PartialEq)]
pub enum Buffer {
    /// Half precision data
    F16(Vec<f16>),
    /// Single precision data
    F32(Vec<f32>),
    /// Double precision data
    F64(Vec<f64>),
}

impl Buffer {
    fn zeros(dtype: DType, len: usize) -> Buffer {
        match dtype {
            DType::F16 => Buffer::F16(vec![f16::ZERO; len]),
            DType::F32 => Buffer::F32(vec![0.; len]),
            DType::F64 => Buffer::F64(vec![0.; len]),
        }
    }

    /// DType of stored elements
    pub fn dtype(&self) -> DType {
        match self {
            Buffer::F16(_) => DType::F16,
            Buffer::F32(_) => DType::F32,
            Buffer::F64(_) => DType::F64,
        }
    }

    /// Number of stored elements
    pub(crate) fn len(&self) -> usize {
        match self {
            Buffer::F16(data) => data.len(),
            Buffer::F32(data) => data.len(),
            Buffer::F64(data) => data.len(),
        }
    }
}

/// Host resident 2-D tensor.
///
/// Element `(row, col)` lives at `row * strides[0] + col * strides[1]` in the buffer.
/// Tensors are immutable apart from [`Tensor::data_mut`], which copies the storage
/// if it is shared with another tensor.
#[derive(Debug, Clone)]
pub struct Tensor {
    shape: [usize; 2],
    strides: [usize; 2],
    buffer: Arc<Buffer>,
}

impl Tensor {
    /// Contiguous tensor filled with zeros
    pub fn zeros(shape: [usize; 2], dtype: DType) -> Tensor {
        Tensor {
            shape,
            strides: [shape[1], 1],
            buffer: Arc::new(Buffer::zeros(dtype, shape[0] * shape[1])),
        }
    }

    /// Contiguous tensor from row major data
    #[track_caller]
    pub fn from_vec<T: Scalar>(shape: [usize; 2], data: Vec<T>) -> Result<Tensor, CastmmError> {
        if data.len() != shape[0] * shape[1] {
            return Err(CastmmError::shape_error(
                format!("Tensor of shape {shape:?} can not hold {} elements", data.len()).into(),
            ));
        }
        Ok(Tensor { shape, strides: [shape[1], 1], buffer: Arc::new(T::into_buffer(data)) })
    }

    /// Contiguous tensor sampled from the standard normal distribution.
    /// Samples are drawn in double precision and rounded to dtype.
    pub fn randn(shape: [usize; 2], dtype: DType, rng: &mut Rng) -> Tensor {
        let n = shape[0] * shape[1];
        let buffer = match dtype {
            DType::F16 => Buffer::F16((0..n).map(|_| rng.randn().cast()).collect()),
            DType::F32 => Buffer::F32((0..n).map(|_| rng.randn().cast()).collect()),
            DType::F64 => Buffer::F64((0..n).map(|_| rng.randn()).collect()),
        };
        Tensor { shape, strides: [shape[1], 1], buffer: Arc::new(buffer) }
    }

    /// Tensor from little endian bytes in row major order
    #[track_caller]
    pub fn from_le_bytes(shape: [usize; 2], dtype: DType, bytes: &[u8]) -> Result<Tensor, CastmmError> {
        let n = shape[0] * shape[1];
        if bytes.len() != n * dtype.byte_size() {
            return Err(CastmmError::shape_error(
                format!(
                    "{} bytes do not fit tensor of shape {shape:?} and dtype {dtype}",
                    bytes.len()
                )
                .into(),
            ));
        }
        fn read<T: Scalar>(bytes: &[u8]) -> Vec<T> {
            bytes.chunks_exact(T::dtype().byte_size()).map(T::read_le).collect()
        }
        let buffer = match dtype {
            DType::F16 => Buffer::F16(read(bytes)),
            DType::F32 => Buffer::F32(read(bytes)),
            DType::F64 => Buffer::F64(read(bytes)),
        };
        Ok(Tensor { shape, strides: [shape[1], 1], buffer: Arc::new(buffer) })
    }

    /// DType of tensor
    pub fn dtype(&self) -> DType {
        self.buffer.dtype()
    }

    /// Shape as `[rows, cols]`
    pub const fn shape(&self) -> [usize; 2] {
        self.shape
    }

    /// Strides in elements as `[row_stride, col_stride]`
    pub const fn strides(&self) -> [usize; 2] {
        self.strides
    }

    /// Number of elements
    pub const fn numel(&self) -> usize {
        self.shape[0] * self.shape[1]
    }

    /// Is the tensor stored row major without gaps?
    pub fn is_contiguous(&self) -> bool {
        self.strides == [self.shape[1], 1] && self.buffer.len() == self.numel()
    }

    /// Underlying storage
    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    /// Transposed tensor sharing the storage of self
    #[must_use]
    pub fn t(&self) -> Tensor {
        Tensor {
            shape: [self.shape[1], self.shape[0]],
            strides: [self.strides[1], self.strides[0]],
            buffer: self.buffer.clone(),
        }
    }

    /// Raw storage as slice of T, indexed through [`Tensor::strides`]
    #[track_caller]
    pub fn data<T: Scalar>(&self) -> Result<&[T], CastmmError> {
        let dtype = self.dtype();
        T::slice(&self.buffer).ok_or_else(|| {
            CastmmError::dtype_error(format!("accessing {dtype} tensor as {}", T::dtype()).into())
        })
    }

    /// Raw mutable storage as slice of T, indexed through [`Tensor::strides`]
    #[track_caller]
    pub fn data_mut<T: Scalar>(&mut self) -> Result<&mut [T], CastmmError> {
        let dtype = self.dtype();
        T::slice_mut(Arc::make_mut(&mut self.buffer)).ok_or_else(|| {
            CastmmError::dtype_error(format!("accessing {dtype} tensor as {}", T::dtype()).into())
        })
    }

    /// Copy elements of other into self, honoring strides of both
    #[track_caller]
    pub fn assign(&mut self, other: &Tensor) -> Result<(), CastmmError> {
        if self.shape != other.shape {
            return Err(CastmmError::shape_error(
                format!("Assigning {:?} to {:?}", other.shape, self.shape).into(),
            ));
        }
        match self.dtype() {
            DType::F16 => self.assign_typed::<f16>(other),
            DType::F32 => self.assign_typed::<f32>(other),
            DType::F64 => self.assign_typed::<f64>(other),
        }
    }

    #[track_caller]
    fn assign_typed<T: Scalar>(&mut self, other: &Tensor) -> Result<(), CastmmError> {
        let [rows, cols] = self.shape;
        let [s0, s1] = other.strides;
        let [d0, d1] = self.strides;
        let src = other.data::<T>()?;
        let dst = self.data_mut::<T>()?;
        for r in 0..rows {
            for c in 0..cols {
                dst[r * d0 + c * d1] = src[r * s0 + c * s1];
            }
        }
        Ok(())
    }

    /// Element at `(row, col)` converted to f64
    pub fn get(&self, row: usize, col: usize) -> f64 {
        let i = row * self.strides[0] + col * self.strides[1];
        match &*self.buffer {
            Buffer::F16(data) => data[i].into_f64(),
            Buffer::F32(data) => data[i].into_f64(),
            Buffer::F64(data) => data[i],
        }
    }

    fn gather<S: Scalar, T: Scalar>(&self, data: &[S]) -> Vec<T> {
        let [rows, cols] = self.shape;
        if self.is_contiguous() {
            return data.iter().map(|x| x.cast()).collect();
        }
        let mut res = Vec::with_capacity(self.numel());
        for r in 0..rows {
            for c in 0..cols {
                res.push(data[r * self.strides[0] + c * self.strides[1]].cast());
            }
        }
        res
    }

    /// Elements in row major order, converted to T
    pub fn to_vec<T: Scalar>(&self) -> Vec<T> {
        match &*self.buffer {
            Buffer::F16(data) => self.gather(data),
            Buffer::F32(data) => self.gather(data),
            Buffer::F64(data) => self.gather(data),
        }
    }

    /// New contiguous tensor with elements rounded to dtype
    #[must_use]
    pub fn cast(&self, dtype: DType) -> Tensor {
        let buffer = match dtype {
            DType::F16 => Buffer::F16(self.to_vec()),
            DType::F32 => Buffer::F32(self.to_vec()),
            DType::F64 => Buffer::F64(self.to_vec()),
        };
        Tensor { shape: self.shape, strides: [self.shape[1], 1], buffer: Arc::new(buffer) }
    }

    /// Elements in row major order as little endian bytes
    pub fn to_le_bytes(&self) -> Vec<u8> {
        fn write<T: Scalar>(data: Vec<T>) -> Vec<u8> {
            let mut bytes = Vec::with_capacity(data.len() * T::dtype().byte_size());
            for x in data {
                x.write_le(&mut bytes);
            }
            bytes
        }
        match self.dtype() {
            DType::F16 => write(self.to_vec::<f16>()),
            DType::F32 => write(self.to_vec::<f32>()),
            DType::F64 => write(self.to_vec::<f64>()),
        }
    }
}

impl core::fmt::Display for Tensor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let [rows, cols] = self.shape;
        f.write_fmt(format_args!("Tensor {rows}x{cols} {}\n", self.dtype()))?;
        for r in 0..rows.min(8) {
            f.write_str("[")?;
            for c in 0..cols.min(8) {
                if c > 0 {
                    f.write_str(", ")?;
                }
                f.write_fmt(format_args!("{:.4}", self.get(r, c)))?;
            }
            if cols > 8 {
                f.write_str(", ...")?;
            }
            f.write_str("]\n")?;
        }
        if rows > 8 {
            f.write_str("...\n")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::Tensor;
    use crate::{dtype::DType, error::CastmmError, rng::Rng};
    use half::f16;

    #[test]
    fn transpose_view() -> Result<(), CastmmError> {
        let x = Tensor::from_vec([2, 3], vec![1f32, 2., 3., 4., 5., 6.])?;
        let y = x.t();
        assert_eq!(y.shape(), [3, 2]);
        assert!(!y.is_contiguous());
        assert_eq!(y.get(2, 1), 6.);
        assert_eq!(y.get(0, 1), 4.);
        assert_eq!(y.to_vec::<f32>(), [1., 4., 2., 5., 3., 6.]);
        assert!(y.cast(DType::F32).is_contiguous());
        Ok(())
    }

    #[test]
    fn display() -> Result<(), CastmmError> {
        let x = Tensor::from_vec([2, 3], vec![1f32, 2., 3., 4., 5., 6.5])?;
        assert_eq!(
            x.to_string(),
            "Tensor 2x3 F32\n[1.0000, 2.0000, 3.0000]\n[4.0000, 5.0000, 6.5000]\n"
        );
        let x = Tensor::zeros([10, 9], DType::F16);
        let text = x.to_string();
        assert_eq!(text.lines().count(), 10);
        assert!(text.lines().nth(1).is_some_and(|l| l.ends_with(", ...]")));
        assert!(text.ends_with("...\n"));
        Ok(())
    }

    #[test]
    fn cast_rounds() -> Result<(), CastmmError> {
        let x = Tensor::from_vec([1, 3], vec![0.1f64, 65504.0, 1e-8])?;
        let y = x.cast(DType::F16);
        assert_eq!(y.dtype(), DType::F16);
        assert_eq!(
            y.data::<f16>()?,
            [f16::from_f64(0.1), f16::from_f64(65504.0), f16::from_f64(1e-8)]
        );
        assert!(y.data::<f32>().is_err());
        Ok(())
    }

    #[test]
    fn from_vec_checks_len() {
        assert!(Tensor::from_vec([2, 2], vec![1f32; 3]).is_err());
    }

    #[test]
    fn data_mut_copies_shared_storage() -> Result<(), CastmmError> {
        let x = Tensor::zeros([2, 2], DType::F32);
        let mut y = x.clone();
        y.data_mut::<f32>()?[0] = 1.;
        assert_eq!(x.get(0, 0), 0.);
        assert_eq!(y.get(0, 0), 1.);
        Ok(())
    }

    #[test]
    fn assign_honors_strides() -> Result<(), CastmmError> {
        let x = Tensor::from_vec([2, 3], vec![1f64, 2., 3., 4., 5., 6.])?;
        let mut y = Tensor::zeros([3, 2], DType::F64).t();
        y.assign(&x)?;
        assert_eq!(y.to_vec::<f64>(), x.to_vec::<f64>());
        assert_eq!(y.data::<f64>()?, [1., 4., 2., 5., 3., 6.]);
        assert!(y.assign(&x.t()).is_err());
        assert!(y.assign(&x.cast(DType::F32)).is_err());
        Ok(())
    }

    #[test]
    fn bytes() -> Result<(), CastmmError> {
        let mut rng = Rng::seed_from_u64(1);
        let x = Tensor::randn([3, 5], DType::F16, &mut rng).t();
        let y = Tensor::from_le_bytes([5, 3], DType::F16, &x.to_le_bytes())?;
        assert_eq!(x.to_vec::<f16>(), y.to_vec::<f16>());
        assert!(Tensor::from_le_bytes([5, 3], DType::F32, &x.to_le_bytes()).is_err());
        Ok(())
    }
}

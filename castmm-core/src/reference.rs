use crate::dtype::DType;
use crate::error::CastmmError;
use crate::scalar::Scalar;
use crate::shape::ProblemShape;
use crate::tensor::Tensor;
use half::f16;
use rayon::prelude::*;

/// Dense matmul of two tensors of the same dtype.
///
/// Products are accumulated in double precision and each output element is
/// rounded once to the dtype of the operands.
pub fn matmul(a: &Tensor, b: &Tensor) -> Result<Tensor, CastmmError> {
    if a.dtype() != b.dtype() {
        return Err(CastmmError::dtype_error(
            format!("matmul of {} and {} tensors", a.dtype(), b.dtype()).into(),
        ));
    }
    let shape = ProblemShape::from_operands(a.shape(), b.shape(), [a.shape()[0], b.shape()[1]])?;
    let ProblemShape { m, k, n } = shape;
    let x: Vec<f64> = a.to_vec();
    // B transposed, so that both operands are read along rows
    let y: Vec<f64> = b.t().to_vec();
    let dot = |i: usize| -> f64 {
        let (r, c) = (i / n, i % n);
        x[r * k..(r + 1) * k].iter().zip(&y[c * k..(c + 1) * k]).map(|(x, y)| x * y).sum()
    };
    match a.dtype() {
        DType::F16 => Tensor::from_vec([m, n], compute::<f16>(m * n, dot)),
        DType::F32 => Tensor::from_vec([m, n], compute::<f32>(m * n, dot)),
        DType::F64 => Tensor::from_vec([m, n], compute::<f64>(m * n, dot)),
    }
}

fn compute<T: Scalar>(numel: usize, dot: impl Fn(usize) -> f64 + Sync) -> Vec<T> {
    (0..numel).into_par_iter().map(|i| T::from_f64(dot(i))).collect()
}

/// Reference result of the fused cast matmul: both operands are cast to
/// `dtype` first, then multiplied with [`matmul`].
pub fn cast_matmul(a: &Tensor, b: &Tensor, dtype: DType) -> Result<Tensor, CastmmError> {
    matmul(&a.cast(dtype), &b.cast(dtype))
}

//! Tiled cast matmul, one monomorphised variant per dtype triple.

use castmm_core::{
    error::CastmmError,
    scalar::{round_tf32, Scalar},
    tensor::{Buffer, Tensor},
    DType, KernelConfig, ProblemShape,
};
use half::f16;
use rayon::prelude::*;

/// Strided read only view into raw storage
#[derive(Clone, Copy)]
struct Operand<'a, T> {
    data: &'a [T],
    strides: [usize; 2],
}

impl<T: Scalar> Operand<'_, T> {
    fn get(&self, row: usize, col: usize) -> T {
        self.data[row * self.strides[0] + col * self.strides[1]]
    }
}

/// Rounding applied to inputs of the block dot product after casting to TC
#[allow(clippy::cast_possible_truncation)]
fn load<S: Scalar, TC: Scalar>(x: S, tf32: bool) -> f64 {
    let x = TC::from_f64(x.into_f64()).into_f64();
    if tf32 {
        // x is already an f32 here
        f64::from(round_tf32(x as f32))
    } else {
        x
    }
}

/// Output tile of launch index `pid` in row major order, `block_m * block_n` elements
fn tile<TA: Scalar, TB: Scalar, TC: Scalar>(
    a: Operand<'_, TA>,
    b: Operand<'_, TB>,
    shape: &ProblemShape,
    config: &KernelConfig,
    pid: usize,
) -> Vec<TC> {
    let KernelConfig { block_m, block_n, block_k, allow_tf32, .. } = *config;
    let ProblemShape { m, k, n } = *shape;
    let tf32 = allow_tf32 && TC::dtype() == DType::F32;
    let dot_dtype = TC::dtype().dot_dtype();
    let (pid_m, pid_n) = config.tile(shape, pid);

    // Out of bounds rows and columns wrap around, their results are never stored
    let rm: Vec<usize> = (0..block_m).map(|i| (pid_m * block_m + i) % m).collect();
    let rn: Vec<usize> = (0..block_n).map(|j| (pid_n * block_n + j) % n).collect();

    let mut acc = vec![TC::zero(); block_m * block_n];
    let mut a_tile = vec![0f64; block_m * block_k];
    // B tile is stored transposed, block_n x block_k
    let mut b_tile = vec![0f64; block_n * block_k];
    for step in 0..config.k_steps(shape) {
        let k0 = step * block_k;
        for kk in 0..block_k {
            let rk = k0 + kk;
            for (i, &r) in rm.iter().enumerate() {
                a_tile[i * block_k + kk] = if rk < k { load::<TA, TC>(a.get(r, rk), tf32) } else { 0. };
            }
            for (j, &c) in rn.iter().enumerate() {
                b_tile[j * block_k + kk] = if rk < k { load::<TB, TC>(b.get(rk, c), tf32) } else { 0. };
            }
        }
        for i in 0..block_m {
            let x = &a_tile[i * block_k..(i + 1) * block_k];
            for j in 0..block_n {
                let y = &b_tile[j * block_k..(j + 1) * block_k];
                let dot: f64 = x.iter().zip(y).map(|(x, y)| x * y).sum();
                let dot = match dot_dtype {
                    DType::F64 => dot,
                    _ => f32::from_f64(dot).into_f64(),
                };
                let acc = &mut acc[i * block_n + j];
                *acc = TC::from_f64(acc.into_f64() + TC::from_f64(dot).into_f64());
            }
        }
    }
    acc
}

fn run<TA: Scalar, TB: Scalar, TC: Scalar>(
    a: Operand<'_, TA>,
    b: Operand<'_, TB>,
    c: &mut [TC],
    c_strides: [usize; 2],
    shape: &ProblemShape,
    config: &KernelConfig,
) {
    let tiles: Vec<(usize, Vec<TC>)> = (0..config.grid(shape).0)
        .into_par_iter()
        .map(|pid| (pid, tile::<TA, TB, TC>(a, b, shape, config, pid)))
        .collect();
    for (pid, acc) in tiles {
        let (pid_m, pid_n) = config.tile(shape, pid);
        for i in 0..config.block_m {
            let row = pid_m * config.block_m + i;
            if row >= shape.m {
                break;
            }
            for j in 0..config.block_n {
                let col = pid_n * config.block_n + j;
                if col >= shape.n {
                    break;
                }
                c[row * c_strides[0] + col * c_strides[1]] = acc[i * config.block_n + j];
            }
        }
    }
}

fn with_c<TA: Scalar, TB: Scalar>(
    a: Operand<'_, TA>,
    b: Operand<'_, TB>,
    c: &mut Tensor,
    shape: &ProblemShape,
    config: &KernelConfig,
) -> Result<(), CastmmError> {
    let strides = c.strides();
    match c.dtype() {
        DType::F16 => run(a, b, c.data_mut::<f16>()?, strides, shape, config),
        DType::F32 => run(a, b, c.data_mut::<f32>()?, strides, shape, config),
        DType::F64 => run(a, b, c.data_mut::<f64>()?, strides, shape, config),
    }
    Ok(())
}

fn with_b<TA: Scalar>(
    a: Operand<'_, TA>,
    b: &Tensor,
    c: &mut Tensor,
    shape: &ProblemShape,
    config: &KernelConfig,
) -> Result<(), CastmmError> {
    let strides = b.strides();
    match b.buffer() {
        Buffer::F16(data) => with_c(a, Operand { data, strides }, c, shape, config),
        Buffer::F32(data) => with_c(a, Operand { data, strides }, c, shape, config),
        Buffer::F64(data) => with_c(a, Operand { data, strides }, c, shape, config),
    }
}

/// Compute `c = a.cast(c.dtype()) x b.cast(c.dtype())` with the tiled kernel
pub(super) fn cast_matmul(
    a: &Tensor,
    b: &Tensor,
    c: &mut Tensor,
    config: &KernelConfig,
) -> Result<(), CastmmError> {
    config.check()?;
    let shape = ProblemShape::from_operands(a.shape(), b.shape(), c.shape())?;
    let strides = a.strides();
    match a.buffer() {
        Buffer::F16(data) => with_b(Operand { data, strides }, b, c, &shape, config),
        Buffer::F32(data) => with_b(Operand { data, strides }, b, c, &shape, config),
        Buffer::F64(data) => with_b(Operand { data, strides }, b, c, &shape, config),
    }
}

#[cfg(test)]
mod tests {
    use super::cast_matmul;
    use castmm_core::{error::CastmmError, DType, KernelConfig, Tensor};

    #[test]
    fn small_exact() -> Result<(), CastmmError> {
        let a = Tensor::from_vec([2, 3], vec![1f32, 2., 3., 4., 5., 6.])?;
        let b = Tensor::from_vec([3, 2], vec![7f64, 8., 9., 10., 11., 12.])?;
        let mut c = Tensor::zeros([2, 2], DType::F16);
        cast_matmul(&a, &b, &mut c, &KernelConfig::default())?;
        assert_eq!(c.to_vec::<f64>(), [58., 64., 139., 154.]);
        Ok(())
    }

    #[test]
    fn accumulates_every_k_step() -> Result<(), CastmmError> {
        // 3 reduction steps with block_k = 2, last one partial
        let config = KernelConfig { block_m: 2, block_n: 2, block_k: 2, group_m: 1, allow_tf32: false };
        let a = Tensor::from_vec([1, 5], vec![1f64; 5])?;
        let b = Tensor::from_vec([5, 1], vec![1f32, 2., 3., 4., 5.])?;
        let mut c = Tensor::zeros([1, 1], DType::F32);
        cast_matmul(&a, &b, &mut c, &config)?;
        assert_eq!(c.get(0, 0), 15.);
        Ok(())
    }

    #[test]
    fn writes_through_strides() -> Result<(), CastmmError> {
        let a = Tensor::from_vec([2, 2], vec![1f32, 2., 3., 4.])?;
        let eye = Tensor::from_vec([2, 2], vec![1f64, 0., 0., 1.])?;
        // c is a transposed view, so rows of the result land in its columns of storage
        let mut c = Tensor::zeros([2, 2], DType::F32).t();
        cast_matmul(&a.t(), &eye, &mut c, &KernelConfig::default())?;
        assert_eq!(c.to_vec::<f32>(), [1., 3., 2., 4.]);
        assert_eq!(c.data::<f32>()?, [1., 2., 3., 4.]);
        Ok(())
    }

    #[test]
    fn tf32_rounds_single_precision_inputs() -> Result<(), CastmmError> {
        let x = 1. + f64::powi(2., -20);
        let a = Tensor::from_vec([1, 1], vec![x])?;
        let b = Tensor::from_vec([1, 1], vec![1f32])?;
        let mut c = Tensor::zeros([1, 1], DType::F32);
        cast_matmul(&a, &b, &mut c, &KernelConfig::default())?;
        assert_eq!(c.get(0, 0), 1.);
        let config = KernelConfig { allow_tf32: false, ..KernelConfig::default() };
        cast_matmul(&a, &b, &mut c, &config)?;
        assert_eq!(c.get(0, 0), x);
        Ok(())
    }

    #[test]
    fn rejects_bad_operands() {
        let a = Tensor::zeros([2, 3], DType::F32);
        let b = Tensor::zeros([2, 3], DType::F64);
        let mut c = Tensor::zeros([2, 3], DType::F16);
        assert!(cast_matmul(&a, &b, &mut c, &KernelConfig::default()).is_err());
        let b = Tensor::zeros([3, 3], DType::F64);
        let config = KernelConfig { block_n: 0, ..KernelConfig::default() };
        assert!(cast_matmul(&a, &b, &mut c, &config).is_err());
    }
}

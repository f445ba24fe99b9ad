use crate::backend::Target;
use crate::dtype::DType;
use crate::error::CastmmError;
use crate::tensor::Tensor;
use core::fmt::{Display, Formatter};

/// Acceptance threshold `|expected - actual| <= atol + rtol * |expected|`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    /// Absolute tolerance
    pub atol: f64,
    /// Relative tolerance
    pub rtol: f64,
}

impl Tolerance {
    /// Tolerance used for cast matmul results
    pub const TIGHT: Tolerance = Tolerance { atol: 0.3, rtol: 0.01 };
    /// Accelerators may compute half precision references with single precision
    /// arithmetic, which drifts for long reductions
    pub const WIDE: Tolerance = Tolerance { atol: 2.0, rtol: 0.1 };

    /// Tolerance for a cast matmul with output dtype and reduction length k on target
    pub fn for_cast_matmul(target: Target, dtype: DType, k: usize) -> Tolerance {
        if target == Target::Accelerator && dtype == DType::F16 && k > 128 {
            Self::WIDE
        } else {
            Self::TIGHT
        }
    }

    /// Does the pair of elements pass?
    pub fn accepts(&self, expected: f64, actual: f64) -> bool {
        if expected.is_nan() || actual.is_nan() {
            return false;
        }
        if expected.is_infinite() || actual.is_infinite() {
            return expected == actual;
        }
        (expected - actual).abs() <= self.atol + self.rtol * expected.abs()
    }
}

/// Description of tensors that are not close
#[derive(Debug, Clone, PartialEq)]
pub struct Mismatch {
    /// Number of elements outside of tolerance
    pub mismatched: usize,
    /// Number of compared elements
    pub total: usize,
    /// Greatest absolute difference and its `(row, col)`
    pub max_abs_diff: (f64, [usize; 2]),
    /// Greatest relative difference and its `(row, col)`
    pub max_rel_diff: (f64, [usize; 2]),
    /// First offending element: `(row, col)`, expected and actual value
    pub first: ([usize; 2], f64, f64),
    /// Tolerance in use
    pub tolerance: Tolerance,
}

impl Display for Mismatch {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        #[allow(clippy::cast_precision_loss)]
        let percent = 100.0 * self.mismatched as f64 / self.total as f64;
        f.write_fmt(format_args!(
            "Tensor-likes are not close!\n\nMismatched elements: {} / {} ({percent:.1}%)\n",
            self.mismatched, self.total
        ))?;
        f.write_fmt(format_args!(
            "Greatest absolute difference: {} at index {:?} (up to {} allowed)\n",
            self.max_abs_diff.0, self.max_abs_diff.1, self.tolerance.atol
        ))?;
        f.write_fmt(format_args!(
            "Greatest relative difference: {} at index {:?} (up to {} allowed)\n",
            self.max_rel_diff.0, self.max_rel_diff.1, self.tolerance.rtol
        ))?;
        let (index, expected, actual) = self.first;
        f.write_fmt(format_args!(
            "First mismatch at index {index:?}: expected {expected}, got {actual}"
        ))
    }
}

/// Compare tensors element-wise.
///
/// Returns `Ok(Err(mismatch))` if any element is outside of tolerance and
/// `Err` if the tensors can not be compared at all.
pub fn assert_close(
    expected: &Tensor,
    actual: &Tensor,
    tolerance: Tolerance,
) -> Result<Result<(), Mismatch>, CastmmError> {
    if expected.shape() != actual.shape() {
        return Err(CastmmError::shape_error(
            format!("Comparing {:?} with {:?}", expected.shape(), actual.shape()).into(),
        ));
    }
    if expected.dtype() != actual.dtype() {
        return Err(CastmmError::dtype_error(
            format!("Comparing {} with {}", expected.dtype(), actual.dtype()).into(),
        ));
    }
    let [rows, cols] = expected.shape();
    let mut mismatched = 0;
    let mut first = None;
    let mut max_abs_diff = (0f64, [0, 0]);
    let mut max_rel_diff = (0f64, [0, 0]);
    for r in 0..rows {
        for c in 0..cols {
            let (e, a) = (expected.get(r, c), actual.get(r, c));
            if tolerance.accepts(e, a) {
                continue;
            }
            mismatched += 1;
            if first.is_none() {
                first = Some(([r, c], e, a));
            }
            // NaN differences always win, the first one is kept
            let abs = (e - a).abs();
            if !max_abs_diff.0.is_nan() && (abs.is_nan() || abs > max_abs_diff.0) {
                max_abs_diff = (abs, [r, c]);
            }
            let rel = abs / e.abs();
            if !max_rel_diff.0.is_nan() && (rel.is_nan() || rel > max_rel_diff.0) {
                max_rel_diff = (rel, [r, c]);
            }
        }
    }
    Ok(match first {
        None => Ok(()),
        Some(first) => Err(Mismatch {
            mismatched,
            total: rows * cols,
            max_abs_diff,
            max_rel_diff,
            first,
            tolerance,
        }),
    })
}

use crate::error::CastmmError;

/// Dimensions of one matmul problem, C (m x n) = A (m x k) * B (k x n)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProblemShape {
    /// Rows of A and C
    pub m: usize,
    /// Columns of A, rows of B, the reduction dimension
    pub k: usize,
    /// Columns of B and C
    pub n: usize,
}

impl ProblemShape {
    /// Create shape, all dimensions must be positive
    #[track_caller]
    pub fn new(m: usize, k: usize, n: usize) -> Result<Self, CastmmError> {
        if m == 0 || k == 0 || n == 0 {
            return Err(CastmmError::shape_error(
                format!("Matmul dimensions must be positive, got m={m}, k={k}, n={n}").into(),
            ));
        }
        Ok(Self { m, k, n })
    }

    /// Shape of A
    pub const fn a(&self) -> [usize; 2] {
        [self.m, self.k]
    }

    /// Shape of B
    pub const fn b(&self) -> [usize; 2] {
        [self.k, self.n]
    }

    /// Shape of C
    pub const fn c(&self) -> [usize; 2] {
        [self.m, self.n]
    }

    /// Derive problem shape from operands, checking that they fit together
    #[track_caller]
    pub fn from_operands(a: [usize; 2], b: [usize; 2], c: [usize; 2]) -> Result<Self, CastmmError> {
        if a[1] != b[0] || c[0] != a[0] || c[1] != b[1] {
            return Err(CastmmError::shape_error(
                format!("Cannot multiply {a:?} by {b:?} into {c:?}").into(),
            ));
        }
        Self::new(a[0], a[1], b[1])
    }
}

impl core::fmt::Display for ProblemShape {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_fmt(format_args!("({}, {}, {})", self.m, self.k, self.n))
    }
}

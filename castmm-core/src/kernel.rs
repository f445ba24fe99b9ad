//! Compile time constants of the tiled cast matmul kernel and the mapping
//! from launch index to output tile shared by all execution targets.

use crate::error::CastmmError;
use crate::shape::ProblemShape;

/// Compile time constants of one kernel variant.
/// The accumulator is always held in the dtype of the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KernelConfig {
    /// Rows of one output tile
    pub block_m: usize,
    /// Columns of one output tile
    pub block_n: usize,
    /// Reduction step
    pub block_k: usize,
    /// Number of tile rows grouped together when ordering launch indices
    pub group_m: usize,
    /// Allow reduced precision multiplies in single precision dot products
    pub allow_tf32: bool,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self { block_m: 16, block_n: 16, block_k: 32, group_m: 8, allow_tf32: true }
    }
}

/// Integer division rounding up
pub const fn cdiv(x: usize, y: usize) -> usize {
    x.div_ceil(y)
}

impl KernelConfig {
    /// Check that all block sizes are positive
    #[track_caller]
    pub fn check(&self) -> Result<(), CastmmError> {
        if self.block_m == 0 || self.block_n == 0 || self.block_k == 0 || self.group_m == 0 {
            return Err(CastmmError::shape_error(
                format!("Kernel block sizes must be positive, got {self:?}").into(),
            ));
        }
        Ok(())
    }

    /// Number of tile rows and tile columns
    pub const fn tiles(&self, shape: &ProblemShape) -> (usize, usize) {
        (cdiv(shape.m, self.block_m), cdiv(shape.n, self.block_n))
    }

    /// Launch grid, one launch index per output tile
    pub const fn grid(&self, shape: &ProblemShape) -> (usize, usize) {
        let (grid_m, grid_n) = self.tiles(shape);
        (grid_m * grid_n, 1)
    }

    /// Number of reduction steps
    pub const fn k_steps(&self, shape: &ProblemShape) -> usize {
        cdiv(shape.k, self.block_k)
    }

    /// Tile `(pid_m, pid_n)` computed by launch index `pid`.
    ///
    /// Launch indices walk `group_m` tile rows at a time, column by column,
    /// so consecutive launches reuse the same rows of A and columns of B.
    pub const fn tile(&self, shape: &ProblemShape, pid: usize) -> (usize, usize) {
        let (grid_m, grid_n) = self.tiles(shape);
        let width = self.group_m * grid_n;
        let group_id = pid / width;
        let rest = grid_m - group_id * self.group_m;
        let group_size = if rest < self.group_m { rest } else { self.group_m };
        let pid_m = group_id * self.group_m + pid % group_size;
        let pid_n = (pid % width) / group_size;
        (pid_m, pid_n)
    }
}

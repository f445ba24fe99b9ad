//! OpenCL C source of the tiled cast matmul and its compile time constants.

use castmm_core::{DType, KernelConfig};
use std::fmt::Write;

/// Name of the kernel function in [`TEMPLATE`]
pub(crate) const KERNEL_NAME: &str = "cast_matmul";

/// Tiled cast matmul.
///
/// One work group computes one BLOCK_M x BLOCK_N tile of C, one work item one element.
/// TA, TB and TC are the dtypes of A, B and C, TD is the dtype of the block dot product.
pub(crate) const TEMPLATE: &str = r"
__kernel void cast_matmul(
    __global const TA *a,
    __global const TB *b,
    __global TC *c,
    const int M, const int N, const int K,
    const int stride_am, const int stride_ak,
    const int stride_bk, const int stride_bn,
    const int stride_cm, const int stride_cn)
{
    const int pid = get_group_id(0);
    const int grid_m = (M + BLOCK_M - 1) / BLOCK_M;
    const int grid_n = (N + BLOCK_N - 1) / BLOCK_N;
    const int width = GROUP_M * grid_n;
    const int group_id = pid / width;
    const int group_size = min(grid_m - group_id * GROUP_M, GROUP_M);
    const int pid_m = group_id * GROUP_M + pid % group_size;
    const int pid_n = (pid % width) / group_size;

    const int i = get_local_id(1);
    const int j = get_local_id(0);
    const int rm = (pid_m * BLOCK_M + i) % M;
    const int rn = (pid_n * BLOCK_N + j) % N;

    __local TC a_tile[BLOCK_M][BLOCK_K];
    __local TC b_tile[BLOCK_K][BLOCK_N];

    TC acc = (TC)0;
    for (int k0 = 0; k0 < K; k0 += BLOCK_K) {
        for (int kk = j; kk < BLOCK_K; kk += BLOCK_N) {
            const int rk = k0 + kk;
            a_tile[i][kk] = rk < K ? (TC)a[rm * stride_am + rk * stride_ak] : (TC)0;
        }
        for (int kk = i; kk < BLOCK_K; kk += BLOCK_M) {
            const int rk = k0 + kk;
            b_tile[kk][j] = rk < K ? (TC)b[rk * stride_bk + rn * stride_bn] : (TC)0;
        }
        barrier(CLK_LOCAL_MEM_FENCE);
        TD dot = (TD)0;
        for (int kk = 0; kk < BLOCK_K; kk++) {
            dot = mad((TD)a_tile[i][kk], (TD)b_tile[kk][j], dot);
        }
        acc += (TC)dot;
        barrier(CLK_LOCAL_MEM_FENCE);
    }

    const int row = pid_m * BLOCK_M + i;
    const int col = pid_n * BLOCK_N + j;
    if (row < M && col < N) {
        c[row * stride_cm + col * stride_cn] = acc;
    }
}
";

/// One compiled kernel variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct Variant {
    pub(crate) a: DType,
    pub(crate) b: DType,
    pub(crate) c: DType,
    pub(crate) config: KernelConfig,
}

impl Variant {
    /// Extensions the device must support to build this variant
    pub(crate) fn extensions(&self) -> Vec<&'static str> {
        let mut res: Vec<&'static str> = [self.a, self.b, self.c]
            .into_iter()
            .filter_map(DType::ocl_extension)
            .collect();
        res.sort_unstable();
        res.dedup();
        res
    }

    /// Kernel source with extension pragmas
    pub(crate) fn source(&self) -> String {
        let mut source = String::new();
        for ext in self.extensions() {
            let _ = writeln!(source, "#pragma OPENCL EXTENSION {ext} : enable");
        }
        source += TEMPLATE;
        source
    }

    /// Build options defining dtypes and block sizes
    pub(crate) fn options(&self) -> String {
        let KernelConfig { block_m, block_n, block_k, group_m, allow_tf32 } = self.config;
        let mut options = format!(
            "-D TA={} -D TB={} -D TC={} -D TD={}",
            self.a.ocl(),
            self.b.ocl(),
            self.c.ocl(),
            self.c.dot_dtype().ocl()
        );
        let _ = write!(
            options,
            " -D BLOCK_M={block_m} -D BLOCK_N={block_n} -D BLOCK_K={block_k} -D GROUP_M={group_m}"
        );
        if allow_tf32 {
            options += " -cl-mad-enable";
        }
        options
    }
}

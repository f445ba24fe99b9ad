//! OpenCL backend for castmm
//!
//! The OpenCL runtime is loaded at runtime, so this crate builds on machines
//! without OpenCL. Kernel variants are compiled on first use and cached.
//!
//! ```rust
//! use castmm_core::config::DebugMask;
//! match castmm_opencl::device(&castmm_opencl::OpenCLConfig::default(), DebugMask(0)) {
//!     Ok(dev) => println!("Using {}", castmm_core::Backend::name(&dev)),
//!     Err(e) => println!("OpenCL is not available, {e}"),
//! }
//! ```

#![forbid(rustdoc::broken_intra_doc_links)]
#![forbid(rustdoc::private_intra_doc_links)]
#![forbid(missing_docs)]
#![forbid(rustdoc::missing_crate_level_docs)]
#![forbid(rustdoc::private_doc_tests)]
#![forbid(rustdoc::invalid_codeblock_attributes)]
#![forbid(rustdoc::invalid_html_tags)]
#![forbid(rustdoc::invalid_rust_codeblocks)]
#![forbid(rustdoc::bare_urls)]
#![forbid(rustdoc::unescaped_backticks)]
#![forbid(rustdoc::redundant_explicit_links)]

mod runtime;
mod source;

use castmm_core::{
    backend::{Backend, Target},
    config::DebugMask,
    KernelConfig, ProblemShape,
};
pub use castmm_core::{error::CastmmError, DType, Tensor};
use nanoserde::DeJson;
use runtime::{Arg, Runtime};
use source::Variant;
use std::cell::RefCell;

/// OpenCL backend configuration, the `opencl` entry of `backend_config.json`
#[derive(Debug, Default, Clone, DeJson)]
pub struct OpenCLConfig {
    /// Select which platforms will be searched for devices.
    /// If set to None, uses all available platforms.
    /// default = None
    pub platform_ids: Option<Vec<usize>>,
}

/// OpenCL backend
pub struct OpenCL {
    runtime: RefCell<Runtime>,
}

/// Load OpenCL runtime and open the first GPU, or the first device if there is no GPU
pub fn device(config: &OpenCLConfig, debug: DebugMask) -> Result<OpenCL, CastmmError> {
    Ok(OpenCL { runtime: RefCell::new(Runtime::initialize(config, debug)?) })
}

impl OpenCL {
    /// Can kernels on this device load and store dtype?
    pub fn supports(&self, dtype: DType) -> bool {
        dtype.ocl_extension().map_or(true, |ext| self.runtime.borrow().supports(ext))
    }
}

impl Backend for OpenCL {
    fn target(&self) -> Target {
        Target::Accelerator
    }

    fn name(&self) -> String {
        format!("opencl ({})", self.runtime.borrow().name())
    }

    fn cast_matmul(
        &self,
        a: &Tensor,
        b: &Tensor,
        c: &mut Tensor,
        config: &KernelConfig,
    ) -> Result<(), CastmmError> {
        config.check()?;
        let shape = ProblemShape::from_operands(a.shape(), b.shape(), c.shape())?;
        let variant = Variant { a: a.dtype(), b: b.dtype(), c: c.dtype(), config: *config };
        let mut runtime = self.runtime.borrow_mut();
        let kernel = runtime.kernel(&variant)?;
        let runtime = &*runtime;

        // Operands are uploaded as contiguous row major copies
        let a_bytes = a.to_le_bytes();
        let a_buffer = runtime.allocate(a_bytes.len())?;
        runtime.write(&a_buffer, &a_bytes)?;
        let b_bytes = b.to_le_bytes();
        let b_buffer = runtime.allocate(b_bytes.len())?;
        runtime.write(&b_buffer, &b_bytes)?;
        let c_bytes = shape.m * shape.n * c.dtype().byte_size();
        let c_buffer = runtime.allocate(c_bytes)?;

        let ProblemShape { m, k, n } = shape;
        let args = [
            Arg::Buffer(&a_buffer),
            Arg::Buffer(&b_buffer),
            Arg::Buffer(&c_buffer),
            Arg::int(m)?,
            Arg::int(n)?,
            Arg::int(k)?,
            Arg::int(k)?,
            Arg::int(1)?,
            Arg::int(n)?,
            Arg::int(1)?,
            Arg::int(n)?,
            Arg::int(1)?,
        ];
        let (grid, _) = config.grid(&shape);
        runtime.launch(
            kernel,
            &args,
            [grid * config.block_n, config.block_m],
            [config.block_n, config.block_m],
        )?;

        let mut bytes = vec![0u8; c_bytes];
        runtime.read(&c_buffer, &mut bytes)?;
        c.assign(&Tensor::from_le_bytes(shape.c(), c.dtype(), &bytes)?)
    }
}

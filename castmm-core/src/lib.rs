//! # castmm-core
//!
//! castmm-core is the core part of castmm, a correctness harness for fused
//! cast + tiled matmul kernels.
//! castmm-core contains definitions of dtype, scalar, host tensor, kernel
//! configuration, the backend trait implemented by execution targets,
//! reference matmul, tolerance comparison and the cast matmul validator.
//!
#![forbid(unsafe_code)]
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

/// See [Backend](backend::Backend)
pub mod backend;
/// Tolerance based comparison of tensors
pub mod compare;
/// Debug mask and backend config loading
pub mod config;
/// See [DType](dtype::DType)
pub mod dtype;
/// See [CastmmError](error::CastmmError)
pub mod error;
/// See [KernelConfig](kernel::KernelConfig)
pub mod kernel;
/// Dense matmul used as reference
pub mod reference;
/// Seeded random number generation
pub mod rng;
/// See [Scalar](scalar::Scalar)
pub mod scalar;
/// See [ProblemShape](shape::ProblemShape)
pub mod shape;
/// See [Tensor](tensor::Tensor)
pub mod tensor;
/// See [validate](validator::validate)
pub mod validator;

pub use backend::{Backend, Target};
pub use dtype::DType;
pub use error::CastmmError;
pub use kernel::KernelConfig;
pub use scalar::Scalar;
pub use shape::ProblemShape;
pub use tensor::Tensor;
pub use validator::{CastMatmulCase, Verdict};

/// Seed used when neither config nor command line sets one
pub const SEED: u64 = 69420;

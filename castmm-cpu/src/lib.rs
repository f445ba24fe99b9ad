//! CPU only, pure rust backend for castmm
//!
//! Initialize backend.
//! ```rust
//! let dev = castmm_cpu::device()?;
//! # Ok::<(), castmm_cpu::CastmmError>(())
//! ```

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

mod kernel;

use castmm_core::{
    backend::{Backend, Target},
    error::{BackendError, ErrorStatus},
    KernelConfig,
};
pub use castmm_core::{error::CastmmError, DType, Tensor};
use nanoserde::DeJson;

/// CPU backend configuration, the `cpu` entry of `backend_config.json`
#[derive(Debug, Default, Clone, DeJson)]
pub struct CPUConfig {
    /// Number of worker threads, defaults to the number of logical cores
    pub num_threads: Option<usize>,
}

/// CPU backend
pub struct CPU {
    pool: rayon::ThreadPool,
}

/// Create new CPU backend with default config
pub fn device() -> Result<CPU, CastmmError> {
    device_with_config(&CPUConfig::default())
}

/// Create new CPU backend
pub fn device_with_config(config: &CPUConfig) -> Result<CPU, CastmmError> {
    let mut builder = rayon::ThreadPoolBuilder::new().thread_name(|i| format!("castmm-cpu-{i}"));
    if let Some(num_threads) = config.num_threads {
        builder = builder.num_threads(num_threads);
    }
    let pool = builder.build().map_err(|e| BackendError {
        status: ErrorStatus::Initialization,
        context: format!("Failed to create thread pool, {e}").into(),
    })?;
    Ok(CPU { pool })
}

impl CPU {
    /// Number of worker threads
    pub fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }
}

impl Backend for CPU {
    fn target(&self) -> Target {
        Target::Cpu
    }

    fn name(&self) -> String {
        format!("cpu ({} threads)", self.num_threads())
    }

    fn cast_matmul(
        &self,
        a: &Tensor,
        b: &Tensor,
        c: &mut Tensor,
        config: &KernelConfig,
    ) -> Result<(), CastmmError> {
        self.pool.install(|| kernel::cast_matmul(a, b, c, config))
    }
}

#[cfg(test)]
mod tests {
    use super::{device_with_config, CPUConfig};
    use castmm_core::{backend::Backend, CastmmError};
    use nanoserde::DeJson;

    #[test]
    fn thread_count() -> Result<(), CastmmError> {
        let dev = device_with_config(&CPUConfig { num_threads: Some(3) })?;
        assert_eq!(dev.num_threads(), 3);
        assert!(dev.name().contains("3 threads"));
        Ok(())
    }

    #[test]
    fn config_from_json() {
        let config = CPUConfig::deserialize_json(r#"{ "num_threads": 2 }"#).unwrap();
        assert_eq!(config.num_threads, Some(2));
    }
}

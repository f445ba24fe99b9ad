use crate::error::CastmmError;
use crate::kernel::KernelConfig;
use crate::tensor::Tensor;
use core::str::FromStr;

/// Kind of execution target, tolerances depend on it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Host processor
    Cpu,
    /// GPU or another accelerator
    Accelerator,
}

/// Execution target requested by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Device {
    /// Pure rust CPU backend
    CPU,
    /// OpenCL backend
    OpenCL,
}

impl FromStr for Device {
    type Err = CastmmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cpu" => Ok(Device::CPU),
            "opencl" | "gpu" | "xpu" => Ok(Device::OpenCL),
            _ => Err(CastmmError::parse_error(format!("Unknown device {s}").into())),
        }
    }
}

impl core::fmt::Display for Device {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Device::CPU => "cpu",
            Device::OpenCL => "opencl",
        })
    }
}

/// Execution target able to run the fused cast + tiled matmul kernel.
pub trait Backend {
    /// Kind of target
    fn target(&self) -> Target;

    /// Human readable name, e.g. device name reported by the driver
    fn name(&self) -> String;

    /// Compute `c = a.cast(c.dtype()) x b.cast(c.dtype())` with the tiled kernel.
    ///
    /// Inputs are cast to the dtype of `c` inside the reduction loop and the
    /// accumulator is held in the dtype of `c`. Only elements of `c` are written,
    /// strides of all three tensors are honored. Blocks until the result is in `c`.
    fn cast_matmul(
        &self,
        a: &Tensor,
        b: &Tensor,
        c: &mut Tensor,
        config: &KernelConfig,
    ) -> Result<(), CastmmError>;
}

impl<B: Backend + ?Sized> Backend for &B {
    fn target(&self) -> Target {
        (**self).target()
    }

    fn name(&self) -> String {
        (**self).name()
    }

    fn cast_matmul(
        &self,
        a: &Tensor,
        b: &Tensor,
        c: &mut Tensor,
        config: &KernelConfig,
    ) -> Result<(), CastmmError> {
        (**self).cast_matmul(a, b, c, config)
    }
}

impl<B: Backend + ?Sized> Backend for Box<B> {
    fn target(&self) -> Target {
        (**self).target()
    }

    fn name(&self) -> String {
        (**self).name()
    }

    fn cast_matmul(
        &self,
        a: &Tensor,
        b: &Tensor,
        c: &mut Tensor,
        config: &KernelConfig,
    ) -> Result<(), CastmmError> {
        (**self).cast_matmul(a, b, c, config)
    }
}

use crate::error::CastmmError;
use core::str::FromStr;

/// DType of tensor
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DType {
    /// 16 bit floating point type
    F16,
    /// 32 bit floating point type
    F32,
    /// 64 bit floating point type
    F64,
}

impl DType {
    /// All supported dtypes
    pub const ALL: [DType; 3] = [DType::F16, DType::F32, DType::F64];

    /// Get the size of DType in bytes
    pub const fn byte_size(self) -> usize {
        match self {
            Self::F16 => 2,
            Self::F32 => 4,
            Self::F64 => 8,
        }
    }

    /// Name of the dtype as used in test parametrization, e.g. `float16`
    pub const fn name(self) -> &'static str {
        match self {
            Self::F16 => "float16",
            Self::F32 => "float32",
            Self::F64 => "float64",
        }
    }

    /// OpenCL C type
    pub const fn ocl(self) -> &'static str {
        match self {
            Self::F16 => "half",
            Self::F32 => "float",
            Self::F64 => "double",
        }
    }

    /// OpenCL extension required to use this dtype in kernels
    pub const fn ocl_extension(self) -> Option<&'static str> {
        match self {
            Self::F16 => Some("cl_khr_fp16"),
            Self::F32 => None,
            Self::F64 => Some("cl_khr_fp64"),
        }
    }

    /// Dtype used for products and sums inside one block dot when accumulating in self.
    /// Half precision products are computed in single precision.
    pub const fn dot_dtype(self) -> DType {
        match self {
            Self::F16 | Self::F32 => Self::F32,
            Self::F64 => Self::F64,
        }
    }
}

impl core::fmt::Display for DType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            DType::F16 => "F16",
            DType::F32 => "F32",
            DType::F64 => "F64",
        })
    }
}

impl FromStr for DType {
    type Err = CastmmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "float16" | "f16" | "half" => Ok(DType::F16),
            "float32" | "f32" | "float" => Ok(DType::F32),
            "float64" | "f64" | "double" => Ok(DType::F64),
            _ => Err(CastmmError::parse_error(
                format!("Could not parse dtype {s}").into(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::DType;

    #[test]
    fn parse_names() {
        for dtype in DType::ALL {
            assert_eq!(dtype.name().parse::<DType>().ok(), Some(dtype));
        }
        assert_eq!("F16".parse::<DType>().ok(), Some(DType::F16));
        assert!("bfloat16".parse::<DType>().is_err());
    }

    #[test]
    fn dot_dtype() {
        assert_eq!(DType::F16.dot_dtype(), DType::F32);
        assert_eq!(DType::F64.dot_dtype(), DType::F64);
    }
}

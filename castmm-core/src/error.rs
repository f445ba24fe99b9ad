use std::fmt::{Display, Write};

/// Errors that can occur while preparing, running or checking a cast matmul.
#[derive(Debug)]
pub enum CastmmError {
    /// Invalid shapes for operation
    ShapeError(Box<str>),
    /// Wrong dtype for given operation
    DTypeError(Box<str>),
    /// Error parsing some data
    ParseError(Box<str>),
    /// Error from file operations
    IOError(std::io::Error),
    /// Error returned by backends
    BackendError(BackendError),
}

fn with_location(e: Box<str>, location: &std::panic::Location<'_>) -> Box<str> {
    let mut e: String = e.into();
    let _ = write!(e, ", {}:{}:{}", location.file(), location.line(), location.column());
    e.into()
}

impl CastmmError {
    /// Shape error
    #[track_caller]
    pub fn shape_error(e: Box<str>) -> Self {
        Self::ShapeError(with_location(e, std::panic::Location::caller()))
    }

    /// DType error
    #[track_caller]
    pub fn dtype_error(e: Box<str>) -> Self {
        Self::DTypeError(with_location(e, std::panic::Location::caller()))
    }

    /// Parse error
    #[track_caller]
    pub fn parse_error(e: Box<str>) -> Self {
        Self::ParseError(with_location(e, std::panic::Location::caller()))
    }
}

impl Display for CastmmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CastmmError::ShapeError(e) => f.write_fmt(format_args!("Shape {e}")),
            CastmmError::DTypeError(e) => f.write_fmt(format_args!("Wrong dtype {e}")),
            CastmmError::ParseError(e) => f.write_fmt(format_args!("Parse {e}")),
            CastmmError::IOError(e) => f.write_fmt(format_args!("IO {e}")),
            CastmmError::BackendError(e) => f.write_fmt(format_args!("Backend {e}")),
        }
    }
}

impl std::error::Error for CastmmError {}

impl From<std::io::Error> for CastmmError {
    fn from(value: std::io::Error) -> Self {
        Self::IOError(value)
    }
}

/// Error reported by an execution target
#[derive(Debug)]
pub struct BackendError {
    /// What went wrong
    pub status: ErrorStatus,
    /// Additional information, e.g. driver status or build log
    pub context: Box<str>,
}

impl From<BackendError> for CastmmError {
    fn from(value: BackendError) -> Self {
        CastmmError::BackendError(value)
    }
}

impl Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("{:?}: {}", self.status, self.context))
    }
}

/// Kind of backend failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorStatus {
    /// Dynamic library was not found on the disk
    DyLibNotFound,
    /// Backend initialization failure
    Initialization,
    /// Failed to enumerate devices
    DeviceEnumeration,
    /// Failed to query device for information
    DeviceQuery,
    /// Failed to allocate memory
    MemoryAllocation,
    /// Failed to copy memory to device
    MemoryCopyH2P,
    /// Failed to copy memory to host
    MemoryCopyP2H,
    /// Kernel argument was not correct
    IncorrectKernelArg,
    /// Failed to compile kernel
    KernelCompilation,
    /// Failed to launch kernel
    KernelLaunch,
    /// Failed to synchronize kernel
    KernelSync,
}

//! Dynamically loaded OpenCL runtime with a single device, context and queue.

#![allow(non_camel_case_types)]
#![allow(non_snake_case)]

use crate::source::{Variant, KERNEL_NAME};
use crate::OpenCLConfig;
use castmm_core::config::DebugMask;
use castmm_core::error::{BackendError, ErrorStatus};
use libloading::Library;
use std::collections::BTreeMap;
use std::ffi::{c_char, c_void, CString};
use std::ptr;

type cl_int = i32;
type cl_uint = u32;
type cl_bitfield = u64;
type Ptr = *mut c_void;
type InfoFn = unsafe extern "C" fn(Ptr, cl_uint, usize, *mut c_void, *mut usize) -> cl_int;
type ReleaseFn = unsafe extern "C" fn(Ptr) -> cl_int;
type EnqueueCopyFn<P> =
    unsafe extern "C" fn(Ptr, Ptr, cl_uint, usize, usize, P, cl_uint, *const Ptr, *mut Ptr) -> cl_int;

const CL_PLATFORM_NAME: cl_uint = 0x0902; // 2306
const CL_DEVICE_TYPE: cl_uint = 0x1000; // 4096
const CL_DEVICE_NAME: cl_uint = 0x102B; // 4139
const CL_DEVICE_EXTENSIONS: cl_uint = 0x1030; // 4144
const CL_PROGRAM_BUILD_LOG: cl_uint = 0x1183; // 4483
const CL_DEVICE_TYPE_CPU: cl_bitfield = 1 << 1;
const CL_DEVICE_TYPE_GPU: cl_bitfield = 1 << 2;
const CL_DEVICE_TYPE_ALL: cl_bitfield = 0xFFFF_FFFF;
const CL_MEM_READ_WRITE: cl_bitfield = 1;
const CL_BLOCKING: cl_uint = 1;

const OPENCL_PATHS: [&str; 10] = [
    "/lib/libOpenCL.so",
    "/lib64/libOpenCL.so",
    "/lib/x86_64-linux-gnu/libOpenCL.so",
    "/lib64/x86_64-linux-gnu/libOpenCL.so",
    "/usr/lib/libOpenCL.so",
    "/usr/lib64/libOpenCL.so",
    "/usr/lib/x86_64-linux-gnu/libOpenCL.so",
    "/usr/lib64/x86_64-linux-gnu/libOpenCL.so",
    "/usr/lib/x86_64-linux-gnu/libOpenCL.so.1",
    "libOpenCL.so.1",
];

/// Status codes returned by OpenCL calls
#[allow(clippy::upper_case_acronyms)]
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum OpenCLStatus {
    CL_SUCCESS,
    CL_DEVICE_NOT_FOUND,
    CL_BUILD_PROGRAM_FAILURE,
    CL_MEM_OBJECT_ALLOCATION_FAILURE,
    CL_OUT_OF_RESOURCES,
    CL_OUT_OF_HOST_MEMORY,
    CL_INVALID_VALUE,
    CL_INVALID_PLATFORM,
    CL_INVALID_DEVICE,
    CL_INVALID_CONTEXT,
    CL_INVALID_COMMAND_QUEUE,
    CL_INVALID_MEM_OBJECT,
    CL_INVALID_BUILD_OPTIONS,
    CL_INVALID_PROGRAM,
    CL_INVALID_PROGRAM_EXECUTABLE,
    CL_INVALID_KERNEL_NAME,
    CL_INVALID_KERNEL,
    CL_INVALID_ARG_INDEX,
    CL_INVALID_ARG_VALUE,
    CL_INVALID_ARG_SIZE,
    CL_INVALID_KERNEL_ARGS,
    CL_INVALID_WORK_DIMENSION,
    CL_INVALID_WORK_GROUP_SIZE,
    CL_INVALID_WORK_ITEM_SIZE,
    CL_INVALID_BUFFER_SIZE,
    CL_INVALID_GLOBAL_WORK_SIZE,
    UNKNOWN(cl_int),
}

impl From<cl_int> for OpenCLStatus {
    fn from(status: cl_int) -> Self {
        match status {
            0 => Self::CL_SUCCESS,
            -1 => Self::CL_DEVICE_NOT_FOUND,
            -4 => Self::CL_MEM_OBJECT_ALLOCATION_FAILURE,
            -5 => Self::CL_OUT_OF_RESOURCES,
            -6 => Self::CL_OUT_OF_HOST_MEMORY,
            -11 => Self::CL_BUILD_PROGRAM_FAILURE,
            -30 => Self::CL_INVALID_VALUE,
            -32 => Self::CL_INVALID_PLATFORM,
            -33 => Self::CL_INVALID_DEVICE,
            -34 => Self::CL_INVALID_CONTEXT,
            -36 => Self::CL_INVALID_COMMAND_QUEUE,
            -38 => Self::CL_INVALID_MEM_OBJECT,
            -43 => Self::CL_INVALID_BUILD_OPTIONS,
            -44 => Self::CL_INVALID_PROGRAM,
            -45 => Self::CL_INVALID_PROGRAM_EXECUTABLE,
            -46 => Self::CL_INVALID_KERNEL_NAME,
            -48 => Self::CL_INVALID_KERNEL,
            -49 => Self::CL_INVALID_ARG_INDEX,
            -50 => Self::CL_INVALID_ARG_VALUE,
            -51 => Self::CL_INVALID_ARG_SIZE,
            -52 => Self::CL_INVALID_KERNEL_ARGS,
            -53 => Self::CL_INVALID_WORK_DIMENSION,
            -54 => Self::CL_INVALID_WORK_GROUP_SIZE,
            -55 => Self::CL_INVALID_WORK_ITEM_SIZE,
            -61 => Self::CL_INVALID_BUFFER_SIZE,
            -63 => Self::CL_INVALID_GLOBAL_WORK_SIZE,
            _ => Self::UNKNOWN(status),
        }
    }
}

fn check(status: cl_int, error: ErrorStatus) -> Result<(), BackendError> {
    match OpenCLStatus::from(status) {
        OpenCLStatus::CL_SUCCESS => Ok(()),
        status => Err(BackendError { status: error, context: format!("{status:?}").into() }),
    }
}

fn int(x: usize) -> Result<cl_int, BackendError> {
    cl_int::try_from(x).map_err(|_| BackendError {
        status: ErrorStatus::IncorrectKernelArg,
        context: format!("{x} does not fit into cl_int").into(),
    })
}

unsafe fn symbol<T: Copy>(library: &Library, name: &[u8]) -> Result<T, BackendError> {
    library.get::<T>(name).map(|f| *f).map_err(|e| BackendError {
        status: ErrorStatus::Initialization,
        context: format!("OpenCL runtime is missing {}, {e}", String::from_utf8_lossy(name)).into(),
    })
}

/// Query string or binary info of a platform or device
fn info(f: InfoFn, object: Ptr, param_name: cl_uint, error: ErrorStatus) -> Result<Vec<u8>, BackendError> {
    let mut size: usize = 0;
    check(unsafe { f(object, param_name, 0, ptr::null_mut(), &mut size) }, error)?;
    let mut data = vec![0u8; size];
    if size > 0 {
        check(
            unsafe { f(object, param_name, size, data.as_mut_ptr().cast(), ptr::null_mut()) },
            error,
        )?;
    }
    Ok(data)
}

fn info_string(data: &[u8]) -> String {
    String::from_utf8_lossy(data).trim_end_matches('\0').trim().to_string()
}

/// Kernel argument
pub(crate) enum Arg<'a> {
    Buffer(&'a DeviceBuffer<'a>),
    Int(cl_int),
}

impl Arg<'_> {
    pub(crate) fn int(x: usize) -> Result<Arg<'static>, BackendError> {
        Ok(Arg::Int(int(x)?))
    }
}

/// Device memory, released on drop
pub(crate) struct DeviceBuffer<'a> {
    mem: Ptr,
    bytes: usize,
    runtime: &'a Runtime,
}

impl Drop for DeviceBuffer<'_> {
    fn drop(&mut self) {
        let _ = unsafe { (self.runtime.clReleaseMemObject)(self.mem) };
    }
}

struct Program {
    program: Ptr,
    kernel: Ptr,
}

pub(crate) struct Runtime {
    device: Ptr,
    context: Ptr,
    queue: Ptr,
    name: String,
    extensions: String,
    programs: BTreeMap<Variant, Program>,
    debug: DebugMask,
    clCreateBuffer: unsafe extern "C" fn(Ptr, cl_bitfield, usize, Ptr, *mut cl_int) -> Ptr,
    clEnqueueWriteBuffer: EnqueueCopyFn<*const c_void>,
    clEnqueueReadBuffer: EnqueueCopyFn<*mut c_void>,
    clReleaseMemObject: ReleaseFn,
    clCreateProgramWithSource:
        unsafe extern "C" fn(Ptr, cl_uint, *const *const c_char, *const usize, *mut cl_int) -> Ptr,
    clBuildProgram: unsafe extern "C" fn(
        Ptr,
        cl_uint,
        *const Ptr,
        *const c_char,
        Option<unsafe extern "C" fn(Ptr, Ptr)>,
        Ptr,
    ) -> cl_int,
    clGetProgramBuildInfo:
        unsafe extern "C" fn(Ptr, Ptr, cl_uint, usize, *mut c_void, *mut usize) -> cl_int,
    clCreateKernel: unsafe extern "C" fn(Ptr, *const c_char, *mut cl_int) -> Ptr,
    clSetKernelArg: unsafe extern "C" fn(Ptr, cl_uint, usize, *const c_void) -> cl_int,
    clEnqueueNDRangeKernel: unsafe extern "C" fn(
        Ptr,
        Ptr,
        cl_uint,
        *const usize,
        *const usize,
        *const usize,
        cl_uint,
        *const Ptr,
        *mut Ptr,
    ) -> cl_int,
    clFinish: ReleaseFn,
    clReleaseKernel: ReleaseFn,
    clReleaseProgram: ReleaseFn,
    clReleaseCommandQueue: ReleaseFn,
    clReleaseContext: ReleaseFn,
    // Dropped last, function pointers above point into it
    _library: Library,
}

impl Runtime {
    pub(crate) fn initialize(config: &OpenCLConfig, debug: DebugMask) -> Result<Runtime, BackendError> {
        if config.platform_ids.as_ref().is_some_and(Vec::is_empty) {
            return Err(BackendError {
                status: ErrorStatus::Initialization,
                context: "OpenCL is configured out, platform_ids is empty".into(),
            });
        }
        let library = OPENCL_PATHS
            .iter()
            .find_map(|path| unsafe { Library::new(path) }.ok())
            .ok_or_else(|| BackendError {
                status: ErrorStatus::DyLibNotFound,
                context: "OpenCL runtime not found.".into(),
            })?;
        let clGetPlatformIDs: unsafe extern "C" fn(cl_uint, *mut Ptr, *mut cl_uint) -> cl_int =
            unsafe { symbol(&library, b"clGetPlatformIDs\0") }?;
        let clGetPlatformInfo: InfoFn = unsafe { symbol(&library, b"clGetPlatformInfo\0") }?;
        let clGetDeviceIDs: unsafe extern "C" fn(Ptr, cl_bitfield, cl_uint, *mut Ptr, *mut cl_uint) -> cl_int =
            unsafe { symbol(&library, b"clGetDeviceIDs\0") }?;
        let clGetDeviceInfo: InfoFn = unsafe { symbol(&library, b"clGetDeviceInfo\0") }?;
        let clCreateContext: unsafe extern "C" fn(
            *const isize,
            cl_uint,
            *const Ptr,
            Option<unsafe extern "C" fn(*const c_char, *const c_void, usize, Ptr)>,
            Ptr,
            *mut cl_int,
        ) -> Ptr = unsafe { symbol(&library, b"clCreateContext\0") }?;
        let clCreateCommandQueue: unsafe extern "C" fn(Ptr, Ptr, cl_bitfield, *mut cl_int) -> Ptr =
            unsafe { symbol(&library, b"clCreateCommandQueue\0") }?;

        let platforms = {
            let mut count: cl_uint = 0;
            check(
                unsafe { clGetPlatformIDs(0, ptr::null_mut(), &mut count) },
                ErrorStatus::DeviceEnumeration,
            )?;
            let mut ids: Vec<Ptr> = vec![ptr::null_mut(); count as usize];
            if count > 0 {
                check(
                    unsafe { clGetPlatformIDs(count, ids.as_mut_ptr(), ptr::null_mut()) },
                    ErrorStatus::DeviceEnumeration,
                )?;
            }
            ids
        };

        // First GPU wins, otherwise the first device of any type
        let mut selected: Option<(Ptr, cl_bitfield)> = None;
        for (platform_id, &platform) in platforms
            .iter()
            .enumerate()
            .filter(|(id, _)| config.platform_ids.as_ref().is_none_or(|ids| ids.contains(id)))
        {
            let mut count: cl_uint = 0;
            let status = unsafe {
                clGetDeviceIDs(platform, CL_DEVICE_TYPE_ALL, 0, ptr::null_mut(), &mut count)
            };
            if OpenCLStatus::from(status) == OpenCLStatus::CL_DEVICE_NOT_FOUND || count == 0 {
                continue;
            }
            check(status, ErrorStatus::DeviceEnumeration)?;
            let mut devices: Vec<Ptr> = vec![ptr::null_mut(); count as usize];
            check(
                unsafe {
                    clGetDeviceIDs(platform, CL_DEVICE_TYPE_ALL, count, devices.as_mut_ptr(), ptr::null_mut())
                },
                ErrorStatus::DeviceEnumeration,
            )?;
            if debug.dev() {
                let name = info(clGetPlatformInfo, platform, CL_PLATFORM_NAME, ErrorStatus::DeviceQuery)?;
                println!(
                    "Found OpenCL platform, platform id {platform_id}, name {}, {count} devices",
                    info_string(&name)
                );
            }
            for device in devices {
                let device_type =
                    info(clGetDeviceInfo, device, CL_DEVICE_TYPE, ErrorStatus::DeviceQuery)?;
                let device_type = <[u8; 8]>::try_from(device_type.as_slice())
                    .map(cl_bitfield::from_ne_bytes)
                    .map_err(|_| BackendError {
                        status: ErrorStatus::DeviceQuery,
                        context: "Unexpected size of CL_DEVICE_TYPE".into(),
                    })?;
                let better = match selected {
                    None => true,
                    Some((_, t)) => t & CL_DEVICE_TYPE_GPU == 0 && device_type & CL_DEVICE_TYPE_GPU != 0,
                };
                if better {
                    selected = Some((device, device_type));
                }
            }
        }
        let Some((device, device_type)) = selected else {
            return Err(BackendError {
                status: ErrorStatus::DeviceEnumeration,
                context: "No OpenCL device found.".into(),
            });
        };

        let name = info_string(&info(clGetDeviceInfo, device, CL_DEVICE_NAME, ErrorStatus::DeviceQuery)?);
        let extensions =
            info_string(&info(clGetDeviceInfo, device, CL_DEVICE_EXTENSIONS, ErrorStatus::DeviceQuery)?);
        if debug.dev() {
            let kind = if device_type & CL_DEVICE_TYPE_GPU != 0 {
                "gpu"
            } else if device_type & CL_DEVICE_TYPE_CPU != 0 {
                "cpu"
            } else {
                "other"
            };
            println!("Using OpenCL device {name} ({kind}), extensions: {extensions}");
        }

        // Context and queue are created once all symbols are loaded, so that drop releases them
        let mut runtime = Runtime {
            device,
            context: ptr::null_mut(),
            queue: ptr::null_mut(),
            name,
            extensions,
            programs: BTreeMap::new(),
            debug,
            clCreateBuffer: unsafe { symbol(&library, b"clCreateBuffer\0") }?,
            clEnqueueWriteBuffer: unsafe { symbol(&library, b"clEnqueueWriteBuffer\0") }?,
            clEnqueueReadBuffer: unsafe { symbol(&library, b"clEnqueueReadBuffer\0") }?,
            clReleaseMemObject: unsafe { symbol(&library, b"clReleaseMemObject\0") }?,
            clCreateProgramWithSource: unsafe { symbol(&library, b"clCreateProgramWithSource\0") }?,
            clBuildProgram: unsafe { symbol(&library, b"clBuildProgram\0") }?,
            clGetProgramBuildInfo: unsafe { symbol(&library, b"clGetProgramBuildInfo\0") }?,
            clCreateKernel: unsafe { symbol(&library, b"clCreateKernel\0") }?,
            clSetKernelArg: unsafe { symbol(&library, b"clSetKernelArg\0") }?,
            clEnqueueNDRangeKernel: unsafe { symbol(&library, b"clEnqueueNDRangeKernel\0") }?,
            clFinish: unsafe { symbol(&library, b"clFinish\0") }?,
            clReleaseKernel: unsafe { symbol(&library, b"clReleaseKernel\0") }?,
            clReleaseProgram: unsafe { symbol(&library, b"clReleaseProgram\0") }?,
            clReleaseCommandQueue: unsafe { symbol(&library, b"clReleaseCommandQueue\0") }?,
            clReleaseContext: unsafe { symbol(&library, b"clReleaseContext\0") }?,
            _library: library,
        };
        let mut status: cl_int = 0;
        runtime.context =
            unsafe { clCreateContext(ptr::null(), 1, &device, None, ptr::null_mut(), &mut status) };
        check(status, ErrorStatus::Initialization)?;
        runtime.queue = unsafe { clCreateCommandQueue(runtime.context, device, 0, &mut status) };
        check(status, ErrorStatus::Initialization)?;
        Ok(runtime)
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn supports(&self, extension: &str) -> bool {
        self.extensions.split_whitespace().any(|ext| ext == extension)
    }

    /// Kernel of variant, compiled on first use
    pub(crate) fn kernel(&mut self, variant: &Variant) -> Result<Ptr, BackendError> {
        if let Some(program) = self.programs.get(variant) {
            return Ok(program.kernel);
        }
        if let Some(ext) = variant.extensions().into_iter().find(|ext| !self.supports(ext)) {
            return Err(BackendError {
                status: ErrorStatus::KernelCompilation,
                context: format!("Device {} does not support {ext}, required by {variant:?}", self.name)
                    .into(),
            });
        }
        let program = self.build(variant)?;
        let kernel = program.kernel;
        self.programs.insert(*variant, program);
        Ok(kernel)
    }

    fn build(&self, variant: &Variant) -> Result<Program, BackendError> {
        let source = variant.source();
        let options = variant.options();
        if self.debug.kernel() {
            println!("Compiling cast_matmul with options {options}\n{source}");
        }
        let options = CString::new(options).map_err(|e| BackendError {
            status: ErrorStatus::KernelCompilation,
            context: format!("Invalid build options, {e}").into(),
        })?;
        let mut status: cl_int = 0;
        let sources: [*const c_char; 1] = [source.as_ptr().cast()];
        let program = unsafe {
            (self.clCreateProgramWithSource)(self.context, 1, sources.as_ptr(), [source.len()].as_ptr(), &mut status)
        };
        check(status, ErrorStatus::KernelCompilation)?;
        let mut status = unsafe {
            (self.clBuildProgram)(program, 1, &self.device, options.as_ptr(), None, ptr::null_mut())
        };
        if let Err(mut e) = check(status, ErrorStatus::KernelCompilation) {
            if let Ok(log) = self.build_log(program) {
                e.context = format!("{}\n{}", e.context, info_string(&log)).into();
            }
            let _ = unsafe { (self.clReleaseProgram)(program) };
            return Err(e);
        }
        let name = CString::new(KERNEL_NAME).map_err(|e| BackendError {
            status: ErrorStatus::KernelCompilation,
            context: format!("{e}").into(),
        })?;
        let kernel = unsafe { (self.clCreateKernel)(program, name.as_ptr(), &mut status) };
        if let Err(e) = check(status, ErrorStatus::KernelCompilation) {
            let _ = unsafe { (self.clReleaseProgram)(program) };
            return Err(e);
        }
        Ok(Program { program, kernel })
    }

    fn build_log(&self, program: Ptr) -> Result<Vec<u8>, BackendError> {
        let mut size: usize = 0;
        check(
            unsafe {
                (self.clGetProgramBuildInfo)(
                    program,
                    self.device,
                    CL_PROGRAM_BUILD_LOG,
                    0,
                    ptr::null_mut(),
                    &mut size,
                )
            },
            ErrorStatus::KernelCompilation,
        )?;
        let mut data = vec![0u8; size];
        check(
            unsafe {
                (self.clGetProgramBuildInfo)(
                    program,
                    self.device,
                    CL_PROGRAM_BUILD_LOG,
                    size,
                    data.as_mut_ptr().cast(),
                    ptr::null_mut(),
                )
            },
            ErrorStatus::KernelCompilation,
        )?;
        Ok(data)
    }

    pub(crate) fn allocate(&self, bytes: usize) -> Result<DeviceBuffer<'_>, BackendError> {
        let mut status: cl_int = 0;
        let mem = unsafe {
            (self.clCreateBuffer)(self.context, CL_MEM_READ_WRITE, bytes, ptr::null_mut(), &mut status)
        };
        check(status, ErrorStatus::MemoryAllocation)?;
        Ok(DeviceBuffer { mem, bytes, runtime: self })
    }

    /// Blocking copy from host to device
    pub(crate) fn write(&self, dst: &DeviceBuffer<'_>, src: &[u8]) -> Result<(), BackendError> {
        if src.len() != dst.bytes {
            return Err(BackendError {
                status: ErrorStatus::MemoryCopyH2P,
                context: format!("Copying {} bytes into buffer of {} bytes", src.len(), dst.bytes).into(),
            });
        }
        check(
            unsafe {
                (self.clEnqueueWriteBuffer)(
                    self.queue,
                    dst.mem,
                    CL_BLOCKING,
                    0,
                    src.len(),
                    src.as_ptr().cast(),
                    0,
                    ptr::null(),
                    ptr::null_mut(),
                )
            },
            ErrorStatus::MemoryCopyH2P,
        )
    }

    /// Blocking copy from device to host
    pub(crate) fn read(&self, src: &DeviceBuffer<'_>, dst: &mut [u8]) -> Result<(), BackendError> {
        if dst.len() != src.bytes {
            return Err(BackendError {
                status: ErrorStatus::MemoryCopyP2H,
                context: format!("Copying buffer of {} bytes into {} bytes", src.bytes, dst.len()).into(),
            });
        }
        check(
            unsafe {
                (self.clEnqueueReadBuffer)(
                    self.queue,
                    src.mem,
                    CL_BLOCKING,
                    0,
                    dst.len(),
                    dst.as_mut_ptr().cast(),
                    0,
                    ptr::null(),
                    ptr::null_mut(),
                )
            },
            ErrorStatus::MemoryCopyP2H,
        )
    }

    /// Set arguments, enqueue two dimensional launch and wait for it
    pub(crate) fn launch(
        &self,
        kernel: Ptr,
        args: &[Arg<'_>],
        global_work_size: [usize; 2],
        local_work_size: [usize; 2],
    ) -> Result<(), BackendError> {
        for (i, arg) in (0..).zip(args) {
            let status = match arg {
                Arg::Buffer(buffer) => {
                    let mem: *const Ptr = &buffer.mem;
                    unsafe { (self.clSetKernelArg)(kernel, i, core::mem::size_of::<Ptr>(), mem.cast()) }
                }
                Arg::Int(x) => {
                    let x: *const cl_int = x;
                    unsafe { (self.clSetKernelArg)(kernel, i, core::mem::size_of::<cl_int>(), x.cast()) }
                }
            };
            check(status, ErrorStatus::IncorrectKernelArg)?;
        }
        check(
            unsafe {
                (self.clEnqueueNDRangeKernel)(
                    self.queue,
                    kernel,
                    2,
                    ptr::null(),
                    global_work_size.as_ptr(),
                    local_work_size.as_ptr(),
                    0,
                    ptr::null(),
                    ptr::null_mut(),
                )
            },
            ErrorStatus::KernelLaunch,
        )?;
        check(unsafe { (self.clFinish)(self.queue) }, ErrorStatus::KernelSync)
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        for program in self.programs.values() {
            unsafe {
                let _ = (self.clReleaseKernel)(program.kernel);
                let _ = (self.clReleaseProgram)(program.program);
            }
        }
        if !self.queue.is_null() {
            let _ = unsafe { (self.clReleaseCommandQueue)(self.queue) };
        }
        if !self.context.is_null() {
            let _ = unsafe { (self.clReleaseContext)(self.context) };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{check, info_string, int, OpenCLStatus};
    use castmm_core::error::ErrorStatus;

    #[test]
    fn status() {
        assert_eq!(OpenCLStatus::from(-11), OpenCLStatus::CL_BUILD_PROGRAM_FAILURE);
        assert_eq!(OpenCLStatus::from(-1000), OpenCLStatus::UNKNOWN(-1000));
        assert!(check(0, ErrorStatus::KernelLaunch).is_ok());
        let e = check(-54, ErrorStatus::KernelLaunch).unwrap_err();
        assert_eq!(e.status, ErrorStatus::KernelLaunch);
        assert_eq!(&*e.context, "CL_INVALID_WORK_GROUP_SIZE");
    }

    #[test]
    fn conversions() {
        assert_eq!(info_string(b"Some Device\0"), "Some Device");
        assert_eq!(int(1280).unwrap(), 1280);
        assert!(int(usize::MAX).is_err());
    }
}

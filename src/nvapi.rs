//! NvAPI interception: the `nvapi_QueryInterface` wrapper and the two interfaces it swaps out.
//!
//! NvAPI exports a single real entry point, `nvapi_QueryInterface(id)`, which hands back the
//! function for a numeric interface id. Wrapping it lets us replace:
//!
//! * `NvAPI_GPU_GetArchInfo`, whose reported architecture is raised to a minimum generation;
//! * `NvAPI_D3D12_SetRawScgPriority`, which is stubbed out because it corrupts command-list state
//!   on some drivers when combined with the replacement upscaler.
use std::ffi::c_void;
use std::sync::OnceLock;

use zerocopy::{AsBytes, FromBytes, FromZeroes};

use crate::config::CONFIG;

/// `NvAPI_Status`.
pub type NvStatus = i32;

pub const NVAPI_OK: NvStatus = 0;
pub const NVAPI_ERROR: NvStatus = -1;
pub const NVAPI_NO_IMPLEMENTATION: NvStatus = -3;

/// Interface id of `NvAPI_GPU_GetArchInfo`.
pub const GPU_GET_ARCH_INFO_ID: u32 = 0xD826_5D24;
/// Interface id of `NvAPI_D3D12_SetRawScgPriority`.
pub const D3D12_SET_RAW_SCG_PRIORITY_ID: u32 = 0x5DB3_048A;

/// `NV_GPU_ARCHITECTURE_AD100`.
pub const NV_GPU_ARCHITECTURE_AD100: u32 = 0x0000_0190;
/// `NV_GPU_ARCH_IMPLEMENTATION_AD102`.
pub const NV_GPU_ARCH_IMPLEMENTATION_AD102: u32 = 0x0000_0002;
/// Architecture values at or above this are driver-internal placeholders, not generations.
pub const NV_GPU_ARCHITECTURE_SENTINEL_FLOOR: u32 = 0xE000_0000;

/// `NV_GPU_ARCH_INFO` (version 2).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromZeroes, FromBytes, AsBytes)]
pub struct NvGpuArchInfo {
    pub version: u32,
    pub architecture: u32,
    pub implementation: u32,
    pub revision: u32,
}

/// `NV_GPU_ARCH_INFO_VER`.
pub const NV_GPU_ARCH_INFO_VER: u32 = std::mem::size_of::<NvGpuArchInfo>() as u32 | (2 << 16);

pub type QueryInterfaceFn = unsafe extern "C" fn(id: u32) -> *const c_void;
pub type GetArchInfoFn =
    unsafe extern "C" fn(gpu: *mut c_void, info: *mut NvGpuArchInfo) -> NvStatus;
pub type SetRawScgPriorityFn =
    unsafe extern "C" fn(command_list: *mut c_void, priority: u32) -> NvStatus;

/// Which reported architectures get raised, and to what.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchPolicy {
    /// Architectures below this are reported as this instead.
    pub minimum_architecture: u32,
    /// Implementation id reported alongside `minimum_architecture`.
    pub minimum_implementation: u32,
    /// First value treated as a placeholder rather than a generation, if any.
    pub sentinel_floor: Option<u32>,
}

impl Default for ArchPolicy {
    fn default() -> Self {
        Self {
            minimum_architecture: NV_GPU_ARCHITECTURE_AD100,
            minimum_implementation: NV_GPU_ARCH_IMPLEMENTATION_AD102,
            sentinel_floor: Some(NV_GPU_ARCHITECTURE_SENTINEL_FLOOR),
        }
    }
}

impl ArchPolicy {
    pub fn needs_rewrite(&self, architecture: u32) -> bool {
        architecture < self.minimum_architecture
            || self.sentinel_floor.is_some_and(|floor| architecture >= floor)
    }

    /// Raise `info` to the minimum if needed. Returns whether anything changed.
    pub fn rewrite(&self, info: &mut NvGpuArchInfo) -> bool {
        if !self.needs_rewrite(info.architecture) {
            return false;
        }

        info.architecture = self.minimum_architecture;
        info.implementation = self.minimum_implementation;
        true
    }
}

/// Call `original` and apply `policy` to what it reports. A failed call is passed through with
/// `info` left exactly as the driver left it.
///
/// # Safety
/// `original` must be a valid `NvAPI_GPU_GetArchInfo` and `info` must satisfy its contract.
pub unsafe fn query_arch_info(
    original: GetArchInfoFn,
    gpu: *mut c_void,
    info: *mut NvGpuArchInfo,
    policy: &ArchPolicy,
) -> NvStatus {
    let status = original(gpu, info);
    if status != NVAPI_OK {
        return status;
    }

    if let Some(info) = info.as_mut() {
        let reported = info.architecture;
        if policy.rewrite(info) {
            log::trace!(
                "GetArchInfo: architecture {reported:#x} reported as {:#x}",
                info.architecture
            );
        }
    }

    status
}

static ORIGINAL_QUERY_INTERFACE: OnceLock<QueryInterfaceFn> = OnceLock::new();
static ORIGINAL_GET_ARCH_INFO: OnceLock<GetArchInfoFn> = OnceLock::new();

unsafe extern "C" fn hooked_query_interface(id: u32) -> *const c_void {
    match ORIGINAL_QUERY_INTERFACE.get() {
        Some(original) => substitute_interface(id, original(id)),
        None => std::ptr::null(),
    }
}

unsafe extern "C" fn hooked_get_arch_info(gpu: *mut c_void, info: *mut NvGpuArchInfo) -> NvStatus {
    match ORIGINAL_GET_ARCH_INFO.get() {
        Some(original) => query_arch_info(*original, gpu, info, &CONFIG.arch_policy),
        None => NVAPI_NO_IMPLEMENTATION,
    }
}

unsafe extern "C" fn hooked_set_raw_scg_priority(
    _command_list: *mut c_void,
    _priority: u32,
) -> NvStatus {
    NVAPI_OK
}

/// Whether `ptr` is one of this module's NvAPI wrappers.
pub fn is_wrapper(ptr: *const c_void) -> bool {
    ptr == hooked_query_interface as *const c_void
        || ptr == hooked_get_arch_info as *const c_void
        || ptr == hooked_set_raw_scg_priority as *const c_void
}

/// Record `original` as the real `nvapi_QueryInterface` and return the wrapper to hand out
/// instead. Only the first original is kept.
pub fn wrap_query_interface(original: *const c_void) -> *const c_void {
    if original.is_null() || is_wrapper(original) {
        return original;
    }

    // SAFETY: `original` is the `nvapi_QueryInterface` export of a loaded nvapi module.
    let original: QueryInterfaceFn = unsafe { std::mem::transmute(original) };
    if ORIGINAL_QUERY_INTERFACE.set(original).is_ok() {
        log::info!("nvapi_QueryInterface intercepted");
    }

    hooked_query_interface as *const c_void
}

/// Replace the function returned for interface `id`, if it is one we wrap.
pub fn substitute_interface(id: u32, real: *const c_void) -> *const c_void {
    if real.is_null() || is_wrapper(real) {
        return real;
    }

    match id {
        GPU_GET_ARCH_INFO_ID => {
            // SAFETY: the driver returned this for the GetArchInfo interface id.
            let real: GetArchInfoFn = unsafe { std::mem::transmute(real) };
            ORIGINAL_GET_ARCH_INFO.get_or_init(|| real);
            hooked_get_arch_info as *const c_void
        }
        D3D12_SET_RAW_SCG_PRIORITY_ID => hooked_set_raw_scg_priority as *const c_void,
        _ => real,
    }
}

//! The NGX export surface: result codes, opaque handles, the parameter-bag interface and the
//! records callers allocate for us to fill.
//!
//! Everything here must match `nvsdk_ngx.h` / `nvsdk_ngx_params.h` bit for bit. None of these
//! types is ever created or interpreted by the shim, except in tests.
use std::ffi::{c_char, c_void};
use std::marker::{PhantomData, PhantomPinned};

use zerocopy::FromZeroes;

pub mod cuda;
pub mod d3d;
pub mod vulkan;

/// `NVSDK_NGX_Result`.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NgxResult(pub u32);

impl NgxResult {
    pub const SUCCESS: Self = Self(0x1);
    pub const FAIL: Self = Self(0xBAD0_0000);
    pub const FAIL_FEATURE_NOT_SUPPORTED: Self = Self(0xBAD0_0001);
    pub const FAIL_PLATFORM_ERROR: Self = Self(0xBAD0_0002);
    pub const FAIL_NOT_INITIALIZED: Self = Self(0xBAD0_0007);
    pub const FAIL_INVALID_PARAMETER: Self = Self(0xBAD0_0005);
    pub const FAIL_OUT_OF_DATE: Self = Self(0xBAD0_000C);
    pub const FAIL_NOT_IMPLEMENTED: Self = Self(0xBAD0_0012);

    /// `NVSDK_NGX_SUCCEED`: every failure code has the `0xFFF00000` bits equal to `0xBAD00000`.
    pub const fn is_success(self) -> bool {
        (self.0 & 0xFFF0_0000) != 0xBAD0_0000
    }
}

/// `NVSDK_NGX_Feature`.
pub type NgxFeature = u32;
/// `NVSDK_NGX_EngineType`.
pub type NgxEngineType = u32;
/// `NVSDK_NGX_Version`.
pub type NgxVersion = u32;

macro_rules! opaque_types {
    ($($(#[$attr:meta])* $name:ident;)*) => {
        $(
            $(#[$attr])*
            #[repr(C)]
            pub struct $name {
                _data: [u8; 0],
                _marker: PhantomData<(*mut u8, PhantomPinned)>,
            }
        )*
    };
}

opaque_types! {
    /// `NVSDK_NGX_Handle`, a feature instance.
    NgxHandle;
    /// `NVSDK_NGX_FeatureCommonInfo`.
    NgxFeatureCommonInfo;
    /// `NVSDK_NGX_FeatureDiscoveryInfo`.
    NgxFeatureDiscoveryInfo;
    ID3D11Device;
    ID3D11DeviceContext;
    ID3D11Resource;
    ID3D12Device;
    ID3D12GraphicsCommandList;
    ID3D12Resource;
    IDXGIAdapter;
    VkInstanceT;
    VkPhysicalDeviceT;
    VkDeviceT;
    VkCommandBufferT;
    VkExtensionProperties;
}

// Vulkan dispatchable handles are pointers to opaque structs.
pub type VkInstance = *mut VkInstanceT;
pub type VkPhysicalDevice = *mut VkPhysicalDeviceT;
pub type VkDevice = *mut VkDeviceT;
pub type VkCommandBuffer = *mut VkCommandBufferT;
/// `PFN_vkGetInstanceProcAddr` / `PFN_vkGetDeviceProcAddr`, passed through untouched.
pub type VkProcAddrFn = *const c_void;

/// `PFN_NVSDK_NGX_ProgressCallback` (C++ flavour, `bool&` is a pointer at the ABI level).
pub type NgxProgressCallback = Option<unsafe extern "C" fn(progress: f32, should_cancel: *mut bool)>;
/// `PFN_NVSDK_NGX_ProgressCallback_C`.
pub type NgxProgressCallbackC = Option<unsafe extern "C" fn(progress: f32, should_cancel: *mut bool)>;

/// Length of `NVSDK_NGX_FeatureRequirement::MinOSVersion`.
pub const MIN_OS_VERSION_LEN: usize = 255;

/// `NVSDK_NGX_FeatureRequirement`. Allocated by the caller, filled by the implementation.
#[repr(C)]
#[derive(Debug, Clone, Copy, FromZeroes)]
pub struct NgxFeatureRequirement {
    /// `NVSDK_NGX_Feature_Support_Result` flags.
    pub feature_supported: u32,
    /// Minimum GPU architecture (`NV_GPU_ARCHITECTURE_*`).
    pub min_hw_architecture: u32,
    pub min_os_version: [c_char; MIN_OS_VERSION_LEN],
}

/// `NVSDK_NGX_Parameter`: an abstract C++ class, so a pointer to a vtable pointer.
#[repr(C)]
pub struct NgxParameter {
    pub vtbl: *const NgxParameterVtbl,
}

/// Virtual table of `NVSDK_NGX_Parameter`.
///
/// The header declares eight `Set` overloads, eight `Get` overloads and `Reset`. MSVC places
/// overloads of one name next to each other in reverse declaration order, so the `void*`
/// variant comes first and the `unsigned long long` variant last within each group. x64 has a
/// single calling convention, so `this` is simply the first argument.
#[repr(C)]
pub struct NgxParameterVtbl {
    pub set_void_pointer: unsafe extern "C" fn(*mut NgxParameter, *const c_char, *mut c_void),
    pub set_d3d12_resource: unsafe extern "C" fn(*mut NgxParameter, *const c_char, *mut ID3D12Resource),
    pub set_d3d11_resource: unsafe extern "C" fn(*mut NgxParameter, *const c_char, *mut ID3D11Resource),
    pub set_i32: unsafe extern "C" fn(*mut NgxParameter, *const c_char, i32),
    pub set_u32: unsafe extern "C" fn(*mut NgxParameter, *const c_char, u32),
    pub set_f64: unsafe extern "C" fn(*mut NgxParameter, *const c_char, f64),
    pub set_f32: unsafe extern "C" fn(*mut NgxParameter, *const c_char, f32),
    pub set_u64: unsafe extern "C" fn(*mut NgxParameter, *const c_char, u64),

    pub get_void_pointer:
        unsafe extern "C" fn(*const NgxParameter, *const c_char, *mut *mut c_void) -> NgxResult,
    pub get_d3d12_resource: unsafe extern "C" fn(
        *const NgxParameter,
        *const c_char,
        *mut *mut ID3D12Resource,
    ) -> NgxResult,
    pub get_d3d11_resource: unsafe extern "C" fn(
        *const NgxParameter,
        *const c_char,
        *mut *mut ID3D11Resource,
    ) -> NgxResult,
    pub get_i32: unsafe extern "C" fn(*const NgxParameter, *const c_char, *mut i32) -> NgxResult,
    pub get_u32: unsafe extern "C" fn(*const NgxParameter, *const c_char, *mut u32) -> NgxResult,
    pub get_f64: unsafe extern "C" fn(*const NgxParameter, *const c_char, *mut f64) -> NgxResult,
    pub get_f32: unsafe extern "C" fn(*const NgxParameter, *const c_char, *mut f32) -> NgxResult,
    pub get_u64: unsafe extern "C" fn(*const NgxParameter, *const c_char, *mut u64) -> NgxResult,

    pub reset: unsafe extern "C" fn(*mut NgxParameter),
}

const _: () = assert!(std::mem::size_of::<NgxParameterVtbl>() == 17 * std::mem::size_of::<usize>());
const _: () = assert!(std::mem::size_of::<NgxFeatureRequirement>() == 264);

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CStr;
    use std::sync::Mutex;

    static CALLS: Mutex<Vec<String>> = Mutex::new(Vec::new());

    fn record(slot: &str, name: *const c_char) {
        let name = unsafe { CStr::from_ptr(name) }.to_string_lossy();
        CALLS.lock().unwrap().push(format!("{slot}:{name}"));
    }

    unsafe extern "C" fn set_void_pointer(_: *mut NgxParameter, n: *const c_char, _: *mut c_void) {
        record("set_void_pointer", n)
    }
    unsafe extern "C" fn set_d3d12(_: *mut NgxParameter, n: *const c_char, _: *mut ID3D12Resource) {
        record("set_d3d12_resource", n)
    }
    unsafe extern "C" fn set_d3d11(_: *mut NgxParameter, n: *const c_char, _: *mut ID3D11Resource) {
        record("set_d3d11_resource", n)
    }
    unsafe extern "C" fn set_i32(_: *mut NgxParameter, n: *const c_char, _: i32) {
        record("set_i32", n)
    }
    unsafe extern "C" fn set_u32(_: *mut NgxParameter, n: *const c_char, _: u32) {
        record("set_u32", n)
    }
    unsafe extern "C" fn set_f64(_: *mut NgxParameter, n: *const c_char, _: f64) {
        record("set_f64", n)
    }
    unsafe extern "C" fn set_f32(_: *mut NgxParameter, n: *const c_char, v: f32) {
        record("set_f32", n);
        assert_eq!(v, 0.5);
    }
    unsafe extern "C" fn set_u64(_: *mut NgxParameter, n: *const c_char, _: u64) {
        record("set_u64", n)
    }
    unsafe extern "C" fn get_void_pointer(
        _: *const NgxParameter,
        n: *const c_char,
        _: *mut *mut c_void,
    ) -> NgxResult {
        record("get_void_pointer", n);
        NgxResult::SUCCESS
    }
    unsafe extern "C" fn get_d3d12(
        _: *const NgxParameter,
        n: *const c_char,
        _: *mut *mut ID3D12Resource,
    ) -> NgxResult {
        record("get_d3d12_resource", n);
        NgxResult::SUCCESS
    }
    unsafe extern "C" fn get_d3d11(
        _: *const NgxParameter,
        n: *const c_char,
        _: *mut *mut ID3D11Resource,
    ) -> NgxResult {
        record("get_d3d11_resource", n);
        NgxResult::SUCCESS
    }
    unsafe extern "C" fn get_i32(_: *const NgxParameter, n: *const c_char, _: *mut i32) -> NgxResult {
        record("get_i32", n);
        NgxResult::SUCCESS
    }
    unsafe extern "C" fn get_u32(_: *const NgxParameter, n: *const c_char, out: *mut u32) -> NgxResult {
        record("get_u32", n);
        *out = 7;
        NgxResult::SUCCESS
    }
    unsafe extern "C" fn get_f64(_: *const NgxParameter, n: *const c_char, _: *mut f64) -> NgxResult {
        record("get_f64", n);
        NgxResult::SUCCESS
    }
    unsafe extern "C" fn get_f32(_: *const NgxParameter, n: *const c_char, _: *mut f32) -> NgxResult {
        record("get_f32", n);
        NgxResult::SUCCESS
    }
    unsafe extern "C" fn get_u64(_: *const NgxParameter, n: *const c_char, _: *mut u64) -> NgxResult {
        record("get_u64", n);
        NgxResult::FAIL_INVALID_PARAMETER
    }
    unsafe extern "C" fn reset(_: *mut NgxParameter) {
        CALLS.lock().unwrap().push("reset".to_owned());
    }

    static FAKE_VTBL: NgxParameterVtbl = NgxParameterVtbl {
        set_void_pointer,
        set_d3d12_resource: set_d3d12,
        set_d3d11_resource: set_d3d11,
        set_i32,
        set_u32,
        set_f64,
        set_f32,
        set_u64,
        get_void_pointer,
        get_d3d12_resource: get_d3d12,
        get_d3d11_resource: get_d3d11,
        get_i32,
        get_u32,
        get_f64,
        get_f32,
        get_u64,
        reset,
    };

    #[test]
    fn vtable_slots_follow_msvc_overload_order() {
        let slots = unsafe {
            std::slice::from_raw_parts(&FAKE_VTBL as *const _ as *const usize, 17)
        };
        assert_eq!(slots[0], set_void_pointer as usize);
        assert_eq!(slots[6], set_f32 as usize);
        assert_eq!(slots[8], get_void_pointer as usize);
        assert_eq!(slots[12], get_u32 as usize);
        assert_eq!(slots[16], reset as usize);
    }

    #[test]
    fn calls_through_the_table_reach_the_right_slot() {
        let mut param = NgxParameter { vtbl: &FAKE_VTBL };
        let this: *mut NgxParameter = &mut param;
        let mut out = 0u32;

        unsafe {
            ((*(*this).vtbl).set_f32)(this, c"Sharpness".as_ptr(), 0.5);
            let result = ((*(*this).vtbl).get_u32)(this, c"Width".as_ptr(), &mut out);
            assert_eq!(result, NgxResult::SUCCESS);
            let result = ((*(*this).vtbl).get_u64)(this, c"Height".as_ptr(), std::ptr::null_mut());
            assert!(!result.is_success());
            ((*(*this).vtbl).reset)(this);
        }

        assert_eq!(out, 7);
        assert_eq!(
            *CALLS.lock().unwrap(),
            ["set_f32:Sharpness", "get_u32:Width", "get_u64:Height", "reset"]
        );
    }

    #[test]
    fn result_codes() {
        assert!(NgxResult::SUCCESS.is_success());
        assert!(!NgxResult::FAIL.is_success());
        assert!(!NgxResult::FAIL_NOT_IMPLEMENTED.is_success());
        assert!(!NgxResult::FAIL_OUT_OF_DATE.is_success());
    }

    #[test]
    fn feature_requirement_starts_zeroed() {
        let requirement = NgxFeatureRequirement::new_zeroed();
        assert_eq!(requirement.feature_supported, 0);
        assert!(requirement.min_os_version.iter().all(|&c| c == 0));
    }
}

//! CUDA entry points. They exist so the export set is complete; none of them does anything
//! beyond reporting `NVSDK_NGX_Result_FAIL_NotImplemented`.
use std::ffi::c_char;

use super::{
    NgxEngineType, NgxFeature, NgxFeatureCommonInfo, NgxHandle, NgxParameter,
    NgxProgressCallback, NgxProgressCallbackC, NgxResult, NgxVersion,
};

macro_rules! not_implemented_exports {
    ($(fn $name:ident($($ty:ty),* $(,)?);)*) => {
        $(
            #[no_mangle]
            pub unsafe extern "C" fn $name($(_: $ty),*) -> NgxResult {
                NgxResult::FAIL_NOT_IMPLEMENTED
            }
        )*
    };
}

not_implemented_exports! {
    fn NVSDK_NGX_CUDA_Init(u64, *const u16, *const NgxFeatureCommonInfo, NgxVersion);
    fn NVSDK_NGX_CUDA_Init_ProjectID(
        *const c_char,
        NgxEngineType,
        *const c_char,
        *const u16,
        *const NgxFeatureCommonInfo,
        NgxVersion,
    );
    fn NVSDK_NGX_CUDA_Init_with_ProjectID(
        *const c_char,
        NgxEngineType,
        *const c_char,
        *const u16,
        *const NgxFeatureCommonInfo,
        NgxVersion,
    );
    fn NVSDK_NGX_CUDA_Shutdown();
    fn NVSDK_NGX_CUDA_GetParameters(*mut *mut NgxParameter);
    fn NVSDK_NGX_CUDA_AllocateParameters(*mut *mut NgxParameter);
    fn NVSDK_NGX_CUDA_GetCapabilityParameters(*mut *mut NgxParameter);
    fn NVSDK_NGX_CUDA_DestroyParameters(*mut NgxParameter);
    fn NVSDK_NGX_CUDA_GetScratchBufferSize(NgxFeature, *const NgxParameter, *mut usize);
    fn NVSDK_NGX_CUDA_CreateFeature(NgxFeature, *const NgxParameter, *mut *mut NgxHandle);
    fn NVSDK_NGX_CUDA_ReleaseFeature(*mut NgxHandle);
    fn NVSDK_NGX_CUDA_EvaluateFeature(*const NgxHandle, *const NgxParameter, NgxProgressCallback);
    fn NVSDK_NGX_CUDA_EvaluateFeature_C(*const NgxHandle, *const NgxParameter, NgxProgressCallbackC);
}

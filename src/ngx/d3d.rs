//! D3D11 and D3D12 entry points, forwarded to the resolved NGX implementation.
use std::ffi::c_char;

use super::{
    ID3D11Device, ID3D11DeviceContext, ID3D12Device, ID3D12GraphicsCommandList, IDXGIAdapter,
    NgxEngineType, NgxFeature, NgxFeatureCommonInfo, NgxFeatureDiscoveryInfo,
    NgxFeatureRequirement, NgxHandle, NgxParameter, NgxProgressCallback, NgxProgressCallbackC,
    NgxResult, NgxVersion,
};

crate::forward_exports! {
    crate::forward::FORWARDER;

    fn NVSDK_NGX_D3D11_Init(
        application_id: u64,
        application_data_path: *const u16,
        device: *mut ID3D11Device,
        feature_info: *const NgxFeatureCommonInfo,
        sdk_version: NgxVersion,
    ) -> NgxResult;
    fn NVSDK_NGX_D3D11_Init_Ext(
        application_id: u64,
        application_data_path: *const u16,
        device: *mut ID3D11Device,
        sdk_version: NgxVersion,
        parameters: *const NgxParameter,
    ) -> NgxResult;
    fn NVSDK_NGX_D3D11_Init_ProjectID(
        project_id: *const c_char,
        engine_type: NgxEngineType,
        engine_version: *const c_char,
        application_data_path: *const u16,
        device: *mut ID3D11Device,
        feature_info: *const NgxFeatureCommonInfo,
        sdk_version: NgxVersion,
    ) -> NgxResult;
    fn NVSDK_NGX_D3D11_Init_with_ProjectID(
        project_id: *const c_char,
        engine_type: NgxEngineType,
        engine_version: *const c_char,
        application_data_path: *const u16,
        device: *mut ID3D11Device,
        feature_info: *const NgxFeatureCommonInfo,
        sdk_version: NgxVersion,
    ) -> NgxResult;
    fn NVSDK_NGX_D3D11_Shutdown() -> NgxResult;
    fn NVSDK_NGX_D3D11_Shutdown1(device: *mut ID3D11Device) -> NgxResult;
    fn NVSDK_NGX_D3D11_GetParameters(parameters: *mut *mut NgxParameter) -> NgxResult;
    fn NVSDK_NGX_D3D11_AllocateParameters(parameters: *mut *mut NgxParameter) -> NgxResult;
    fn NVSDK_NGX_D3D11_GetCapabilityParameters(parameters: *mut *mut NgxParameter) -> NgxResult;
    fn NVSDK_NGX_D3D11_DestroyParameters(parameters: *mut NgxParameter) -> NgxResult;
    fn NVSDK_NGX_D3D11_GetScratchBufferSize(
        feature: NgxFeature,
        parameters: *const NgxParameter,
        size_in_bytes: *mut usize,
    ) -> NgxResult;
    fn NVSDK_NGX_D3D11_CreateFeature(
        device_context: *mut ID3D11DeviceContext,
        feature: NgxFeature,
        parameters: *mut NgxParameter,
        handle: *mut *mut NgxHandle,
    ) -> NgxResult;
    fn NVSDK_NGX_D3D11_ReleaseFeature(handle: *mut NgxHandle) -> NgxResult;
    fn NVSDK_NGX_D3D11_EvaluateFeature(
        device_context: *mut ID3D11DeviceContext,
        handle: *const NgxHandle,
        parameters: *const NgxParameter,
        callback: NgxProgressCallback,
    ) -> NgxResult;
    fn NVSDK_NGX_D3D11_EvaluateFeature_C(
        device_context: *mut ID3D11DeviceContext,
        handle: *const NgxHandle,
        parameters: *const NgxParameter,
        callback: NgxProgressCallbackC,
    ) -> NgxResult;
    fn NVSDK_NGX_D3D11_GetFeatureRequirements(
        adapter: *mut IDXGIAdapter,
        discovery_info: *const NgxFeatureDiscoveryInfo,
        requirement: *mut NgxFeatureRequirement,
    ) -> NgxResult;

    fn NVSDK_NGX_D3D12_Init(
        application_id: u64,
        application_data_path: *const u16,
        device: *mut ID3D12Device,
        feature_info: *const NgxFeatureCommonInfo,
        sdk_version: NgxVersion,
    ) -> NgxResult;
    fn NVSDK_NGX_D3D12_Init_Ext(
        application_id: u64,
        application_data_path: *const u16,
        device: *mut ID3D12Device,
        sdk_version: NgxVersion,
        parameters: *const NgxParameter,
    ) -> NgxResult;
    fn NVSDK_NGX_D3D12_Init_ProjectID(
        project_id: *const c_char,
        engine_type: NgxEngineType,
        engine_version: *const c_char,
        application_data_path: *const u16,
        device: *mut ID3D12Device,
        feature_info: *const NgxFeatureCommonInfo,
        sdk_version: NgxVersion,
    ) -> NgxResult;
    fn NVSDK_NGX_D3D12_Init_with_ProjectID(
        project_id: *const c_char,
        engine_type: NgxEngineType,
        engine_version: *const c_char,
        application_data_path: *const u16,
        device: *mut ID3D12Device,
        feature_info: *const NgxFeatureCommonInfo,
        sdk_version: NgxVersion,
    ) -> NgxResult;
    fn NVSDK_NGX_D3D12_Shutdown() -> NgxResult;
    fn NVSDK_NGX_D3D12_Shutdown1(device: *mut ID3D12Device) -> NgxResult;
    fn NVSDK_NGX_D3D12_GetParameters(parameters: *mut *mut NgxParameter) -> NgxResult;
    fn NVSDK_NGX_D3D12_AllocateParameters(parameters: *mut *mut NgxParameter) -> NgxResult;
    fn NVSDK_NGX_D3D12_GetCapabilityParameters(parameters: *mut *mut NgxParameter) -> NgxResult;
    fn NVSDK_NGX_D3D12_DestroyParameters(parameters: *mut NgxParameter) -> NgxResult;
    fn NVSDK_NGX_D3D12_GetScratchBufferSize(
        feature: NgxFeature,
        parameters: *const NgxParameter,
        size_in_bytes: *mut usize,
    ) -> NgxResult;
    fn NVSDK_NGX_D3D12_CreateFeature(
        command_list: *mut ID3D12GraphicsCommandList,
        feature: NgxFeature,
        parameters: *mut NgxParameter,
        handle: *mut *mut NgxHandle,
    ) -> NgxResult;
    fn NVSDK_NGX_D3D12_ReleaseFeature(handle: *mut NgxHandle) -> NgxResult;
    fn NVSDK_NGX_D3D12_EvaluateFeature(
        command_list: *mut ID3D12GraphicsCommandList,
        handle: *const NgxHandle,
        parameters: *const NgxParameter,
        callback: NgxProgressCallback,
    ) -> NgxResult;
    fn NVSDK_NGX_D3D12_EvaluateFeature_C(
        command_list: *mut ID3D12GraphicsCommandList,
        handle: *const NgxHandle,
        parameters: *const NgxParameter,
        callback: NgxProgressCallbackC,
    ) -> NgxResult;
    fn NVSDK_NGX_D3D12_GetFeatureRequirements(
        adapter: *mut IDXGIAdapter,
        discovery_info: *const NgxFeatureDiscoveryInfo,
        requirement: *mut NgxFeatureRequirement,
    ) -> NgxResult;
}

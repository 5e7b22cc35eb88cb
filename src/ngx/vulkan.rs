//! Vulkan entry points, forwarded to the resolved NGX implementation.
use std::ffi::c_char;

use super::{
    NgxEngineType, NgxFeature, NgxFeatureCommonInfo, NgxFeatureDiscoveryInfo,
    NgxFeatureRequirement, NgxHandle, NgxParameter, NgxProgressCallback, NgxProgressCallbackC,
    NgxResult, NgxVersion, VkCommandBuffer, VkDevice, VkExtensionProperties, VkInstance,
    VkPhysicalDevice, VkProcAddrFn,
};

crate::forward_exports! {
    crate::forward::FORWARDER;

    fn NVSDK_NGX_VULKAN_RequiredExtensions(
        instance_extension_count: *mut u32,
        instance_extensions: *mut *const *const c_char,
        device_extension_count: *mut u32,
        device_extensions: *mut *const *const c_char,
    ) -> NgxResult;
    fn NVSDK_NGX_VULKAN_Init(
        application_id: u64,
        application_data_path: *const u16,
        instance: VkInstance,
        physical_device: VkPhysicalDevice,
        device: VkDevice,
        get_instance_proc_addr: VkProcAddrFn,
        get_device_proc_addr: VkProcAddrFn,
        feature_info: *const NgxFeatureCommonInfo,
        sdk_version: NgxVersion,
    ) -> NgxResult;
    fn NVSDK_NGX_VULKAN_Init_ProjectID(
        project_id: *const c_char,
        engine_type: NgxEngineType,
        engine_version: *const c_char,
        application_data_path: *const u16,
        instance: VkInstance,
        physical_device: VkPhysicalDevice,
        device: VkDevice,
        get_instance_proc_addr: VkProcAddrFn,
        get_device_proc_addr: VkProcAddrFn,
        feature_info: *const NgxFeatureCommonInfo,
        sdk_version: NgxVersion,
    ) -> NgxResult;
    fn NVSDK_NGX_VULKAN_Init_with_ProjectID(
        project_id: *const c_char,
        engine_type: NgxEngineType,
        engine_version: *const c_char,
        application_data_path: *const u16,
        instance: VkInstance,
        physical_device: VkPhysicalDevice,
        device: VkDevice,
        get_instance_proc_addr: VkProcAddrFn,
        get_device_proc_addr: VkProcAddrFn,
        feature_info: *const NgxFeatureCommonInfo,
        sdk_version: NgxVersion,
    ) -> NgxResult;
    fn NVSDK_NGX_VULKAN_Shutdown() -> NgxResult;
    fn NVSDK_NGX_VULKAN_Shutdown1(device: VkDevice) -> NgxResult;
    fn NVSDK_NGX_VULKAN_GetParameters(parameters: *mut *mut NgxParameter) -> NgxResult;
    fn NVSDK_NGX_VULKAN_AllocateParameters(parameters: *mut *mut NgxParameter) -> NgxResult;
    fn NVSDK_NGX_VULKAN_GetCapabilityParameters(parameters: *mut *mut NgxParameter) -> NgxResult;
    fn NVSDK_NGX_VULKAN_DestroyParameters(parameters: *mut NgxParameter) -> NgxResult;
    fn NVSDK_NGX_VULKAN_GetScratchBufferSize(
        feature: NgxFeature,
        parameters: *const NgxParameter,
        size_in_bytes: *mut usize,
    ) -> NgxResult;
    fn NVSDK_NGX_VULKAN_CreateFeature(
        command_buffer: VkCommandBuffer,
        feature: NgxFeature,
        parameters: *mut NgxParameter,
        handle: *mut *mut NgxHandle,
    ) -> NgxResult;
    fn NVSDK_NGX_VULKAN_CreateFeature1(
        device: VkDevice,
        command_buffer: VkCommandBuffer,
        feature: NgxFeature,
        parameters: *mut NgxParameter,
        handle: *mut *mut NgxHandle,
    ) -> NgxResult;
    fn NVSDK_NGX_VULKAN_ReleaseFeature(handle: *mut NgxHandle) -> NgxResult;
    fn NVSDK_NGX_VULKAN_EvaluateFeature(
        command_buffer: VkCommandBuffer,
        handle: *const NgxHandle,
        parameters: *const NgxParameter,
        callback: NgxProgressCallback,
    ) -> NgxResult;
    fn NVSDK_NGX_VULKAN_EvaluateFeature_C(
        command_buffer: VkCommandBuffer,
        handle: *const NgxHandle,
        parameters: *const NgxParameter,
        callback: NgxProgressCallbackC,
    ) -> NgxResult;
    fn NVSDK_NGX_VULKAN_GetFeatureRequirements(
        instance: VkInstance,
        physical_device: VkPhysicalDevice,
        discovery_info: *const NgxFeatureDiscoveryInfo,
        requirement: *mut NgxFeatureRequirement,
    ) -> NgxResult;
    fn NVSDK_NGX_VULKAN_GetFeatureInstanceExtensionRequirements(
        discovery_info: *const NgxFeatureDiscoveryInfo,
        extension_count: *mut u32,
        extensions: *mut *mut VkExtensionProperties,
    ) -> NgxResult;
    fn NVSDK_NGX_VULKAN_GetFeatureDeviceExtensionRequirements(
        instance: VkInstance,
        physical_device: VkPhysicalDevice,
        discovery_info: *const NgxFeatureDiscoveryInfo,
        extension_count: *mut u32,
        extensions: *mut *mut VkExtensionProperties,
    ) -> NgxResult;
}

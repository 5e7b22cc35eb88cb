//! Watching `GetProcAddress`.
//!
//! In aggressive mode every `GetProcAddress` call in the process goes through a detour on
//! kernel32's export. Otherwise only the NGX core's own import slot is redirected, so its lookups
//! into NvAPI and the overlay are the only ones that see substitution.
use std::ffi::{c_char, c_void};
use std::sync::OnceLock;

use pelite::pe64::imports::Import;
use pelite::pe64::{Pe, PeView};
use retour::GenericDetour;
use windows::core::{s, w};
use windows::Win32::System::LibraryLoader::{GetModuleHandleW, GetProcAddress};

use crate::error::HookError;
use crate::intercept::{self, GetProcAddressFn};

type GetProcAddressDetourFn = extern "system" fn(isize, *const c_char) -> *const c_void;

/// Process-wide detour on kernel32's export.
static GET_PROC_ADDRESS_HOOK: OnceLock<GenericDetour<GetProcAddressDetourFn>> = OnceLock::new();

/// The genuine `GetProcAddress` the patched import slot used to hold.
static ORIGINAL_GET_PROC_ADDRESS: OnceLock<GetProcAddressFn> = OnceLock::new();

extern "system" fn detoured_get_proc_address(module: isize, name: *const c_char) -> *const c_void {
    let Some(hook) = GET_PROC_ADDRESS_HOOK.get() else {
        return std::ptr::null();
    };

    #[allow(unused_unsafe)]
    unsafe {
        let mut proc = hook.call(module, name);
        intercept::intercept(module as usize, name, &mut proc);
        proc
    }
}

unsafe extern "system" fn patched_get_proc_address(
    module: isize,
    name: *const c_char,
) -> *const c_void {
    match ORIGINAL_GET_PROC_ADDRESS.get() {
        Some(original) => intercept::lookup_through(*original, module, name),
        None => std::ptr::null(),
    }
}

/// Detour kernel32's `GetProcAddress` for the whole process.
pub fn install_process_wide() -> Result<(), HookError> {
    if GET_PROC_ADDRESS_HOOK.get().is_some() {
        return Ok(());
    }

    unsafe {
        let kernel32 = GetModuleHandleW(w!("kernel32.dll"))?;
        let target = GetProcAddress(kernel32, s!("GetProcAddress"))
            .ok_or(HookError::ExportNotFound("GetProcAddress"))?;
        let target: GetProcAddressDetourFn = std::mem::transmute(target);

        // Stored before enabling: the detour reads it on every call.
        let detour = GenericDetour::<GetProcAddressDetourFn>::new(target, detoured_get_proc_address)?;
        GET_PROC_ADDRESS_HOOK.get_or_init(|| detour).enable()?;
    }

    log::info!("GetProcAddress detoured process-wide");
    Ok(())
}

/// Import address table slots bound to `GetProcAddress` in the module mapped at `base`.
///
/// # Safety
/// `base` must be the base address of a loaded 64-bit image.
unsafe fn get_proc_address_slots(base: usize) -> Result<Vec<*mut usize>, HookError> {
    let view = PeView::module(base as *const u8);
    let mut slots = Vec::new();

    for desc in view.imports()? {
        let iat = desc.iat()?;
        let int = desc.int()?;

        for (slot, import) in iat.zip(int) {
            if let Ok(Import::ByName { name, .. }) = import {
                if name.to_str() == Ok("GetProcAddress") {
                    slots.push(slot as *const u64 as *mut usize);
                }
            }
        }
    }

    Ok(slots)
}

/// Redirect the `GetProcAddress` import of the module mapped at `base`.
///
/// Slots already pointing at the replacement are left alone, so patching twice is harmless.
///
/// # Safety
/// `base` must be the base address of a loaded 64-bit image that stays mapped.
pub unsafe fn patch_module_imports(base: usize) -> Result<(), HookError> {
    let slots = get_proc_address_slots(base)?;
    if slots.is_empty() {
        return Err(HookError::ImportNotFound("GetProcAddress"));
    }

    let replacement = patched_get_proc_address as GetProcAddressFn as usize;
    let mut patched = 0usize;

    for slot in slots {
        if slot.read() == replacement {
            continue;
        }
        let original: GetProcAddressFn = std::mem::transmute(slot.read());
        ORIGINAL_GET_PROC_ADDRESS.get_or_init(|| original);

        let _guard = region::protect_with_handle(
            slot,
            std::mem::size_of::<usize>(),
            region::Protection::READ_WRITE,
        )?;
        slot.write(replacement);
        patched += 1;
    }

    log::info!("patched {patched} GetProcAddress import slot(s) in module {base:#x}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use windows::core::PCWSTR;
    use windows::Win32::Foundation::HMODULE;

    use super::*;

    fn own_image() -> usize {
        unsafe { GetModuleHandleW(PCWSTR::null()).map(|module| module.0 as usize).unwrap() }
    }

    fn lookup(module: HMODULE) -> usize {
        unsafe { GetProcAddress(module, s!("GetProcAddress")).map(|proc| proc as usize).unwrap() }
    }

    #[test]
    fn own_imports_are_redirected_and_still_resolve() {
        let base = own_image();
        let kernel32 = unsafe { GetModuleHandleW(w!("kernel32.dll")).unwrap() };
        let genuine = lookup(kernel32);

        unsafe { patch_module_imports(base).unwrap() };

        let replacement = patched_get_proc_address as GetProcAddressFn as usize;
        let slots = unsafe { get_proc_address_slots(base).unwrap() };
        assert!(!slots.is_empty());
        for slot in slots {
            assert_eq!(unsafe { slot.read() }, replacement);
        }
        assert!(ORIGINAL_GET_PROC_ADDRESS.get().is_some());

        // Lookups outside NvAPI pass through untouched.
        assert_eq!(lookup(kernel32), genuine);

        unsafe { patch_module_imports(base).unwrap() };
        assert_eq!(lookup(kernel32), genuine);
    }
}

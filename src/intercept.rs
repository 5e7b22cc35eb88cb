//! Symbol substitution applied to export lookups.
//!
//! Every time a watched lookup resolves an export (a `GetProcAddress` call, or the first call of
//! one of our forwarded stubs), the resolved pointer goes through [`intercept`]. Almost every
//! name passes through untouched. Two groups are replaced:
//!
//! * `nvapi_QueryInterface`, wrapped so selected NvAPI interfaces can be swapped (see
//!   [`crate::nvapi`]);
//! * the overlay's hook-installation entry points, which tear down hooks installed by others and
//!   are redirected to a stub reporting "not supported".
use std::ffi::{c_char, c_void, CStr};

use crate::nvapi;

/// NvAPI's single real export.
pub const QUERY_INTERFACE_EXPORT: &CStr = c"nvapi_QueryInterface";

/// Overlay exports that reinstall the overlay's own hooks, dropping everyone else's.
pub const OVERLAY_EXPORTS: &[&CStr] = &[
    c"OverlayHookD3D3",
    c"OverlayHookD3D11",
    c"OverlayHookD3D12",
    c"OverlayHookVulkan",
];

/// What the neutralised overlay entry points return.
pub const OVERLAY_NOT_SUPPORTED: u32 = 0xFFFF_FFFF;

extern "C" fn overlay_not_supported() -> u32 {
    OVERLAY_NOT_SUPPORTED
}

/// Whether a `GetProcAddress`-style name argument is really an ordinal.
fn is_ordinal(name: *const c_char) -> bool {
    (name as usize) <= 0xFFFF
}

/// Pointer to hand out for export `name` in place of `original`.
pub fn substitute(name: &CStr, original: *const c_void) -> *const c_void {
    if original.is_null() || name.is_empty() {
        return original;
    }

    if name == QUERY_INTERFACE_EXPORT {
        return nvapi::wrap_query_interface(original);
    }

    if OVERLAY_EXPORTS.iter().any(|&export| export == name) {
        return overlay_not_supported as *const c_void;
    }

    original
}

/// Signature of `GetProcAddress`, with the module handle as a plain integer.
pub type GetProcAddressFn = unsafe extern "system" fn(isize, *const c_char) -> *const c_void;

/// Resolve `name` in `module` through `original`, then intercept the result.
///
/// # Safety
/// Same contract as `GetProcAddress`.
pub unsafe fn lookup_through(
    original: GetProcAddressFn,
    module: isize,
    name: *const c_char,
) -> *const c_void {
    let mut proc = original(module, name);
    intercept(module as usize, name, &mut proc);
    proc
}

/// Substitute `proc`, the address `module` resolved for `name`, in place.
///
/// # Safety
/// `name` must be null, an ordinal, or a valid nul-terminated string.
pub unsafe fn intercept(module: usize, name: *const c_char, proc: &mut *const c_void) {
    if name.is_null() || is_ordinal(name) || proc.is_null() {
        return;
    }

    let name = CStr::from_ptr(name);
    let replacement = substitute(name, *proc);
    if replacement != *proc {
        log::debug!("substituted {name:?} resolved from module {module:#x}");
        *proc = replacement;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nvapi::tests::fake_query_interface;

    const REAL: *const c_void = 0x7FF0_1234_5678 as *const c_void;

    #[test]
    fn every_overlay_export_is_neutralised() {
        for &name in OVERLAY_EXPORTS {
            let mut proc = REAL;
            unsafe { intercept(0x1_0000, name.as_ptr(), &mut proc) };

            assert_ne!(proc, REAL, "{name:?} passed through");
            let stub: extern "C" fn() -> u32 = unsafe { std::mem::transmute(proc) };
            assert_eq!(stub(), 0xFFFF_FFFF);
        }
    }

    #[test]
    fn other_names_are_left_alone() {
        for name in [
            c"NvAPI_Initialize",
            c"OverlayHookD3D",
            c"overlayhookd3d11",
            c"GetFileVersionInfoW",
            c"nvapi_queryinterface",
        ] {
            let mut proc = REAL;
            unsafe { intercept(0x1_0000, name.as_ptr(), &mut proc) };
            assert_eq!(proc, REAL, "{name:?} was replaced");
        }
    }

    #[test]
    fn null_ordinal_and_empty_names_exit_early() {
        let mut proc = REAL;
        unsafe {
            intercept(0x1_0000, std::ptr::null(), &mut proc);
            intercept(0x1_0000, 42 as *const c_char, &mut proc);
            intercept(0x1_0000, c"".as_ptr(), &mut proc);
        }
        assert_eq!(proc, REAL);

        let mut proc = std::ptr::null();
        unsafe { intercept(0x1_0000, OVERLAY_EXPORTS[0].as_ptr(), &mut proc) };
        assert!(proc.is_null());
    }

    static LOOKUPS: std::sync::atomic::AtomicUsize = std::sync::atomic::AtomicUsize::new(0);

    /// Stand-in for `GetProcAddress` on a module exporting NvAPI and one ordinary symbol.
    unsafe extern "system" fn fake_get_proc_address(
        _module: isize,
        name: *const c_char,
    ) -> *const c_void {
        LOOKUPS.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        if is_ordinal(name) {
            return REAL;
        }
        match CStr::from_ptr(name).to_bytes() {
            b"nvapi_QueryInterface" => fake_query_interface as *const c_void,
            b"NvAPI_Initialize" => REAL,
            _ => std::ptr::null(),
        }
    }

    #[test]
    fn lookups_go_through_the_original_then_substitution() {
        let module = 0x7FF8_0000_0000;
        unsafe {
            let query =
                lookup_through(fake_get_proc_address, module, QUERY_INTERFACE_EXPORT.as_ptr());
            assert!(nvapi::is_wrapper(query));

            assert_eq!(
                lookup_through(fake_get_proc_address, module, c"NvAPI_Initialize".as_ptr()),
                REAL
            );
            assert!(lookup_through(fake_get_proc_address, module, c"Missing".as_ptr()).is_null());
            assert_eq!(lookup_through(fake_get_proc_address, module, 7 as *const c_char), REAL);
        }
        assert_eq!(LOOKUPS.load(std::sync::atomic::Ordering::SeqCst), 4);
    }

    #[test]
    fn query_interface_is_wrapped_and_stays_wrapped() {
        let original = fake_query_interface as *const c_void;

        let mut proc = original;
        unsafe { intercept(0x1_0000, QUERY_INTERFACE_EXPORT.as_ptr(), &mut proc) };
        assert_ne!(proc, original);
        assert!(nvapi::is_wrapper(proc));

        // Substituting the wrapper again must not wrap the wrapper.
        let again = substitute(QUERY_INTERFACE_EXPORT, proc);
        assert_eq!(again, proc);
    }
}

//! Forwarders generated from the export listings under `exports/`.
//!
//! The listings only carry names, not signatures, so each export is a naked stub: it spills
//! the argument registers, asks [`generic_export_address`] for the target, restores the
//! registers and jumps. The target sees exactly the frame the caller built.
use std::ffi::c_void;

use super::{ForwardSlot, FORWARDER};

macro_rules! generic_exports {
    ($($index:literal => $name:ident,)*) => {
        const GENERIC_EXPORT_COUNT: usize = [$(stringify!($name)),*].len();

        /// One slot per listed export, in listing (sorted) order.
        pub static GENERIC_EXPORTS: [ForwardSlot; GENERIC_EXPORT_COUNT] = [
            $(ForwardSlot::new(concat!(stringify!($name), "\0")),)*
        ];

        #[cfg(all(windows, target_arch = "x86_64"))]
        mod stubs {
            $(naked_forwarder!($index, $name);)*
        }
    };
}

#[cfg(all(windows, target_arch = "x86_64"))]
macro_rules! naked_forwarder {
    ($index:literal, $name:ident) => {
        #[no_mangle]
        #[unsafe(naked)]
        pub unsafe extern "system" fn $name() {
            // Entry rsp is 8 mod 16. Four pushes plus 0x68 bytes realigns it for the call and
            // leaves room for the 0x20 shadow space and the four vector argument registers.
            core::arch::naked_asm!(
                "push rcx",
                "push rdx",
                "push r8",
                "push r9",
                "sub rsp, 0x68",
                "movdqu [rsp + 0x20], xmm0",
                "movdqu [rsp + 0x30], xmm1",
                "movdqu [rsp + 0x40], xmm2",
                "movdqu [rsp + 0x50], xmm3",
                "mov ecx, {index}",
                "call {resolve}",
                "movdqu xmm0, [rsp + 0x20]",
                "movdqu xmm1, [rsp + 0x30]",
                "movdqu xmm2, [rsp + 0x40]",
                "movdqu xmm3, [rsp + 0x50]",
                "add rsp, 0x68",
                "pop r9",
                "pop r8",
                "pop rdx",
                "pop rcx",
                "jmp rax",
                index = const $index,
                resolve = sym super::generic_export_address,
            );
        }
    };
}

include!(concat!(env!("OUT_DIR"), "/generic_exports.rs"));

/// Target of the listed export at `index`. Null for an index outside the table or an export
/// the resolved module lacks, in which case the stub faults on the jump.
#[cfg_attr(not(all(windows, target_arch = "x86_64")), allow(dead_code))]
extern "system" fn generic_export_address(index: u32) -> *const c_void {
    match GENERIC_EXPORTS.get(index as usize) {
        Some(slot) => slot.address(&FORWARDER),
        None => std::ptr::null(),
    }
}

/// Table index of a listed export.
pub fn generic_export_index(name: &str) -> Option<usize> {
    GENERIC_EXPORTS
        .binary_search_by(|slot| slot.name().to_bytes().cmp(name.as_bytes()))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listings_are_merged_sorted_and_unique() {
        assert!(GENERIC_EXPORTS
            .windows(2)
            .all(|pair| pair[0].name() < pair[1].name()));
    }

    #[test]
    fn every_system_library_contributes() {
        for name in ["GetFileVersionInfoW", "WinHttpOpen", "MiniDumpWriteDump", "SymInitialize"] {
            assert!(generic_export_index(name).is_some(), "{name} missing");
        }
        assert_eq!(generic_export_index("NVSDK_NGX_D3D12_Init"), None);
    }

    #[test]
    fn newer_entry_points_are_forwarded() {
        for name in [
            "WinHttpReadDataEx",
            "WinHttpQueryHeadersEx",
            "WinHttpAddRequestHeadersEx",
            "WinHttpWebSocketReceive",
            "SymFromIndex",
            "SymEnumerateModules64",
            "SymSrvGetFileIndexInfoW",
            "StackWalk2",
        ] {
            assert!(generic_export_index(name).is_some(), "{name} missing");
        }
    }

    #[test]
    fn out_of_range_index_has_no_target() {
        assert!(generic_export_address(GENERIC_EXPORT_COUNT as u32).is_null());
    }
}

//! Drop-in stand-in for NVIDIA's `nvngx.dll`, and a generic forwarding proxy for a handful of
//! system libraries.
//!
//! The same binary behaves differently depending on the file name it was loaded under:
//!
//! * `nvngx.dll`: every NGX entry point forwards to the real NGX core (`_nvngx.dll`) located via
//!   the driver's registry keys.
//! * `dbghelp.dll`, `winhttp.dll`, `version.dll`: every listed export forwards to the genuine copy
//!   in the system directory.
//! * anything else: exports forward into the host executable.
//!
//! On top of the forwarding, lookups into NvAPI are intercepted so the reported GPU architecture
//! is never below the minimum the upscaler requires.
#![allow(non_snake_case)]

#[cfg(all(windows, not(target_arch = "x86_64")))]
compile_error!("the NGX runtime only exists for 64-bit Windows");

pub mod config;
pub mod debugger;
pub mod error;
pub mod forward;
pub mod identity;
pub mod intercept;
pub mod logger;
pub mod ngx;
pub mod nvapi;
pub mod resolver;

#[cfg(windows)]
mod dll;
#[cfg(windows)]
pub mod hooks;

#[cfg(windows)]
use windows::Win32::Foundation::{BOOL, HINSTANCE};

#[cfg(windows)]
#[no_mangle]
pub extern "system" fn DllMain(
    hinst_dll: HINSTANCE,
    fdw_reason: u32,
    lpv_reserved: *mut std::ffi::c_void,
) -> BOOL {
    BOOL(dll::dll_main(hinst_dll, fdw_reason, lpv_reserved))
}

use std::ffi::c_void;

use anyhow::Context;
use windows::Win32::Foundation::HINSTANCE;
use windows::Win32::System::SystemServices::{
    DLL_PROCESS_ATTACH, DLL_PROCESS_DETACH, DLL_THREAD_ATTACH, DLL_THREAD_DETACH,
};

use crate::config::CONFIG;
use crate::forward::FORWARDER;
use crate::{debugger, hooks, identity, intercept, logger, resolver};

pub fn dll_main(_hinst_dll: HINSTANCE, fdw_reason: u32, _lpv_reserved: *mut c_void) -> i32 {
    match fdw_reason {
        DLL_PROCESS_ATTACH => {
            // Failing the attach would take the host process down with us; keep loading and let
            // forwarded calls report what is missing.
            if let Err(e) = dll_attach() {
                log::error!("initialisation failed: {e:#}");
            }
        }
        DLL_PROCESS_DETACH => log::logger().flush(),

        DLL_THREAD_ATTACH => {}
        DLL_THREAD_DETACH => {}

        _ => return 0,
    }

    1
}

/// Called upon DLL attach. Only cheap work happens here unless eager resolution was asked
/// for: loading other libraries under the loader lock is not safe.
fn dll_attach() -> anyhow::Result<()> {
    logger::init(&CONFIG);
    debugger::launch_if_requested(CONFIG.debugger.as_ref());

    let identity = identity::current();
    log::info!(
        "loaded as {} ({:?})",
        identity.path.display(),
        identity.role
    );

    FORWARDER.set_resolver(resolver::resolved_module);
    FORWARDER.set_interceptor(intercept::substitute);

    if identity.role.aggressive_hooking() {
        hooks::install_process_wide().context("Failed to detour GetProcAddress")?;
    }

    FORWARDER.initialize(CONFIG.init_timing);
    Ok(())
}

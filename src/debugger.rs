//! Optional just-in-time debugger launch at process start.
//!
//! Driven by `NGX_SHIM_DEBUGGER_CMDLINE` and `NGX_SHIM_DEBUGGER_TARGET`. If either is missing
//! the feature stays off without a word.

use std::time::{Duration, Instant};

/// How long to wait for the spawned debugger to attach.
pub const ATTACH_TIMEOUT: Duration = Duration::from_secs(30);

#[cfg(windows)]
const ATTACH_POLL: Duration = Duration::from_millis(100);

/// A debugger launch request taken from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebuggerLaunch {
    /// Command line to spawn. `{pid}` is replaced with the current process id.
    pub command_line: String,
    /// Executable file name the request applies to, or `*` for any process.
    pub target: String,
}

impl DebuggerLaunch {
    /// Build a request from the two raw variable values. Both must be present and non-empty.
    pub fn from_vars(command_line: Option<String>, target: Option<String>) -> Option<Self> {
        let command_line = command_line.filter(|s| !s.trim().is_empty())?;
        let target = target.filter(|s| !s.trim().is_empty())?;

        Some(Self {
            command_line: command_line.trim().to_owned(),
            target: target.trim().to_owned(),
        })
    }

    /// Whether the request names the executable `exe_file_name`.
    pub fn applies_to(&self, exe_file_name: &str) -> bool {
        self.target == "*" || self.target.eq_ignore_ascii_case(exe_file_name)
    }

    pub fn expand(&self, pid: u32) -> String {
        self.command_line.replace("{pid}", &pid.to_string())
    }
}

/// Poll `is_present` until it reports an attached debugger or `timeout` runs out.
pub fn wait_for_debugger(
    is_present: impl Fn() -> bool,
    timeout: Duration,
    poll: Duration,
) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if is_present() {
            return true;
        }
        let now = Instant::now();
        if now >= deadline {
            return false;
        }
        std::thread::sleep(poll.min(deadline - now));
    }
}

/// Spawn the configured debugger and give it a bounded amount of time to attach.
///
/// Runs from `DllMain`, so the wait holds the loader lock: other threads that load or unload
/// modules stall until the debugger attaches or [`ATTACH_TIMEOUT`] passes. Attaching only
/// needs the debuggee's PEB flag, which does not take the lock.
#[cfg(windows)]
pub fn launch_if_requested(launch: Option<&DebuggerLaunch>) {
    use std::os::windows::process::CommandExt;
    use windows::Win32::System::Diagnostics::Debug::IsDebuggerPresent;

    let Some(launch) = launch else {
        return;
    };

    let exe_name = std::env::current_exe()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_default();

    if !launch.applies_to(&exe_name) {
        return;
    }

    let command_line = launch.expand(std::process::id());
    log::info!("launching debugger: {command_line}");

    if let Err(e) = std::process::Command::new("cmd.exe")
        .arg("/C")
        .raw_arg(&command_line)
        .spawn()
    {
        log::warn!("failed to launch debugger: {e}");
        return;
    }

    let present = || unsafe { IsDebuggerPresent() }.as_bool();
    if wait_for_debugger(present, ATTACH_TIMEOUT, ATTACH_POLL) {
        log::info!("debugger attached");
    } else {
        log::warn!("debugger did not attach within {ATTACH_TIMEOUT:?}");
    }
}

//! Logging backend.
//!
//! Records go to the debugger output stream (`OutputDebugStringW`), which is visible in any
//! attached debugger or DebugView without touching the host's console. An optional log file
//! can be added through `NGX_SHIM_LOG_FILE`.
use std::fs::File;

use log::{LevelFilter, Log, Metadata, Record};
use simplelog::{CombinedLogger, Config, SharedLogger, WriteLogger};

use crate::config::ShimConfig;

/// Prefix on every debug-string line, so our output can be filtered from the host's.
const LINE_PREFIX: &str = "[nvngx]";

pub struct DebugStringLogger {
    level: LevelFilter,
    config: Config,
}

impl DebugStringLogger {
    pub fn new(level: LevelFilter) -> Box<Self> {
        Box::new(Self {
            level,
            config: Config::default(),
        })
    }
}

/// Format a record as a single debug-string line.
pub fn format_record(record: &Record) -> String {
    // OutputDebugString does not append newlines.
    format!(
        "{LINE_PREFIX} {:<5} {}: {}\n",
        record.level(),
        record.target(),
        record.args()
    )
}

fn output_debug_string(line: &str) {
    #[cfg(windows)]
    {
        use windows::core::PCWSTR;
        use windows::Win32::System::Diagnostics::Debug::OutputDebugStringW;

        let wstr = widestring::U16CString::from_str_truncate(line);
        unsafe { OutputDebugStringW(PCWSTR(wstr.as_ptr())) }
    }

    #[cfg(not(windows))]
    eprint!("{line}");
}

impl Log for DebugStringLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            output_debug_string(&format_record(record));
        }
    }

    fn flush(&self) {}
}

impl SharedLogger for DebugStringLogger {
    fn level(&self) -> LevelFilter {
        self.level
    }

    fn config(&self) -> Option<&Config> {
        Some(&self.config)
    }

    fn as_log(self: Box<Self>) -> Box<dyn Log> {
        Box::new(*self)
    }
}

/// Install the process logger. Calling this more than once is harmless.
pub fn init(config: &ShimConfig) {
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![DebugStringLogger::new(config.log_level)];
    let mut file_error = None;

    if let Some(path) = &config.log_file {
        match File::create(path) {
            Ok(file) => loggers.push(WriteLogger::new(config.log_level, Config::default(), file)),
            Err(e) => file_error = Some(format!("cannot create {}: {e}", path.display())),
        }
    }

    if CombinedLogger::init(loggers).is_err() {
        // Already installed.
        return;
    }

    if let Some(e) = file_error {
        log::warn!("{e}");
    }
    for warning in &config.warnings {
        log::warn!("{warning}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_is_a_single_prefixed_line() {
        let line = format_record(
            &Record::builder()
                .level(log::Level::Warn)
                .target("nvngx::resolver")
                .args(format_args!("failed to load {}", "_nvngx.dll"))
                .build(),
        );

        assert_eq!(line, "[nvngx] WARN  nvngx::resolver: failed to load _nvngx.dll\n");
    }

    #[test]
    fn level_filter_is_respected() {
        let logger = DebugStringLogger::new(LevelFilter::Info);

        assert!(logger.enabled(&Metadata::builder().level(log::Level::Error).build()));
        assert!(!logger.enabled(&Metadata::builder().level(log::Level::Debug).build()));
    }
}

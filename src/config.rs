//! Process-wide settings, read once from the environment.
use std::path::PathBuf;

use lazy_static::lazy_static;
use log::LevelFilter;

use crate::debugger::DebuggerLaunch;
use crate::forward::InitTiming;
use crate::nvapi::ArchPolicy;

// Environment variable names.
pub const LOG_LEVEL_VAR: &str = "NGX_SHIM_LOG_LEVEL";
pub const LOG_FILE_VAR: &str = "NGX_SHIM_LOG_FILE";
pub const EAGER_INIT_VAR: &str = "NGX_SHIM_EAGER_INIT";
pub const MIN_ARCH_VAR: &str = "NGX_SHIM_MIN_ARCH";
pub const MIN_IMPL_VAR: &str = "NGX_SHIM_MIN_IMPL";
pub const ARCH_SENTINEL_VAR: &str = "NGX_SHIM_ARCH_SENTINEL";
pub const DEBUGGER_CMDLINE_VAR: &str = "NGX_SHIM_DEBUGGER_CMDLINE";
pub const DEBUGGER_TARGET_VAR: &str = "NGX_SHIM_DEBUGGER_TARGET";

lazy_static! {
    pub static ref CONFIG: ShimConfig = ShimConfig::from_env();
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShimConfig {
    pub log_level: LevelFilter,
    pub log_file: Option<PathBuf>,
    pub init_timing: InitTiming,
    pub arch_policy: ArchPolicy,
    pub debugger: Option<DebuggerLaunch>,
    /// Problems found while parsing. Logged once the logger is up.
    pub warnings: Vec<String>,
}

impl Default for ShimConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_file: None,
            init_timing: InitTiming::Lazy,
            arch_policy: ArchPolicy::default(),
            debugger: None,
            warnings: Vec::new(),
        }
    }
}

fn default_log_level() -> LevelFilter {
    if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

/// Parse a decimal or `0x`-prefixed hexadecimal integer.
fn parse_u32(value: &str) -> Option<u32> {
    let value = value.trim();
    match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => value.parse().ok(),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

impl ShimConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(level) = lookup(LOG_LEVEL_VAR) {
            match level.trim().parse::<LevelFilter>() {
                Ok(level) => config.log_level = level,
                Err(_) => config
                    .warnings
                    .push(format!("{LOG_LEVEL_VAR}: unknown level `{level}`")),
            }
        }

        config.log_file = lookup(LOG_FILE_VAR)
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        if let Some(eager) = lookup(EAGER_INIT_VAR) {
            match parse_bool(&eager) {
                Some(true) => config.init_timing = InitTiming::Eager,
                Some(false) => {}
                None => config
                    .warnings
                    .push(format!("{EAGER_INIT_VAR}: expected a boolean, got `{eager}`")),
            }
        }

        for (var, field) in [
            (MIN_ARCH_VAR, &mut config.arch_policy.minimum_architecture),
            (MIN_IMPL_VAR, &mut config.arch_policy.minimum_implementation),
        ] {
            if let Some(value) = lookup(var) {
                match parse_u32(&value) {
                    Some(v) => *field = v,
                    None => config
                        .warnings
                        .push(format!("{var}: expected an integer, got `{value}`")),
                }
            }
        }

        if let Some(value) = lookup(ARCH_SENTINEL_VAR) {
            if value.trim().eq_ignore_ascii_case("none") {
                config.arch_policy.sentinel_floor = None;
            } else {
                match parse_u32(&value) {
                    Some(v) => config.arch_policy.sentinel_floor = Some(v),
                    None => config
                        .warnings
                        .push(format!("{ARCH_SENTINEL_VAR}: expected an integer or `none`, got `{value}`")),
                }
            }
        }

        config.debugger =
            DebuggerLaunch::from_vars(lookup(DEBUGGER_CMDLINE_VAR), lookup(DEBUGGER_TARGET_VAR));

        config
    }
}

//! Error types for module resolution and hook installation.
use std::path::PathBuf;

use thiserror::Error;

/// Why the real implementation module could not be loaded.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Neither registry key nor the adjacent file produced a loadable NGX core.
    #[error("the NVIDIA NGX core could not be located; is a recent NVIDIA driver installed?")]
    NotInstalled,

    #[error("failed to load {}", .path.display())]
    Load {
        path: PathBuf,
        #[cfg(windows)]
        #[source]
        source: libloading::Error,
    },

    #[cfg(windows)]
    #[error("failed to open the host executable image")]
    HostImage(#[source] libloading::Error),

    #[cfg(windows)]
    #[error("failed to query a module path")]
    ModulePath(#[from] windows::core::Error),
}

/// Why an interception hook could not be put in place.
#[derive(Debug, Error)]
pub enum HookError {
    #[error("`{0}` is not imported by the module")]
    ImportNotFound(&'static str),

    #[error("`{0}` could not be located in the system libraries")]
    ExportNotFound(&'static str),

    #[cfg(windows)]
    #[error("failed to parse the module's PE headers")]
    Pe(#[from] pelite::Error),

    #[cfg(windows)]
    #[error("failed to change page protection")]
    Protect(#[from] region::Error),

    #[cfg(windows)]
    #[error("failed to install detour")]
    Detour(#[from] retour::Error),

    #[cfg(windows)]
    #[error(transparent)]
    Windows(#[from] windows::core::Error),
}

//! Which library this DLL is currently standing in for, decided from its own file name.
use std::path::PathBuf;
#[cfg(windows)]
use std::sync::OnceLock;

/// File name under which we replace the NGX core.
pub const NGX_CORE_NAME: &str = "nvngx.dll";

/// System libraries we can stand in for. The genuine copy is loaded from the system directory.
pub const SYSTEM_LIBRARY_NAMES: &[&str] = &["dbghelp.dll", "winhttp.dll", "version.dll"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleRole {
    /// Loaded as `nvngx.dll`; forward to the driver's NGX core.
    NgxCore,
    /// Loaded under a system library's name; forward to the genuine one.
    SystemLibrary(&'static str),
    /// Loaded under any other name; forward to the host executable.
    HostImage,
}

/// Final path component of a Windows or POSIX path.
pub fn file_name_of(path: &str) -> &str {
    path.rsplit(['\\', '/']).next().unwrap_or(path)
}

impl ModuleRole {
    /// Classify a module by its file name (or full path), ignoring case.
    pub fn classify(path: &str) -> Self {
        let file_name = file_name_of(path);

        if file_name.eq_ignore_ascii_case(NGX_CORE_NAME) {
            return Self::NgxCore;
        }

        SYSTEM_LIBRARY_NAMES
            .iter()
            .find(|name| file_name.eq_ignore_ascii_case(name))
            .map_or(Self::HostImage, |name| Self::SystemLibrary(name))
    }

    /// Whether lookups process-wide should go through interception, rather than only those
    /// made by the resolved NGX core.
    pub fn aggressive_hooking(self) -> bool {
        !matches!(self, Self::NgxCore)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleIdentity {
    pub path: PathBuf,
    pub role: ModuleRole,
}

impl ModuleIdentity {
    pub fn new(path: PathBuf) -> Self {
        let role = ModuleRole::classify(&path.to_string_lossy());
        Self { path, role }
    }
}

#[cfg(windows)]
mod os {
    use std::ffi::OsString;
    use std::os::windows::ffi::OsStringExt;
    use std::path::PathBuf;

    use windows::core::PCWSTR;
    use windows::Win32::Foundation::HMODULE;
    use windows::Win32::System::LibraryLoader::{
        GetModuleFileNameW, GetModuleHandleExW, GET_MODULE_HANDLE_EX_FLAG_FROM_ADDRESS,
        GET_MODULE_HANDLE_EX_FLAG_UNCHANGED_REFCOUNT,
    };

    /// Handle of the module containing this code. Works before any initialisation has run.
    pub fn own_module() -> windows::core::Result<HMODULE> {
        let mut module = HMODULE::default();
        unsafe {
            GetModuleHandleExW(
                GET_MODULE_HANDLE_EX_FLAG_FROM_ADDRESS | GET_MODULE_HANDLE_EX_FLAG_UNCHANGED_REFCOUNT,
                PCWSTR(own_module as *const u16),
                &mut module,
            )?;
        }
        Ok(module)
    }

    /// Full path of a loaded module.
    pub fn module_file_name(module: HMODULE) -> windows::core::Result<PathBuf> {
        let mut buf = vec![0u16; 260];
        loop {
            let len = unsafe { GetModuleFileNameW(module, &mut buf) } as usize;
            if len == 0 {
                return Err(windows::core::Error::from_win32());
            }
            if len < buf.len() {
                buf.truncate(len);
                return Ok(PathBuf::from(OsString::from_wide(&buf)));
            }
            buf.resize(buf.len() * 2, 0);
        }
    }
}

#[cfg(windows)]
pub use os::{module_file_name, own_module};

#[cfg(windows)]
static IDENTITY: OnceLock<ModuleIdentity> = OnceLock::new();

/// This module's identity, computed on first use.
#[cfg(windows)]
pub fn current() -> &'static ModuleIdentity {
    IDENTITY.get_or_init(|| {
        let identity = own_module().and_then(module_file_name).map(ModuleIdentity::new);

        identity.unwrap_or_else(|e| {
            log::warn!("cannot determine own file name ({e}); forwarding to the host image");
            ModuleIdentity {
                path: PathBuf::new(),
                role: ModuleRole::HostImage,
            }
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ngx_core_name_is_matched_case_insensitively() {
        for path in [
            "nvngx.dll",
            "NVNGX.DLL",
            r"C:\Games\Cyberpunk 2077\bin\x64\nvngx.dll",
            "C:/Games/NvNgx.Dll",
        ] {
            assert_eq!(ModuleRole::classify(path), ModuleRole::NgxCore, "{path}");
        }
    }

    #[test]
    fn system_libraries_keep_their_canonical_name() {
        assert_eq!(
            ModuleRole::classify(r"D:\game\VERSION.dll"),
            ModuleRole::SystemLibrary("version.dll")
        );
        assert_eq!(
            ModuleRole::classify("winhttp.dll"),
            ModuleRole::SystemLibrary("winhttp.dll")
        );
        assert_eq!(
            ModuleRole::classify("DbgHelp.dll"),
            ModuleRole::SystemLibrary("dbghelp.dll")
        );
    }

    #[test]
    fn anything_else_forwards_to_the_host() {
        for path in ["", "dlssg_to_fsr3.dll", r"C:\nvngx.dll\other.dll", "_nvngx.dll", "nvngx.dll.bak"] {
            assert_eq!(ModuleRole::classify(path), ModuleRole::HostImage, "{path}");
        }
    }

    #[test]
    fn only_the_ngx_core_disables_aggressive_hooking() {
        assert!(!ModuleRole::NgxCore.aggressive_hooking());
        assert!(ModuleRole::SystemLibrary("version.dll").aggressive_hooking());
        assert!(ModuleRole::HostImage.aggressive_hooking());
    }

    #[test]
    fn identity_is_derived_from_the_path() {
        let identity = ModuleIdentity::new(PathBuf::from(r"C:\Games\bin\WinHTTP.dll"));
        assert_eq!(identity.role, ModuleRole::SystemLibrary("winhttp.dll"));
        assert_eq!(identity.path, PathBuf::from(r"C:\Games\bin\WinHTTP.dll"));
    }
}

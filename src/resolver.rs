//! Locating and loading the module forwarded calls go to.
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// File name of the real NGX core inside the driver's NGX directory.
pub const NGX_CORE_LIBRARY: &str = "_nvngx.dll";

/// Registry locations holding the NGX install directory, in the order they are tried.
pub const NGX_REGISTRY_KEYS: &[(&str, &str)] = &[
    (r"SYSTEM\CurrentControlSet\Services\nvlddmkm\NGXCore", "NGXPath"),
    (r"SOFTWARE\NVIDIA Corporation\Global\NGXCore", "FullPath"),
];

/// Where the NGX core may live: each registry entry that is set, in order, then next to
/// `own_path`. `registry` reads one `HKLM` string value.
pub fn ngx_core_candidates(
    registry: impl Fn(&str, &str) -> Option<OsString>,
    own_path: &Path,
) -> Vec<PathBuf> {
    let mut candidates: Vec<PathBuf> = NGX_REGISTRY_KEYS
        .iter()
        .filter_map(|(key, value)| {
            let dir = registry(key, value);
            if dir.is_none() {
                log::debug!(r"HKLM\{key}\{value} is not set");
            }
            dir
        })
        .map(|dir| PathBuf::from(dir).join(NGX_CORE_LIBRARY))
        .collect();

    if let Some(dir) = own_path.parent() {
        candidates.push(dir.join(NGX_CORE_LIBRARY));
    }

    candidates
}

#[cfg(windows)]
mod os {
    use std::ffi::{c_void, CStr, OsString};
    use std::os::windows::ffi::OsStringExt;
    use std::path::{Path, PathBuf};
    use std::sync::OnceLock;

    use libloading::os::windows::Library;
    use widestring::{U16CStr, U16CString};
    use windows::core::{PCSTR, PCWSTR};
    use windows::Win32::Foundation::{HMODULE, HWND};
    use windows::Win32::System::LibraryLoader::GetProcAddress;
    use windows::Win32::System::Registry::{RegGetValueW, HKEY_LOCAL_MACHINE, RRF_RT_REG_SZ};
    use windows::Win32::System::SystemInformation::GetSystemDirectoryW;
    use windows::Win32::UI::WindowsAndMessaging::{MessageBoxW, MB_ICONERROR, MB_OK};

    use super::ngx_core_candidates;
    use crate::error::ResolveError;
    use crate::forward::SymbolSource;
    use crate::hooks;
    use crate::identity::{self, ModuleIdentity, ModuleRole};

    const FATAL_CAPTION: &str = "NGX shim";

    /// A loaded module. It is never unloaded.
    pub struct ResolvedModule {
        module: HMODULE,
        pub path: PathBuf,
    }

    // SAFETY: a module handle is a plain address, usable from any thread.
    unsafe impl Send for ResolvedModule {}
    unsafe impl Sync for ResolvedModule {}

    impl ResolvedModule {
        fn new(library: Library, path: PathBuf) -> Self {
            Self {
                module: HMODULE(library.into_raw() as isize),
                path,
            }
        }

        /// Base address of the loaded image.
        pub fn base(&self) -> usize {
            self.module.0 as usize
        }
    }

    impl SymbolSource for ResolvedModule {
        fn symbol(&self, name: &CStr) -> Option<*const c_void> {
            let proc = unsafe { GetProcAddress(self.module, PCSTR(name.as_ptr().cast())) }?;
            Some(proc as *const c_void)
        }

        fn describe(&self) -> String {
            if self.path.as_os_str().is_empty() {
                format!("module {:#x}", self.base())
            } else {
                self.path.display().to_string()
            }
        }
    }

    /// Read a `REG_SZ` value under `HKEY_LOCAL_MACHINE`.
    pub fn read_registry_string(key: &str, value: &str) -> Option<OsString> {
        let key = U16CString::from_str(key).ok()?;
        let value = U16CString::from_str(value).ok()?;
        let (key, value) = (PCWSTR(key.as_ptr()), PCWSTR(value.as_ptr()));

        let mut size = 0u32;
        let status = unsafe {
            RegGetValueW(
                HKEY_LOCAL_MACHINE,
                key,
                value,
                RRF_RT_REG_SZ,
                None,
                None,
                Some(&mut size as *mut u32),
            )
        };
        if status.is_err() || size == 0 {
            return None;
        }

        let mut buf = vec![0u16; (size as usize).div_ceil(2)];
        let status = unsafe {
            RegGetValueW(
                HKEY_LOCAL_MACHINE,
                key,
                value,
                RRF_RT_REG_SZ,
                None,
                Some(buf.as_mut_ptr().cast()),
                Some(&mut size as *mut u32),
            )
        };
        if status.is_err() {
            return None;
        }

        let text = U16CStr::from_slice_truncate(&buf).ok()?;
        (!text.is_empty()).then(|| text.to_os_string())
    }

    pub fn system_directory() -> Result<PathBuf, ResolveError> {
        let mut buf = vec![0u16; 260];
        loop {
            let len = unsafe { GetSystemDirectoryW(Some(&mut buf)) } as usize;
            if len == 0 {
                return Err(windows::core::Error::from_win32().into());
            }
            if len < buf.len() {
                buf.truncate(len);
                return Ok(PathBuf::from(OsString::from_wide(&buf)));
            }
            buf.resize(len + 1, 0);
        }
    }

    fn load(path: &Path) -> Result<Library, ResolveError> {
        log::debug!("loading {}", path.display());
        unsafe { Library::new(path) }.map_err(|source| ResolveError::Load {
            path: path.to_path_buf(),
            source,
        })
    }

    fn resolve_ngx_core(identity: &ModuleIdentity) -> Result<ResolvedModule, ResolveError> {
        for path in ngx_core_candidates(read_registry_string, &identity.path) {
            match load(&path) {
                Ok(library) => {
                    let module = ResolvedModule::new(library, path);
                    // SAFETY: the module is never unloaded.
                    if let Err(e) = unsafe { hooks::patch_module_imports(module.base()) } {
                        log::warn!("NvAPI lookups of {} are not intercepted: {e}", module.describe());
                    }
                    return Ok(module);
                }
                Err(e) => log::warn!("{e}"),
            }
        }

        Err(ResolveError::NotInstalled)
    }

    /// Load the module calls should be forwarded to, based on the role this DLL is playing.
    pub fn resolve_target(identity: &ModuleIdentity) -> Result<ResolvedModule, ResolveError> {
        match identity.role {
            ModuleRole::NgxCore => resolve_ngx_core(identity),
            ModuleRole::SystemLibrary(name) => {
                let path = system_directory()?.join(name);
                let library = load(&path)?;
                Ok(ResolvedModule::new(library, path))
            }
            ModuleRole::HostImage => {
                let library = Library::this().map_err(ResolveError::HostImage)?;
                let path = std::env::current_exe().unwrap_or_default();
                Ok(ResolvedModule::new(library, path))
            }
        }
    }

    /// Show a blocking error dialog. Used only when nothing can be forwarded.
    pub fn report_fatal(error: &ResolveError) {
        let text = U16CString::from_str_truncate(error.to_string());
        let caption = U16CString::from_str_truncate(FATAL_CAPTION);
        unsafe {
            MessageBoxW(
                HWND(0),
                PCWSTR(text.as_ptr()),
                PCWSTR(caption.as_ptr()),
                MB_ICONERROR | MB_OK,
            );
        }
    }

    static RESOLVED: OnceLock<Option<ResolvedModule>> = OnceLock::new();

    /// The forwarding target, resolved on first call.
    pub fn resolved_module() -> Option<&'static dyn SymbolSource> {
        let resolved = RESOLVED.get_or_init(|| {
            let identity = identity::current();
            match resolve_target(identity) {
                Ok(module) => {
                    log::info!(
                        "{} ({:?}) forwards to {}",
                        identity.path.display(),
                        identity.role,
                        module.describe()
                    );
                    Some(module)
                }
                Err(e) => {
                    log::error!("{:#}", anyhow::Error::new(e));
                    if identity.role == ModuleRole::NgxCore {
                        report_fatal(&ResolveError::NotInstalled);
                    }
                    None
                }
            }
        });

        resolved.as_ref().map(|module| module as &dyn SymbolSource)
    }
}

#[cfg(windows)]
pub use os::{
    read_registry_string, report_fatal, resolve_target, resolved_module, system_directory,
    ResolvedModule,
};

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    const OWN_PATH: &str = "C:/Games/bin/nvngx.dll";

    fn adjacent() -> PathBuf {
        Path::new("C:/Games/bin").join(NGX_CORE_LIBRARY)
    }

    #[test]
    fn registry_keys_come_first_then_the_adjacent_file() {
        let candidates = ngx_core_candidates(
            |key, value| match value {
                "NGXPath" => Some(format!("D:/primary/{}", key.len()).into()),
                "FullPath" => Some("D:/fallback".into()),
                _ => None,
            },
            Path::new(OWN_PATH),
        );

        let primary_key_len = NGX_REGISTRY_KEYS[0].0.len();
        assert_eq!(
            candidates,
            [
                PathBuf::from(format!("D:/primary/{primary_key_len}")).join(NGX_CORE_LIBRARY),
                PathBuf::from("D:/fallback").join(NGX_CORE_LIBRARY),
                adjacent(),
            ]
        );
    }

    #[test]
    fn keys_are_queried_primary_then_fallback() {
        let queried = RefCell::new(Vec::new());
        ngx_core_candidates(
            |key, value| {
                queried.borrow_mut().push((key.to_owned(), value.to_owned()));
                None
            },
            Path::new(OWN_PATH),
        );

        assert_eq!(
            *queried.borrow(),
            [
                (r"SYSTEM\CurrentControlSet\Services\nvlddmkm\NGXCore".to_owned(), "NGXPath".to_owned()),
                (r"SOFTWARE\NVIDIA Corporation\Global\NGXCore".to_owned(), "FullPath".to_owned()),
            ]
        );
    }

    #[test]
    fn missing_keys_are_skipped() {
        let only_fallback = ngx_core_candidates(
            |_, value| (value == "FullPath").then(|| "D:/fallback".into()),
            Path::new(OWN_PATH),
        );
        assert_eq!(
            only_fallback,
            [PathBuf::from("D:/fallback").join(NGX_CORE_LIBRARY), adjacent()]
        );

        let neither = ngx_core_candidates(|_, _| None, Path::new(OWN_PATH));
        assert_eq!(neither, [adjacent()]);
    }

    #[test]
    fn unknown_own_path_leaves_only_the_registry() {
        let candidates = ngx_core_candidates(|_, _| Some("D:/ngx".into()), Path::new(""));
        assert_eq!(
            candidates,
            [
                PathBuf::from("D:/ngx").join(NGX_CORE_LIBRARY),
                PathBuf::from("D:/ngx").join(NGX_CORE_LIBRARY),
            ]
        );
    }
}

#[cfg(all(test, windows))]
mod windows_tests {
    use windows::core::PCWSTR;
    use windows::Win32::System::LibraryLoader::GetModuleHandleW;

    use super::*;
    use crate::forward::SymbolSource;
    use crate::identity::{ModuleIdentity, ModuleRole};

    #[test]
    fn system_library_role_loads_the_genuine_copy() {
        let identity = ModuleIdentity::new(PathBuf::from(r"C:\Games\bin\version.dll"));
        assert_eq!(identity.role, ModuleRole::SystemLibrary("version.dll"));

        let module = resolve_target(&identity).unwrap();
        assert_eq!(module.path, system_directory().unwrap().join("version.dll"));
        assert!(module.symbol(c"GetFileVersionInfoW").is_some());
        assert!(module.symbol(c"NVSDK_NGX_D3D12_Init").is_none());
    }

    #[test]
    fn host_image_role_resolves_the_executable() {
        let identity = ModuleIdentity::new(PathBuf::from(r"C:\Games\bin\dxgi_shim.dll"));
        assert_eq!(identity.role, ModuleRole::HostImage);

        let module = resolve_target(&identity).unwrap();
        let exe = unsafe { GetModuleHandleW(PCWSTR::null()) }.unwrap();

        assert_eq!(module.base(), exe.0 as usize);
        assert_eq!(module.path, std::env::current_exe().unwrap());
        assert!(!module.describe().is_empty());
    }
}

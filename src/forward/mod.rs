//! The forwarding engine behind every exported stub.
//!
//! A [`ForwardModule`] answers "which loaded module do forwarded calls go to"; it asks its
//! resolver callback once and keeps the answer for the life of the process. A [`ForwardSlot`]
//! caches the address of one symbol inside that module, so a stub costs a single load after
//! its first call. Both are write-once: concurrent first callers block on the same
//! initialisation and observe the same result.
use std::ffi::{c_void, CStr};
use std::sync::OnceLock;

pub mod generic;

/// A loaded module forwarded exports can be resolved against.
pub trait SymbolSource: Send + Sync {
    /// Address of the export called `name`, if the module has one.
    fn symbol(&self, name: &CStr) -> Option<*const c_void>;

    /// Short description for diagnostics (usually the module path).
    fn describe(&self) -> String;
}

/// Supplies the module forwarded calls go to. Called at most once per [`ForwardModule`].
pub type ResolverFn = fn() -> Option<&'static dyn SymbolSource>;

/// Gets a chance to substitute each symbol the first time it is resolved.
pub type InterceptorFn = fn(&CStr, *const c_void) -> *const c_void;

/// When the forwarding target is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitTiming {
    /// On the first forwarded call.
    Lazy,
    /// During process attach.
    Eager,
}

/// The module every stub in this DLL forwards to.
pub static FORWARDER: ForwardModule = ForwardModule::new();

pub struct ForwardModule {
    resolver: OnceLock<ResolverFn>,
    interceptor: OnceLock<InterceptorFn>,
    source: OnceLock<Option<&'static dyn SymbolSource>>,
}

impl Default for ForwardModule {
    fn default() -> Self {
        Self::new()
    }
}

impl ForwardModule {
    pub const fn new() -> Self {
        Self {
            resolver: OnceLock::new(),
            interceptor: OnceLock::new(),
            source: OnceLock::new(),
        }
    }

    /// Register the resolver. Only the first registration takes effect.
    pub fn set_resolver(&self, resolver: ResolverFn) -> bool {
        self.resolver.set(resolver).is_ok()
    }

    /// Register the symbol interceptor. Only the first registration takes effect.
    pub fn set_interceptor(&self, interceptor: InterceptorFn) -> bool {
        self.interceptor.set(interceptor).is_ok()
    }

    /// The resolved module, running the resolver if nobody has yet.
    pub fn source(&self) -> Option<&'static dyn SymbolSource> {
        let Some(resolve) = self.resolver.get() else {
            log::error!("forwarded call arrived before a resolver was registered");
            return None;
        };

        *self.source.get_or_init(|| {
            let source = resolve();
            match source {
                Some(source) => log::info!("forwarding to {}", source.describe()),
                None => log::error!("no module to forward to; forwarded calls will fault"),
            }
            source
        })
    }

    /// Resolve the target now if `timing` asks for it.
    pub fn initialize(&self, timing: InitTiming) {
        if timing == InitTiming::Eager {
            self.source();
        }
    }

    /// Look `name` up in the resolved module. Null when it cannot be found.
    fn lookup(&self, name: &CStr) -> *const c_void {
        let Some(source) = self.source() else {
            return std::ptr::null();
        };

        let Some(target) = source.symbol(name) else {
            log::error!("{} does not export {name:?}", source.describe());
            return std::ptr::null();
        };

        match self.interceptor.get() {
            Some(intercept) if !target.is_null() => intercept(name, target),
            _ => target,
        }
    }
}

/// Memoized address of one forwarded symbol.
pub struct ForwardSlot {
    name: &'static CStr,
    target: OnceLock<usize>,
}

impl ForwardSlot {
    /// `name` must carry its terminating nul.
    pub const fn new(name: &'static str) -> Self {
        let name = match CStr::from_bytes_with_nul(name.as_bytes()) {
            Ok(name) => name,
            Err(_) => panic!("export names must be nul-terminated"),
        };

        Self {
            name,
            target: OnceLock::new(),
        }
    }

    pub fn name(&self) -> &'static CStr {
        self.name
    }

    /// Address this slot forwards to, resolving it through `module` on first use.
    #[inline]
    pub fn address(&self, module: &ForwardModule) -> *const c_void {
        *self.target.get_or_init(|| {
            let target = module.lookup(self.name);
            log::debug!("resolved {:?} to {target:p}", self.name);
            target as usize
        }) as *const c_void
    }
}

/// Called by a stub whose target could not be resolved. There is no meaningful value to hand
/// back to a caller expecting the vendor ABI, so the process goes down here.
#[cold]
pub fn missing_export(name: &CStr) -> ! {
    log::error!("{name:?} has no forwarding target; aborting");
    log::logger().flush();
    std::process::abort()
}

/// Define C-ABI exports whose bodies forward every argument, unchanged, to the
/// identically-named symbol of a [`ForwardModule`].
///
/// ```ignore
/// forward_exports! {
///     crate::forward::FORWARDER;
///     fn NVSDK_NGX_D3D12_ReleaseFeature(handle: *mut NgxHandle) -> NgxResult;
/// }
/// ```
#[macro_export]
macro_rules! forward_exports {
    (
        $module:path;
        $(
            $(#[$attr:meta])*
            fn $name:ident($($arg:ident: $ty:ty),* $(,)?) -> $ret:ty;
        )*
    ) => {
        $(
            $(#[$attr])*
            #[no_mangle]
            pub unsafe extern "C" fn $name($($arg: $ty),*) -> $ret {
                type Target = unsafe extern "C" fn($($ty),*) -> $ret;

                static SLOT: $crate::forward::ForwardSlot =
                    $crate::forward::ForwardSlot::new(concat!(stringify!($name), "\0"));

                let address = SLOT.address(&$module);
                // SAFETY: an `Option` of a function pointer has the same layout as a raw pointer,
                // with null mapping to `None`. The signature is the vendor's.
                let target: Option<Target> = unsafe { ::std::mem::transmute(address) };
                match target {
                    Some(target) => unsafe { target($($arg),*) },
                    None => $crate::forward::missing_export(SLOT.name()),
                }
            }
        )*
    };
}

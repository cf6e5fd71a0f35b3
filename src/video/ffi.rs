//! Raw bindings for the libmpv client and render API.
//!
//! The library is opened at runtime via `libloading`, so the player builds
//! without mpv development files and reports a clear error when libmpv is
//! missing. Only the calls the player needs are bound.
//!
//! Reference: mpv `client.h`, `render.h`.

use std::ffi::{c_char, c_int, c_void, CStr};

use libloading::Library;

use crate::video::EngineError;

// ---------------------------------------------------------------------------
// Opaque handles
// ---------------------------------------------------------------------------

#[repr(C)]
pub struct MpvHandle {
    _private: [u8; 0],
}

#[repr(C)]
pub struct MpvRenderContext {
    _private: [u8; 0],
}

// ---------------------------------------------------------------------------
// Formats, events, render parameters
// ---------------------------------------------------------------------------

pub const MPV_FORMAT_STRING: c_int = 1;
pub const MPV_FORMAT_DOUBLE: c_int = 5;

pub const MPV_EVENT_NONE: c_int = 0;
pub const MPV_EVENT_SHUTDOWN: c_int = 1;
pub const MPV_EVENT_GET_PROPERTY_REPLY: c_int = 3;
pub const MPV_EVENT_PROPERTY_CHANGE: c_int = 22;

pub const MPV_RENDER_PARAM_INVALID: c_int = 0;
pub const MPV_RENDER_PARAM_API_TYPE: c_int = 1;
pub const MPV_RENDER_PARAM_SW_SIZE: c_int = 17;
pub const MPV_RENDER_PARAM_SW_FORMAT: c_int = 18;
pub const MPV_RENDER_PARAM_SW_STRIDE: c_int = 19;
pub const MPV_RENDER_PARAM_SW_POINTER: c_int = 20;

/// Returned by `mpv_render_context_update` when a new frame is ready.
pub const MPV_RENDER_UPDATE_FRAME: u64 = 1;

/// Software renderer, NUL-terminated.
pub const MPV_RENDER_API_TYPE_SW: &[u8] = b"sw\0";
/// Byte order R, G, B, padding. NUL-terminated.
pub const SW_FORMAT_RGB0: &[u8] = b"rgb0\0";

#[repr(C)]
pub struct MpvEvent {
    pub event_id: c_int,
    pub error: c_int,
    pub reply_userdata: u64,
    pub data: *mut c_void,
}

#[repr(C)]
pub struct MpvEventProperty {
    pub name: *const c_char,
    pub format: c_int,
    pub data: *mut c_void,
}

#[repr(C)]
pub struct MpvRenderParam {
    pub kind: c_int,
    pub data: *mut c_void,
}

impl MpvRenderParam {
    pub fn end() -> Self {
        Self {
            kind: MPV_RENDER_PARAM_INVALID,
            data: std::ptr::null_mut(),
        }
    }
}

pub type UpdateCallback = unsafe extern "C" fn(*mut c_void);

// ---------------------------------------------------------------------------
// Dynamically loaded library
// ---------------------------------------------------------------------------

macro_rules! symbol {
    ($lib:expr, $name:literal, $ty:ty) => {
        *$lib
            .get::<$ty>(concat!($name, "\0").as_bytes())
            .map_err(|source| EngineError::Symbol { name: $name, source })?
    };
}

/// Function table for one loaded libmpv. The `Library` is kept alive for as
/// long as the pointers are in use.
pub struct MpvLibrary {
    _lib: Library,
    pub create: unsafe extern "C" fn() -> *mut MpvHandle,
    pub initialize: unsafe extern "C" fn(*mut MpvHandle) -> c_int,
    pub set_option_string: unsafe extern "C" fn(*mut MpvHandle, *const c_char, *const c_char) -> c_int,
    pub command: unsafe extern "C" fn(*mut MpvHandle, *mut *const c_char) -> c_int,
    pub set_property_string: unsafe extern "C" fn(*mut MpvHandle, *const c_char, *const c_char) -> c_int,
    pub observe_property: unsafe extern "C" fn(*mut MpvHandle, u64, *const c_char, c_int) -> c_int,
    pub get_property_async: unsafe extern "C" fn(*mut MpvHandle, u64, *const c_char, c_int) -> c_int,
    pub wait_event: unsafe extern "C" fn(*mut MpvHandle, f64) -> *mut MpvEvent,
    pub wakeup: unsafe extern "C" fn(*mut MpvHandle),
    pub terminate_destroy: unsafe extern "C" fn(*mut MpvHandle),
    pub error_string: unsafe extern "C" fn(c_int) -> *const c_char,
    pub render_context_create:
        unsafe extern "C" fn(*mut *mut MpvRenderContext, *mut MpvHandle, *mut MpvRenderParam) -> c_int,
    pub render_context_set_update_callback:
        unsafe extern "C" fn(*mut MpvRenderContext, Option<UpdateCallback>, *mut c_void),
    pub render_context_update: unsafe extern "C" fn(*mut MpvRenderContext) -> u64,
    pub render_context_render: unsafe extern "C" fn(*mut MpvRenderContext, *mut MpvRenderParam) -> c_int,
    pub render_context_free: unsafe extern "C" fn(*mut MpvRenderContext),
}

impl MpvLibrary {
    /// Opens the first of `names` that loads.
    pub fn load(names: &[String]) -> Result<Self, EngineError> {
        for name in names {
            // SAFETY: libmpv runs no unsound initialisation on load.
            match unsafe { Library::new(name) } {
                Ok(lib) => {
                    log::info!("Loaded {}", name);
                    return Self::bind(lib);
                }
                Err(e) => log::debug!("Could not load {}: {}", name, e),
            }
        }

        Err(EngineError::Library {
            candidates: names.join(", "),
        })
    }

    fn bind(lib: Library) -> Result<Self, EngineError> {
        // SAFETY: the signatures below match client.h and render.h. Each
        // Symbol is dereferenced to copy the function pointer out, which ends
        // the borrow of `lib` before it moves into the struct.
        unsafe {
            let create = symbol!(lib, "mpv_create", unsafe extern "C" fn() -> *mut MpvHandle);
            let initialize = symbol!(lib, "mpv_initialize", unsafe extern "C" fn(*mut MpvHandle) -> c_int);
            let set_option_string = symbol!(
                lib,
                "mpv_set_option_string",
                unsafe extern "C" fn(*mut MpvHandle, *const c_char, *const c_char) -> c_int
            );
            let command = symbol!(
                lib,
                "mpv_command",
                unsafe extern "C" fn(*mut MpvHandle, *mut *const c_char) -> c_int
            );
            let set_property_string = symbol!(
                lib,
                "mpv_set_property_string",
                unsafe extern "C" fn(*mut MpvHandle, *const c_char, *const c_char) -> c_int
            );
            let observe_property = symbol!(
                lib,
                "mpv_observe_property",
                unsafe extern "C" fn(*mut MpvHandle, u64, *const c_char, c_int) -> c_int
            );
            let get_property_async = symbol!(
                lib,
                "mpv_get_property_async",
                unsafe extern "C" fn(*mut MpvHandle, u64, *const c_char, c_int) -> c_int
            );
            let wait_event = symbol!(
                lib,
                "mpv_wait_event",
                unsafe extern "C" fn(*mut MpvHandle, f64) -> *mut MpvEvent
            );
            let wakeup = symbol!(lib, "mpv_wakeup", unsafe extern "C" fn(*mut MpvHandle));
            let terminate_destroy = symbol!(lib, "mpv_terminate_destroy", unsafe extern "C" fn(*mut MpvHandle));
            let error_string = symbol!(lib, "mpv_error_string", unsafe extern "C" fn(c_int) -> *const c_char);
            let render_context_create = symbol!(
                lib,
                "mpv_render_context_create",
                unsafe extern "C" fn(*mut *mut MpvRenderContext, *mut MpvHandle, *mut MpvRenderParam) -> c_int
            );
            let render_context_set_update_callback = symbol!(
                lib,
                "mpv_render_context_set_update_callback",
                unsafe extern "C" fn(*mut MpvRenderContext, Option<UpdateCallback>, *mut c_void)
            );
            let render_context_update = symbol!(
                lib,
                "mpv_render_context_update",
                unsafe extern "C" fn(*mut MpvRenderContext) -> u64
            );
            let render_context_render = symbol!(
                lib,
                "mpv_render_context_render",
                unsafe extern "C" fn(*mut MpvRenderContext, *mut MpvRenderParam) -> c_int
            );
            let render_context_free = symbol!(
                lib,
                "mpv_render_context_free",
                unsafe extern "C" fn(*mut MpvRenderContext)
            );

            Ok(Self {
                _lib: lib,
                create,
                initialize,
                set_option_string,
                command,
                set_property_string,
                observe_property,
                get_property_async,
                wait_event,
                wakeup,
                terminate_destroy,
                error_string,
                render_context_create,
                render_context_set_update_callback,
                render_context_update,
                render_context_render,
                render_context_free,
            })
        }
    }

    /// Maps a negative libmpv status code to an error.
    pub fn check(&self, call: &'static str, code: c_int) -> Result<(), EngineError> {
        if code >= 0 {
            return Ok(());
        }
        // SAFETY: mpv_error_string returns a static string for any code.
        let message = unsafe { text((self.error_string)(code)) }.unwrap_or_default();
        Err(EngineError::Mpv { call, code, message })
    }
}

/// Copies a C string, `None` for null.
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string.
pub unsafe fn text(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        None
    } else {
        Some(CStr::from_ptr(ptr).to_string_lossy().into_owned())
    }
}

/// Platform library names tried in order.
pub fn default_library_names() -> Vec<String> {
    let names: &[&str] = if cfg!(target_os = "windows") {
        &["libmpv-2.dll", "mpv-2.dll", "mpv-1.dll"]
    } else if cfg!(target_os = "macos") {
        &["libmpv.2.dylib", "libmpv.dylib"]
    } else {
        &["libmpv.so.2", "libmpv.so.1", "libmpv.so"]
    };
    names.iter().map(|name| name.to_string()).collect()
}

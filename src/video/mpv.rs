// =============================================================================
// MPV ENGINE - IN-PROCESS PLAYBACK THROUGH LIBMPV
// =============================================================================
//
// libmpv is loaded at runtime and driven through its client API:
// - Commands and property writes go straight from the UI thread; the client
//   API is thread-safe
// - An event thread waits on mpv's event queue, decodes property changes and
//   pushes typed EngineEvents into an unbounded channel, then wakes the UI
// - Video is drawn by the software renderer into the egui video surface
//   (see render.rs); mpv never opens a window of its own
//
// =============================================================================

use std::ffi::{c_char, c_void, CString};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tokio::sync::mpsc;
use crate::video::ffi::{self, MpvEventProperty, MpvHandle, MpvLibrary};
use crate::video::properties::{
    self, PropertyValue, ValueShape, MIX_PROPERTY, OBSERVED_PROPERTIES, POSITION_POLL_REQUEST_ID,
    TIME_POS_PROPERTY,
};
use crate::video::render::{self, RenderSignal, VideoOutput};
use crate::video::{Engine, EngineError, EngineEvent, LoadMode};

/// Called from the engine threads after an event or frame is queued.
pub type Waker = Box<dyn Fn() + Send + Sync>;

/// Options applied before the core is initialized.
const ENGINE_OPTIONS: [(&str, &str); 7] = [
    ("vo", "libmpv"),
    ("idle", "yes"),
    ("keep-open", "yes"),
    ("input-default-bindings", "no"),
    ("input-vo-keyboard", "no"),
    ("osc", "no"),
    ("terminal", "no"),
];

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Shared library names tried in order.
    pub library_names: Vec<String>,
    /// Name the audio output reports to the system mixer.
    pub client_name: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            library_names: ffi::default_library_names(),
            client_name: "trackmix".to_string(),
        }
    }
}

#[derive(Clone, Copy)]
struct Handle(*mut MpvHandle);

// SAFETY: the libmpv client API may be called from any thread, and the
// handle stays valid until `mpv_terminate_destroy` in `MpvEngine::drop`,
// which runs after every thread using it has been joined.
unsafe impl Send for Handle {}
unsafe impl Sync for Handle {}

pub struct MpvEngine {
    api: Arc<MpvLibrary>,
    handle: Handle,
    render_signal: Arc<RenderSignal>,
    render_thread: Option<JoinHandle<()>>,
    event_thread: Option<JoinHandle<()>>,
    stop: Arc<AtomicBool>,
}

impl MpvEngine {
    /// Loads libmpv, starts playback core, renderer and event thread.
    ///
    /// The engine value exists from the moment the core is created, so any
    /// later failure tears everything down through `Drop`.
    pub fn spawn(
        config: &EngineConfig,
        waker: Waker,
    ) -> Result<(Self, mpsc::UnboundedReceiver<EngineEvent>, VideoOutput), EngineError> {
        let api = Arc::new(MpvLibrary::load(&config.library_names)?);

        // SAFETY: mpv_create has no preconditions.
        let raw = unsafe { (api.create)() };
        if raw.is_null() {
            return Err(EngineError::Create);
        }

        let mut engine = Self {
            api,
            handle: Handle(raw),
            render_signal: Arc::new(RenderSignal::new()),
            render_thread: None,
            event_thread: None,
            stop: Arc::new(AtomicBool::new(false)),
        };

        for (name, value) in ENGINE_OPTIONS {
            engine.set_option(name, value)?;
        }
        engine.set_option("audio-client-name", &config.client_name)?;

        // SAFETY: the handle is valid and not yet initialized.
        let code = unsafe { (engine.api.initialize)(raw) };
        engine.api.check("mpv_initialize", code)?;

        let waker: Arc<Waker> = Arc::new(waker);
        let (render_thread, video) =
            render::start(&engine.api, raw, &engine.render_signal, Arc::clone(&waker))?;
        engine.render_thread = Some(render_thread);

        for (id, name, shape) in OBSERVED_PROPERTIES {
            engine.observe(id, name, shape)?;
        }

        let (sender, receiver) = mpsc::unbounded_channel();
        let api = Arc::clone(&engine.api);
        let handle = engine.handle;
        let stop = Arc::clone(&engine.stop);
        engine.event_thread = Some(
            thread::Builder::new()
                .name("mpv-events".to_string())
                .spawn(move || Self::read_events(api, handle, stop, sender, waker))?,
        );

        log::info!("Playback engine started");
        Ok((engine, receiver, video))
    }

    fn read_events(
        api: Arc<MpvLibrary>,
        handle: Handle,
        stop: Arc<AtomicBool>,
        sender: mpsc::UnboundedSender<EngineEvent>,
        waker: Arc<Waker>,
    ) {
        while !stop.load(Ordering::Acquire) {
            // SAFETY: this is the only thread waiting on the handle, and the
            // returned event stays valid until the next wait.
            let event = match unsafe { (api.wait_event)(handle.0, -1.0).as_ref() } {
                Some(event) => event,
                None => break,
            };

            let decoded = match event.event_id {
                ffi::MPV_EVENT_NONE => continue,
                ffi::MPV_EVENT_SHUTDOWN => {
                    log::info!("Playback engine shut down");
                    break;
                }
                ffi::MPV_EVENT_PROPERTY_CHANGE => {
                    // SAFETY: property-change events carry an mpv_event_property.
                    unsafe { read_property(event.data) }
                        .and_then(|(name, value)| properties::decode_property(&name, &value))
                }
                ffi::MPV_EVENT_GET_PROPERTY_REPLY if event.reply_userdata == POSITION_POLL_REQUEST_ID => {
                    // SAFETY: property replies carry an mpv_event_property.
                    let value = unsafe { read_property(event.data) }
                        .map(|(_, value)| value)
                        .unwrap_or(PropertyValue::Missing);
                    Some(properties::decode_position_reply(event.error >= 0, &value))
                }
                _ => None,
            };

            if let Some(decoded) = decoded {
                if sender.send(decoded).is_err() {
                    log::debug!("Event receiver dropped, stopping event thread");
                    return;
                }
                waker();
            }
        }

        let _ = sender.send(EngineEvent::Closed);
        waker();
    }

    fn set_option(&self, name: &str, value: &str) -> Result<(), EngineError> {
        let name = CString::new(name)?;
        let value = CString::new(value)?;
        // SAFETY: both strings are NUL-terminated and outlive the call.
        let code = unsafe { (self.api.set_option_string)(self.handle.0, name.as_ptr(), value.as_ptr()) };
        self.api.check("mpv_set_option_string", code)
    }

    /// Observes a property, falling back to text where the library refuses
    /// the native number format.
    fn observe(&self, id: u64, name: &str, shape: ValueShape) -> Result<(), EngineError> {
        let c_name = CString::new(name)?;
        // SAFETY: the name is NUL-terminated and outlives the call.
        let observe_as =
            |format| unsafe { (self.api.observe_property)(self.handle.0, id, c_name.as_ptr(), format) };

        let code = match shape {
            ValueShape::Json => observe_as(ffi::MPV_FORMAT_STRING),
            ValueShape::Number => match observe_as(ffi::MPV_FORMAT_DOUBLE) {
                code if code >= 0 => code,
                code => {
                    log::warn!("Observing {} as a number failed ({}), observing as text", name, code);
                    observe_as(ffi::MPV_FORMAT_STRING)
                }
            },
        };
        self.api.check("mpv_observe_property", code)
    }

    fn command(&self, args: &[&str]) -> Result<(), EngineError> {
        let owned = args
            .iter()
            .map(|arg| CString::new(*arg))
            .collect::<Result<Vec<_>, _>>()?;
        let mut pointers: Vec<*const c_char> = owned.iter().map(|arg| arg.as_ptr()).collect();
        pointers.push(std::ptr::null());

        // SAFETY: `pointers` is NULL-terminated and borrows from `owned`.
        let code = unsafe { (self.api.command)(self.handle.0, pointers.as_mut_ptr()) };
        self.api.check("mpv_command", code)
    }
}

/// Reads an `mpv_event_property`.
///
/// # Safety
/// `data` must be null or point to an `mpv_event_property` that is valid
/// for the duration of the call.
unsafe fn read_property(data: *mut c_void) -> Option<(String, PropertyValue)> {
    let property = (data as *const MpvEventProperty).as_ref()?;
    let name = ffi::text(property.name)?;

    let value = if property.data.is_null() {
        PropertyValue::Missing
    } else {
        match property.format {
            ffi::MPV_FORMAT_DOUBLE => PropertyValue::Number(*(property.data as *const f64)),
            ffi::MPV_FORMAT_STRING => ffi::text(*(property.data as *const *const c_char))
                .map(PropertyValue::Text)
                .unwrap_or(PropertyValue::Missing),
            _ => PropertyValue::Missing,
        }
    };
    Some((name, value))
}

impl Engine for MpvEngine {
    fn load(&mut self, path: &Path, mode: LoadMode) -> Result<(), EngineError> {
        log::info!("Loading {}", path.display());
        let path = path.to_string_lossy();
        self.command(&["loadfile", &path, mode.as_str()])
    }

    fn toggle_pause(&mut self) -> Result<(), EngineError> {
        self.command(&["cycle", "pause"])
    }

    fn seek_to(&mut self, seconds: f64) -> Result<(), EngineError> {
        self.command(&["seek", &seconds.to_string(), "absolute"])
    }

    fn set_mix(&mut self, expression: &str) -> Result<(), EngineError> {
        log::debug!("Setting mix: {:?}", expression);
        let name = CString::new(MIX_PROPERTY)?;
        let value = CString::new(expression)?;
        // SAFETY: both strings are NUL-terminated and outlive the call.
        let code = unsafe { (self.api.set_property_string)(self.handle.0, name.as_ptr(), value.as_ptr()) };
        self.api.check("mpv_set_property_string", code)
    }

    fn request_position(&mut self) -> Result<(), EngineError> {
        let name = CString::new(TIME_POS_PROPERTY)?;
        // SAFETY: the name is NUL-terminated and outlives the call.
        let code = unsafe {
            (self.api.get_property_async)(
                self.handle.0,
                POSITION_POLL_REQUEST_ID,
                name.as_ptr(),
                ffi::MPV_FORMAT_DOUBLE,
            )
        };
        self.api.check("mpv_get_property_async", code)
    }
}

impl Drop for MpvEngine {
    fn drop(&mut self) {
        // The render context has to be gone before the core is destroyed.
        self.render_signal.stop();
        if let Some(thread) = self.render_thread.take() {
            if thread.join().is_err() {
                log::error!("Render thread panicked");
            }
        }

        self.stop.store(true, Ordering::Release);
        // SAFETY: the handle is still alive; wakeup only interrupts wait_event.
        unsafe { (self.api.wakeup)(self.handle.0) };
        if let Some(thread) = self.event_thread.take() {
            if thread.join().is_err() {
                log::error!("Event thread panicked");
            }
        }

        // SAFETY: no thread uses the handle any more.
        unsafe { (self.api.terminate_destroy)(self.handle.0) };
        log::info!("Playback engine stopped");
    }
}

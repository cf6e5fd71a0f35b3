// =============================================================================
// VIDEO OUTPUT - MPV SOFTWARE RENDERING INTO AN EGUI TEXTURE
// =============================================================================
//
// mpv draws each frame into a CPU buffer sized to the video surface:
// - libmpv calls the update callback from its own threads; the callback only
//   flags the render thread, it never calls back into mpv
// - The render thread owns the render context and is the only caller of the
//   render API
// - Finished frames go to the UI through a channel and the UI uploads the
//   newest one as a texture
//
// =============================================================================

use std::ffi::c_void;
use std::sync::mpsc;
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use egui::{Color32, ColorImage};
use crate::video::ffi::{self, MpvLibrary, MpvRenderContext, MpvRenderParam};
use crate::video::mpv::Waker;
use crate::video::EngineError;

/// One rendered frame, already in egui's pixel format.
pub struct VideoFrame {
    pub image: ColorImage,
}

#[derive(Debug, Default)]
struct RenderState {
    frame_pending: bool,
    size: [usize; 2],
    resized: bool,
    stop: bool,
}

/// Wake-up flags shared by mpv's update callback, the UI and the render
/// thread.
#[derive(Debug, Default)]
pub struct RenderSignal {
    state: Mutex<RenderState>,
    wake: Condvar,
}

/// What the render thread should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderWork {
    Stop,
    /// Ask mpv for updates; `force` redraws even without a new frame.
    Render { size: [usize; 2], force: bool },
}

impl RenderSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notify_frame(&self) {
        self.update(|state| state.frame_pending = true);
    }

    /// Sets the target size in pixels. Only a real change wakes the renderer.
    pub fn resize(&self, size: [usize; 2]) {
        self.update(|state| {
            if state.size != size {
                state.size = size;
                state.resized = true;
            }
        });
    }

    pub fn stop(&self) {
        self.update(|state| state.stop = true);
    }

    /// Takes pending work, `None` when there is nothing to do yet.
    #[cfg(test)]
    pub fn take_work(&self) -> Option<RenderWork> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        Self::take(&mut state)
    }

    /// Blocks until there is work.
    pub fn wait_work(&self) -> RenderWork {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        loop {
            if let Some(work) = Self::take(&mut state) {
                return work;
            }
            state = self.wake.wait(state).unwrap_or_else(PoisonError::into_inner);
        }
    }

    fn take(state: &mut RenderState) -> Option<RenderWork> {
        if state.stop {
            return Some(RenderWork::Stop);
        }
        if !state.frame_pending && !state.resized {
            return None;
        }

        let work = RenderWork::Render {
            size: state.size,
            force: state.resized,
        };
        state.frame_pending = false;
        state.resized = false;
        Some(work)
    }

    fn update(&self, change: impl FnOnce(&mut RenderState)) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        change(&mut state);
        self.wake.notify_all();
    }
}

/// UI-side end of the video pipeline: reports the surface size and hands
/// out the newest rendered frame.
pub struct VideoOutput {
    signal: Arc<RenderSignal>,
    frame_receiver: mpsc::Receiver<VideoFrame>,
}

impl VideoOutput {
    pub fn resize(&self, width: usize, height: usize) {
        self.signal.resize([width, height]);
    }

    /// Drains the channel and returns only the most recent frame.
    pub fn latest_frame(&self) -> Option<VideoFrame> {
        let mut latest = None;
        while let Ok(frame) = self.frame_receiver.try_recv() {
            latest = Some(frame);
        }
        latest
    }
}

/// Owns a render context and frees it on drop.
struct RenderContext {
    api: Arc<MpvLibrary>,
    ptr: *mut MpvRenderContext,
}

// SAFETY: the context is only ever used by the thread that owns this value.
unsafe impl Send for RenderContext {}

impl Drop for RenderContext {
    fn drop(&mut self) {
        // SAFETY: `ptr` came from mpv_render_context_create and is freed once.
        unsafe {
            (self.api.render_context_set_update_callback)(self.ptr, None, std::ptr::null_mut());
            (self.api.render_context_free)(self.ptr);
        }
    }
}

unsafe extern "C" fn on_render_update(signal: *mut c_void) {
    // SAFETY: `signal` is the RenderSignal registered in `start`, which the
    // engine keeps alive until the context is freed.
    let signal = &*(signal as *const RenderSignal);
    signal.notify_frame();
}

/// Creates a software render context on `handle` and starts the render
/// thread.
pub(crate) fn start(
    api: &Arc<MpvLibrary>,
    handle: *mut ffi::MpvHandle,
    signal: &Arc<RenderSignal>,
    waker: Arc<Waker>,
) -> Result<(JoinHandle<()>, VideoOutput), EngineError> {
    let mut params = [
        MpvRenderParam {
            kind: ffi::MPV_RENDER_PARAM_API_TYPE,
            data: ffi::MPV_RENDER_API_TYPE_SW.as_ptr() as *mut c_void,
        },
        MpvRenderParam::end(),
    ];

    let mut ptr: *mut MpvRenderContext = std::ptr::null_mut();
    // SAFETY: `params` is terminated and outlives the call.
    let code = unsafe { (api.render_context_create)(&mut ptr, handle, params.as_mut_ptr()) };
    api.check("mpv_render_context_create", code)?;

    let context = RenderContext {
        api: Arc::clone(api),
        ptr,
    };
    // SAFETY: the signal outlives the context; the engine stops and joins
    // the render thread, which drops the context, before dropping its Arc.
    unsafe {
        (api.render_context_set_update_callback)(
            context.ptr,
            Some(on_render_update),
            Arc::as_ptr(signal) as *mut c_void,
        );
    }

    let (frame_sender, frame_receiver) = mpsc::channel();
    let thread_signal = Arc::clone(signal);
    let handle = thread::Builder::new()
        .name("mpv-render".to_string())
        .spawn(move || render_loop(context, thread_signal, frame_sender, waker))?;

    Ok((
        handle,
        VideoOutput {
            signal: Arc::clone(signal),
            frame_receiver,
        },
    ))
}

fn render_loop(
    context: RenderContext,
    signal: Arc<RenderSignal>,
    frame_sender: mpsc::Sender<VideoFrame>,
    waker: Arc<Waker>,
) {
    // Stored as u32 so the buffer is 4-byte aligned as mpv requires.
    let mut buffer: Vec<u32> = Vec::new();

    loop {
        let (size, force) = match signal.wait_work() {
            RenderWork::Stop => break,
            RenderWork::Render { size, force } => (size, force),
        };

        // SAFETY: this thread is the only user of the render context.
        let flags = unsafe { (context.api.render_context_update)(context.ptr) };
        if flags & ffi::MPV_RENDER_UPDATE_FRAME == 0 && !force {
            continue;
        }
        let [width, height] = size;
        if width == 0 || height == 0 {
            continue;
        }

        match render_frame(&context, &mut buffer, width, height) {
            Ok(image) => {
                if frame_sender.send(VideoFrame { image }).is_err() {
                    log::debug!("Video output dropped, stopping renderer");
                    break;
                }
                waker();
            }
            Err(e) => log::warn!("Rendering a video frame failed: {}", e),
        }
    }

    log::debug!("Render thread finished");
}

fn render_frame(
    context: &RenderContext,
    buffer: &mut Vec<u32>,
    width: usize,
    height: usize,
) -> Result<ColorImage, EngineError> {
    buffer.clear();
    buffer.resize(width * height, 0);

    let mut sw_size: [i32; 2] = [width as i32, height as i32];
    let mut stride: usize = width * 4;
    let mut params = [
        MpvRenderParam {
            kind: ffi::MPV_RENDER_PARAM_SW_SIZE,
            data: sw_size.as_mut_ptr() as *mut c_void,
        },
        MpvRenderParam {
            kind: ffi::MPV_RENDER_PARAM_SW_FORMAT,
            data: ffi::SW_FORMAT_RGB0.as_ptr() as *mut c_void,
        },
        MpvRenderParam {
            kind: ffi::MPV_RENDER_PARAM_SW_STRIDE,
            data: &mut stride as *mut usize as *mut c_void,
        },
        MpvRenderParam {
            kind: ffi::MPV_RENDER_PARAM_SW_POINTER,
            data: buffer.as_mut_ptr() as *mut c_void,
        },
        MpvRenderParam::end(),
    ];

    // SAFETY: every parameter points at live locals; the buffer holds
    // `height` rows of `stride` bytes.
    let code = unsafe { (context.api.render_context_render)(context.ptr, params.as_mut_ptr()) };
    context.api.check("mpv_render_context_render", code)?;

    Ok(rgb0_to_image(buffer, width, height))
}

/// Converts packed R, G, B, padding pixels into an opaque image.
pub fn rgb0_to_image(pixels: &[u32], width: usize, height: usize) -> ColorImage {
    let pixels = pixels
        .iter()
        .take(width * height)
        .map(|pixel| {
            let [r, g, b, _] = pixel.to_ne_bytes();
            Color32::from_rgb(r, g, b)
        })
        .collect();
    ColorImage {
        size: [width, height],
        pixels,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_work_until_signalled() {
        let signal = RenderSignal::new();
        assert_eq!(signal.take_work(), None);
    }

    #[test]
    fn test_frame_update_renders_at_current_size() {
        let signal = RenderSignal::new();
        signal.resize([640, 360]);
        assert_eq!(signal.take_work(), Some(RenderWork::Render { size: [640, 360], force: true }));

        signal.notify_frame();
        assert_eq!(signal.take_work(), Some(RenderWork::Render { size: [640, 360], force: false }));
        assert_eq!(signal.take_work(), None);
    }

    #[test]
    fn test_same_size_does_not_force_redraw() {
        let signal = RenderSignal::new();
        signal.resize([320, 240]);
        let _ = signal.take_work();

        signal.resize([320, 240]);
        assert_eq!(signal.take_work(), None);
    }

    #[test]
    fn test_stop_wins_over_pending_frames() {
        let signal = RenderSignal::new();
        signal.notify_frame();
        signal.stop();
        assert_eq!(signal.wait_work(), RenderWork::Stop);
    }

    #[test]
    fn test_wait_wakes_on_callback_from_other_thread() {
        let signal = Arc::new(RenderSignal::new());
        let remote = Arc::clone(&signal);
        let notifier = thread::spawn(move || {
            remote.resize([8, 8]);
        });

        assert_eq!(signal.wait_work(), RenderWork::Render { size: [8, 8], force: true });
        notifier.join().unwrap();
    }

    #[test]
    fn test_rgb0_pixels_become_opaque_colors() {
        let pixels = [
            u32::from_ne_bytes([255, 0, 0, 0]),
            u32::from_ne_bytes([0, 128, 255, 7]),
        ];
        let image = rgb0_to_image(&pixels, 2, 1);

        assert_eq!(image.size, [2, 1]);
        assert_eq!(image.pixels, vec![Color32::from_rgb(255, 0, 0), Color32::from_rgb(0, 128, 255)]);
    }
}

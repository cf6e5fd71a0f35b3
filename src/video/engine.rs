use std::path::Path;
use crate::core::AudioTrack;

/// How a newly loaded file interacts with what is already playing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    /// Stop the current file and play the new one immediately.
    Replace,
}

impl LoadMode {
    pub fn as_str(self) -> &'static str {
        match self {
            LoadMode::Replace => "replace",
        }
    }
}

/// Notifications pushed by the engine, delivered on the UI thread by
/// draining the channel returned alongside the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// The full list of audio tracks of the loaded file, in engine order.
    TrackList(Vec<AudioTrack>),
    Duration(Option<f64>),
    TimePos(Option<f64>),
    /// The connection to the engine is gone; no further events follow.
    Closed,
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("libmpv not found (tried {candidates})")]
    Library { candidates: String },
    #[error("libmpv is missing {name}: {source}")]
    Symbol {
        name: &'static str,
        #[source]
        source: libloading::Error,
    },
    #[error("mpv_create failed")]
    Create,
    #[error("{call} failed: {message} ({code})")]
    Mpv {
        call: &'static str,
        code: i32,
        message: String,
    },
    #[error("engine argument contains a NUL byte: {0}")]
    Nul(#[from] std::ffi::NulError),
    #[error("failed to start engine thread: {0}")]
    Io(#[from] std::io::Error),
}

/// Command surface of the playback engine.
///
/// Commands are fire-and-forget; their effects come back as
/// [`EngineEvent`]s.
pub trait Engine {
    fn load(&mut self, path: &Path, mode: LoadMode) -> Result<(), EngineError>;
    fn toggle_pause(&mut self) -> Result<(), EngineError>;
    fn seek_to(&mut self, seconds: f64) -> Result<(), EngineError>;
    /// Installs a filter-graph mix; an empty expression removes it.
    fn set_mix(&mut self, expression: &str) -> Result<(), EngineError>;
    /// Asks for the current position, answered with [`EngineEvent::TimePos`].
    fn request_position(&mut self) -> Result<(), EngineError>;
}

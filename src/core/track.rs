use std::fmt;

/// Engine-assigned handle for one stream of the loaded file.
///
/// Stable for the lifetime of the loaded file, meaningless across files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrackId(pub i64);

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An audio stream as reported by the engine's track list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioTrack {
    pub id: TrackId,
    pub title: Option<String>,
    pub lang: Option<String>,
}

impl AudioTrack {
    pub fn new(id: TrackId) -> Self {
        Self {
            id,
            title: None,
            lang: None,
        }
    }

    /// Caption shown next to the track's volume slider.
    pub fn caption(&self) -> String {
        match (&self.title, &self.lang) {
            (Some(title), Some(lang)) => format!("Track {} [{}] {}", self.id, lang, title),
            (Some(title), None) => format!("Track {} {}", self.id, title),
            (None, Some(lang)) => format!("Track {} [{}]", self.id, lang),
            (None, None) => format!("Track {}", self.id),
        }
    }
}

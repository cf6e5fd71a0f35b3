use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use crate::core::{format_time, mix_expression, AudioTrack, PreferenceStore, Preferences, TrackId};
use crate::gui::hover_bar::{HoverBar, TrackSlider};
use crate::gui::seek_bar::{SeekBar, SeekGesture};
use crate::video::{Engine, EngineEvent, LoadMode};

/// How often the position is requested explicitly. Some engines stop
/// pushing time-pos while paused.
pub const POLL_INTERVAL: Duration = Duration::from_millis(300);

/// Main window state and the glue between widgets, preferences and the
/// engine. Lives on the UI thread; engine events reach it only through
/// [`PlayerController::handle_event`].
pub struct PlayerController<E: Engine> {
    engine: E,
    store: PreferenceStore,
    pub preferences: Preferences,
    pub hover_bar: HoverBar,
    pub seek_bar: SeekBar,
    position: Option<f64>,
    duration: Option<f64>,
    current_file: Option<PathBuf>,
    engine_closed: bool,
    last_poll: Option<Instant>,
}

impl<E: Engine> PlayerController<E> {
    pub fn new(engine: E, store: PreferenceStore, preferences: Preferences) -> Self {
        Self {
            engine,
            store,
            preferences,
            hover_bar: HoverBar::default(),
            seek_bar: SeekBar::new(),
            position: None,
            duration: None,
            current_file: None,
            engine_closed: false,
            last_poll: None,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn current_file(&self) -> Option<&Path> {
        self.current_file.as_deref()
    }

    pub fn is_engine_closed(&self) -> bool {
        self.engine_closed
    }

    pub fn open_file(&mut self, path: PathBuf) {
        match self.engine.load(&path, LoadMode::Replace) {
            Ok(()) => self.current_file = Some(path),
            Err(e) => log::error!("Failed to load {}: {}", path.display(), e),
        }
    }

    pub fn toggle_pause(&mut self) {
        if let Err(e) = self.engine.toggle_pause() {
            log::error!("Failed to toggle pause: {}", e);
        }
    }

    pub fn handle_event(&mut self, event: EngineEvent, now: Instant) {
        match event {
            EngineEvent::TrackList(tracks) => self.rebuild_tracks(tracks, now),
            EngineEvent::Duration(duration) => self.update_duration(duration),
            EngineEvent::TimePos(position) => self.update_position(position),
            EngineEvent::Closed => {
                log::warn!("Playback engine went away");
                self.engine_closed = true;
            }
        }
    }

    fn rebuild_tracks(&mut self, tracks: Vec<AudioTrack>, now: Instant) {
        log::info!("Track list changed: {} audio track(s)", tracks.len());
        let sliders = tracks
            .into_iter()
            .map(|track| TrackSlider {
                volume: self.preferences.volume(track.id),
                track,
            })
            .collect();
        self.hover_bar.rebuild(sliders, now);
        // The old graph may name tracks that no longer exist.
        self.apply_mix();
    }

    fn update_duration(&mut self, duration: Option<f64>) {
        // Zero, negative and missing durations mean "not known yet".
        if let Some(duration) = duration.filter(|d| *d > 0.0) {
            self.duration = Some(duration);
            self.seek_bar.set_max(duration);
        }
    }

    fn update_position(&mut self, position: Option<f64>) {
        self.position = position;
        if let Some(position) = position {
            self.seek_bar.follow(position);
        }
    }

    /// Applies a new volume to the slider at `index`, pushes the whole mix to
    /// the engine and persists the volume.
    pub fn set_track_volume(&mut self, index: usize, volume: u8) {
        let Some(slider) = self.hover_bar.slider_mut(index) else {
            return;
        };
        slider.volume = volume.min(100);
        let (id, volume) = (slider.id(), slider.volume);

        self.apply_mix();
        self.preferences.set_volume(id, volume);
        self.store.save(&self.preferences);
    }

    fn apply_mix(&mut self) {
        let mix: Vec<(TrackId, u8)> = self
            .hover_bar
            .sliders()
            .iter()
            .map(|slider| (slider.id(), slider.volume))
            .collect();

        if let Err(e) = self.engine.set_mix(&mix_expression(&mix)) {
            log::error!("Failed to apply mix: {}", e);
        }
    }

    pub fn handle_seek_gesture(&mut self, gesture: SeekGesture) {
        match gesture {
            SeekGesture::Pressed => self.seek_bar.press(),
            SeekGesture::Released => {
                let target = self.seek_bar.release();
                if let Err(e) = self.engine.seek_to(target) {
                    log::error!("Failed to seek to {:.3}s: {}", target, e);
                }
            }
        }
    }

    /// Requests the position if a poll interval has passed since the last one.
    pub fn poll_position(&mut self, now: Instant) {
        let due = self
            .last_poll
            .map_or(true, |last| now.duration_since(last) >= POLL_INTERVAL);
        if !due || self.engine_closed {
            return;
        }

        self.last_poll = Some(now);
        if let Err(e) = self.engine.request_position() {
            log::debug!("Position poll failed: {}", e);
        }
    }

    /// `elapsed / total` as shown next to the seek bar.
    pub fn time_label(&self) -> String {
        format!("{} / {}", format_time(self.position), format_time(self.duration))
    }

    /// Records the final window size and writes preferences one last time.
    pub fn on_close(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.preferences.set_window_size(width, height);
        }
        self.store.save(&self.preferences);
        log::info!("Saved preferences to {}", self.store.path().display());
    }
}

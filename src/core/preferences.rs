use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use crate::core::TrackId;

pub const DEFAULT_VOLUME: u8 = 100;
pub const DEFAULT_WINDOW_WIDTH: u32 = 960;
pub const DEFAULT_WINDOW_HEIGHT: u32 = 540;

const WINDOW_WIDTH_KEY: &str = "window_width";
const WINDOW_HEIGHT_KEY: &str = "window_height";
const SETTINGS_FILE_NAME: &str = "trackmix_settings.json";

/// Flat key/value preferences: per-track volumes and the window size.
///
/// Keys the player doesn't understand are kept as-is and written back on
/// save, so newer settings files survive a round trip through older builds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Preferences {
    entries: Map<String, Value>,
}

impl Preferences {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(content: &str) -> anyhow::Result<Self> {
        let entries: Map<String, Value> = serde_json::from_str(content)?;
        Ok(Self { entries })
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(&self.entries)?)
    }

    pub fn volume(&self, track: TrackId) -> u8 {
        self.integer(&track.to_string())
            .map(|v| v.clamp(0, 100) as u8)
            .unwrap_or(DEFAULT_VOLUME)
    }

    pub fn set_volume(&mut self, track: TrackId, volume: u8) {
        self.entries
            .insert(track.to_string(), Value::from(volume.min(100)));
    }

    /// Stored window size, falling back to the default for any missing or
    /// non-positive dimension.
    pub fn window_size(&self) -> (u32, u32) {
        let dimension = |key: &str, default: u32| {
            self.integer(key)
                .filter(|v| *v > 0 && *v <= i64::from(u32::MAX))
                .map(|v| v as u32)
                .unwrap_or(default)
        };
        (
            dimension(WINDOW_WIDTH_KEY, DEFAULT_WINDOW_WIDTH),
            dimension(WINDOW_HEIGHT_KEY, DEFAULT_WINDOW_HEIGHT),
        )
    }

    pub fn set_window_size(&mut self, width: u32, height: u32) {
        self.entries.insert(WINDOW_WIDTH_KEY.to_string(), Value::from(width));
        self.entries.insert(WINDOW_HEIGHT_KEY.to_string(), Value::from(height));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn integer(&self, key: &str) -> Option<i64> {
        self.entries.get(key).and_then(Value::as_i64)
    }
}

/// Reads and writes [`Preferences`] at a single fixed location.
///
/// Both directions are best effort: a failed load yields empty preferences
/// and a failed save is logged and dropped.
#[derive(Debug, Clone)]
pub struct PreferenceStore {
    path: PathBuf,
}

impl PreferenceStore {
    /// Store beside the running executable.
    pub fn beside_executable() -> Self {
        Self::at(Self::default_path())
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Preferences {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => match Preferences::from_json(&content) {
                Ok(preferences) => {
                    log::info!("Loaded {} preference entries from {}", preferences.len(), self.path.display());
                    preferences
                }
                Err(e) => {
                    log::warn!("Ignoring unreadable preferences at {}: {}", self.path.display(), e);
                    Preferences::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No preferences at {}, using defaults", self.path.display());
                Preferences::new()
            }
            Err(e) => {
                log::warn!("Failed to read preferences at {}: {}", self.path.display(), e);
                Preferences::new()
            }
        }
    }

    pub fn save(&self, preferences: &Preferences) {
        if let Err(e) = self.try_save(preferences) {
            log::warn!("Failed to save preferences to {}: {}", self.path.display(), e);
        }
    }

    fn try_save(&self, preferences: &Preferences) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.path, preferences.to_json()?)?;
        Ok(())
    }

    fn default_path() -> PathBuf {
        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| {
                dirs::config_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join("trackmix")
            })
            .join(SETTINGS_FILE_NAME)
    }
}

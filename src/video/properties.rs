// Properties the player watches, and how their raw values become
// EngineEvents. Numbers are observed natively as doubles where the library
// allows it and otherwise as text. The track list is observed as text, which
// libmpv renders as a JSON array.

use serde::Deserialize;
use serde_json::Value;
use crate::core::{AudioTrack, TrackId};
use crate::video::EngineEvent;

pub const TRACK_LIST_PROPERTY: &str = "track-list";
pub const DURATION_PROPERTY: &str = "duration";
pub const TIME_POS_PROPERTY: &str = "time-pos";
pub const MIX_PROPERTY: &str = "lavfi-complex";

/// How a property is asked for when observing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueShape {
    /// Native double, with text as the fallback.
    Number,
    /// JSON text.
    Json,
}

/// Observer ids for the properties the player watches.
pub const OBSERVED_PROPERTIES: [(u64, &str, ValueShape); 3] = [
    (1, TRACK_LIST_PROPERTY, ValueShape::Json),
    (2, DURATION_PROPERTY, ValueShape::Number),
    (3, TIME_POS_PROPERTY, ValueShape::Number),
];

/// Reply id of explicit position polls.
pub const POSITION_POLL_REQUEST_ID: u64 = 100;

/// A property value as delivered by the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Missing,
    Number(f64),
    Text(String),
}

#[derive(Debug, Deserialize)]
struct RawTrack {
    id: i64,
    #[serde(rename = "type")]
    kind: String,
    title: Option<String>,
    lang: Option<String>,
}

/// Maps a property change to the event the player cares about, `None` for
/// properties it doesn't watch.
pub fn decode_property(name: &str, value: &PropertyValue) -> Option<EngineEvent> {
    match name {
        TRACK_LIST_PROPERTY => Some(EngineEvent::TrackList(audio_tracks(value))),
        DURATION_PROPERTY => Some(EngineEvent::Duration(seconds(value))),
        TIME_POS_PROPERTY => Some(EngineEvent::TimePos(seconds(value))),
        _ => None,
    }
}

/// Maps the reply to a position poll. A failed read ("property unavailable"
/// while idle) means there is no position.
pub fn decode_position_reply(succeeded: bool, value: &PropertyValue) -> EngineEvent {
    if succeeded {
        EngineEvent::TimePos(seconds(value))
    } else {
        EngineEvent::TimePos(None)
    }
}

fn seconds(value: &PropertyValue) -> Option<f64> {
    match value {
        PropertyValue::Number(n) => Some(*n).filter(|n| n.is_finite()),
        PropertyValue::Text(text) => text.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        PropertyValue::Missing => None,
    }
}

fn audio_tracks(value: &PropertyValue) -> Vec<AudioTrack> {
    let PropertyValue::Text(text) = value else {
        return Vec::new();
    };

    let entries = match serde_json::from_str::<Value>(text) {
        Ok(Value::Array(entries)) => entries,
        Ok(other) => {
            log::warn!("Track list is not an array: {}", other);
            return Vec::new();
        }
        Err(e) => {
            log::warn!("Undecodable track list ({}): {}", e, text);
            return Vec::new();
        }
    };

    entries
        .iter()
        .filter_map(|entry| match RawTrack::deserialize(entry) {
            Ok(track) => Some(track),
            Err(e) => {
                log::debug!("Skipping malformed track entry ({}): {}", e, entry);
                None
            }
        })
        .filter(|track| track.kind == "audio")
        .map(|track| AudioTrack {
            id: TrackId(track.id),
            title: track.title,
            lang: track.lang,
        })
        .collect()
}

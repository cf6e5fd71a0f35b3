use crate::core::TrackId;

/// Builds the `lavfi-complex` graph that mixes the given audio tracks.
///
/// Each `(track, volume)` pair becomes one gain stage scaling that track by
/// `volume / 100`, labelled `[a<i>]` by its position. A final `amix` stage
/// sums every labelled stream into the engine's audio output `[ao]`.
///
/// An empty slice yields an empty string, which tells the engine to drop any
/// custom mix and fall back to its default routing.
pub fn mix_expression(tracks: &[(TrackId, u8)]) -> String {
    if tracks.is_empty() {
        return String::new();
    }

    let mut stages: Vec<String> = tracks
        .iter()
        .enumerate()
        .map(|(index, (id, volume))| {
            format!("[aid{}]volume={}[a{}]", id, gain(*volume), index)
        })
        .collect();

    let inputs: String = (0..tracks.len()).map(|index| format!("[a{}]", index)).collect();
    stages.push(format!("{}amix=inputs={}[ao]", inputs, tracks.len()));

    stages.join(";")
}

fn gain(volume: u8) -> f64 {
    f64::from(volume.min(100)) / 100.0
}

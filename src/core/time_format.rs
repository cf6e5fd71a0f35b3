/// Shown wherever a time is unknown.
pub const TIME_PLACEHOLDER: &str = "--:--";

/// Formats a playback time as `H:MM:SS` (with hours) or `MM:SS`.
///
/// Absent and negative inputs render as [`TIME_PLACEHOLDER`]. Fractional
/// seconds are truncated, never rounded up.
pub fn format_time(seconds: Option<f64>) -> String {
    let seconds = match seconds {
        Some(s) if s >= 0.0 && s.is_finite() => s,
        _ => return TIME_PLACEHOLDER.to_string(),
    };

    let total = seconds.trunc() as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}

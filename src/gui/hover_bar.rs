use eframe::egui;
use std::time::{Duration, Instant};
use crate::core::{AudioTrack, TrackId};

/// How long the bar stays up after the pointer leaves the video and the bar.
pub const HIDE_DELAY: Duration = Duration::from_millis(2000);

/// One volume slider, bound to one audio track.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackSlider {
    pub track: AudioTrack,
    pub volume: u8,
}

impl TrackSlider {
    pub fn id(&self) -> TrackId {
        self.track.id
    }
}

/// Overlay along the bottom of the video holding the per-track sliders.
///
/// Visible while the pointer is active over the video or the bar. Leaving
/// both arms a one-shot hide timer; any activity disarms it.
#[derive(Debug)]
pub struct HoverBar {
    sliders: Vec<TrackSlider>,
    visible: bool,
    hide_at: Option<Instant>,
    hide_delay: Duration,
}

impl Default for HoverBar {
    fn default() -> Self {
        Self::new(HIDE_DELAY)
    }
}

impl HoverBar {
    pub fn new(hide_delay: Duration) -> Self {
        Self {
            sliders: Vec::new(),
            visible: false,
            hide_at: None,
            hide_delay,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn hide_deadline(&self) -> Option<Instant> {
        self.hide_at
    }

    pub fn sliders(&self) -> &[TrackSlider] {
        &self.sliders
    }

    pub fn slider_mut(&mut self, index: usize) -> Option<&mut TrackSlider> {
        self.sliders.get_mut(index)
    }

    /// Pointer entered or moved over the video or the bar.
    pub fn on_activity(&mut self) {
        self.visible = true;
        self.hide_at = None;
    }

    /// Pointer left both the video and the bar.
    pub fn on_leave(&mut self, now: Instant) {
        if self.visible {
            self.hide_at = Some(now + self.hide_delay);
        }
    }

    /// Fires the hide timer if it is due.
    pub fn tick(&mut self, now: Instant) {
        if let Some(deadline) = self.hide_at {
            if now >= deadline {
                self.visible = false;
                self.hide_at = None;
            }
        }
    }

    /// Throws away every slider and builds one per track, in the given order,
    /// then shows the bar so the new mix is discoverable.
    ///
    /// The hide timer starts right away; pointer activity keeps the bar up
    /// as usual.
    pub fn rebuild(&mut self, sliders: Vec<TrackSlider>, now: Instant) {
        self.sliders = sliders;
        self.visible = true;
        self.hide_at = Some(now + self.hide_delay);
    }

    /// Lays the bar over the bottom edge of `video_rect`, matching its width.
    ///
    /// Returns the bar's rectangle and the index of every slider the user
    /// changed this frame.
    pub fn show(&mut self, ctx: &egui::Context, video_rect: egui::Rect) -> (egui::Rect, Vec<usize>) {
        let mut changed = Vec::new();

        let response = egui::Area::new(egui::Id::new("hover_bar"))
            .order(egui::Order::Foreground)
            .pivot(egui::Align2::LEFT_BOTTOM)
            .fixed_pos(video_rect.left_bottom())
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    let inner_width = (video_rect.width() - 16.0).max(0.0);
                    ui.set_width(inner_width);

                    if self.sliders.is_empty() {
                        ui.label("No audio tracks");
                        return;
                    }

                    ui.spacing_mut().slider_width = (inner_width - 220.0).max(80.0);
                    for (index, slider) in self.sliders.iter_mut().enumerate() {
                        let widget = egui::Slider::new(&mut slider.volume, 0..=100)
                            .suffix("%")
                            .text(slider.track.caption());
                        if ui.add(widget).changed() {
                            changed.push(index);
                        }
                    }
                });
            });

        (response.response.rect, changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slider(id: i64, volume: u8) -> TrackSlider {
        TrackSlider {
            track: AudioTrack::new(TrackId(id)),
            volume,
        }
    }

    #[test]
    fn test_starts_hidden() {
        let bar = HoverBar::default();
        assert!(!bar.is_visible());
        assert!(bar.hide_deadline().is_none());
    }

    #[test]
    fn test_activity_shows_without_arming_timer() {
        let mut bar = HoverBar::default();
        let start = Instant::now();
        bar.on_activity();

        bar.tick(start + Duration::from_secs(60));
        assert!(bar.is_visible());
    }

    #[test]
    fn test_hides_after_full_delay_since_leave() {
        let mut bar = HoverBar::default();
        let start = Instant::now();
        bar.on_activity();
        bar.on_leave(start);

        bar.tick(start + HIDE_DELAY - Duration::from_millis(1));
        assert!(bar.is_visible());

        bar.tick(start + HIDE_DELAY);
        assert!(!bar.is_visible());
        assert!(bar.hide_deadline().is_none());
    }

    #[test]
    fn test_activity_before_timeout_cancels_hide() {
        let mut bar = HoverBar::default();
        let start = Instant::now();
        bar.on_activity();
        bar.on_leave(start);

        bar.tick(start + Duration::from_millis(1500));
        bar.on_activity();
        bar.tick(start + Duration::from_millis(5000));
        assert!(bar.is_visible());

        // Leaving again restarts the full delay.
        let left_again = start + Duration::from_millis(5000);
        bar.on_leave(left_again);
        bar.tick(left_again + Duration::from_millis(1999));
        assert!(bar.is_visible());
        bar.tick(left_again + Duration::from_millis(2000));
        assert!(!bar.is_visible());
    }

    #[test]
    fn test_leave_while_hidden_does_not_arm() {
        let mut bar = HoverBar::default();
        bar.on_leave(Instant::now());
        assert!(bar.hide_deadline().is_none());
    }

    #[test]
    fn test_rebuild_replaces_sliders_and_shows() {
        let mut bar = HoverBar::default();
        let start = Instant::now();
        bar.rebuild(vec![slider(1, 100), slider(2, 50)], start);
        assert!(bar.is_visible());
        assert_eq!(bar.sliders().len(), 2);

        bar.rebuild(vec![slider(5, 10)], start);
        assert_eq!(bar.sliders(), &[slider(5, 10)]);
    }

    #[test]
    fn test_rebuild_without_pointer_hides_after_delay() {
        let mut bar = HoverBar::default();
        let start = Instant::now();
        bar.rebuild(vec![slider(1, 100)], start);

        bar.tick(start + Duration::from_millis(1999));
        assert!(bar.is_visible());
        bar.tick(start + HIDE_DELAY);
        assert!(!bar.is_visible());
        assert_eq!(bar.sliders().len(), 1);
    }

    #[test]
    fn test_rebuild_with_pointer_inside_stays_visible() {
        let mut bar = HoverBar::default();
        let start = Instant::now();
        bar.rebuild(vec![slider(1, 100)], start);
        bar.on_activity();

        bar.tick(start + Duration::from_secs(10));
        assert!(bar.is_visible());
    }
}

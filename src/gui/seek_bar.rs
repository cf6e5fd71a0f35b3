use eframe::egui;

/// What the user did with the seek bar this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SeekGesture {
    Pressed,
    /// Released; the target is the bar's scrub position.
    Released,
}

/// Horizontal seek control over `[0, max]` seconds.
///
/// While `is_scrubbing` is set the control belongs to the user: engine
/// position updates must not move `scrub_position`.
#[derive(Debug, Clone, Default)]
pub struct SeekBar {
    pub scrub_position: f64,
    pub is_scrubbing: bool,
    pub max: f64,
}

impl SeekBar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self) {
        self.is_scrubbing = true;
    }

    /// Ends the gesture and returns the position to seek to.
    pub fn release(&mut self) -> f64 {
        self.is_scrubbing = false;
        self.scrub_position
    }

    /// Follows the engine's position unless the user holds the control.
    pub fn follow(&mut self, position: f64) {
        if !self.is_scrubbing {
            self.scrub_position = position.clamp(0.0, self.max);
        }
    }

    pub fn set_max(&mut self, max: f64) {
        self.max = max;
        if !self.is_scrubbing {
            self.scrub_position = self.scrub_position.min(max);
        }
    }

    pub fn show(&mut self, ui: &mut egui::Ui, width: f32) -> Option<SeekGesture> {
        ui.spacing_mut().slider_width = width.max(40.0);
        let response = ui.add(
            egui::Slider::new(&mut self.scrub_position, 0.0..=self.max).show_value(false),
        );

        if response.drag_started() {
            return Some(SeekGesture::Pressed);
        }
        if response.drag_stopped() {
            return Some(SeekGesture::Released);
        }
        // A click without a drag is a press and release in one frame.
        if response.clicked() && !self.is_scrubbing {
            return Some(SeekGesture::Released);
        }
        None
    }
}

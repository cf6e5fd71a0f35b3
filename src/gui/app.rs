use eframe::egui;
use std::path::PathBuf;
use std::time::Instant;
use tokio::sync::mpsc;
use crate::core::{PreferenceStore, Preferences};
use crate::gui::player::{PlayerController, POLL_INTERVAL};
use crate::video::{EngineConfig, EngineEvent, MpvEngine, VideoOutput};

const VIDEO_EXTENSIONS: [&str; 10] = ["mkv", "mp4", "mov", "avi", "webm", "m4v", "ts", "flv", "wmv", "mpg"];

pub struct TrackmixApp {
    pub player: PlayerController<MpvEngine>,
    pub event_receiver: mpsc::UnboundedReceiver<EngineEvent>,
    video: VideoOutput,
    /// Last frame uploaded to the GPU; `None` until mpv has drawn one.
    video_texture: Option<egui::TextureHandle>,
    /// Hover bar rectangle from the previous frame, for pointer tracking.
    bar_rect: Option<egui::Rect>,
    pointer_inside: bool,
    window_size: Option<egui::Vec2>,
    close_handled: bool,
}

impl TrackmixApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        store: PreferenceStore,
        preferences: Preferences,
    ) -> anyhow::Result<Self> {
        cc.egui_ctx.set_visuals(egui::Visuals::dark());

        let ctx = cc.egui_ctx.clone();
        let (engine, event_receiver, video) = MpvEngine::spawn(
            &EngineConfig::default(),
            Box::new(move || ctx.request_repaint()),
        )
        .map_err(|e| anyhow::anyhow!("Failed to start playback engine: {}", e))?;

        Ok(Self {
            player: PlayerController::new(engine, store, preferences),
            event_receiver,
            video,
            video_texture: None,
            bar_rect: None,
            pointer_inside: false,
            window_size: None,
            close_handled: false,
        })
    }

    fn process_engine_events(&mut self, now: Instant) {
        while let Ok(event) = self.event_receiver.try_recv() {
            self.player.handle_event(event, now);
        }
    }

    fn process_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped: Vec<PathBuf> = ctx.input(|i| {
            i.raw
                .dropped_files
                .iter()
                .filter_map(|file| file.path.clone())
                .collect()
        });

        if dropped.len() > 1 {
            log::warn!("{} files dropped, loading only the first", dropped.len());
        }
        if let Some(path) = dropped.into_iter().next() {
            self.player.open_file(path);
        }
    }

    fn open_file_dialog(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Video", &VIDEO_EXTENSIONS)
            .add_filter("All files", &["*"])
            .pick_file()
        {
            self.player.open_file(path);
        }
    }

    fn show_menu(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Open…").clicked() {
                        ui.close_menu();
                        self.open_file_dialog();
                    }
                    ui.separator();
                    if ui.button("Exit").clicked() {
                        ui.close_menu();
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });
            });
        });
    }

    fn show_transport(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("transport").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let label = self.player.time_label();
                let label_width = 150.0;
                let seek_width = ui.available_width() - label_width - ui.spacing().item_spacing.x;

                if let Some(gesture) = self.player.seek_bar.show(ui, seek_width) {
                    self.player.handle_seek_gesture(gesture);
                }
                ui.add_sized(
                    [label_width, ui.available_height()],
                    egui::Label::new(egui::RichText::new(label).monospace()),
                );
            });
        });
    }

    fn upload_video_frame(&mut self, ctx: &egui::Context) {
        let Some(frame) = self.video.latest_frame() else {
            return;
        };
        match &mut self.video_texture {
            Some(texture) => texture.set(frame.image, egui::TextureOptions::LINEAR),
            None => {
                self.video_texture = Some(ctx.load_texture("video", frame.image, egui::TextureOptions::LINEAR));
            }
        }
    }

    /// Draws the video surface and returns its rectangle.
    fn show_video_surface(&mut self, ctx: &egui::Context) -> egui::Rect {
        let files_hovering = ctx.input(|i| !i.raw.hovered_files.is_empty());
        let pixels_per_point = ctx.pixels_per_point();

        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(egui::Color32::BLACK))
            .show(ctx, |ui| {
                let (rect, response) = ui.allocate_exact_size(ui.available_size(), egui::Sense::click());
                if response.clicked() {
                    self.player.toggle_pause();
                }

                // mpv renders at the surface's physical size and letterboxes
                // inside it.
                let size = rect.size() * pixels_per_point;
                self.video.resize(size.x.round() as usize, size.y.round() as usize);

                let showing_video = self.player.current_file().is_some() && !self.player.is_engine_closed();
                if let Some(texture) = self.video_texture.as_ref().filter(|_| showing_video) {
                    ui.painter().image(
                        texture.id(),
                        rect,
                        egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                        egui::Color32::WHITE,
                    );
                    if files_hovering {
                        ui.painter().text(
                            rect.center(),
                            egui::Align2::CENTER_CENTER,
                            "Drop to play",
                            egui::FontId::proportional(18.0),
                            egui::Color32::GRAY,
                        );
                    }
                    return rect;
                }

                let text = if files_hovering {
                    "Drop to play".to_string()
                } else if self.player.is_engine_closed() {
                    "Playback engine closed".to_string()
                } else if let Some(path) = self.player.current_file() {
                    path.file_name()
                        .unwrap_or_default()
                        .to_string_lossy()
                        .into_owned()
                } else {
                    "Drop a video file here".to_string()
                };

                ui.painter().text(
                    rect.center(),
                    egui::Align2::CENTER_CENTER,
                    text,
                    egui::FontId::proportional(18.0),
                    egui::Color32::GRAY,
                );
                rect
            })
            .inner
    }

    fn track_pointer(&mut self, ctx: &egui::Context, video_rect: egui::Rect, now: Instant) {
        let bar_rect = self.bar_rect.filter(|_| self.player.hover_bar.is_visible());
        let inside = ctx.input(|i| i.pointer.hover_pos()).map_or(false, |pos| {
            video_rect.contains(pos) || bar_rect.map_or(false, |rect| rect.contains(pos))
        });

        if inside {
            self.player.hover_bar.on_activity();
        } else if self.pointer_inside {
            self.player.hover_bar.on_leave(now);
        }
        self.pointer_inside = inside;
    }

    fn show_hover_bar(&mut self, ctx: &egui::Context, video_rect: egui::Rect) {
        if !self.player.hover_bar.is_visible() {
            self.bar_rect = None;
            return;
        }

        let (rect, changed) = self.player.hover_bar.show(ctx, video_rect);
        self.bar_rect = Some(rect);
        for index in changed {
            if let Some(volume) = self.player.hover_bar.sliders().get(index).map(|s| s.volume) {
                self.player.set_track_volume(index, volume);
            }
        }
    }

    fn handle_close(&mut self, ctx: &egui::Context) {
        if self.close_handled || !ctx.input(|i| i.viewport().close_requested()) {
            return;
        }
        self.close_handled = true;

        let (width, height) = self
            .window_size
            .map(|size| (size.x.round() as u32, size.y.round() as u32))
            .unwrap_or((0, 0));
        self.player.on_close(width, height);
    }

    fn schedule_repaint(&self, ctx: &egui::Context, now: Instant) {
        let mut wait = POLL_INTERVAL;
        if let Some(deadline) = self.player.hover_bar.hide_deadline() {
            wait = wait.min(deadline.saturating_duration_since(now));
        }
        ctx.request_repaint_after(wait);
    }
}

impl eframe::App for TrackmixApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();

        if let Some(rect) = ctx.input(|i| i.viewport().inner_rect) {
            self.window_size = Some(rect.size());
        }

        self.process_engine_events(now);
        self.process_dropped_files(ctx);
        self.upload_video_frame(ctx);
        self.player.poll_position(now);
        self.player.hover_bar.tick(now);

        self.show_menu(ctx);
        self.show_transport(ctx);
        let video_rect = self.show_video_surface(ctx);
        self.track_pointer(ctx, video_rect, now);
        self.show_hover_bar(ctx, video_rect);

        self.handle_close(ctx);
        self.schedule_repaint(ctx, now);
    }
}

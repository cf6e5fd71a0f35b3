mod core;
mod gui;
mod video;

use eframe::egui;
use crate::core::PreferenceStore;
use crate::gui::TrackmixApp;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let store = PreferenceStore::beside_executable();
    let preferences = store.load();
    let (width, height) = preferences.window_size();
    log::info!("Using preferences at {}", store.path().display());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([width as f32, height as f32])
            .with_drag_and_drop(true)
            .with_title("trackmix"),
        ..Default::default()
    };

    eframe::run_native(
        "trackmix",
        options,
        Box::new(move |cc| {
            match TrackmixApp::new(cc, store, preferences) {
                Ok(app) => Ok(Box::new(app)),
                Err(e) => {
                    eprintln!("Failed to initialize app: {}", e);
                    std::process::exit(1);
                }
            }
        }),
    ).map_err(|e| anyhow::anyhow!("Failed to run app: {}", e))?;

    Ok(())
}

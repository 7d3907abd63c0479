mod app;

use eframe::egui;
use ui2prd_core::AppConfig;

use crate::app::Ui2PrdApp;

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::load_default().unwrap_or_else(|e| {
        log::error!("{:#}; using default settings", e);
        AppConfig::default()
    });

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("UI Screenshot → PRD")
            .with_inner_size([1280.0, 860.0])
            .with_drag_and_drop(true),
        ..Default::default()
    };

    eframe::run_native(
        "ui2prd",
        options,
        Box::new(|cc| Ok(Box::new(Ui2PrdApp::new(cc, config)))),
    )
}

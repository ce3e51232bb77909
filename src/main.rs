mod app;

use lotmap::settings::{self, ViewMode};

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let mode = ViewMode::from_args(std::env::args().skip(1));
    let settings = settings::load_first(&settings::settings_candidates());
    log::info!("starting in {mode:?} mode, data root {}", settings.data_root.display());

    let native_options = eframe::NativeOptions::default();
    eframe::run_native(
        "Lotmap",
        native_options,
        Box::new(move |cc| Ok(Box::new(app::MapApp::new(cc, settings, mode)))),
    )
}

//! Data Sweeper - desktop entry point

use data_sweeper::gui::DataSweeperApp;
use eframe::egui;

fn main() -> eframe::Result<()> {
    env_logger::init();

    // Configure native options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([900.0, 600.0])
            .with_title("Data Sweeper")
            .with_drag_and_drop(true),
        ..Default::default()
    };

    // Run the application
    eframe::run_native(
        "Data Sweeper",
        options,
        Box::new(|cc| Ok(Box::new(DataSweeperApp::new(cc)))),
    )
}

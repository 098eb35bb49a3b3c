//! GUI module - User interface components

mod app;
mod file_card;
mod upload_panel;

pub use app::DataSweeperApp;
pub use file_card::{FileCard, FileCardAction};
pub use upload_panel::{StatusKind, UploadPanel, UploadPanelAction, ACCENT};

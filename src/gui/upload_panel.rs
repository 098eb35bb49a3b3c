//! Upload Panel Widget
//! Left side panel with the file picker, batch progress, and status line.

use egui::{Color32, RichText};

pub const ACCENT: Color32 = Color32::from_rgb(255, 165, 0);

/// Severity of a status message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Success,
    Warning,
    Error,
}

impl StatusKind {
    pub fn color(self) -> Color32 {
        match self {
            StatusKind::Info => Color32::GRAY,
            StatusKind::Success => Color32::from_rgb(40, 167, 69),
            StatusKind::Warning => Color32::from_rgb(255, 193, 7),
            StatusKind::Error => Color32::from_rgb(220, 53, 69),
        }
    }
}

/// Left side panel with upload controls and batch progress.
pub struct UploadPanel {
    pub progress: f32,
    pub status: String,
    pub status_kind: StatusKind,
}

impl Default for UploadPanel {
    fn default() -> Self {
        Self {
            progress: 0.0,
            status: "Ready".to_string(),
            status_kind: StatusKind::Info,
        }
    }
}

impl UploadPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw the upload panel
    pub fn show(&mut self, ui: &mut egui::Ui, is_loading: bool, file_count: usize) -> UploadPanelAction {
        let mut action = UploadPanelAction::None;

        // Title
        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(RichText::new("📀 Data Sweeper").size(22.0).color(ACCENT));
            ui.label(
                RichText::new("Convert and clean CSV & Excel files")
                    .size(11.0)
                    .color(Color32::GRAY),
            );
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== Upload Section =====
        ui.label(RichText::new("📤 Upload Files").size(14.0).strong());
        ui.add_space(5.0);

        egui::Frame::none()
            .stroke(egui::Stroke::new(2.0, ACCENT))
            .rounding(5.0)
            .inner_margin(10.0)
            .show(ui, |ui| {
                ui.vertical_centered(|ui| {
                    ui.label(RichText::new("Drag and drop CSV or XLSX files onto the window").size(12.0));
                    ui.add_space(6.0);
                    ui.add_enabled_ui(!is_loading, |ui| {
                        if ui.button("📂 Browse files").clicked() {
                            action = UploadPanelAction::BrowseFiles;
                        }
                    });
                });
            });

        ui.add_space(10.0);
        ui.add_enabled_ui(!is_loading && file_count > 0, |ui| {
            if ui.small_button("🗑 Clear all files").clicked() {
                action = UploadPanelAction::ClearAll;
            }
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Progress Section =====
        ui.label(RichText::new("📊 Progress").size(14.0).strong());
        ui.add_space(5.0);

        ui.add(
            egui::ProgressBar::new(self.progress / 100.0)
                .show_percentage()
                .animate(is_loading),
        );

        ui.add_space(5.0);
        ui.label(
            RichText::new(&self.status)
                .size(11.0)
                .color(self.status_kind.color()),
        );

        action
    }

    /// Set progress and status
    pub fn set_progress(&mut self, progress: f32, status: &str) {
        self.progress = progress;
        self.status = status.to_string();
        self.status_kind = StatusKind::Info;
    }

    pub fn set_status(&mut self, kind: StatusKind, status: &str) {
        self.status = status.to_string();
        self.status_kind = kind;
    }
}

/// Actions triggered by the upload panel
#[derive(Debug, Clone, PartialEq)]
pub enum UploadPanelAction {
    None,
    BrowseFiles,
    ClearAll,
}

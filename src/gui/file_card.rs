//! File Card Widget
//! One card per uploaded file: preview, cleaning, column selection,
//! visualization, and conversion controls.

use crate::charts::{BarChartData, ChartPlotter, Visualization};
use crate::config::SweeperConfig;
use crate::data::{CleaningOptions, ConversionTarget, Dataset, DownloadArtifact};
use crate::gui::upload_panel::{StatusKind, ACCENT};
use crate::pipeline::{LoadedFile, PipelineError, ProcessOptions, ProcessedFile};
use egui::{Color32, RichText, ScrollArea};
use log::debug;
use std::path::PathBuf;

enum CardState {
    Loaded(LoadedFile),
    Failed(String),
}

/// Per-file controls and cached results.
pub struct FileCard {
    pub file_name: String,
    state: CardState,
    cleaning_enabled: bool,
    cleaning: CleaningOptions,
    columns: Vec<(String, bool)>,
    visualize: bool,
    target: ConversionTarget,
    processed: Option<ProcessedFile>,
    artifact: Option<DownloadArtifact>,
    message: Option<(StatusKind, String)>,
    saved_path: Option<PathBuf>,
}

impl FileCard {
    pub fn from_result(file_name: &str, result: Result<LoadedFile, PipelineError>) -> Self {
        match result {
            Ok(loaded) => Self::loaded(loaded),
            Err(e) => Self::failed(file_name, e.to_string()),
        }
    }

    pub fn loaded(loaded: LoadedFile) -> Self {
        let columns = loaded
            .dataset
            .column_names()
            .into_iter()
            .map(|name| (name, true))
            .collect();
        Self {
            file_name: loaded.name.clone(),
            state: CardState::Loaded(loaded),
            cleaning_enabled: false,
            cleaning: CleaningOptions::default(),
            columns,
            visualize: false,
            target: ConversionTarget::default(),
            processed: None,
            artifact: None,
            message: None,
            saved_path: None,
        }
    }

    pub fn failed(file_name: &str, error: String) -> Self {
        Self {
            file_name: file_name.to_string(),
            state: CardState::Failed(error),
            cleaning_enabled: false,
            cleaning: CleaningOptions::default(),
            columns: Vec::new(),
            visualize: false,
            target: ConversionTarget::default(),
            processed: None,
            artifact: None,
            message: None,
            saved_path: None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.state, CardState::Failed(_))
    }

    pub fn artifact(&self) -> Option<&DownloadArtifact> {
        self.artifact.as_ref()
    }

    pub fn chart_data(&self) -> Option<&BarChartData> {
        match self.processed.as_ref()?.visualization.as_ref()? {
            Visualization::Chart(data) => Some(data),
            Visualization::NoNumericData => None,
        }
    }

    pub fn saved_path(&self) -> Option<&PathBuf> {
        self.saved_path.as_ref()
    }

    pub fn set_message(&mut self, kind: StatusKind, text: impl Into<String>) {
        self.message = Some((kind, text.into()));
    }

    pub fn set_saved(&mut self, path: PathBuf) {
        self.set_message(StatusKind::Success, format!("✅ Saved to {}", path.display()));
        self.saved_path = Some(path);
    }

    /// Current settings as pipeline options (no conversion requested).
    fn options(&self) -> ProcessOptions {
        ProcessOptions {
            cleaning: if self.cleaning_enabled {
                self.cleaning
            } else {
                CleaningOptions::default()
            },
            selected_columns: Some(
                self.columns
                    .iter()
                    .filter(|(_, keep)| *keep)
                    .map(|(name, _)| name.clone())
                    .collect(),
            ),
            visualize: self.visualize,
            convert_to: None,
        }
    }

    /// Settings changed: drop cached output so it is rebuilt from the parsed data.
    fn invalidate(&mut self) {
        self.processed = None;
        self.artifact = None;
    }

    fn refresh(&mut self, config: &SweeperConfig) {
        if self.processed.is_some() {
            return;
        }
        if let CardState::Loaded(loaded) = &self.state {
            debug!("Reprocessing {}", self.file_name);
            self.processed = Some(loaded.apply(&self.options(), config));
        }
    }

    fn convert(&mut self) {
        let (CardState::Loaded(loaded), Some(processed)) = (&self.state, &self.processed) else {
            return;
        };
        match loaded.convert(processed, self.target) {
            Ok(artifact) => {
                let text = format!("✅ Ready: {}", artifact.file_name);
                self.artifact = Some(artifact);
                self.set_message(StatusKind::Success, text);
            }
            Err(e) => self.set_message(StatusKind::Error, format!("❌ {e}")),
        }
    }

    /// Draw the card. `index` keeps widget state apart for files sharing a name.
    pub fn show(&mut self, ui: &mut egui::Ui, index: usize, config: &SweeperConfig) -> FileCardAction {
        let mut action = FileCardAction::None;
        let file_name = self.file_name.clone();
        let id = egui::Id::new(("file_card", index));

        egui::Frame::none()
            .rounding(8.0)
            .stroke(egui::Stroke::new(
                1.5,
                if self.is_failed() {
                    StatusKind::Error.color()
                } else {
                    ACCENT
                },
            ))
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .inner_margin(12.0)
            .show(ui, |ui| {
                ui.set_width(ui.available_width());
                egui::CollapsingHeader::new(RichText::new(format!("📄 {}", file_name)).size(16.0).strong())
                    .id_salt(id)
                    .default_open(true)
                    .show(ui, |ui| {
                        action = self.show_body(ui, id, config);
                    });
            });

        action
    }

    fn show_body(&mut self, ui: &mut egui::Ui, id: egui::Id, config: &SweeperConfig) -> FileCardAction {
        let mut action = FileCardAction::None;

        let preview = match &self.state {
            CardState::Failed(error) => {
                ui.label(RichText::new(format!("❌ {}", error)).color(StatusKind::Error.color()));
                return action;
            }
            CardState::Loaded(loaded) => loaded.preview(config.preview_rows),
        };

        self.refresh(config);

        // ===== Preview =====
        ui.label(RichText::new("📌 Preview").size(14.0).strong());
        Self::draw_table(ui, id, &preview);
        ui.add_space(10.0);

        // ===== Cleaning =====
        ui.label(RichText::new("🛠 Data Cleaning Options").size(14.0).strong());
        if ui
            .checkbox(&mut self.cleaning_enabled, "Enable cleaning")
            .changed()
        {
            self.invalidate();
        }
        if self.cleaning_enabled {
            ui.horizontal(|ui| {
                if ui.button("Remove duplicates").clicked() && !self.cleaning.remove_duplicates {
                    self.cleaning.remove_duplicates = true;
                    self.invalidate();
                }
                if ui.button("Fill missing values").clicked() && !self.cleaning.fill_missing {
                    self.cleaning.fill_missing = true;
                    self.invalidate();
                }
            });
            if self.cleaning.remove_duplicates {
                ui.colored_label(StatusKind::Success.color(), "✅ Duplicates removed!");
            }
            if self.cleaning.fill_missing {
                ui.colored_label(
                    StatusKind::Success.color(),
                    "✅ Missing values filled with column mean!",
                );
            }
        }
        ui.add_space(10.0);

        // ===== Column selection =====
        ui.label(RichText::new("🎯 Select Columns to Keep").size(14.0).strong());
        let mut columns_changed = false;
        ui.horizontal_wrapped(|ui| {
            for (name, keep) in self.columns.iter_mut() {
                columns_changed |= ui.checkbox(keep, name.as_str()).changed();
            }
        });
        ui.horizontal(|ui| {
            if ui.small_button("Select All").clicked() {
                self.columns.iter_mut().for_each(|(_, keep)| *keep = true);
                columns_changed = true;
            }
            if ui.small_button("Clear All").clicked() {
                self.columns.iter_mut().for_each(|(_, keep)| *keep = false);
                columns_changed = true;
            }
        });
        if columns_changed {
            self.invalidate();
        }
        ui.add_space(10.0);

        self.refresh(config);

        // ===== Visualization =====
        ui.label(RichText::new("📊 Data Visualization").size(14.0).strong());
        if ui.checkbox(&mut self.visualize, "Show visualization").changed() {
            self.invalidate();
            self.refresh(config);
        }
        if let Some(visualization) = self.processed.as_ref().and_then(|p| p.visualization.as_ref()) {
            match visualization {
                Visualization::Chart(data) => {
                    ChartPlotter::draw_bar_chart(ui, id, data);
                    if ui.button("🖼 Save chart PNG").clicked() {
                        action = FileCardAction::SaveChart;
                    }
                }
                Visualization::NoNumericData => {
                    ui.colored_label(
                        StatusKind::Warning.color(),
                        "No numeric data available for visualization.",
                    );
                }
            }
        }
        ui.add_space(10.0);

        // ===== Conversion =====
        ui.label(RichText::new("🔄 Conversion Options").size(14.0).strong());
        ui.horizontal(|ui| {
            ui.label("Convert to:");
            for target in ConversionTarget::ALL {
                if ui.radio_value(&mut self.target, target, target.label()).changed() {
                    self.artifact = None;
                }
            }
        });
        ui.horizontal(|ui| {
            if ui.button(format!("Convert {}", self.file_name)).clicked() {
                self.convert();
            }
            if let Some(artifact) = &self.artifact {
                let label = format!("⬇ Download {} as {}", self.file_name, self.target.label());
                if ui.button(label).on_hover_text(artifact.file_name.as_str()).clicked() {
                    action = FileCardAction::Download;
                }
            }
            if self.saved_path.is_some() && ui.small_button("📂 Open").clicked() {
                action = FileCardAction::OpenSaved;
            }
        });

        if let Some((kind, text)) = &self.message {
            ui.add_space(5.0);
            ui.label(RichText::new(text).size(11.0).color(kind.color()));
        }

        action
    }

    fn draw_table(ui: &mut egui::Ui, id: egui::Id, dataset: &Dataset) {
        if dataset.width() == 0 {
            ui.label(RichText::new("No columns").color(Color32::GRAY));
            return;
        }

        ScrollArea::horizontal()
            .id_salt(id.with("preview_scroll"))
            .show(ui, |ui| {
                egui::Grid::new(id.with("preview"))
                    .striped(true)
                    .min_col_width(60.0)
                    .show(ui, |ui| {
                        for name in dataset.column_names() {
                            ui.label(RichText::new(name).strong().color(ACCENT));
                        }
                        ui.end_row();

                        for row in 0..dataset.height() {
                            for cell in dataset.row(row) {
                                if cell.is_missing() {
                                    ui.label(RichText::new("None").italics().color(Color32::GRAY));
                                } else {
                                    ui.label(cell.to_string());
                                }
                            }
                            ui.end_row();
                        }
                    });
            });
    }
}

/// Actions triggered by a file card that need the window (dialogs, disk I/O).
#[derive(Debug, Clone, PartialEq)]
pub enum FileCardAction {
    None,
    Download,
    SaveChart,
    OpenSaved,
}

//! Data Sweeper Main Application
//! Main window with the upload panel and one card per uploaded file.

use crate::charts::ChartRenderer;
use crate::config::SweeperConfig;
use crate::gui::{FileCard, FileCardAction, StatusKind, UploadPanel, UploadPanelAction};
use crate::pipeline::{self, BatchProgress, LoadedFile, PipelineError, UploadedFile};
use anyhow::{Context, Result};
use egui::SidePanel;
use log::{error, info};
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver};
use std::thread;

/// Loading result from background thread
enum LoadResult {
    File {
        progress: BatchProgress,
        result: Result<LoadedFile, PipelineError>,
    },
    Complete,
}

/// Main application window.
pub struct DataSweeperApp {
    config: SweeperConfig,
    upload_panel: UploadPanel,
    cards: Vec<FileCard>,

    // Async loading
    load_rx: Option<Receiver<LoadResult>>,
    is_loading: bool,
    batch_failures: usize,
}

impl DataSweeperApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        cc.egui_ctx.set_visuals(egui::Visuals::dark());
        Self {
            config: SweeperConfig::default(),
            upload_panel: UploadPanel::new(),
            cards: Vec::new(),
            load_rx: None,
            is_loading: false,
            batch_failures: 0,
        }
    }

    /// Handle file selection
    fn handle_browse_files(&mut self) {
        if self.is_loading {
            return;
        }

        if let Some(paths) = rfd::FileDialog::new()
            .add_filter("Data Files", &["csv", "xlsx"])
            .pick_files()
        {
            self.start_loading(paths);
        }
    }

    /// Read files from disk and parse them in a background thread.
    fn start_loading(&mut self, paths: Vec<PathBuf>) {
        if paths.is_empty() || self.is_loading {
            return;
        }

        let mut uploads = Vec::with_capacity(paths.len());
        for path in &paths {
            match UploadedFile::from_path(path) {
                Ok(upload) => uploads.push(upload),
                Err(e) => {
                    let name = path.display().to_string();
                    error!("Cannot read {}: {}", name, e);
                    self.cards
                        .push(FileCard::failed(&name, format!("Error reading file {name}: {e}")));
                }
            }
        }
        if uploads.is_empty() {
            self.upload_panel
                .set_status(StatusKind::Error, "❌ None of the selected files could be read");
            return;
        }

        info!("Loading {} file(s)", uploads.len());
        self.upload_panel
            .set_progress(0.0, &format!("Processing {} file(s)...", uploads.len()));
        self.is_loading = true;
        self.batch_failures = 0;

        let (tx, rx) = channel();
        self.load_rx = Some(rx);
        let pacing = self.config.pacing;

        thread::spawn(move || {
            pipeline::load_each(&uploads, pacing, |progress, result| {
                let _ = tx.send(LoadResult::File { progress, result });
            });
            let _ = tx.send(LoadResult::Complete);
        });
    }

    /// Check for loading results
    fn check_load_results(&mut self) {
        let rx = self.load_rx.take();
        if let Some(rx) = rx {
            let mut should_keep_receiver = true;

            while let Ok(result) = rx.try_recv() {
                match result {
                    LoadResult::File { progress, result } => {
                        if result.is_err() {
                            self.batch_failures += 1;
                        }
                        self.cards
                            .push(FileCard::from_result(&progress.file_name, result));
                        self.upload_panel.set_progress(
                            progress.fraction() * 100.0,
                            &format!(
                                "✅ {} of {} files uploaded",
                                progress.completed, progress.total
                            ),
                        );
                    }
                    LoadResult::Complete => {
                        if self.batch_failures == 0 {
                            self.upload_panel.set_status(
                                StatusKind::Success,
                                "🎉 All files processed successfully!",
                            );
                        } else {
                            self.upload_panel.set_status(
                                StatusKind::Warning,
                                &format!(
                                    "⚠ Finished with {} file(s) that could not be read",
                                    self.batch_failures
                                ),
                            );
                        }
                        self.is_loading = false;
                        should_keep_receiver = false;
                    }
                }
            }

            if should_keep_receiver {
                self.load_rx = Some(rx);
            }
        }
    }

    /// Save a card's converted file through a save dialog.
    fn handle_download(&mut self, index: usize) {
        let Some(card) = self.cards.get_mut(index) else {
            return;
        };
        let Some(artifact) = card.artifact() else {
            return;
        };

        let Some(path) = rfd::FileDialog::new()
            .set_file_name(&artifact.file_name)
            .save_file()
        else {
            return;
        };

        let result = std::fs::write(&path, &artifact.bytes)
            .with_context(|| format!("Failed to write {}", path.display()));
        match result {
            Ok(()) => {
                info!("Saved {} ({})", path.display(), artifact.content_type);
                card.set_saved(path);
            }
            Err(e) => {
                error!("{:#}", e);
                card.set_message(StatusKind::Error, format!("❌ {:#}", e));
            }
        }
    }

    /// Render a card's chart to PNG and save it.
    fn handle_save_chart(&mut self, index: usize) {
        let Some(card) = self.cards.get_mut(index) else {
            return;
        };
        let Some(data) = card.chart_data() else {
            return;
        };

        let Some(path) = rfd::FileDialog::new()
            .add_filter("PNG Image", &["png"])
            .set_file_name(ChartRenderer::png_file_name(&card.file_name))
            .save_file()
        else {
            return;
        };

        let result = Self::save_chart_png(&self.config, data, &card.file_name, &path);
        match result {
            Ok(()) => {
                info!("Chart saved to {}", path.display());
                card.set_saved(path);
            }
            Err(e) => {
                error!("{:#}", e);
                card.set_message(StatusKind::Error, format!("❌ {:#}", e));
            }
        }
    }

    fn save_chart_png(
        config: &SweeperConfig,
        data: &crate::charts::BarChartData,
        title: &str,
        path: &std::path::Path,
    ) -> Result<()> {
        let png = ChartRenderer::render_bar_chart_png(
            data,
            title,
            config.chart_png_width,
            config.chart_png_height,
        )
        .context("Failed to render chart")?;
        std::fs::write(path, png).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    fn handle_open_saved(&mut self, index: usize) {
        let Some(card) = self.cards.get_mut(index) else {
            return;
        };
        let Some(path) = card.saved_path().cloned() else {
            return;
        };
        if let Err(e) = open::that(&path).with_context(|| format!("Failed to open {}", path.display())) {
            error!("{:#}", e);
            card.set_message(StatusKind::Error, format!("❌ {:#}", e));
        }
    }

    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped: Vec<PathBuf> = ctx.input(|i| {
            i.raw
                .dropped_files
                .iter()
                .filter_map(|f| f.path.clone())
                .collect()
        });
        if !dropped.is_empty() {
            self.start_loading(dropped);
        }
    }
}

impl eframe::App for DataSweeperApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Check for background results
        self.check_load_results();
        self.handle_dropped_files(ctx);

        // Request repaint while loading
        if self.is_loading {
            ctx.request_repaint();
        }

        // Left panel - Upload Panel
        SidePanel::left("upload_panel")
            .min_width(280.0)
            .max_width(340.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    let action = self.upload_panel.show(ui, self.is_loading, self.cards.len());

                    match action {
                        UploadPanelAction::BrowseFiles => self.handle_browse_files(),
                        UploadPanelAction::ClearAll => {
                            self.cards.clear();
                            self.upload_panel.set_progress(0.0, "Ready");
                        }
                        UploadPanelAction::None => {}
                    }
                });
            });

        // Central panel - File cards
        egui::CentralPanel::default().show(ctx, |ui| {
            if self.cards.is_empty() {
                ui.centered_and_justified(|ui| {
                    ui.label(
                        egui::RichText::new("Upload CSV or Excel files to get started")
                            .size(18.0)
                            .color(egui::Color32::GRAY),
                    );
                });
                return;
            }

            let mut pending = Vec::new();
            egui::ScrollArea::vertical().show(ui, |ui| {
                for (index, card) in self.cards.iter_mut().enumerate() {
                    let action = card.show(ui, index, &self.config);
                    if action != FileCardAction::None {
                        pending.push((index, action));
                    }
                    ui.add_space(12.0);
                }
            });

            for (index, action) in pending {
                match action {
                    FileCardAction::Download => self.handle_download(index),
                    FileCardAction::SaveChart => self.handle_save_chart(index),
                    FileCardAction::OpenSaved => self.handle_open_saved(index),
                    FileCardAction::None => {}
                }
            }
        });
    }
}

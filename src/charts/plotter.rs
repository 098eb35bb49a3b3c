//! Chart Plotter Module
//! Bar chart data for numeric columns and its interactive egui_plot view.

use crate::data::Dataset;
use egui::Color32;
use egui_plot::{Bar, BarChart, Legend, Plot};

/// Color palette for series
pub const PALETTE: [Color32; 10] = [
    Color32::from_rgb(255, 165, 0),  // Orange
    Color32::from_rgb(52, 152, 219), // Blue
    Color32::from_rgb(46, 204, 113), // Green
    Color32::from_rgb(155, 89, 182), // Purple
    Color32::from_rgb(231, 76, 60),  // Red
    Color32::from_rgb(26, 188, 156), // Teal
    Color32::from_rgb(233, 30, 99),  // Pink
    Color32::from_rgb(0, 188, 212),  // Cyan
    Color32::from_rgb(121, 85, 72),  // Brown
    Color32::from_rgb(96, 125, 139), // Blue Grey
];

/// Total width shared by the bars of one row.
const GROUP_WIDTH: f64 = 0.8;

/// One numeric column, keyed by row position.
#[derive(Debug, Clone, PartialEq)]
pub struct BarSeries {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

/// Grouped bars: one group per row, one bar per series.
#[derive(Debug, Clone, PartialEq)]
pub struct BarChartData {
    pub series: Vec<BarSeries>,
    pub row_count: usize,
}

impl BarChartData {
    /// Value span covering every bar and the zero baseline, padded by 10%.
    pub fn value_range(&self) -> (f64, f64) {
        let (min, max) = self
            .series
            .iter()
            .flat_map(|s| s.values.iter().flatten())
            .fold((0.0f64, 0.0f64), |(lo, hi), &v| (lo.min(v), hi.max(v)));

        if min == max {
            return (0.0, 1.0);
        }
        let pad = (max - min) * 0.1;
        (if min < 0.0 { min - pad } else { 0.0 }, max + pad)
    }

    /// Bar width and left offset of series `k` within a row group.
    pub fn bar_slot(&self, k: usize) -> (f64, f64) {
        let width = GROUP_WIDTH / self.series.len().max(1) as f64;
        (width, -GROUP_WIDTH / 2.0 + width * k as f64)
    }
}

/// Result of the visualization step.
#[derive(Debug, Clone, PartialEq)]
pub enum Visualization {
    Chart(BarChartData),
    /// The dataset has no numeric columns; show a notice instead of a chart.
    NoNumericData,
}

impl Visualization {
    /// Chart the first `max_series` numeric columns of `dataset`.
    ///
    /// A dataset without rows has no typed columns to chart.
    pub fn from_dataset(dataset: &Dataset, max_series: usize) -> Self {
        if dataset.is_empty() {
            return Visualization::NoNumericData;
        }

        let series: Vec<BarSeries> = dataset
            .numeric_columns()
            .into_iter()
            .take(max_series)
            .map(|col| BarSeries {
                name: col.name.clone(),
                values: col.values(),
            })
            .collect();

        if series.is_empty() {
            Visualization::NoNumericData
        } else {
            Visualization::Chart(BarChartData {
                series,
                row_count: dataset.height(),
            })
        }
    }
}

/// Draws bar charts with egui_plot.
pub struct ChartPlotter;

impl ChartPlotter {
    pub fn series_color(index: usize) -> Color32 {
        PALETTE[index % PALETTE.len()]
    }

    /// Grouped bar chart; x axis is the row position.
    pub fn draw_bar_chart(ui: &mut egui::Ui, id: impl std::hash::Hash, data: &BarChartData) {
        Plot::new(("bar_chart", id))
            .height(260.0)
            .legend(Legend::default())
            .x_axis_label("Row")
            .y_axis_label("Value")
            .allow_scroll(false)
            .show(ui, |plot_ui| {
                for (k, series) in data.series.iter().enumerate() {
                    let (width, offset) = data.bar_slot(k);
                    let bars: Vec<Bar> = series
                        .values
                        .iter()
                        .enumerate()
                        .filter_map(|(row, v)| {
                            v.map(|v| {
                                Bar::new(row as f64 + offset + width / 2.0, v)
                                    .width(width)
                                    .name(format!("{} [{}]", series.name, row))
                            })
                        })
                        .collect();

                    plot_ui.bar_chart(
                        BarChart::new(bars)
                            .name(&series.name)
                            .color(Self::series_color(k)),
                    );
                }
            });
    }
}

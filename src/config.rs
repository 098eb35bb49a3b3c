//! Application Settings
//! In-memory knobs shared by the pipeline and the window. Nothing is persisted.

use std::time::Duration;

/// Number of rows shown in a file preview.
pub const DEFAULT_PREVIEW_ROWS: usize = 5;
/// Number of numeric columns drawn in the bar chart.
pub const DEFAULT_CHART_SERIES: usize = 2;

/// Settings for one application session.
#[derive(Debug, Clone)]
pub struct SweeperConfig {
    pub preview_rows: usize,
    pub chart_series: usize,
    /// Cosmetic pause between files while a batch loads.
    pub pacing: Duration,
    pub chart_png_width: u32,
    pub chart_png_height: u32,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            preview_rows: DEFAULT_PREVIEW_ROWS,
            chart_series: DEFAULT_CHART_SERIES,
            pacing: Duration::from_millis(500),
            chart_png_width: 1200,
            chart_png_height: 600,
        }
    }
}

impl SweeperConfig {
    /// Same settings without the pacing delay (batch jobs and tests).
    pub fn unpaced() -> Self {
        Self {
            pacing: Duration::ZERO,
            ..Self::default()
        }
    }
}

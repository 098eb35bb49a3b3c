//! Static Chart Renderer
//! Renders a [`BarChartData`] to PNG bytes with plotters, for saving to disk.

use crate::charts::BarChartData;
use image::{ImageFormat, RgbImage};
use plotters::prelude::*;
use std::fmt::Display;
use std::io::Cursor;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to draw chart: {0}")]
    Draw(String),
    #[error("Chart buffer has the wrong size")]
    Buffer,
    #[error("Failed to encode PNG: {0}")]
    Encode(#[from] image::ImageError),
}

fn draw_err(e: impl Display) -> RenderError {
    RenderError::Draw(e.to_string())
}

// Same hues as the interactive palette.
const SERIES_COLORS: [RGBColor; 4] = [
    RGBColor(255, 165, 0),
    RGBColor(52, 152, 219),
    RGBColor(46, 204, 113),
    RGBColor(155, 89, 182),
];

pub struct ChartRenderer;

impl ChartRenderer {
    /// Render grouped bars to an in-memory PNG.
    pub fn render_bar_chart_png(
        data: &BarChartData,
        title: &str,
        width: u32,
        height: u32,
    ) -> Result<Vec<u8>, RenderError> {
        let mut rgb = vec![0u8; (width * height * 3) as usize];
        {
            let root = BitMapBackend::with_buffer(&mut rgb, (width, height)).into_drawing_area();
            root.fill(&WHITE).map_err(draw_err)?;

            let (y_min, y_max) = data.value_range();
            let rows = data.row_count.max(1) as f64;

            let mut chart = ChartBuilder::on(&root)
                .caption(title, ("sans-serif", 28))
                .margin(20)
                .x_label_area_size(40)
                .y_label_area_size(60)
                .build_cartesian_2d(-0.5f64..(rows - 0.5), y_min..y_max)
                .map_err(draw_err)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .x_desc("Row")
                .y_desc("Value")
                .draw()
                .map_err(draw_err)?;

            for (k, series) in data.series.iter().enumerate() {
                let color = SERIES_COLORS[k % SERIES_COLORS.len()];
                let (bar_width, offset) = data.bar_slot(k);

                chart
                    .draw_series(series.values.iter().enumerate().filter_map(|(row, v)| {
                        v.map(|v| {
                            let x0 = row as f64 + offset;
                            Rectangle::new([(x0, 0.0), (x0 + bar_width, v)], color.filled())
                        })
                    }))
                    .map_err(draw_err)?
                    .label(series.name.clone())
                    .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 12, y + 5)], color.filled()));
            }

            chart
                .configure_series_labels()
                .background_style(WHITE.mix(0.8))
                .border_style(&BLACK)
                .draw()
                .map_err(draw_err)?;

            root.present().map_err(draw_err)?;
        }

        let image = RgbImage::from_raw(width, height, rgb).ok_or(RenderError::Buffer)?;
        let mut png = Vec::new();
        image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
        Ok(png)
    }

    /// `sales.csv` → `sales_chart.png`
    pub fn png_file_name(original: &str) -> String {
        let stem = std::path::Path::new(original)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(original);
        format!("{stem}_chart.png")
    }
}

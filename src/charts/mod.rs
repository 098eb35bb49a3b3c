//! Charts module - Chart rendering

mod plotter;
mod renderer;

pub use plotter::{BarChartData, BarSeries, ChartPlotter, Visualization};
pub use renderer::{ChartRenderer, RenderError};

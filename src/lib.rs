//! Data Sweeper - CSV & Excel cleaning and conversion
//!
//! Upload CSV or XLSX files, preview them, remove duplicates, fill missing
//! numeric values, keep a subset of columns, chart the numeric data, and
//! convert between CSV and Excel.

pub mod charts;
pub mod config;
pub mod data;
pub mod gui;
pub mod pipeline;

//! Data Processor Module
//! Cleaning and projection operations on a [`Dataset`].

use super::model::{Cell, Column, Dataset};
use log::debug;
use rayon::prelude::*;
use statrs::statistics::Statistics;
use std::collections::HashSet;

/// Which cleaning steps to apply. Each flag is a setting, not an action: the
/// pipeline applies them to the freshly parsed dataset, so turning a step on
/// again has no further effect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleaningOptions {
    pub remove_duplicates: bool,
    pub fill_missing: bool,
}

/// Handles data cleaning and transformation operations.
pub struct DataProcessor;

impl DataProcessor {
    /// Drop rows equal to an earlier row, keeping the first occurrence in place.
    ///
    /// Returns the number of rows removed.
    pub fn remove_duplicates(dataset: &mut Dataset) -> usize {
        let before = dataset.height();
        let mut seen: HashSet<Vec<&Cell>> = HashSet::with_capacity(before);
        let keep: Vec<bool> = (0..before).map(|i| seen.insert(dataset.row(i))).collect();
        drop(seen);

        dataset.retain_rows(&keep);
        let removed = before - dataset.height();
        debug!("Removed {} duplicate rows", removed);
        removed
    }

    /// Replace missing cells of every numeric column with that column's mean.
    ///
    /// Text and mixed columns are left as they are, and so is a numeric column
    /// with no values to average. Returns the number of cells filled.
    pub fn fill_missing_with_mean(dataset: &mut Dataset) -> usize {
        let filled: usize = dataset
            .columns_mut()
            .par_iter_mut()
            .filter(|col| col.is_numeric())
            .map(Self::fill_column)
            .sum();
        debug!("Filled {} missing numeric cells", filled);
        filled
    }

    fn fill_column(column: &mut Column) -> usize {
        let present: Vec<f64> = column.cells.iter().filter_map(Cell::as_f64).collect();
        if present.is_empty() || present.len() == column.cells.len() {
            return 0;
        }

        let mean = present.iter().mean();
        let mut filled = 0;
        for cell in column.cells.iter_mut().filter(|c| c.is_missing()) {
            *cell = Cell::Number(mean);
            filled += 1;
        }
        filled
    }

    /// Project onto `selected` columns. Names not in the dataset are ignored and
    /// the dataset's own column order is kept. Row count and order do not change.
    pub fn select_columns(dataset: &mut Dataset, selected: &[String]) {
        let wanted: HashSet<&str> = selected.iter().map(String::as_str).collect();
        dataset.retain_columns(|name| wanted.contains(name));
    }

    /// Apply the enabled cleaning steps: duplicates first, then mean-fill.
    pub fn clean(dataset: &mut Dataset, options: CleaningOptions) {
        if options.remove_duplicates {
            Self::remove_duplicates(dataset);
        }
        if options.fill_missing {
            Self::fill_missing_with_mean(dataset);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn num(v: f64) -> Cell {
        Cell::Number(v)
    }

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    /// Rows `[1,,3]`, `[1,,3]`, `[4,5,6]` under columns a, b, c.
    fn scenario() -> Dataset {
        Dataset::new(vec![
            Column::new("a", vec![num(1.0), num(1.0), num(4.0)]),
            Column::new("b", vec![Cell::Missing, Cell::Missing, num(5.0)]),
            Column::new("c", vec![num(3.0), num(3.0), num(6.0)]),
        ])
        .unwrap()
    }

    #[test]
    fn dedup_then_fill_scenario() {
        let mut ds = scenario();
        assert_eq!(DataProcessor::remove_duplicates(&mut ds), 1);
        assert_eq!(ds.height(), 2);
        assert_eq!(ds.row(0), vec![&num(1.0), &Cell::Missing, &num(3.0)]);
        assert_eq!(ds.row(1), vec![&num(4.0), &num(5.0), &num(6.0)]);

        assert_eq!(DataProcessor::fill_missing_with_mean(&mut ds), 1);
        assert_eq!(ds.column("b").unwrap().values(), vec![Some(5.0), Some(5.0)]);
        assert_eq!(ds.column("a").unwrap().values(), vec![Some(1.0), Some(4.0)]);
    }

    #[test]
    fn fill_uses_mean_of_present_values() {
        let mut ds = Dataset::new(vec![Column::new(
            "x",
            vec![num(3.0), Cell::Missing, num(6.0), Cell::Missing],
        )])
        .unwrap();
        DataProcessor::fill_missing_with_mean(&mut ds);
        assert_eq!(
            ds.column("x").unwrap().values(),
            vec![Some(3.0), Some(4.5), Some(6.0), Some(4.5)]
        );
    }

    #[test]
    fn fill_leaves_text_columns_alone() {
        let mut ds = Dataset::new(vec![
            Column::new("name", vec![text("a"), Cell::Missing]),
            Column::new("mixed", vec![num(1.0), text("b")]),
            Column::new("empty", vec![Cell::Missing, Cell::Missing]),
        ])
        .unwrap();
        let before = ds.clone();
        assert_eq!(DataProcessor::fill_missing_with_mean(&mut ds), 0);
        assert_eq!(ds, before);
    }

    #[test]
    fn dedup_keeps_first_occurrence_order() {
        let mut ds = Dataset::new(vec![Column::new(
            "k",
            vec![text("b"), text("a"), text("b"), text("c"), text("a")],
        )])
        .unwrap();
        DataProcessor::remove_duplicates(&mut ds);
        assert_eq!(
            ds.column("k").unwrap().cells,
            vec![text("b"), text("a"), text("c")]
        );
    }

    #[test]
    fn select_keeps_dataset_order_and_rows() {
        let mut ds = scenario();
        DataProcessor::select_columns(&mut ds, &["c".into(), "a".into(), "zzz".into()]);
        assert_eq!(ds.column_names(), vec!["a", "c"]);
        assert_eq!(ds.height(), 3);
    }

    #[test]
    fn select_nothing_keeps_row_count() {
        let mut ds = scenario();
        DataProcessor::select_columns(&mut ds, &[]);
        assert_eq!(ds.width(), 0);
        assert_eq!(ds.height(), 3);
    }

    #[test]
    fn clean_settles_after_one_pass() {
        let options = CleaningOptions {
            remove_duplicates: true,
            fill_missing: true,
        };
        let mut once = scenario();
        DataProcessor::clean(&mut once, options);
        let mut twice = once.clone();
        DataProcessor::clean(&mut twice, options);
        assert_eq!(once, twice);
    }

    fn arb_cell() -> impl Strategy<Value = Cell> {
        prop_oneof![
            (0i32..4).prop_map(|v| Cell::Number(v as f64)),
            "[ab]".prop_map(Cell::Text),
            Just(Cell::Missing),
        ]
    }

    fn arb_numeric_cell() -> impl Strategy<Value = Cell> {
        prop_oneof![
            (-100i32..100).prop_map(|v| Cell::Number(v as f64)),
            Just(Cell::Missing),
        ]
    }

    fn arb_dataset() -> impl Strategy<Value = Dataset> {
        (0usize..12).prop_flat_map(|rows| {
            (
                prop::collection::vec(arb_cell(), rows),
                prop::collection::vec(arb_numeric_cell(), rows),
                prop::collection::vec(arb_cell(), rows),
            )
                .prop_map(|(a, b, c)| {
                    Dataset::new(vec![
                        Column::new("a", a),
                        Column::new("b", b),
                        Column::new("c", c),
                    ])
                    .unwrap()
                })
        })
    }

    proptest! {
        #[test]
        fn dedup_is_idempotent(ds in arb_dataset()) {
            let mut once = ds.clone();
            DataProcessor::remove_duplicates(&mut once);
            let mut twice = once.clone();
            prop_assert_eq!(DataProcessor::remove_duplicates(&mut twice), 0);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn fill_matches_mean_and_spares_text(ds in arb_dataset()) {
            let mut filled = ds.clone();
            DataProcessor::fill_missing_with_mean(&mut filled);

            for (orig, new) in ds.columns().iter().zip(filled.columns()) {
                if !orig.is_numeric() {
                    prop_assert_eq!(orig, new);
                    continue;
                }
                let present: Vec<f64> = orig.cells.iter().filter_map(Cell::as_f64).collect();
                for (o, n) in orig.cells.iter().zip(&new.cells) {
                    match o {
                        Cell::Missing if !present.is_empty() => {
                            let mean = present.iter().sum::<f64>() / present.len() as f64;
                            let got = n.as_f64().unwrap();
                            prop_assert!((got - mean).abs() < 1e-9);
                        }
                        _ => prop_assert_eq!(o, n),
                    }
                }
            }

            let mut again = filled.clone();
            DataProcessor::fill_missing_with_mean(&mut again);
            prop_assert_eq!(filled, again);
        }

        #[test]
        fn projection_is_a_subset(
            ds in arb_dataset(),
            pick in prop::collection::vec(prop::sample::select(vec!["a", "b", "c", "d"]), 0..4),
        ) {
            let selected: Vec<String> = pick.iter().map(|s| s.to_string()).collect();
            let mut projected = ds.clone();
            DataProcessor::select_columns(&mut projected, &selected);

            prop_assert_eq!(projected.height(), ds.height());
            for col in projected.columns() {
                prop_assert!(selected.contains(&col.name));
                prop_assert_eq!(Some(col), ds.column(&col.name));
            }
        }
    }
}

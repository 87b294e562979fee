//! Price table aligned on a unified date timeline.

use crate::domain::error::StockcorrError;
use crate::domain::price::{PriceBar, PriceField};
use crate::domain::series;
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, PartialEq)]
pub struct PriceColumn {
    pub symbol: String,
    pub values: Vec<Option<f64>>,
}

impl PriceColumn {
    pub fn first_value(&self) -> Option<f64> {
        self.values.iter().flatten().next().copied()
    }

    pub fn last_value(&self) -> Option<f64> {
        self.values.iter().rev().flatten().next().copied()
    }
}

/// Closing prices for several symbols on the union of their trading dates.
/// Columns keep the order in which they were added.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PriceTable {
    dates: Vec<NaiveDate>,
    columns: Vec<PriceColumn>,
}

/// Per-date returns for one symbol; the table's first date has no entry.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnSeries {
    pub symbol: String,
    pub dates: Vec<NaiveDate>,
    pub values: Vec<Option<f64>>,
}

impl ReturnSeries {
    /// (date, return) pairs with a defined return.
    pub fn observations(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.dates
            .iter()
            .zip(&self.values)
            .filter_map(|(d, v)| v.map(|r| (*d, r)))
    }
}

pub fn build_unified_timeline(series: &[(String, Vec<PriceBar>)]) -> Vec<NaiveDate> {
    let unique_dates: BTreeSet<NaiveDate> = series
        .iter()
        .flat_map(|(_, bars)| bars.iter().map(|bar| bar.date))
        .collect();
    unique_dates.into_iter().collect()
}

impl PriceTable {
    /// Outer-join per-symbol bars. Dates a symbol did not trade on are
    /// recorded as missing rather than dropped.
    pub fn from_series(series: &[(String, Vec<PriceBar>)], field: PriceField) -> Self {
        let dates = build_unified_timeline(series);
        let columns = series
            .iter()
            .map(|(symbol, bars)| {
                let by_date: HashMap<NaiveDate, Option<f64>> =
                    bars.iter().map(|b| (b.date, b.price(field))).collect();
                PriceColumn {
                    symbol: symbol.clone(),
                    values: dates
                        .iter()
                        .map(|d| by_date.get(d).copied().flatten())
                        .collect(),
                }
            })
            .collect();
        Self { dates, columns }
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn columns(&self) -> &[PriceColumn] {
        &self.columns
    }

    pub fn symbols(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.symbol.as_str()).collect()
    }

    pub fn row_count(&self) -> usize {
        self.dates.len()
    }

    /// True when there is nothing to compute on: no dates, no columns, or
    /// no price anywhere in the table.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
            || self
                .columns
                .iter()
                .all(|c| c.values.iter().all(Option::is_none))
    }

    pub fn column(&self, symbol: &str) -> Result<&PriceColumn, StockcorrError> {
        self.columns
            .iter()
            .find(|c| c.symbol == symbol)
            .ok_or_else(|| StockcorrError::MissingColumn {
                symbol: symbol.to_string(),
            })
    }

    pub fn forward_fill(&self) -> Self {
        self.map_columns(series::forward_fill)
    }

    pub fn rebase(&self, base: f64) -> Self {
        self.map_columns(|values| series::rebase(values, base))
    }

    pub fn returns(&self, symbol: &str) -> Result<ReturnSeries, StockcorrError> {
        let column = self.column(symbol)?;
        Ok(ReturnSeries {
            symbol: column.symbol.clone(),
            dates: self.dates.iter().skip(1).copied().collect(),
            values: series::pct_change(&column.values),
        })
    }

    fn map_columns<F>(&self, f: F) -> Self
    where
        F: Fn(&[Option<f64>]) -> Vec<Option<f64>>,
    {
        Self {
            dates: self.dates.clone(),
            columns: self
                .columns
                .iter()
                .map(|c| PriceColumn {
                    symbol: c.symbol.clone(),
                    values: f(&c.values),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(symbol: &str, date: &str, close: Option<f64>) -> PriceBar {
        PriceBar {
            symbol: symbol.to_string(),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            close,
            adj_close: None,
        }
    }

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn sample() -> PriceTable {
        PriceTable::from_series(
            &[
                (
                    "BP.L".to_string(),
                    vec![
                        bar("BP.L", "2025-01-02", Some(10.0)),
                        bar("BP.L", "2025-01-06", Some(13.0)),
                    ],
                ),
                (
                    "^FTSE".to_string(),
                    vec![
                        bar("^FTSE", "2025-01-03", Some(8000.0)),
                        bar("^FTSE", "2025-01-06", Some(10000.0)),
                    ],
                ),
            ],
            PriceField::Close,
        )
    }

    #[test]
    fn unified_timeline_merges_and_sorts() {
        let table = sample();
        assert_eq!(
            table.dates(),
            &[d("2025-01-02"), d("2025-01-03"), d("2025-01-06")]
        );
    }

    #[test]
    fn outer_join_marks_gaps_missing() {
        let table = sample();
        assert_eq!(
            table.column("BP.L").unwrap().values,
            vec![Some(10.0), None, Some(13.0)]
        );
        assert_eq!(
            table.column("^FTSE").unwrap().values,
            vec![None, Some(8000.0), Some(10000.0)]
        );
    }

    #[test]
    fn columns_keep_insertion_order() {
        assert_eq!(sample().symbols(), vec!["BP.L", "^FTSE"]);
    }

    #[test]
    fn missing_column_is_reported() {
        let err = sample().column("VOD.L").unwrap_err();
        assert!(matches!(err, StockcorrError::MissingColumn { symbol } if symbol == "VOD.L"));
    }

    #[test]
    fn forward_fill_runs_per_column() {
        let filled = sample().forward_fill();
        assert_eq!(
            filled.column("BP.L").unwrap().values,
            vec![Some(10.0), Some(10.0), Some(13.0)]
        );
        assert_eq!(
            filled.column("^FTSE").unwrap().values,
            vec![None, Some(8000.0), Some(10000.0)]
        );
    }

    #[test]
    fn returns_skip_first_date() {
        let returns = sample().forward_fill().returns("BP.L").unwrap();
        assert_eq!(returns.dates, vec![d("2025-01-03"), d("2025-01-06")]);
        assert_eq!(returns.values[0], Some(0.0));
        assert!((returns.values[1].unwrap() - 0.3).abs() < 1e-12);
    }

    #[test]
    fn rebase_uses_first_present_value_per_column() {
        let rebased = sample().rebase(100.0);
        assert_eq!(
            rebased.column("^FTSE").unwrap().values,
            vec![None, Some(100.0), Some(125.0)]
        );
        assert_eq!(rebased.column("BP.L").unwrap().first_value(), Some(100.0));
    }

    #[test]
    fn empty_table() {
        assert!(PriceTable::default().is_empty());
        let blank = PriceTable::from_series(
            &[("X".to_string(), vec![bar("X", "2025-01-02", None)])],
            PriceField::Close,
        );
        assert!(blank.is_empty());
        assert!(!sample().is_empty());
    }

    #[test]
    fn observations_filter_missing() {
        let returns = ReturnSeries {
            symbol: "X".into(),
            dates: vec![d("2025-01-02"), d("2025-01-03")],
            values: vec![None, Some(0.5)],
        };
        let obs: Vec<_> = returns.observations().collect();
        assert_eq!(obs, vec![(d("2025-01-03"), 0.5)]);
    }

    #[test]
    fn last_value_skips_trailing_gap() {
        let column = PriceColumn {
            symbol: "X".into(),
            values: vec![Some(1.0), Some(2.0), None],
        };
        assert_eq!(column.last_value(), Some(2.0));
    }
}

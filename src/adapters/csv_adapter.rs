//! CSV file data adapter.
//!
//! One file per symbol, `<dir>/<SYMBOL>.csv`, in the layout Yahoo Finance
//! exports: `Date,Open,High,Low,Close,Adj Close,Volume`. Only the date and
//! the two close columns are read; `null`, `NaN` and empty cells are gaps.

use crate::domain::error::StockcorrError;
use crate::domain::price::PriceBar;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }

    pub fn list_symbols(&self) -> Result<Vec<String>, StockcorrError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| StockcorrError::DataSource {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StockcorrError::DataSource {
                reason: format!("directory entry error: {}", e),
            })?;
            let name = entry.file_name();
            if let Some(symbol) = name.to_string_lossy().strip_suffix(".csv") {
                symbols.push(symbol.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}

impl DataPort for CsvAdapter {
    fn fetch_prices(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, StockcorrError> {
        let path = self.csv_path(symbol);
        let file = match fs::File::open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no price file");
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(StockcorrError::DataSource {
                    reason: format!("failed to read {}: {}", path.display(), e),
                });
            }
        };

        let bars = parse_price_csv(file, symbol)?
            .into_iter()
            .filter(|b| b.date >= start_date && b.date <= end_date)
            .collect();
        Ok(bars)
    }

    fn name(&self) -> &str {
        "csv"
    }
}

/// Read a whole price file from disk.
pub fn read_price_file(path: &Path, symbol: &str) -> Result<Vec<PriceBar>, StockcorrError> {
    let file = fs::File::open(path).map_err(|e| StockcorrError::DataSource {
        reason: format!("failed to read {}: {}", path.display(), e),
    })?;
    parse_price_csv(file, symbol)
}

/// Parse Yahoo-style CSV into bars sorted by date.
pub fn parse_price_csv<R: Read>(reader: R, symbol: &str) -> Result<Vec<PriceBar>, StockcorrError> {
    let mut rdr = csv::Reader::from_reader(reader);

    let headers = rdr
        .headers()
        .map_err(|e| StockcorrError::DataSource {
            reason: format!("CSV header error: {}", e),
        })?
        .clone();
    let find = |names: &[&str]| {
        headers.iter().position(|h| {
            let h = h.trim().to_lowercase().replace(' ', "_");
            names.contains(&h.as_str())
        })
    };

    let date_col = find(&["date"]).ok_or_else(|| StockcorrError::DataSource {
        reason: "missing date column".into(),
    })?;
    let close_col = find(&["close"]);
    let adj_col = find(&["adj_close", "adjclose"]);
    if close_col.is_none() && adj_col.is_none() {
        return Err(StockcorrError::DataSource {
            reason: "missing close column".into(),
        });
    }

    let mut bars = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(|e| StockcorrError::DataSource {
            reason: format!("CSV parse error: {}", e),
        })?;

        let date_str = record.get(date_col).unwrap_or_default().trim();
        // Some exports carry a time component: keep the day.
        let day = date_str.get(..10).unwrap_or(date_str);
        let date = NaiveDate::parse_from_str(day, "%Y-%m-%d").map_err(|e| {
            StockcorrError::DataSource {
                reason: format!("invalid date '{}': {}", date_str, e),
            }
        })?;

        bars.push(PriceBar {
            symbol: symbol.to_string(),
            date,
            close: parse_cell(close_col.and_then(|i| record.get(i)), "close")?,
            adj_close: parse_cell(adj_col.and_then(|i| record.get(i)), "adj close")?,
        });
    }

    bars.sort_by_key(|b| b.date);
    Ok(bars)
}

fn parse_cell(cell: Option<&str>, column: &str) -> Result<Option<f64>, StockcorrError> {
    let Some(raw) = cell.map(str::trim) else {
        return Ok(None);
    };
    if raw.is_empty() || raw.eq_ignore_ascii_case("null") || raw.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }
    raw.parse::<f64>()
        .map(Some)
        .map_err(|e| StockcorrError::DataSource {
            reason: format!("invalid {} value '{}': {}", column, raw, e),
        })
}

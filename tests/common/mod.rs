#![allow(dead_code)]

use chrono::NaiveDate;
pub use stockcorr::domain::price::PriceBar;
use stockcorr::domain::error::StockcorrError;
use stockcorr::ports::data_port::DataPort;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<PriceBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<PriceBar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_closes(self, symbol: &str, start_date: &str, closes: &[f64]) -> Self {
        let bars = generate_bars(symbol, start_date, closes);
        self.with_bars(symbol, bars)
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_prices(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, StockcorrError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(StockcorrError::DataSource {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(symbol)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.date >= start_date && b.date <= end_date)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_bar(symbol: &str, date: &str, close: Option<f64>) -> PriceBar {
    PriceBar {
        symbol: symbol.to_string(),
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        close,
        adj_close: close,
    }
}

/// One bar per calendar day from `start_date`.
pub fn generate_bars(symbol: &str, start_date: &str, closes: &[f64]) -> Vec<PriceBar> {
    let start = NaiveDate::parse_from_str(start_date, "%Y-%m-%d").unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, close)| PriceBar {
            symbol: symbol.to_string(),
            date: start + chrono::Duration::days(i as i64),
            close: Some(*close),
            adj_close: Some(*close),
        })
        .collect()
}

//! Correlation engine: one instrument against its home-market index.
//!
//! resolve → fetch → no-data check → forward-fill → returns → correlate →
//! rebase. Everything after the fetch is pure.

use crate::domain::correlation::{self, Correlation};
use crate::domain::error::StockcorrError;
use crate::domain::price::{PriceBar, PriceField};
use crate::domain::price_table::PriceTable;
use crate::domain::ticker::{ResolvedTicker, TickerRules};
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use tracing::{debug, info, warn};

pub const DEFAULT_REBASE_BASE: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisOptions {
    pub price_field: PriceField,
    pub rebase_base: f64,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            price_field: PriceField::default(),
            rebase_base: DEFAULT_REBASE_BASE,
        }
    }
}

/// Everything the interactive form collects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelationRequest {
    pub identifier: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl CorrelationRequest {
    pub fn new(
        identifier: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Self, StockcorrError> {
        if start_date > end_date {
            return Err(StockcorrError::InvalidDateRange {
                start: start_date.to_string(),
                end: end_date.to_string(),
            });
        }
        Ok(Self {
            identifier: identifier.trim().to_string(),
            start_date,
            end_date,
        })
    }

    /// Build from raw `YYYY-MM-DD` strings.
    pub fn parse(identifier: &str, start: &str, end: &str) -> Result<Self, StockcorrError> {
        Self::new(identifier, parse_date(start)?, parse_date(end)?)
    }
}

pub fn parse_date(value: &str) -> Result<NaiveDate, StockcorrError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| StockcorrError::InvalidDate {
        value: value.to_string(),
    })
}

#[derive(Debug, Clone)]
pub struct CorrelationReport {
    pub ticker: ResolvedTicker,
    pub correlation: Correlation,
    /// Forward-filled prices, instrument column first.
    pub prices: PriceTable,
    pub rebased: PriceTable,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Fetch each symbol and align on the union of trading dates.
///
/// Symbols that come back empty are left out of the table, so asking for
/// their column later yields `MissingColumn`. If nothing comes back at all
/// the result is `NoDataReturned`.
pub fn fetch_price_table(
    data_port: &dyn DataPort,
    symbols: &[String],
    start_date: NaiveDate,
    end_date: NaiveDate,
    field: PriceField,
) -> Result<PriceTable, StockcorrError> {
    let mut series: Vec<(String, Vec<PriceBar>)> = Vec::with_capacity(symbols.len());

    for symbol in symbols {
        let bars = data_port.fetch_prices(symbol, start_date, end_date)?;
        if bars.is_empty() {
            warn!(%symbol, provider = data_port.name(), "no rows returned");
            continue;
        }
        debug!(%symbol, rows = bars.len(), "fetched prices");
        series.push((symbol.clone(), bars));
    }

    let table = PriceTable::from_series(&series, field);
    debug!(symbols = ?table.symbols(), rows = table.row_count(), "aligned price table");
    if table.is_empty() {
        return Err(StockcorrError::NoDataReturned {
            symbols: symbols.to_vec(),
        });
    }
    Ok(table)
}

/// Forward-fill, take returns and correlate two columns of a table.
pub fn correlate_columns(
    table: &PriceTable,
    instrument: &str,
    benchmark: &str,
) -> Result<Correlation, StockcorrError> {
    let filled = table.forward_fill();
    let asset_returns = filled.returns(instrument)?;
    let bench_returns = filled.returns(benchmark)?;
    Ok(correlation::correlate(&asset_returns, &bench_returns))
}

pub fn analyse(
    data_port: &dyn DataPort,
    rules: &TickerRules,
    request: &CorrelationRequest,
    options: &AnalysisOptions,
) -> Result<CorrelationReport, StockcorrError> {
    let ticker = rules.resolve(&request.identifier)?;
    info!(
        identifier = %ticker.identifier,
        provider_symbol = %ticker.provider_symbol,
        benchmark = %ticker.benchmark,
        "analysing"
    );

    let symbols = vec![ticker.provider_symbol.clone(), ticker.benchmark.clone()];
    let raw = fetch_price_table(
        data_port,
        &symbols,
        request.start_date,
        request.end_date,
        options.price_field,
    )?;

    // both columns must be present before anything is computed
    raw.column(&ticker.provider_symbol)?;
    raw.column(&ticker.benchmark)?;

    let correlation = correlate_columns(&raw, &ticker.provider_symbol, &ticker.benchmark)?;
    let prices = raw.forward_fill();
    let rebased = prices.rebase(options.rebase_base);

    debug!(
        identifier = %ticker.identifier,
        observations = correlation.observations(),
        coefficient = ?correlation.coefficient(),
        "correlation computed"
    );

    Ok(CorrelationReport {
        ticker,
        correlation,
        prices,
        rebased,
        start_date: request.start_date,
        end_date: request.end_date,
    })
}

//! Batch correlation over a fixed instrument list.
//!
//! Each instrument is analysed independently; a failure is recorded against
//! that instrument and the run moves on.

use crate::domain::engine::{self, AnalysisOptions, CorrelationReport, CorrelationRequest};
use crate::domain::error::StockcorrError;
use crate::domain::ticker::TickerRules;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::collections::HashSet;
use tracing::{info, warn};

/// Instruments analysed when no list is configured: two UK, two US, two
/// German and two French listings.
pub const DEFAULT_INSTRUMENTS: &[&str] = &[
    "VOD", "BP.L", "NVDA", "AAPL", "RHM.DE", "SAP.DE", "OR.PA", "MC.PA",
];
pub const DEFAULT_START_DATE: &str = "2025-01-01";
pub const DEFAULT_END_DATE: &str = "2025-12-31";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InstrumentListError {
    #[error("empty token in instrument list")]
    EmptyToken,

    #[error("duplicate instrument: {0}")]
    DuplicateInstrument(String),
}

pub fn parse_instruments(input: &str) -> Result<Vec<String>, InstrumentListError> {
    let mut instruments = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(InstrumentListError::EmptyToken);
        }
        let id = trimmed.to_uppercase();
        if !seen.insert(id.clone()) {
            return Err(InstrumentListError::DuplicateInstrument(id));
        }
        instruments.push(id);
    }

    Ok(instruments)
}

#[derive(Debug)]
pub struct BatchEntry {
    pub identifier: String,
    pub outcome: Result<CorrelationReport, StockcorrError>,
}

impl BatchEntry {
    pub fn coefficient(&self) -> Option<f64> {
        self.outcome
            .as_ref()
            .ok()
            .and_then(|r| r.correlation.coefficient())
    }

    /// One-line console/report rendering.
    pub fn summary(&self, decimals: usize) -> String {
        match &self.outcome {
            Ok(report) => report.correlation.display(decimals),
            Err(e) => e.to_string(),
        }
    }
}

#[derive(Debug)]
pub struct BatchReport {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// In input order.
    pub entries: Vec<BatchEntry>,
}

impl BatchReport {
    /// Defined coefficients, highest first.
    pub fn ranked(&self) -> Vec<(&str, f64)> {
        let mut ranked: Vec<(&str, f64)> = self
            .entries
            .iter()
            .filter_map(|e| e.coefficient().map(|c| (e.identifier.as_str(), c)))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked
    }

    pub fn failed(&self) -> impl Iterator<Item = &BatchEntry> {
        self.entries.iter().filter(|e| e.outcome.is_err())
    }
}

pub fn run_batch(
    data_port: &dyn DataPort,
    rules: &TickerRules,
    instruments: &[String],
    start_date: NaiveDate,
    end_date: NaiveDate,
    options: &AnalysisOptions,
) -> Result<BatchReport, StockcorrError> {
    if start_date > end_date {
        return Err(StockcorrError::InvalidDateRange {
            start: start_date.to_string(),
            end: end_date.to_string(),
        });
    }

    info!(
        instruments = instruments.len(),
        %start_date,
        %end_date,
        provider = data_port.name(),
        "running batch"
    );

    let entries: Vec<BatchEntry> = instruments
        .iter()
        .map(|identifier| {
            let outcome = CorrelationRequest::new(identifier, start_date, end_date)
                .and_then(|request| engine::analyse(data_port, rules, &request, options));
            match &outcome {
                Err(e) if e.is_data_shortfall() => info!(%identifier, reason = %e, "no result"),
                Err(e) => warn!(%identifier, error = %e, "instrument skipped"),
                Ok(_) => {}
            }
            BatchEntry {
                identifier: identifier.clone(),
                outcome,
            }
        })
        .collect();

    Ok(BatchReport {
        start_date,
        end_date,
        entries,
    })
}

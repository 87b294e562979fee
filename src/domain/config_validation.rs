//! Configuration validation.
//!
//! Validates every config field before any price is fetched.

use crate::domain::batch::parse_instruments;
use crate::domain::error::StockcorrError;
use crate::domain::price::PriceField;
use crate::domain::ticker::parse_rules;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub const DATA_SOURCES: &[&str] = &["csv", "sqlite", "yahoo"];

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), StockcorrError> {
    validate_dates(config)?;
    validate_instruments(config)?;
    validate_rebase_base(config)?;
    validate_data_source(config)?;
    validate_price_field(config)?;
    validate_ticker_rules(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> StockcorrError {
    StockcorrError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), StockcorrError> {
    let start = parse_optional_date(config.get_string("analysis", "start_date"), "start_date")?;
    let end = parse_optional_date(config.get_string("analysis", "end_date"), "end_date")?;

    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            return Err(invalid(
                "analysis",
                "start_date",
                "start_date must not be after end_date",
            ));
        }
    }
    Ok(())
}

fn parse_optional_date(
    value: Option<String>,
    field: &str,
) -> Result<Option<NaiveDate>, StockcorrError> {
    match value {
        None => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Some)
            .map_err(|_| {
                invalid(
                    "analysis",
                    field,
                    format!("invalid {} format, expected YYYY-MM-DD", field),
                )
            }),
    }
}

fn validate_instruments(config: &dyn ConfigPort) -> Result<(), StockcorrError> {
    match config.get_string("analysis", "instruments") {
        None => Ok(()),
        Some(s) => parse_instruments(&s)
            .map(|_| ())
            .map_err(|e| invalid("analysis", "instruments", e.to_string())),
    }
}

fn validate_rebase_base(config: &dyn ConfigPort) -> Result<(), StockcorrError> {
    let value = config.get_double("analysis", "rebase_base", 1.0);
    if !value.is_finite() || value <= 0.0 {
        return Err(invalid(
            "analysis",
            "rebase_base",
            "rebase_base must be positive",
        ));
    }
    Ok(())
}

fn validate_data_source(config: &dyn ConfigPort) -> Result<(), StockcorrError> {
    let source = config
        .get_string("data", "source")
        .unwrap_or_else(|| "csv".to_string())
        .to_lowercase();

    if !DATA_SOURCES.contains(&source.as_str()) {
        return Err(invalid(
            "data",
            "source",
            format!("unknown source '{}' (expected one of {})", source, DATA_SOURCES.join(", ")),
        ));
    }

    match source.as_str() {
        "csv" => require(config, "data", "csv_dir"),
        "sqlite" => require(config, "sqlite", "path"),
        _ => Ok(()),
    }
}

fn require(config: &dyn ConfigPort, section: &str, key: &str) -> Result<(), StockcorrError> {
    match config.get_string(section, key) {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(StockcorrError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }),
    }
}

fn validate_price_field(config: &dyn ConfigPort) -> Result<(), StockcorrError> {
    match config.get_string("data", "price_field") {
        None => Ok(()),
        Some(s) => s
            .parse::<PriceField>()
            .map(|_| ())
            .map_err(|e| invalid("data", "price_field", e)),
    }
}

fn validate_ticker_rules(config: &dyn ConfigPort) -> Result<(), StockcorrError> {
    match config.get_string("tickers", "rules") {
        None => Ok(()),
        Some(s) => parse_rules(&s)
            .map(|_| ())
            .map_err(|e| invalid("tickers", "rules", e.to_string())),
    }
}

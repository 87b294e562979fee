//! Concrete adapter implementations for ports.

pub mod chart_svg;
pub mod csv_adapter;
pub mod file_config_adapter;
pub mod html_report_adapter;
#[cfg(feature = "sqlite")]
pub mod sqlite_adapter;
pub mod svg_report_adapter;
#[cfg(feature = "web")]
pub mod web;
#[cfg(feature = "yahoo")]
pub mod yahoo_adapter;

use crate::domain::error::StockcorrError;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;

/// Build the price provider named by `[data] source` (default `csv`).
pub fn build_data_port(
    config: &dyn ConfigPort,
) -> Result<Box<dyn DataPort + Send + Sync>, StockcorrError> {
    let source = config
        .get_string("data", "source")
        .unwrap_or_else(|| "csv".to_string())
        .to_lowercase();

    match source.as_str() {
        "csv" => {
            let dir = config
                .get_string("data", "csv_dir")
                .ok_or_else(|| StockcorrError::ConfigMissing {
                    section: "data".into(),
                    key: "csv_dir".into(),
                })?;
            Ok(Box::new(csv_adapter::CsvAdapter::new(dir.into())))
        }
        #[cfg(feature = "sqlite")]
        "sqlite" => Ok(Box::new(sqlite_adapter::SqliteAdapter::from_config(config)?)),
        #[cfg(feature = "yahoo")]
        "yahoo" => Ok(Box::new(yahoo_adapter::YahooAdapter::from_config(config)?)),
        other => Err(StockcorrError::ConfigInvalid {
            section: "data".into(),
            key: "source".into(),
            reason: format!("source '{}' is not available in this build", other),
        }),
    }
}

//! Report generation port trait.

use crate::domain::batch::BatchReport;
use crate::domain::error::StockcorrError;

/// Port for writing the batch correlation chart.
pub trait ReportPort {
    fn write(&self, report: &BatchReport, output_path: &str) -> Result<(), StockcorrError>;
}

//! HTML report adapter implementing ReportPort.
//!
//! A standalone page with the ranked bar chart inline and a per-instrument
//! table, failures included.

use std::fs;
use std::path::Path;

use crate::adapters::chart_svg::generate_bar_chart_svg;
use crate::domain::batch::BatchReport;
use crate::domain::error::StockcorrError;
use crate::ports::report_port::ReportPort;

use askama::Template;
use chrono::NaiveDate;

struct InstrumentRow {
    identifier: String,
    benchmark: String,
    market: String,
    result: String,
    observations: String,
    failed: bool,
}

#[derive(Template)]
#[template(path = "batch_report.html")]
struct BatchReportTemplate {
    start_date: NaiveDate,
    end_date: NaiveDate,
    chart_svg: String,
    rows: Vec<InstrumentRow>,
    ranked_count: usize,
}

fn build_rows(report: &BatchReport) -> Vec<InstrumentRow> {
    report
        .entries
        .iter()
        .map(|entry| match &entry.outcome {
            Ok(r) => InstrumentRow {
                identifier: entry.identifier.clone(),
                benchmark: r.ticker.benchmark.clone(),
                market: r.ticker.market.clone(),
                result: entry.summary(4),
                observations: r.correlation.observations().to_string(),
                failed: false,
            },
            Err(_) => InstrumentRow {
                identifier: entry.identifier.clone(),
                benchmark: "-".into(),
                market: "-".into(),
                result: entry.summary(4),
                observations: "-".into(),
                failed: true,
            },
        })
        .collect()
}

/// Write `contents` to `output_path`, creating parent directories.
pub(crate) fn write_output(output_path: &str, contents: &str) -> Result<(), StockcorrError> {
    let path = Path::new(output_path);
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, contents)?;
    Ok(())
}

pub struct HtmlReportAdapter;

impl HtmlReportAdapter {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, report: &BatchReport) -> Result<String, StockcorrError> {
        let ranked = report.ranked();
        let template = BatchReportTemplate {
            start_date: report.start_date,
            end_date: report.end_date,
            chart_svg: generate_bar_chart_svg(&ranked),
            rows: build_rows(report),
            ranked_count: ranked.len(),
        };
        template
            .render()
            .map_err(|e| StockcorrError::Io(std::io::Error::other(e.to_string())))
    }
}

impl Default for HtmlReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportPort for HtmlReportAdapter {
    fn write(&self, report: &BatchReport, output_path: &str) -> Result<(), StockcorrError> {
        let html = self.render(report)?;
        write_output(output_path, &html)
    }
}

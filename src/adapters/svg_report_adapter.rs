//! Bare SVG report: just the ranked bar chart.

use crate::adapters::chart_svg::generate_bar_chart_svg;
use crate::adapters::html_report_adapter::write_output;
use crate::domain::batch::BatchReport;
use crate::domain::error::StockcorrError;
use crate::ports::report_port::ReportPort;

#[derive(Default)]
pub struct SvgReportAdapter;

impl ReportPort for SvgReportAdapter {
    fn write(&self, report: &BatchReport, output_path: &str) -> Result<(), StockcorrError> {
        write_output(output_path, &generate_bar_chart_svg(&report.ranked()))
    }
}

/// Pick the report writer from the output file extension.
pub fn report_for_path(output_path: &str) -> Box<dyn ReportPort> {
    let is_svg = std::path::Path::new(output_path)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("svg"));
    if is_svg {
        Box::new(SvgReportAdapter)
    } else {
        Box::new(crate::adapters::html_report_adapter::HtmlReportAdapter::new())
    }
}

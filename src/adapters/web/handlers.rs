//! HTTP request handlers for web adapter.

use axum::{
    Form,
    extract::{Query, State},
    response::Html,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use askama::Template;

use crate::adapters::chart_svg::generate_line_chart_svg;
use crate::domain::batch::{DEFAULT_END_DATE, DEFAULT_START_DATE};
use crate::domain::correlation::Correlation;
use crate::domain::engine::{self, CorrelationRequest};

use super::templates::{CorrelationTemplate, FormTemplate};
use super::{AppState, WebError};

pub const DEFAULT_TICKER: &str = "VOD.L";

fn render<T: Template>(template: T) -> Result<Html<String>, WebError> {
    template
        .render()
        .map(Html)
        .map_err(|e| WebError::internal(e.to_string()))
}

/// Query string for pre-filling the form.
#[derive(Debug, Default, Deserialize)]
pub struct FormQuery {
    pub ticker: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

pub async fn form(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FormQuery>,
) -> Result<Html<String>, WebError> {
    render(FormTemplate {
        ticker: query.ticker.as_deref().unwrap_or(DEFAULT_TICKER),
        start_date: query.start_date.as_deref().unwrap_or(DEFAULT_START_DATE),
        end_date: query.end_date.as_deref().unwrap_or(DEFAULT_END_DATE),
        supported: state.rules.supported().join(", "),
    })
}

#[derive(Debug, Deserialize)]
pub struct CorrelateForm {
    pub ticker: String,
    pub start_date: String,
    pub end_date: String,
}

pub async fn correlate(
    State(state): State<Arc<AppState>>,
    Form(form): Form<CorrelateForm>,
) -> Result<Html<String>, WebError> {
    let request = CorrelationRequest::parse(&form.ticker, &form.start_date, &form.end_date)?;
    info!(identifier = %request.identifier, "web correlation request");

    let worker = Arc::clone(&state);
    let report = tokio::task::spawn_blocking(move || {
        engine::analyse(
            worker.data_port.as_ref(),
            &worker.rules,
            &request,
            &worker.options,
        )
    })
    .await
    .map_err(|e| WebError::internal(e.to_string()))??;

    let coefficient = match &report.correlation {
        Correlation::Defined { .. } => report.correlation.display(2),
        Correlation::Undefined { .. } => {
            return Err(WebError::unprocessable(report.correlation.display(2)));
        }
    };

    render(CorrelationTemplate {
        identifier: &report.ticker.identifier,
        provider_symbol: &report.ticker.provider_symbol,
        benchmark: &report.ticker.benchmark,
        market: &report.ticker.market,
        start_date: report.start_date,
        end_date: report.end_date,
        observations: report.correlation.observations(),
        coefficient,
        chart_svg: generate_line_chart_svg(&report.rebased),
    })
}

pub async fn health() -> &'static str {
    "ok"
}

pub async fn not_found() -> WebError {
    WebError::not_found("Page not found")
}

//! HTML templates using Askama.

use askama::Template;
use chrono::NaiveDate;

#[derive(Template)]
#[template(path = "form.html")]
pub struct FormTemplate<'a> {
    pub ticker: &'a str,
    pub start_date: &'a str,
    pub end_date: &'a str,
    pub supported: String,
}

#[derive(Template)]
#[template(path = "correlation.html")]
pub struct CorrelationTemplate<'a> {
    pub identifier: &'a str,
    pub provider_symbol: &'a str,
    pub benchmark: &'a str,
    pub market: &'a str,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub observations: usize,
    pub coefficient: String,
    pub chart_svg: String,
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate<'a> {
    pub message: &'a str,
    pub status: u16,
}

//! Yahoo Finance chart API adapter.
//!
//! Queries `/v8/finance/chart/<symbol>` for daily bars. Timestamps are shifted
//! by the exchange's GMT offset before being cut to a calendar date, so a
//! Tokyo or Sydney open does not land on the previous day.

use crate::domain::error::StockcorrError;
use crate::domain::price::PriceBar;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use chrono::{DateTime, Days, NaiveDate};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) stockcorr";

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    meta: Option<Meta>,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Meta {
    gmtoffset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteData>,
    adjclose: Option<Vec<AdjClose>>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct AdjClose {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}

pub struct YahooAdapter {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl YahooAdapter {
    pub fn new(base_url: &str, user_agent: &str, timeout: Duration) -> Result<Self, StockcorrError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| StockcorrError::DataSource {
                reason: e.to_string(),
            })?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, StockcorrError> {
        let base_url = config
            .get_string("yahoo", "base_url")
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let user_agent = config
            .get_string("yahoo", "user_agent")
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());
        let timeout = config.get_int("yahoo", "timeout_secs", 30).max(1) as u64;
        Self::new(&base_url, &user_agent, Duration::from_secs(timeout))
    }

    fn build_url(&self, symbol: &str, start_date: NaiveDate, end_date: NaiveDate) -> String {
        // period2 is exclusive upstream; push it one day out to include end_date
        let period2_day = end_date.checked_add_days(Days::new(1)).unwrap_or(end_date);
        format!(
            "{}/{}?period1={}&period2={}&interval=1d&events=div%2Csplit",
            self.base_url,
            encode_symbol(symbol),
            midnight_utc(start_date),
            midnight_utc(period2_day),
        )
    }
}

fn midnight_utc(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or_default()
}

/// Percent-encode the characters index symbols use (`^GSPC`, `BRK=B`).
fn encode_symbol(symbol: &str) -> String {
    symbol
        .chars()
        .map(|c| match c {
            'A'..='Z' | 'a'..='z' | '0'..='9' | '.' | '-' | '_' => c.to_string(),
            other => {
                let mut buf = [0u8; 4];
                other
                    .encode_utf8(&mut buf)
                    .bytes()
                    .map(|b| format!("%{:02X}", b))
                    .collect()
            }
        })
        .collect()
}

/// Decode a chart payload. A "Not Found" API error or a result without
/// timestamps is an empty series; other API errors are reported.
fn parse_chart(json: &str, symbol: &str) -> Result<Vec<PriceBar>, StockcorrError> {
    let response: ChartResponse =
        serde_json::from_str(json).map_err(|e| StockcorrError::DataSource {
            reason: format!("invalid chart response for {}: {}", symbol, e),
        })?;

    if let Some(error) = response.chart.error {
        if error.code.eq_ignore_ascii_case("not found") {
            return Ok(Vec::new());
        }
        return Err(StockcorrError::DataSource {
            reason: format!("{} [{}]: {}", symbol, error.code, error.description),
        });
    }

    let Some(data) = response.chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok(Vec::new());
    };

    let offset = data.meta.and_then(|m| m.gmtoffset).unwrap_or(0);
    let closes = data
        .indicators
        .quote
        .into_iter()
        .next()
        .map(|q| q.close)
        .unwrap_or_default();
    let adj_closes = data
        .indicators
        .adjclose
        .and_then(|a| a.into_iter().next())
        .map(|a| a.adjclose)
        .unwrap_or_default();

    let mut bars = Vec::with_capacity(data.timestamp.len());
    for (i, ts) in data.timestamp.iter().enumerate() {
        let Some(date) = DateTime::from_timestamp(ts + offset, 0).map(|dt| dt.date_naive()) else {
            continue;
        };
        bars.push(PriceBar {
            symbol: symbol.to_string(),
            date,
            close: closes.get(i).copied().flatten(),
            adj_close: adj_closes.get(i).copied().flatten(),
        });
    }

    bars.sort_by_key(|b| b.date);
    bars.dedup_by_key(|b| b.date);
    Ok(bars)
}

impl DataPort for YahooAdapter {
    fn fetch_prices(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, StockcorrError> {
        let url = self.build_url(symbol, start_date, end_date);
        debug!(%url, "requesting chart");

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| StockcorrError::DataSource {
                reason: format!("request for {} failed: {}", symbol, e),
            })?;

        let status = response.status();
        let body = response.text().map_err(|e| StockcorrError::DataSource {
            reason: format!("reading response for {} failed: {}", symbol, e),
        })?;

        // 404 still carries a chart error body; let the parser classify it
        if !status.is_success() && status != reqwest::StatusCode::NOT_FOUND {
            return Err(StockcorrError::DataSource {
                reason: format!("{} returned HTTP {}", symbol, status),
            });
        }

        let bars = parse_chart(&body, symbol)?;
        Ok(bars
            .into_iter()
            .filter(|b| b.date >= start_date && b.date <= end_date)
            .collect())
    }

    fn name(&self) -> &str {
        "yahoo"
    }
}

//! Daily price rows as returned by a data provider.

use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;

/// One trading day for one symbol. Either price may be absent when the
/// provider reports a gap.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub symbol: String,
    pub date: NaiveDate,
    pub close: Option<f64>,
    pub adj_close: Option<f64>,
}

impl PriceBar {
    /// Price for the requested field. Adjusted close falls back to close when
    /// the provider did not supply an adjustment.
    pub fn price(&self, field: PriceField) -> Option<f64> {
        let value = match field {
            PriceField::Close => self.close,
            PriceField::AdjClose => self.adj_close.or(self.close),
        };
        value.filter(|v| v.is_finite() && *v > 0.0)
    }
}

/// Which daily price the analysis is built on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PriceField {
    Close,
    #[default]
    AdjClose,
}

impl fmt::Display for PriceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriceField::Close => write!(f, "close"),
            PriceField::AdjClose => write!(f, "adj_close"),
        }
    }
}

impl FromStr for PriceField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(' ', "_").as_str() {
            "close" => Ok(PriceField::Close),
            "adj_close" | "adjclose" | "adjusted_close" => Ok(PriceField::AdjClose),
            other => Err(format!("unknown price field '{other}' (expected close or adj_close)")),
        }
    }
}

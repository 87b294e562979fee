//! Price data provider port trait.

use crate::domain::error::StockcorrError;
use crate::domain::price::PriceBar;
use chrono::NaiveDate;

pub trait DataPort {
    /// Daily bars for `symbol` between `start_date` and `end_date`, both
    /// inclusive, in ascending date order. An unknown symbol or a range
    /// without trading yields an empty vector, not an error.
    fn fetch_prices(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, StockcorrError>;

    /// Human-readable name of the provider for log lines.
    fn name(&self) -> &str;
}

//! SQLite price store adapter.
//!
//! A user-managed local price source filled with `stockcorr import`.

use crate::domain::error::StockcorrError;
use crate::domain::price::PriceBar;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

fn pool_error(e: r2d2::Error) -> StockcorrError {
    StockcorrError::DataSource {
        reason: e.to_string(),
    }
}

fn query_error(e: rusqlite::Error) -> StockcorrError {
    StockcorrError::DataQuery {
        reason: e.to_string(),
    }
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, StockcorrError> {
        let db_path =
            config
                .get_string("sqlite", "path")
                .ok_or_else(|| StockcorrError::ConfigMissing {
                    section: "sqlite".into(),
                    key: "path".into(),
                })?;

        let pool_size = config.get_int("sqlite", "pool_size", 4).max(1) as u32;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(pool_error)?;

        let adapter = Self { pool };
        adapter.initialize_schema()?;
        Ok(adapter)
    }

    pub fn in_memory() -> Result<Self, StockcorrError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(pool_error)?;

        Ok(Self { pool })
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, StockcorrError> {
        self.pool.get().map_err(pool_error)
    }

    pub fn initialize_schema(&self) -> Result<(), StockcorrError> {
        self.conn()?
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS prices (
                    symbol TEXT NOT NULL,
                    date TEXT NOT NULL,
                    close REAL,
                    adj_close REAL,
                    PRIMARY KEY (symbol, date)
                );
                CREATE INDEX IF NOT EXISTS idx_prices_date ON prices(date);",
            )
            .map_err(query_error)
    }

    /// Upsert bars in one transaction. Returns the number of rows written.
    pub fn insert_bars(&self, bars: &[PriceBar]) -> Result<usize, StockcorrError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_error)?;

        for bar in bars {
            tx.execute(
                "INSERT OR REPLACE INTO prices (symbol, date, close, adj_close)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    bar.symbol,
                    bar.date.format("%Y-%m-%d").to_string(),
                    bar.close,
                    bar.adj_close
                ],
            )
            .map_err(query_error)?;
        }

        tx.commit().map_err(query_error)?;
        Ok(bars.len())
    }

    pub fn list_symbols(&self) -> Result<Vec<String>, StockcorrError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT DISTINCT symbol FROM prices ORDER BY symbol")
            .map_err(query_error)?;

        let rows = stmt
            .query_map([], |row| row.get(0))
            .map_err(query_error)?;

        rows.collect::<Result<Vec<String>, _>>().map_err(query_error)
    }

    pub fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, StockcorrError> {
        let conn = self.conn()?;
        let result: (Option<String>, Option<String>, i64) = conn
            .query_row(
                "SELECT MIN(date), MAX(date), COUNT(*) FROM prices WHERE symbol = ?1",
                params![symbol],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .map_err(query_error)?;

        match result {
            (Some(min_str), Some(max_str), count) if count > 0 => {
                let parse = |s: &str| {
                    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| {
                        StockcorrError::DataSource {
                            reason: e.to_string(),
                        }
                    })
                };
                Ok(Some((parse(&min_str)?, parse(&max_str)?, count as usize)))
            }
            _ => Ok(None),
        }
    }
}

impl DataPort for SqliteAdapter {
    fn fetch_prices(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, StockcorrError> {
        let conn = self.conn()?;

        let start_str = start_date.format("%Y-%m-%d").to_string();
        let end_str = end_date.format("%Y-%m-%d").to_string();

        let mut stmt = conn
            .prepare(
                "SELECT symbol, date, close, adj_close
                 FROM prices
                 WHERE symbol = ?1 AND date >= ?2 AND date <= ?3
                 ORDER BY date ASC",
            )
            .map_err(query_error)?;

        let rows = stmt
            .query_map(params![symbol, start_str, end_str], |row| {
                let date_str: String = row.get(1)?;
                let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d").map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        1,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?;
                Ok(PriceBar {
                    symbol: row.get(0)?,
                    date,
                    close: row.get(2)?,
                    adj_close: row.get(3)?,
                })
            })
            .map_err(query_error)?;

        rows.collect::<Result<Vec<_>, _>>().map_err(query_error)
    }

    fn name(&self) -> &str {
        "sqlite"
    }
}

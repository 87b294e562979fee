//! Domain error types.

/// Top-level error type for stockcorr.
#[derive(Debug, thiserror::Error)]
pub enum StockcorrError {
    #[error("ticker {identifier} not currently available (supported: {})", supported.join(", "))]
    UnsupportedInstrument {
        identifier: String,
        supported: Vec<String>,
    },

    #[error("no data found for {} in the requested date range", symbols.join(", "))]
    NoDataReturned { symbols: Vec<String> },

    #[error(
        "not enough data to calculate correlation for {instrument} vs {benchmark}: \
         {observations} paired observations, need at least 2"
    )]
    InsufficientPairedObservations {
        instrument: String,
        benchmark: String,
        observations: usize,
    },

    #[error(
        "not enough price movement to calculate correlation for {instrument} vs {benchmark}: \
         returns are constant over {observations} paired observations"
    )]
    ZeroVarianceReturns {
        instrument: String,
        benchmark: String,
        observations: usize,
    },

    #[error("no price column for {symbol} in provider result")]
    MissingColumn { symbol: String },

    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error("data query error: {reason}")]
    DataQuery { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("invalid date {value:?} (expected YYYY-MM-DD)")]
    InvalidDate { value: String },

    #[error("start date {start} is after end date {end}")]
    InvalidDateRange { start: String, end: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl StockcorrError {
    /// True for failures caused by the data itself rather than the environment.
    pub fn is_data_shortfall(&self) -> bool {
        matches!(
            self,
            StockcorrError::NoDataReturned { .. }
                | StockcorrError::InsufficientPairedObservations { .. }
                | StockcorrError::ZeroVarianceReturns { .. }
                | StockcorrError::MissingColumn { .. }
        )
    }
}

impl From<&StockcorrError> for std::process::ExitCode {
    fn from(err: &StockcorrError) -> Self {
        let code: u8 = match err {
            StockcorrError::Io(_) => 1,
            StockcorrError::ConfigParse { .. }
            | StockcorrError::ConfigMissing { .. }
            | StockcorrError::ConfigInvalid { .. }
            | StockcorrError::InvalidDate { .. }
            | StockcorrError::InvalidDateRange { .. } => 2,
            StockcorrError::DataSource { .. } | StockcorrError::DataQuery { .. } => 3,
            StockcorrError::UnsupportedInstrument { .. } => 4,
            StockcorrError::NoDataReturned { .. }
            | StockcorrError::InsufficientPairedObservations { .. }
            | StockcorrError::ZeroVarianceReturns { .. }
            | StockcorrError::MissingColumn { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}

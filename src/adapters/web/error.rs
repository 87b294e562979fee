//! HTTP error responses for web adapter.

use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use tracing::warn;

use crate::domain::error::StockcorrError;

use super::templates::ErrorTemplate;

#[derive(Debug)]
pub struct WebError {
    pub status: StatusCode,
    pub message: String,
}

impl WebError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

pub fn status_from_error(err: &StockcorrError) -> StatusCode {
    match err {
        StockcorrError::InvalidDate { .. }
        | StockcorrError::InvalidDateRange { .. }
        | StockcorrError::ConfigParse { .. }
        | StockcorrError::ConfigMissing { .. }
        | StockcorrError::ConfigInvalid { .. } => StatusCode::BAD_REQUEST,
        StockcorrError::UnsupportedInstrument { .. } => StatusCode::NOT_FOUND,
        StockcorrError::NoDataReturned { .. }
        | StockcorrError::InsufficientPairedObservations { .. }
        | StockcorrError::ZeroVarianceReturns { .. }
        | StockcorrError::MissingColumn { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        StockcorrError::DataSource { .. }
        | StockcorrError::DataQuery { .. }
        | StockcorrError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<StockcorrError> for WebError {
    fn from(err: StockcorrError) -> Self {
        Self::new(status_from_error(&err), err.to_string())
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            warn!(status = %self.status, message = %self.message, "request failed");
        }
        let template = ErrorTemplate {
            message: &self.message,
            status: self.status.as_u16(),
        };
        match template.render() {
            Ok(html) => (self.status, Html(html)).into_response(),
            Err(_) => (self.status, self.message).into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        let unsupported = StockcorrError::UnsupportedInstrument {
            identifier: "XXX.ZZ".into(),
            supported: vec![],
        };
        assert_eq!(status_from_error(&unsupported), StatusCode::NOT_FOUND);

        let bad_date = StockcorrError::InvalidDate {
            value: "yesterday".into(),
        };
        assert_eq!(status_from_error(&bad_date), StatusCode::BAD_REQUEST);

        let no_data = StockcorrError::NoDataReturned {
            symbols: vec!["BP.L".into()],
        };
        assert_eq!(status_from_error(&no_data), StatusCode::UNPROCESSABLE_ENTITY);

        let flat = StockcorrError::ZeroVarianceReturns {
            instrument: "BP.L".into(),
            benchmark: "^FTSE".into(),
            observations: 5,
        };
        assert_eq!(status_from_error(&flat), StatusCode::UNPROCESSABLE_ENTITY);

        let upstream = StockcorrError::DataSource {
            reason: "timeout".into(),
        };
        assert_eq!(
            status_from_error(&upstream),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn from_keeps_message() {
        let err: WebError = StockcorrError::MissingColumn {
            symbol: "^FTSE".into(),
        }
        .into();
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(err.message.contains("^FTSE"));
    }
}

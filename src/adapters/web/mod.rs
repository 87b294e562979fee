//! Web adapter: the interactive single-ticker form.
//!
//! Handlers only collect a `CorrelationRequest` and render the result; the
//! pipeline itself runs on the blocking pool.

mod error;
mod handlers;
mod templates;

pub use error::WebError;
pub use handlers::*;
pub use templates::*;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tracing::info;

use crate::domain::engine::AnalysisOptions;
use crate::domain::error::StockcorrError;
use crate::domain::ticker::TickerRules;
use crate::ports::data_port::DataPort;

pub const DEFAULT_LISTEN: &str = "127.0.0.1:3000";

pub struct AppState {
    pub data_port: Arc<dyn DataPort + Send + Sync>,
    pub rules: TickerRules,
    pub options: AnalysisOptions,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::form))
        .route("/correlate", post(handlers::correlate))
        .route("/health", get(handlers::health))
        .fallback(handlers::not_found)
        .with_state(Arc::new(state))
}

/// Bind `listen` and serve until the process is stopped.
pub async fn serve(state: AppState, listen: &str) -> Result<(), StockcorrError> {
    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind(listen).await?;
    info!(listen = %listener.local_addr()?, "web server listening");
    axum::serve(listener, router).await?;
    Ok(())
}

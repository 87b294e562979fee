//! Core domain types and logic.

pub mod price;
pub mod price_table;
pub mod series;
pub mod correlation;
pub mod ticker;
pub mod engine;
pub mod batch;
pub mod config_validation;
pub mod error;

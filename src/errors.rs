//! Core error types for the reporting engine.
//!
//! This module defines storage-agnostic error types. Storage-specific errors
//! (from whatever backend the hosting application uses) are converted to
//! these types by the storage layer before they reach the engine.

use chrono::ParseError as ChronoParseError;
use std::num::ParseFloatError;
use thiserror::Error;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the reporting engine.
///
/// Filter and validation failures are reported to the caller before any
/// aggregation starts; storage failures are wrapped in string form to keep
/// this type database-agnostic. Recoverable data-integrity findings are
/// *not* errors — they surface as warning entries on the report itself.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid report filter: {0}")]
    InvalidFilter(String),

    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Repository error: {0}")]
    Repository(String),

    #[error("Gain/loss calculation failed: {0}")]
    Gains(#[from] GainsError),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

/// Errors raised while replaying tax lots for realized gain/loss.
///
/// Most lot-level inconsistencies are downgraded to report warnings; these
/// variants cover the cases where the computation itself cannot proceed.
#[derive(Error, Debug)]
pub enum GainsError {
    #[error("Sale quantity must be positive, got {quantity} for transaction {transaction_id}")]
    NonPositiveSaleQuantity {
        transaction_id: String,
        quantity: String,
    },

    #[error("Lot selection returned shares that exceed the requested quantity for position {position_id}")]
    OverConsumedLots { position_id: String },
}

/// Validation errors for filter parameters and data parsing.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Failed to parse number: {0}")]
    NumberParse(#[from] ParseFloatError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Required field '{0}' is missing")]
    MissingField(String),

    #[error("Failed to parse decimal number: {0}")]
    DecimalParse(#[from] rust_decimal::Error),

    #[error("Failed to parse date/time: {0}")]
    DateTimeParse(#[from] ChronoParseError),
}

// === From implementations for common error types ===

impl From<rust_decimal::Error> for Error {
    fn from(err: rust_decimal::Error) -> Self {
        Error::Validation(ValidationError::DecimalParse(err))
    }
}

impl From<ChronoParseError> for Error {
    fn from(err: ChronoParseError) -> Self {
        Error::Validation(ValidationError::DateTimeParse(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Validation(ValidationError::InvalidInput(err.to_string()))
    }
}

impl From<Error> for String {
    fn from(err: Error) -> Self {
        err.to_string()
    }
}

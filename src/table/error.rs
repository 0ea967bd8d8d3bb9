//! Errors raised while loading or validating table data.

use thiserror::Error;

/// Errors that can occur when loading a starting state.
///
/// Rendering paths never produce these; they only surface when a hand file
/// is read or explicitly validated.
#[derive(Debug, Error)]
pub enum TableError {
    /// Table size is not 2, 6 or 9.
    #[error("table size {0} is not supported (expected 2, 6 or 9)")]
    InvalidTopology(usize),

    /// An action references a seat outside the table.
    #[error("action {index} references seat {seat}, table has {topology} seats")]
    SeatOutOfRange {
        /// Index of the offending action.
        index: usize,
        /// Seat it references.
        seat: usize,
        /// Table size.
        topology: usize,
    },

    /// The button seat is outside the table.
    #[error("button seat {button} is outside a {topology}-seat table")]
    ButtonOutOfRange {
        /// Button seat.
        button: usize,
        /// Table size.
        topology: usize,
    },

    /// Reading a hand file failed.
    #[error("failed to read hand file: {0}")]
    Io(#[from] std::io::Error),

    /// A hand file is not valid JSON for a starting state.
    #[error("invalid hand JSON: {0}")]
    Json(#[from] serde_json::Error),
}

//! Error types for the packing engine.

use thiserror::Error;

/// Input rejected before any packing work starts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Sheet dimensions must be positive and finite with a representable area, got {width} x {height}")]
    InvalidSheet { width: f64, height: f64 },

    #[error("Piece #{index} dimensions must be positive and finite with a representable area, got {width} x {height}")]
    InvalidPiece { index: usize, width: f64, height: f64 },

    #[error("Piece #{index} quantity must be at least 1, got {quantity}")]
    InvalidQuantity { index: usize, quantity: i64 },

    #[error("Too many pieces: {count} requested, limit is {limit}")]
    TooManyPieces { count: u64, limit: usize },
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, ValidationError>;

//! Error types for ChainTab
//!
//! Defines all error types used throughout the library.

use thiserror::Error;

/// Main error type for ChainTab operations
#[derive(Debug, Error)]
pub enum ChainTabError {
    /// Chain file parsing errors
    #[error("Chain parse error: {0}")]
    ChainParse(#[from] ChainParseError),

    /// Table sorting errors
    #[error("Table sort error: {0}")]
    TableSort(#[from] TableSortError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur during chain file parsing
#[derive(Debug, Error)]
pub enum ChainParseError {
    /// Invalid chain header format
    #[error("Invalid chain header at line {line}: {message}")]
    InvalidHeader { line: usize, message: String },

    /// Invalid data line format
    #[error("Invalid data line at line {line}: {message}")]
    InvalidDataLine { line: usize, message: String },

    /// Query strand must be '+' or '-'
    #[error("Query strand must be '+' or '-', got '{strand}' at line {line}")]
    InvalidStrand { line: usize, strand: String },

    /// Failed to parse integer
    #[error("Invalid {field} value '{value}' at line {line}: expected a non-negative integer")]
    ParseInt {
        line: usize,
        field: &'static str,
        value: String,
    },

    /// Coordinate validation error (e.g., start > end, block beyond chromosome)
    #[error("Invalid coordinates at line {line}: {message}")]
    InvalidCoordinates { line: usize, message: String },

    /// I/O error during parsing
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ChainParseError {
    /// Line number the error was raised at, if it maps to file content
    pub fn line_number(&self) -> Option<usize> {
        match self {
            ChainParseError::InvalidHeader { line, .. }
            | ChainParseError::InvalidDataLine { line, .. }
            | ChainParseError::InvalidStrand { line, .. }
            | ChainParseError::ParseInt { line, .. }
            | ChainParseError::InvalidCoordinates { line, .. } => Some(*line),
            ChainParseError::Io(_) => None,
        }
    }
}

/// Errors that can occur while sorting the output table
#[derive(Debug, Error)]
pub enum TableSortError {
    /// Malformed row in the intermediate table
    #[error("Invalid table row at line {line}: {message}")]
    InvalidRow { line: usize, message: String },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for ChainTab operations
pub type Result<T> = std::result::Result<T, ChainTabError>;

/// Result type alias for chain parsing operations
pub type ChainResult<T> = std::result::Result<T, ChainParseError>;

/// Result type alias for table sorting operations
pub type SortResult<T> = std::result::Result<T, TableSortError>;

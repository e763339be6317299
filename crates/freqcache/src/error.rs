//! Error types for freqcache
//!
//! Cache operations never fail; only configuration parsing does.

use std::fmt;

/// Result type alias for configuration operations
pub type Result<T> = std::result::Result<T, Error>;

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Malformed byte-size string
    Parse(String),

    /// Unit suffix not recognized
    UnknownUnit(String),

    /// Byte budget does not fit in memory addressing
    BudgetOverflow(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Parse(msg) => write!(f, "Parse error: {}", msg),
            Error::UnknownUnit(unit) => write!(f, "Unknown size unit: {:?}", unit),
            Error::BudgetOverflow(input) => write!(f, "Byte budget too large: {}", input),
        }
    }
}

impl std::error::Error for Error {}

impl From<nom::Err<nom::error::Error<&str>>> for Error {
    fn from(err: nom::Err<nom::error::Error<&str>>) -> Self {
        Error::Parse(format!("{:?}", err))
    }
}

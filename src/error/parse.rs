//! Parsing error types.

use std::num::ParseIntError;

/// Parse data error
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseDataError {
    /// Unexpected end of data
    #[error("unexpected end of data")]
    UnexpectedEof,
    /// Invalid data
    #[error("invalid data")]
    InvalidData,
}

/// Error for a single malformed TZ database field or line
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// Parse data error
    #[error(transparent)]
    ParseData(#[from] ParseDataError),
    /// Integer parsing error
    #[error(transparent)]
    ParseInt(#[from] ParseIntError),
    /// A line has fewer fields than required
    #[error("expected at least {expected} fields, found {found}")]
    MissingFields {
        /// Required number of fields
        expected: usize,
        /// Number of fields found
        found: usize,
    },
    /// Unknown month name
    #[error("invalid month '{0}'")]
    InvalidMonth(String),
    /// Unknown day of week name
    #[error("invalid day of week '{0}'")]
    InvalidDayOfWeek(String),
    /// Unrecognized ON day expression
    #[error("invalid on day '{0}'")]
    InvalidOnDay(String),
    /// Invalid time suffix
    #[error("invalid time suffix '{0}'")]
    InvalidTimeSuffix(char),
    /// Invalid time hour
    #[error("invalid time hour")]
    InvalidHour,
    /// Invalid time minute
    #[error("invalid time minute")]
    InvalidMinute,
    /// Invalid time second
    #[error("invalid time second")]
    InvalidSecond,
    /// Remaining data was found after parsing a field
    #[error("remaining data after '{0}'")]
    RemainingData(String),
}

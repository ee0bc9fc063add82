//! Compiler pipeline error types.

/// Compiler pipeline error
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    /// The extractor found malformed lines
    #[error("invalid lines found: rules={rules}, zones={zones}, links={links}")]
    InvalidLines {
        /// Number of invalid Rule lines
        rules: usize,
        /// Number of invalid Zone lines
        zones: usize,
        /// Number of invalid Link lines
        links: usize,
    },
    /// The estimated transition buffer exceeds the processor capacity
    #[error("max_buf_size={max_buf_size} is greater than {capacity}")]
    BufSizeTooLarge {
        /// Estimated buffer size
        max_buf_size: usize,
        /// Capacity of the transition buffer
        capacity: usize,
    },
    /// Invalid configuration
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    /// Invalid TZ version string
    #[error("invalid tz version '{0}'")]
    InvalidTzVersion(String),
}

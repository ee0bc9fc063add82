//! Zone processor error types.

/// Zone processor error
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ZoneProcessorError {
    /// Transitions are not sorted by transition time
    #[error("transitions not sorted for zone '{zone}' in year {year}")]
    TransitionsNotSorted {
        /// Zone name
        zone: String,
        /// Requested year
        year: i32,
    },
    /// No candidate transition is at or before the start of a match
    #[error("missing prior transition for zone '{zone}' in year {year}")]
    MissingPriorTransition {
        /// Zone name
        zone: String,
        /// Requested year
        year: i32,
    },
    /// Unsupported viewing window size
    #[error("unsupported viewing months {0}")]
    UnsupportedViewingMonths(u8),
    /// A derived field was not computed by the transformer
    #[error("incomplete record in '{name}': missing '{field}'")]
    IncompleteRecord {
        /// Zone or policy name
        name: String,
        /// Field name
        field: &'static str,
    },
    /// A zone refers to a policy missing from the database
    #[error("policy '{policy}' not found for zone '{zone}'")]
    PolicyNotFound {
        /// Zone name
        zone: String,
        /// Policy name
        policy: String,
    },
    /// A zone is missing from the database
    #[error("zone '{0}' not found")]
    ZoneNotFound(String),
}

//! Encoding error types.

/// Fatal error while encoding a transformed database for compact targets
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodeError {
    /// A rule of a policy has an empty LETTER
    #[error("empty LETTER in policy '{policy}'")]
    EmptyLetter {
        /// Policy name
        policy: String,
    },
    /// A multi-character LETTER is missing from the letters of its policy
    #[error("LETTER '{letter}' not found in policy '{policy}'")]
    UnknownLetter {
        /// Policy name
        policy: String,
        /// Letter
        letter: String,
    },
    /// A policy uses too many multi-character letters
    #[error("too many letters ({count}) in policy '{policy}'")]
    TooManyLetters {
        /// Policy name
        policy: String,
        /// Number of multi-character letters
        count: usize,
    },
    /// A derived field was not computed by the transformer
    #[error("missing derived field '{field}' in '{name}'")]
    MissingField {
        /// Zone or policy name
        name: String,
        /// Field name
        field: &'static str,
    },
}

//! Compiler configuration.

use crate::constants::{SECONDS_PER_MINUTE, SECONDS_PER_QUARTER_HOUR};
use crate::error::{CompileError, Error};

use serde::{Deserialize, Serialize};

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Target scope of the compiled database
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Simple zones for targets with 15-minute offsets, year-only UNTIL fields and single-character letters
    Basic,
    /// All zones supported by the encodings
    Extended,
}

impl Scope {
    /// Default STDOFF granularity of the scope
    pub const fn default_offset_granularity(self) -> i32 {
        match self {
            Self::Basic => SECONDS_PER_QUARTER_HOUR,
            Self::Extended => SECONDS_PER_MINUTE,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Basic => f.write_str("basic"),
            Self::Extended => f.write_str("extended"),
        }
    }
}

impl FromStr for Scope {
    type Err = CompileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "basic" => Ok(Self::Basic),
            "extended" => Ok(Self::Extended),
            _ => Err(CompileError::InvalidConfig(format!("unknown scope '{s}'"))),
        }
    }
}

/// Configuration of the compiler pipeline
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Target scope
    pub scope: Scope,
    /// Keep only the years on or after this year
    pub start_year: i32,
    /// Keep only the years before this year
    pub until_year: i32,
    /// Truncation of UNTIL and AT times, in seconds
    pub until_at_granularity: i32,
    /// Truncation of STDOFF, in seconds
    pub offset_granularity: i32,
    /// Truncation of SAVE and RULES offsets, in seconds
    pub delta_granularity: i32,
    /// Remove zones and policies not aligned on the granularities instead of truncating them
    pub strict: bool,
    /// Only warn when the estimated transition buffer is too large
    pub ignore_buf_size_too_large: bool,
}

impl CompilerConfig {
    /// Construct the default configuration of a scope
    pub fn new(scope: Scope) -> Self {
        Self {
            scope,
            start_year: 2000,
            until_year: 2038,
            until_at_granularity: SECONDS_PER_MINUTE,
            offset_granularity: scope.default_offset_granularity(),
            delta_granularity: SECONDS_PER_QUARTER_HOUR,
            strict: false,
            ignore_buf_size_too_large: false,
        }
    }

    /// Load a configuration from a JSON file, missing fields taking their default value
    pub fn from_json_file(path: &Path) -> Result<Self, Error> {
        let text = fs::read_to_string(path).map_err(|error| Error::io(path, error))?;
        let config: Self = serde_json::from_str(&text).map_err(|error| CompileError::InvalidConfig(error.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the consistency of the configuration
    pub fn validate(&self) -> Result<(), CompileError> {
        if self.start_year >= self.until_year {
            return Err(CompileError::InvalidConfig(format!("start_year ({}) must be before until_year ({})", self.start_year, self.until_year)));
        }

        let granularities = [
            ("until_at_granularity", self.until_at_granularity),
            ("offset_granularity", self.offset_granularity),
            ("delta_granularity", self.delta_granularity),
        ];

        for (name, granularity) in granularities {
            if granularity <= 0 {
                return Err(CompileError::InvalidConfig(format!("{name} must be positive, found {granularity}")));
            }
        }

        Ok(())
    }
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self::new(Scope::Extended)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_defaults() {
        let basic = CompilerConfig::new(Scope::Basic);
        assert_eq!(basic.offset_granularity, 900);
        assert_eq!(basic.until_at_granularity, 60);
        assert_eq!(basic.delta_granularity, 900);

        let extended = CompilerConfig::default();
        assert_eq!(extended.scope, Scope::Extended);
        assert_eq!(extended.offset_granularity, 60);
        assert_eq!((extended.start_year, extended.until_year), (2000, 2038));
        assert!(!extended.strict);
    }

    #[test]
    fn test_deserialize() -> Result<(), serde_json::Error> {
        let config: CompilerConfig = serde_json::from_str(r#"{"scope": "basic", "start_year": 1980, "strict": true}"#)?;
        assert_eq!(config.scope, Scope::Basic);
        assert_eq!(config.start_year, 1980);
        assert_eq!(config.until_year, 2038);
        assert!(config.strict);
        Ok(())
    }

    #[test]
    fn test_validate() {
        let mut config = CompilerConfig::default();
        assert_eq!(config.validate(), Ok(()));

        config.until_year = config.start_year;
        assert!(config.validate().is_err());

        let config = CompilerConfig { delta_granularity: 0, ..CompilerConfig::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_scope() -> Result<(), CompileError> {
        assert_eq!("basic".parse::<Scope>()?, Scope::Basic);
        assert_eq!(Scope::Extended.to_string(), "extended");
        assert!("full".parse::<Scope>().is_err());
        Ok(())
    }
}

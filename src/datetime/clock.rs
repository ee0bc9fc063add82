//! Date tuples tagged with the clock they are expressed in.

use super::DateTuple;
use crate::error::ParseError;

use std::cmp::Ordering;
use std::fmt;

/// Clock of a TZ database time, written as a suffix letter after AT and UNTIL times
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Suffix {
    /// Standard time (`s`), without DST
    Standard,
    /// Universal time (`u`)
    Utc,
    /// Wall clock time (`w`), including DST
    Wall,
}

impl Suffix {
    /// Suffix letter
    pub const fn as_char(self) -> char {
        match self {
            Self::Standard => 's',
            Self::Utc => 'u',
            Self::Wall => 'w',
        }
    }
}

impl TryFrom<char> for Suffix {
    type Error = ParseError;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        match c {
            's' => Ok(Self::Standard),
            'u' => Ok(Self::Utc),
            'w' => Ok(Self::Wall),
            _ => Err(ParseError::InvalidTimeSuffix(c)),
        }
    }
}

impl fmt::Display for Suffix {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Date tuple expressed in one of the three clocks of a time zone.
///
/// Converting between clocks needs the UTC offset and DST delta in effect, see [`ClockTime::expand`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ClockTime {
    /// Wall clock time
    Wall(DateTuple),
    /// Standard time
    Standard(DateTuple),
    /// Universal time
    Utc(DateTuple),
}

/// Same instant expressed in the three clocks, each normalized
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ExpandedTime {
    /// Wall clock time
    pub wall: DateTuple,
    /// Standard time
    pub standard: DateTuple,
    /// Universal time
    pub utc: DateTuple,
}

impl ExpandedTime {
    /// Date tuple in the clock of a suffix
    pub fn get(&self, suffix: Suffix) -> DateTuple {
        match suffix {
            Suffix::Wall => self.wall,
            Suffix::Standard => self.standard,
            Suffix::Utc => self.utc,
        }
    }
}

impl ClockTime {
    /// Construct a clock time from a date tuple and a suffix
    pub const fn new(date: DateTuple, suffix: Suffix) -> Self {
        match suffix {
            Suffix::Wall => Self::Wall(date),
            Suffix::Standard => Self::Standard(date),
            Suffix::Utc => Self::Utc(date),
        }
    }

    /// Underlying date tuple
    pub const fn date(&self) -> DateTuple {
        match *self {
            Self::Wall(date) | Self::Standard(date) | Self::Utc(date) => date,
        }
    }

    /// Clock suffix
    pub const fn suffix(&self) -> Suffix {
        match self {
            Self::Wall(_) => Suffix::Wall,
            Self::Standard(_) => Suffix::Standard,
            Self::Utc(_) => Suffix::Utc,
        }
    }

    /// Express the time in the three clocks.
    ///
    /// ## Inputs
    ///
    /// * `offset_seconds`: Standard UTC offset in effect at this time
    /// * `delta_seconds`: DST delta in effect at this time
    ///
    pub fn expand(&self, offset_seconds: i32, delta_seconds: i32) -> ExpandedTime {
        let date = self.date();
        let with_seconds = |seconds| DateTuple { seconds, ..date }.normalize();

        match self {
            Self::Wall(_) => ExpandedTime {
                wall: date.normalize(),
                standard: with_seconds(date.seconds - delta_seconds),
                utc: with_seconds(date.seconds - delta_seconds - offset_seconds),
            },
            Self::Standard(_) => ExpandedTime {
                wall: with_seconds(date.seconds + delta_seconds),
                standard: date.normalize(),
                utc: with_seconds(date.seconds - offset_seconds),
            },
            Self::Utc(_) => ExpandedTime {
                wall: with_seconds(date.seconds + delta_seconds + offset_seconds),
                standard: with_seconds(date.seconds + offset_seconds),
                utc: date.normalize(),
            },
        }
    }
}

impl Ord for ClockTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.date().cmp(&other.date()).then_with(|| self.suffix().cmp(&other.suffix()))
    }
}

impl PartialOrd for ClockTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.date(), self.suffix())
    }
}

//! Matches and transitions computed by the zone processor.

use crate::datetime::{ClockTime, DateTuple, ExpandedTime};
use crate::zone_info::{ZoneEra, ZoneRule};

use std::fmt;

/// Era clipped to the viewing window of a year
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ZoneMatch {
    /// UNTIL time of the previous era, or start of the window
    pub start: ClockTime,
    /// UNTIL time of the era, or end of the window
    pub until: ClockTime,
    /// Index of the era in its zone
    pub era_index: usize,
}

/// Position of a transition relative to a match
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(super) enum MatchPosition {
    Before,
    AtStart,
    Within,
    After,
}

/// UTC offset, DST offset and abbreviation in effect at some instant
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct OffsetInfo {
    /// Total UTC offset in seconds
    pub total_offset: i32,
    /// Standard UTC offset in seconds
    pub utc_offset: i32,
    /// DST offset in seconds
    pub dst_offset: i32,
    /// Abbreviation
    pub abbrev: String,
}

/// Change of UTC offset, DST offset or abbreviation of a zone
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Transition {
    /// Time of the transition, in wall time once fixed
    pub transition_time: ClockTime,
    /// Transition time in the three clocks, using the offsets of the previous transition
    pub expanded: ExpandedTime,
    /// Transition time before being shifted to the start of its match
    pub original_transition_time: Option<ClockTime>,
    /// Wall time of the start of the transition, in its own offsets
    pub start_date_time: DateTuple,
    /// Wall time of the end of the transition
    pub until_date_time: DateTuple,
    /// Start of the transition in seconds since `2000-01-01T00:00:00Z`
    pub start_epoch_second: i64,
    /// Standard UTC offset in seconds
    pub offset_seconds: i32,
    /// DST offset in seconds
    pub delta_seconds: i32,
    /// FORMAT of the era
    pub format: String,
    /// Rule creating the transition, for an era with a named policy
    pub rule: Option<ZoneRule>,
    /// Abbreviation
    pub abbrev: String,
    pub(super) match_until: ClockTime,
    pub(super) is_active: bool,
}

impl Transition {
    /// Transition at the start of a match without named policy
    pub(super) fn for_simple_match(zone_match: &ZoneMatch, era: &ZoneEra) -> Self {
        Self::new(zone_match, era, zone_match.start, era.rules_delta_seconds(), None)
    }

    /// Transition of a rule for a year
    pub(super) fn for_rule(zone_match: &ZoneMatch, era: &ZoneEra, rule: &ZoneRule, year: i32) -> Self {
        Self::new(zone_match, era, rule.transition_time(year), rule.delta_seconds, Some(rule.clone()))
    }

    fn new(zone_match: &ZoneMatch, era: &ZoneEra, transition_time: ClockTime, delta_seconds: i32, rule: Option<ZoneRule>) -> Self {
        let date = transition_time.date();

        Self {
            transition_time,
            expanded: ExpandedTime { wall: date, standard: date, utc: date },
            original_transition_time: None,
            start_date_time: zone_match.start.date(),
            until_date_time: zone_match.until.date(),
            start_epoch_second: 0,
            offset_seconds: era.offset_seconds,
            delta_seconds,
            format: era.format.clone(),
            rule,
            abbrev: String::new(),
            match_until: zone_match.until,
            is_active: false,
        }
    }

    /// LETTER of the rule, empty without rule
    pub fn letter(&self) -> &str {
        self.rule.as_ref().map_or("", |rule| &rule.letter)
    }

    /// Total UTC offset in seconds
    pub fn total_offset(&self) -> i32 {
        self.offset_seconds + self.delta_seconds
    }

    /// Offsets and abbreviation of the transition
    pub fn offset_info(&self) -> OffsetInfo {
        OffsetInfo { total_offset: self.total_offset(), utc_offset: self.offset_seconds, dst_offset: self.delta_seconds, abbrev: self.abbrev.clone() }
    }

    /// Check if a wall time is in `[start, until)`
    pub fn contains(&self, date_time: DateTuple) -> bool {
        self.start_date_time <= date_time && date_time < self.until_date_time
    }

    /// Position relative to a match, comparing in the clock of each boundary.
    ///
    /// The transition time must be fixed.
    pub(super) fn compare_to_match(&self, zone_match: &ZoneMatch) -> MatchPosition {
        let start = zone_match.start;
        let transition_time = self.expanded.get(start.suffix());
        if transition_time < start.date() {
            return MatchPosition::Before;
        }
        if transition_time == start.date() {
            return MatchPosition::AtStart;
        }

        let until = zone_match.until;
        if until.date() <= self.expanded.get(until.suffix()) {
            return MatchPosition::After;
        }

        MatchPosition::Within
    }

    /// Position relative to a match at a resolution of one month, including the month before and the two months after.
    ///
    /// Never returns [`MatchPosition::AtStart`].
    pub(super) fn compare_to_match_fuzzy(&self, zone_match: &ZoneMatch) -> MatchPosition {
        let months = |date: DateTuple| 12 * date.year + date.month as i32;

        let transition_time = months(self.transition_time.date());
        if transition_time < months(zone_match.start.date()) - 1 {
            return MatchPosition::Before;
        }
        if months(zone_match.until.date()) + 2 <= transition_time {
            return MatchPosition::After;
        }

        MatchPosition::Within
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Transition(tt: {}; st: {}; ut: {}; epch: {}; ", self.transition_time, self.start_date_time, self.until_date_time, self.start_epoch_second)?;
        if let Some(rule) = &self.rule {
            write!(f, "rule: [{},{}]; ", rule.from_year, rule.to_year)?;
        }
        write!(f, "off: {}; dst: {}; fmt: {}; ab: {})", self.offset_seconds, self.delta_seconds, self.format, self.abbrev)
    }
}

/// Abbreviation of a FORMAT.
///
/// A `A/B` format gives `A` without DST and `B` with DST,
/// and a `%s` is replaced by the LETTER, with `-` meaning an empty LETTER.
pub fn calc_abbrev(format: &str, letter: &str, delta_seconds: i32) -> String {
    if let Some((standard, dst)) = format.split_once('/') {
        let abbrev = if delta_seconds == 0 { standard } else { dst };
        return abbrev.to_owned();
    }

    if format.contains("%s") {
        let letter = if letter == "-" { "" } else { letter };
        return format.replacen("%s", letter, 1);
    }

    format.to_owned()
}

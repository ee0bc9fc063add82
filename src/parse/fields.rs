//! Functions used for parsing the fields of `Rule` and `Zone` lines.

use crate::error::ParseError;
use crate::parse::utils::{parse_int, read_optional_tag, read_while, Cursor};

use std::str::FromStr;

/// Month names, from January (`1`) to December (`12`)
const MONTH_NAMES: [&str; 12] = ["Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec"];

/// Day of week names, from Monday (`1`) to Sunday (`7`)
const DAY_OF_WEEK_NAMES: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Suffixes accepted after an AT or UNTIL time
const TIME_SUFFIXES: [char; 5] = ['w', 's', 'u', 'g', 'z'];

/// Parse a month name into `[1, 12]`
pub fn parse_month(name: &str) -> Result<u8, ParseError> {
    match MONTH_NAMES.iter().position(|&x| x == name) {
        Some(index) => Ok(index as u8 + 1),
        None => Err(ParseError::InvalidMonth(name.to_owned())),
    }
}

/// Parse a day of week name into an ISO day of week in `[1, 7]`
pub fn parse_day_of_week(name: &str) -> Result<u8, ParseError> {
    match DAY_OF_WEEK_NAMES.iter().position(|&x| x == name) {
        Some(index) => Ok(index as u8 + 1),
        None => Err(ParseError::InvalidDayOfWeek(name.to_owned())),
    }
}

/// Split a time field into its time and its optional suffix letter, e.g. `2:00s` into `2:00` and `s`
pub fn split_time_suffix(field: &str) -> Result<(&str, Option<char>), ParseError> {
    match field.chars().last() {
        Some(c) if !c.is_ascii_digit() => {
            if !TIME_SUFFIXES.contains(&c) {
                return Err(ParseError::InvalidTimeSuffix(c));
            }
            Ok((&field[..field.len() - c.len_utf8()], Some(c)))
        }
        _ => Ok((field, None)),
    }
}

/// Parse a `[-]H[:MM[:SS]]` time string into a number of seconds.
///
/// Hours up to `25` are accepted, since some rules transition at `25:00`.
pub fn parse_time_seconds(time: &str) -> Result<i32, ParseError> {
    let mut cursor: Cursor<'_> = time.as_bytes();

    let sign = if read_optional_tag(&mut cursor, b"-")? { -1 } else { 1 };

    let hour: i32 = parse_int(read_while(&mut cursor, u8::is_ascii_digit)?)?;
    let mut minute: i32 = 0;
    let mut second: i32 = 0;

    if read_optional_tag(&mut cursor, b":")? {
        minute = parse_int(read_while(&mut cursor, u8::is_ascii_digit)?)?;

        if read_optional_tag(&mut cursor, b":")? {
            second = parse_int(read_while(&mut cursor, u8::is_ascii_digit)?)?;
        }
    }

    if !cursor.is_empty() {
        return Err(ParseError::RemainingData(time.to_owned()));
    }

    if hour > 25 {
        return Err(ParseError::InvalidHour);
    }
    if minute > 59 {
        return Err(ParseError::InvalidMinute);
    }
    if second > 59 {
        return Err(ParseError::InvalidSecond);
    }

    Ok(sign * ((hour * 60 + minute) * 60 + second))
}

/// ON day expression of a `Rule` line, also used by the UNTIL day of a `Zone` line
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum OnDay {
    /// Exact day of the month, e.g. `15`
    DayOfMonth(u8),
    /// First day of week on or after a day of the month, e.g. `Sun>=8`
    OnOrAfter {
        /// ISO day of week
        day_of_week: u8,
        /// Day of the month
        day_of_month: u8,
    },
    /// Last day of week on or before a day of the month, e.g. `Fri<=1`
    OnOrBefore {
        /// ISO day of week
        day_of_week: u8,
        /// Day of the month
        day_of_month: u8,
    },
    /// Last day of week of the month, e.g. `lastSun`
    Last(u8),
}

impl OnDay {
    /// ISO day of week, or `0` for an exact day of the month
    pub fn day_of_week(&self) -> u8 {
        match *self {
            Self::DayOfMonth(_) => 0,
            Self::OnOrAfter { day_of_week, .. } | Self::OnOrBefore { day_of_week, .. } | Self::Last(day_of_week) => day_of_week,
        }
    }

    /// Day of the month, negated for [`OnDay::OnOrBefore`], or `0` for [`OnDay::Last`]
    pub fn day_of_month(&self) -> i8 {
        match *self {
            Self::DayOfMonth(day_of_month) | Self::OnOrAfter { day_of_month, .. } => day_of_month as i8,
            Self::OnOrBefore { day_of_month, .. } => -(day_of_month as i8),
            Self::Last(_) => 0,
        }
    }
}

/// Parse a day of the month in `[1, 31]`
fn parse_day_of_month(text: &str, on_day: &str) -> Result<u8, ParseError> {
    match text.parse() {
        Ok(day) if (1..=31).contains(&day) => Ok(day),
        _ => Err(ParseError::InvalidOnDay(on_day.to_owned())),
    }
}

impl FromStr for OnDay {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !s.is_empty() && s.bytes().all(|x| x.is_ascii_digit()) {
            return Ok(Self::DayOfMonth(parse_day_of_month(s, s)?));
        }

        if let Some(name) = s.strip_prefix("last") {
            return Ok(Self::Last(parse_day_of_week(name)?));
        }

        if let Some((name, day)) = s.split_once(">=") {
            return Ok(Self::OnOrAfter { day_of_week: parse_day_of_week(name)?, day_of_month: parse_day_of_month(day, s)? });
        }

        if let Some((name, day)) = s.split_once("<=") {
            return Ok(Self::OnOrBefore { day_of_week: parse_day_of_week(name)?, day_of_month: parse_day_of_month(day, s)? });
        }

        Err(ParseError::InvalidOnDay(s.to_owned()))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_month() -> Result<(), ParseError> {
        assert_eq!(parse_month("Jan")?, 1);
        assert_eq!(parse_month("Dec")?, 12);
        assert_eq!(parse_month("January"), Err(ParseError::InvalidMonth("January".to_owned())));
        Ok(())
    }

    #[test]
    fn test_split_time_suffix() -> Result<(), ParseError> {
        assert_eq!(split_time_suffix("2:00")?, ("2:00", None));
        assert_eq!(split_time_suffix("2:00s")?, ("2:00", Some('s')));
        assert_eq!(split_time_suffix("0u")?, ("0", Some('u')));
        assert_eq!(split_time_suffix("1:00z")?, ("1:00", Some('z')));
        assert_eq!(split_time_suffix("2:00x"), Err(ParseError::InvalidTimeSuffix('x')));
        Ok(())
    }

    #[test]
    fn test_parse_time_seconds() -> Result<(), ParseError> {
        assert_eq!(parse_time_seconds("0")?, 0);
        assert_eq!(parse_time_seconds("2:00")?, 7200);
        assert_eq!(parse_time_seconds("-5:50:36")?, -21036);
        assert_eq!(parse_time_seconds("25:00")?, 90000);
        assert_eq!(parse_time_seconds("0:20")?, 1200);
        assert_eq!(parse_time_seconds("26:00"), Err(ParseError::InvalidHour));
        assert_eq!(parse_time_seconds("1:60"), Err(ParseError::InvalidMinute));
        assert_eq!(parse_time_seconds("1:00:60"), Err(ParseError::InvalidSecond));
        assert_eq!(parse_time_seconds("1:00:00:00"), Err(ParseError::RemainingData("1:00:00:00".to_owned())));
        assert!(parse_time_seconds("").is_err());
        assert!(parse_time_seconds("-").is_err());
        assert!(parse_time_seconds("2:").is_err());
        Ok(())
    }

    #[test]
    fn test_on_day() -> Result<(), ParseError> {
        let on_day: OnDay = "15".parse()?;
        assert_eq!((on_day.day_of_week(), on_day.day_of_month()), (0, 15));

        let on_day: OnDay = "lastSun".parse()?;
        assert_eq!(on_day, OnDay::Last(7));
        assert_eq!((on_day.day_of_week(), on_day.day_of_month()), (7, 0));

        let on_day: OnDay = "Sun>=8".parse()?;
        assert_eq!((on_day.day_of_week(), on_day.day_of_month()), (7, 8));

        let on_day: OnDay = "Fri<=1".parse()?;
        assert_eq!((on_day.day_of_week(), on_day.day_of_month()), (5, -1));

        assert_eq!("0".parse::<OnDay>(), Err(ParseError::InvalidOnDay("0".to_owned())));
        assert_eq!("lastFoo".parse::<OnDay>(), Err(ParseError::InvalidDayOfWeek("Foo".to_owned())));
        assert_eq!("Sun>=x".parse::<OnDay>(), Err(ParseError::InvalidOnDay("Sun>=x".to_owned())));
        assert_eq!("Sun=8".parse::<OnDay>(), Err(ParseError::InvalidOnDay("Sun=8".to_owned())));
        Ok(())
    }
}

//! Calendar functions and date tuples.

mod clock;

pub use clock::{ClockTime, ExpandedTime, Suffix};

use crate::constants::*;

use std::fmt;

/// Calendar date with a number of seconds into the day, expressed in no particular clock.
///
/// Ordering is lexicographic over `(year, month, day, seconds)`.
/// The seconds may lie outside `[0, 86400)` before normalization (e.g. `25:00` in a TZ database line).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DateTuple {
    /// Full year
    pub year: i32,
    /// Month in `[1, 12]`
    pub month: u8,
    /// Day of the month in `[1, 31]`
    pub day: u8,
    /// Seconds since the start of the day
    pub seconds: i32,
}

impl DateTuple {
    /// Construct a date tuple
    pub const fn new(year: i32, month: u8, day: u8, seconds: i32) -> Self {
        Self { year, month, day, seconds }
    }

    /// Convert the seconds into `[0, 86400)`, carrying the excess days into the date.
    ///
    /// Dates in the [`MIN_YEAR`] sentinel year collapse to its first instant.
    pub fn normalize(self) -> Self {
        if self.year == MIN_YEAR {
            return Self::new(MIN_YEAR, 1, 1, 0);
        }

        let seconds = self.seconds as i64;
        let days = self.days_since_epoch() + seconds.div_euclid(SECONDS_PER_DAY);
        let (year, month, day) = date_from_days_since_epoch(days);
        Self::new(year, month, day, seconds.rem_euclid(SECONDS_PER_DAY) as i32)
    }

    /// Number of days since `2000-01-01`, ignoring the seconds
    pub fn days_since_epoch(&self) -> i64 {
        days_since_epoch(self.year, self.month as i32, self.day as i64)
    }

    /// Number of seconds since `2000-01-01T00:00:00`, with the date interpreted in its own clock
    pub fn epoch_seconds(&self) -> i64 {
        self.days_since_epoch() * SECONDS_PER_DAY + self.seconds as i64
    }

    /// Construct a normalized date tuple from a number of seconds since `2000-01-01T00:00:00`
    pub fn from_epoch_seconds(epoch_seconds: i64) -> Self {
        let (year, month, day) = date_from_days_since_epoch(epoch_seconds.div_euclid(SECONDS_PER_DAY));
        Self::new(year, month, day, epoch_seconds.rem_euclid(SECONDS_PER_DAY) as i32)
    }
}

impl fmt::Display for DateTuple {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02} {}s", self.year, self.month, self.day, self.seconds)
    }
}

/// Check if a year is a leap year
pub fn is_leap_year(year: i32) -> bool {
    year % 400 == 0 || (year % 4 == 0 && year % 100 != 0)
}

/// Number of days in a month.
///
/// The month wraps around the year, so that month `0` is December and month `13` is January.
pub fn days_in_month(year: i32, month: i32) -> u8 {
    let month_index = (month - 1).rem_euclid(MONTHS_PER_YEAR) as usize;
    let days = DAY_IN_MONTHS_NORMAL_YEAR[month_index];
    if month_index == 1 && is_leap_year(year) {
        days + 1
    } else {
        days
    }
}

/// Compute the number of days since Unix epoch (`1970-01-01`).
///
/// ## Inputs
///
/// * `year`: Full year
/// * `month`: Month in `[1, 12]`
/// * `month_day`: Day of the month, which may overflow the month
///
pub fn days_since_unix_epoch(year: i32, month: usize, month_day: i64) -> i64 {
    let is_leap_year = is_leap_year(year);
    let month = month - 1;

    let full_year = year as i64;

    let mut result = (full_year - 1970) * DAYS_PER_NORMAL_YEAR;

    if full_year >= 1970 {
        result += (full_year - 1968) / 4;
        result -= (full_year - 1900) / 100;
        result += (full_year - 1600) / 400;

        if is_leap_year && month < 2 {
            result -= 1;
        }
    } else {
        result += (full_year - 1972) / 4;
        result -= (full_year - 2000) / 100;
        result += (full_year - 2000) / 400;

        if is_leap_year && month >= 2 {
            result += 1;
        }
    }

    result += CUM_DAY_IN_MONTHS_NORMAL_YEAR[month] + month_day - 1;

    result
}

/// Compute the number of days since `2000-01-01`.
///
/// ## Inputs
///
/// * `year`: Full year
/// * `month`: Month, wrapped into the adjacent years when outside `[1, 12]`
/// * `month_day`: Day of the month, which may overflow the month
///
pub fn days_since_epoch(year: i32, month: i32, month_day: i64) -> i64 {
    let year = year + (month - 1).div_euclid(MONTHS_PER_YEAR);
    let month = (month - 1).rem_euclid(MONTHS_PER_YEAR) + 1;
    days_since_unix_epoch(year, month as usize, month_day) - DAYS_SINCE_UNIX_EPOCH
}

/// Compute the `(year, month, day)` of a number of days since `2000-01-01`
pub fn date_from_days_since_epoch(days: i64) -> (i32, u8, u8) {
    let mut remaining_days = days - DAYS_TO_MARCH_2000;

    let mut cycles_400_years = remaining_days / DAYS_PER_400_YEARS;
    remaining_days %= DAYS_PER_400_YEARS;
    if remaining_days < 0 {
        remaining_days += DAYS_PER_400_YEARS;
        cycles_400_years -= 1;
    }

    let cycles_100_years = (remaining_days / DAYS_PER_100_YEARS).min(3);
    remaining_days -= cycles_100_years * DAYS_PER_100_YEARS;

    let cycles_4_years = (remaining_days / DAYS_PER_4_YEARS).min(24);
    remaining_days -= cycles_4_years * DAYS_PER_4_YEARS;

    let remaining_years = (remaining_days / DAYS_PER_NORMAL_YEAR).min(3);
    remaining_days -= remaining_years * DAYS_PER_NORMAL_YEAR;

    let mut year = EPOCH_YEAR as i64 + remaining_years + cycles_4_years * 4 + cycles_100_years * 100 + cycles_400_years * 400;

    let mut month = 2;
    for days in DAY_IN_MONTHS_LEAP_YEAR_FROM_MARCH {
        if remaining_days < days {
            break;
        }
        remaining_days -= days;
        month += 1;
    }

    if month >= MONTHS_PER_YEAR {
        month -= MONTHS_PER_YEAR;
        year += 1;
    }

    (year as i32, (month + 1) as u8, (remaining_days + 1) as u8)
}

/// Compute the ISO day of the week, from Monday (`1`) to Sunday (`7`)
pub fn iso_week_day(year: i32, month: i32, month_day: i64) -> u8 {
    // 2000-01-01 was a Saturday
    ((days_since_epoch(year, month, month_day) + 5).rem_euclid(DAYS_PER_WEEK) + 1) as u8
}

/// Resolve an ON day expression to a `(month, day)` pair in the given year and month.
///
/// The returned month may be `month - 1` or `month + 1` when the expression crosses a month boundary,
/// and so may be `0` or `13`.
///
/// ## Inputs
///
/// * `on_day_of_week`: ISO day of week, or `0` for an exact day of the month
/// * `on_day_of_month`: `D` for `Dow>=D`, `-D` for `Dow<=D`, `0` for `lastDow`
///
pub fn calc_day_of_month(year: i32, month: u8, on_day_of_week: u8, on_day_of_month: i8) -> (u8, u8) {
    let month = month as i32;

    if on_day_of_week == 0 {
        return (month as u8, on_day_of_month as u8);
    }

    let on_day_of_week = on_day_of_week as i32;

    if on_day_of_month >= 0 {
        let days_in_month = days_in_month(year, month) as i32;
        let limit = if on_day_of_month == 0 { days_in_month - 6 } else { on_day_of_month as i32 };

        let shift = (on_day_of_week - iso_week_day(year, month, limit as i64) as i32 + 7) % 7;
        let day = limit + shift;
        if day > days_in_month {
            ((month + 1) as u8, (day - days_in_month) as u8)
        } else {
            (month as u8, day as u8)
        }
    } else {
        let limit = -(on_day_of_month as i32);

        let shift = (iso_week_day(year, month, limit as i64) as i32 - on_day_of_week + 7) % 7;
        let day = limit - shift;
        if day < 1 {
            let prev_month = month - 1;
            (prev_month as u8, (day + days_in_month(year, prev_month) as i32) as u8)
        } else {
            (month as u8, day as u8)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_is_leap_year() {
        assert!(is_leap_year(2000));
        assert!(!is_leap_year(2001));
        assert!(is_leap_year(2004));
        assert!(!is_leap_year(2100));
        assert!(!is_leap_year(2200));
        assert!(!is_leap_year(2300));
        assert!(is_leap_year(2400));
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(2000, 2), 29);
        assert_eq!(days_in_month(2001, 2), 28);
        assert_eq!(days_in_month(2001, 4), 30);
        assert_eq!(days_in_month(2001, 0), 31);
        assert_eq!(days_in_month(2001, 13), 31);
    }

    #[test]
    fn test_days_since_unix_epoch() {
        assert_eq!(days_since_unix_epoch(-1001, 3, 1), -1085076);
        assert_eq!(days_since_unix_epoch(1600, 2, 29), -135081);
        assert_eq!(days_since_unix_epoch(1600, 3, 1), -135080);
        assert_eq!(days_since_unix_epoch(1700, 3, 1), -98556);
        assert_eq!(days_since_unix_epoch(1701, 3, 1), -98191);
        assert_eq!(days_since_unix_epoch(1704, 2, 29), -97096);
        assert_eq!(days_since_unix_epoch(2000, 2, 29), 11016);
        assert_eq!(days_since_unix_epoch(2000, 3, 1), 11017);
        assert_eq!(days_since_unix_epoch(2001, 3, 1), 11382);
        assert_eq!(days_since_unix_epoch(2004, 2, 29), 12477);
        assert_eq!(days_since_unix_epoch(2100, 3, 1), 47541);
        assert_eq!(days_since_unix_epoch(3001, 3, 1), 376624);
    }

    #[test]
    fn test_days_since_epoch() {
        assert_eq!(days_since_epoch(2000, 1, 1), 0);
        assert_eq!(days_since_epoch(1970, 1, 1), -10957);
        assert_eq!(days_since_epoch(2000, 13, 1), 366);
        assert_eq!(days_since_epoch(2001, 0, 31), 365);
        assert_eq!(days_since_epoch(2000, 1, 32), 31);
    }

    #[test]
    fn test_date_from_days_since_epoch() {
        assert_eq!(date_from_days_since_epoch(0), (2000, 1, 1));
        assert_eq!(date_from_days_since_epoch(-10957), (1970, 1, 1));
        assert_eq!(date_from_days_since_epoch(59), (2000, 2, 29));
        assert_eq!(date_from_days_since_epoch(60), (2000, 3, 1));
        assert_eq!(date_from_days_since_epoch(365), (2000, 12, 31));
        assert_eq!(date_from_days_since_epoch(366), (2001, 1, 1));
        assert_eq!(date_from_days_since_epoch(-1), (1999, 12, 31));

        for days in [-146_097, -36_525, -1461, -61, 1000, 36_524, 146_097, 3_000_000] {
            let (year, month, day) = date_from_days_since_epoch(days);
            assert_eq!(days_since_epoch(year, month as i32, day as i64), days);
        }
    }

    #[test]
    fn test_iso_week_day() {
        assert_eq!(iso_week_day(2000, 1, 1), 6);
        assert_eq!(iso_week_day(2000, 4, 2), 7);
        assert_eq!(iso_week_day(2000, 10, 25), 3);
        assert_eq!(iso_week_day(1970, 1, 1), 4);
        assert_eq!(iso_week_day(2001, 1, 1), 1);
    }

    #[test]
    fn test_calc_day_of_month() {
        // exact day
        assert_eq!(calc_day_of_month(2000, 3, 0, 15), (3, 15));
        // Sun>=1
        assert_eq!(calc_day_of_month(2000, 4, 7, 1), (4, 2));
        // lastSun
        assert_eq!(calc_day_of_month(2000, 10, 7, 0), (10, 29));
        // Sun<=1 shifts into the previous month
        assert_eq!(calc_day_of_month(2000, 4, 7, -1), (3, 26));
        // Sat>=30 shifts into the following month
        assert_eq!(calc_day_of_month(2000, 1, 6, 30), (2, 5));
        // Thu<=7
        assert_eq!(calc_day_of_month(2000, 4, 4, -7), (4, 6));
    }

    #[test]
    fn test_normalize() {
        assert_eq!(DateTuple::new(2000, 1, 31, 86400).normalize(), DateTuple::new(2000, 2, 1, 0));
        assert_eq!(DateTuple::new(2000, 3, 1, -3600).normalize(), DateTuple::new(2000, 2, 29, 82800));
        assert_eq!(DateTuple::new(2000, 12, 31, 90000).normalize(), DateTuple::new(2001, 1, 1, 3600));
        assert_eq!(DateTuple::new(MIN_YEAR, 5, 3, 7200).normalize(), DateTuple::new(MIN_YEAR, 1, 1, 0));
    }

    #[test]
    fn test_epoch_seconds() {
        let date = DateTuple::new(2000, 4, 2, 10800);
        assert_eq!(date.epoch_seconds(), 92 * 86400 + 10800);
        assert_eq!(DateTuple::from_epoch_seconds(date.epoch_seconds()), date);
        assert_eq!(DateTuple::from_epoch_seconds(-1), DateTuple::new(1999, 12, 31, 86399));
    }

    #[test]
    fn test_date_tuple_ord() {
        assert!(DateTuple::new(2000, 1, 1, 0) < DateTuple::new(2000, 1, 1, 1));
        assert!(DateTuple::new(1999, 12, 31, 90000) < DateTuple::new(2000, 1, 1, 0));
        assert!(DateTuple::new(2000, 2, 1, 0) > DateTuple::new(2000, 1, 31, 86399));
    }
}

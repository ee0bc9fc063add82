//! Some useful constants.

/// Number of seconds in one minute
pub const SECONDS_PER_MINUTE: i32 = 60;
/// Number of seconds in one hour
pub const SECONDS_PER_HOUR: i32 = 3600;
/// Number of seconds in one day
pub const SECONDS_PER_DAY: i64 = 86400;
/// Number of seconds in 15 minutes, the unit of encoded offsets
pub const SECONDS_PER_QUARTER_HOUR: i32 = 900;
/// Number of months in one year
pub const MONTHS_PER_YEAR: i32 = 12;
/// Number of days in one week
pub const DAYS_PER_WEEK: i64 = 7;

/// Number of days in a 400 years period
pub const DAYS_PER_400_YEARS: i64 = 146_097;
/// Number of days in a 100 years period
pub const DAYS_PER_100_YEARS: i64 = 36_524;
/// Number of days in a 4 years period
pub const DAYS_PER_4_YEARS: i64 = 1_461;

/// Month days in a normal year
pub const DAY_IN_MONTHS_NORMAL_YEAR: [u8; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
/// Cumulated month days in a normal year
pub const CUM_DAY_IN_MONTHS_NORMAL_YEAR: [i64; 12] = [0, 31, 59, 90, 120, 151, 181, 212, 243, 273, 304, 334];

/// Sentinel year used for "-infinity", for the earliest anchor rules and eras
pub const MIN_YEAR: i32 = 0;
/// Sentinel year used by the `max` keyword of a Rule TO field
pub const MAX_YEAR: i32 = 9999;
/// Sentinel UNTIL year of the last era of a zone
pub const MAX_UNTIL_YEAR: i32 = 10000;

/// Year offset of the tiny year encoding
pub const EPOCH_YEAR: i32 = 2000;
/// Smallest year representable as a tiny year
pub const MIN_TINY_YEAR: i32 = -127;
/// Largest year representable as a tiny year
pub const MAX_TINY_YEAR: i32 = 126;
/// Tiny year for [`MAX_UNTIL_YEAR`]
pub const MAX_UNTIL_TINY_YEAR: i32 = 127;

/// Number of seconds between 1970-01-01T00:00:00Z and 2000-01-01T00:00:00Z
pub const SECONDS_SINCE_UNIX_EPOCH: i64 = 946_684_800;

/// Capacity of the transition buffer of the extended zone processor
pub const MAX_TRANSITIONS: usize = 8;
/// Maximum number of multi-character letters in one policy
pub const MAX_LETTERS_PER_POLICY: usize = 32;

/// Number of days in a normal year
pub const DAYS_PER_NORMAL_YEAR: i64 = 365;
/// Month days in a leap year from March
pub const DAY_IN_MONTHS_LEAP_YEAR_FROM_MARCH: [i64; 12] = [31, 30, 31, 30, 31, 31, 30, 31, 30, 31, 31, 29];
/// Number of days between 1970-01-01 and 2000-01-01
pub const DAYS_SINCE_UNIX_EPOCH: i64 = 10957;
/// Number of days between 2000-01-01 and 2000-03-01
pub const DAYS_TO_MARCH_2000: i64 = 60;

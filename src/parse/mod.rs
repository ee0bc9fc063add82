//! Parsing of the TZ database text files.

mod extractor;
mod fields;
mod utils;

pub use extractor::{Extractor, ExtractorResult, LineCounts, ZONE_FILES};
pub use fields::{parse_day_of_week, parse_month, parse_time_seconds, split_time_suffix, OnDay};

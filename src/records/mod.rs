//! Raw TZ database records, and the derived fields added to them by each compilation stage.

mod comments;

pub use comments::CommentsMap;

use crate::encode::{EncodedEra, EncodedRule};

use indexmap::IndexMap;
use serde::Serialize;

/// Map of policy name to its rules, in TZ database order
pub type PoliciesMap = IndexMap<String, Vec<RawZoneRule>>;

/// Map of zone name to its eras, in TZ database order
pub type ZonesMap = IndexMap<String, Vec<RawZoneEra>>;

/// Map of link name to target zone name
pub type LinksMap = IndexMap<String, String>;

/// Map of policy name to the names of the zones using it
pub type PoliciesToZones = IndexMap<String, Vec<String>>;

/// One `Rule` line of the TZ database.
///
/// ```text
/// # Rule  NAME    FROM    TO    -    IN   ON      AT      SAVE    LETTER
/// Rule    US      2007    max   -    Mar  Sun>=8  2:00    1:00    D
/// ```
///
/// Fields after `raw_line` are derived by the transformer and the encoder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawZoneRule {
    /// FROM year
    pub from_year: i32,
    /// TO year, with [`MAX_YEAR`](crate::constants::MAX_YEAR) for `max`
    pub to_year: i32,
    /// IN month in `[1, 12]`
    pub in_month: u8,
    /// ON day expression, e.g. `lastSun`, `Sun>=8` or `15`
    pub on_day: String,
    /// AT time without its suffix
    pub at_time: String,
    /// AT time suffix, if any
    pub at_time_suffix: Option<char>,
    /// SAVE field
    pub delta_offset: String,
    /// LETTER field, e.g. `D`, `-` or `CAT`
    pub letter: String,
    /// Original line
    pub raw_line: String,

    /// ISO day of week of the ON field, or `0` for an exact day
    pub on_day_of_week: Option<u8>,
    /// Day of month of the ON field, negative for `Dow<=D`, `0` for `lastDow`
    pub on_day_of_month: Option<i8>,
    /// AT time in seconds
    pub at_seconds: Option<i32>,
    /// AT time truncated to the granularity
    pub at_seconds_truncated: Option<i32>,
    /// SAVE in seconds
    pub delta_seconds: Option<i32>,
    /// SAVE truncated to the granularity
    pub delta_seconds_truncated: Option<i32>,
    /// Target encodings
    #[serde(flatten)]
    pub encoded: Option<EncodedRule>,

    /// Set while cross-referencing the zones
    #[serde(skip)]
    pub used: bool,
}

/// One line of a `Zone` entry of the TZ database, or one of its continuation lines.
///
/// ```text
/// # Zone  NAME                STDOFF      RULES   FORMAT  [UNTIL]
/// Zone    America/Chicago     -5:50:36    -       LMT     1883 Nov 18 12:09:24
///                             -6:00       US      C%sT
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawZoneEra {
    /// STDOFF field
    pub offset_string: String,
    /// RULES field: `-`, a DST offset (`:` once expanded), or a policy name
    pub rules: String,
    /// FORMAT field, e.g. `P%sT` or `GMT/BST`
    pub format: String,
    /// UNTIL year, with [`MAX_UNTIL_YEAR`](crate::constants::MAX_UNTIL_YEAR) when absent
    pub until_year: i32,
    /// Whether UNTIL only has a year
    pub until_year_only: bool,
    /// UNTIL month in `[1, 12]`
    pub until_month: u8,
    /// UNTIL day expression
    pub until_day_string: String,
    /// UNTIL time without its suffix
    pub until_time: String,
    /// UNTIL time suffix, if any
    pub until_time_suffix: Option<char>,
    /// Original line
    pub raw_line: String,

    /// Resolved UNTIL day of month
    pub until_day: Option<u8>,
    /// UNTIL time in seconds
    pub until_seconds: Option<i32>,
    /// UNTIL time truncated to the granularity
    pub until_seconds_truncated: Option<i32>,
    /// STDOFF in seconds
    pub offset_seconds: Option<i32>,
    /// STDOFF truncated to the granularity
    pub offset_seconds_truncated: Option<i32>,
    /// DST offset of a fixed RULES field, `0` otherwise
    pub rules_delta_seconds: Option<i32>,
    /// DST offset of a fixed RULES field truncated to the granularity
    pub rules_delta_seconds_truncated: Option<i32>,
    /// Target encodings
    #[serde(flatten)]
    pub encoded: Option<EncodedEra>,
}

impl RawZoneEra {
    /// Check if the era has no rules, or a fixed DST offset
    pub fn has_fixed_rules(&self) -> bool {
        self.rules == "-" || self.rules.contains(':')
    }

    /// Name of the policy used by the era, if any
    pub fn policy_name(&self) -> Option<&str> {
        if self.has_fixed_rules() {
            None
        } else {
            Some(&self.rules)
        }
    }
}

/// Construct the map of policy names to the zones using them
pub fn policies_to_zones(zones_map: &ZonesMap) -> PoliciesToZones {
    let mut policies_to_zones = PoliciesToZones::new();
    for (zone_name, eras) in zones_map {
        for policy_name in eras.iter().filter_map(RawZoneEra::policy_name) {
            let zones = policies_to_zones.entry(policy_name.to_owned()).or_default();
            if !zones.contains(zone_name) {
                zones.push(zone_name.clone());
            }
        }
    }
    policies_to_zones
}

//! Compiled zone model, consumed by the [`ZoneProcessor`](crate::processor::ZoneProcessor).

use crate::datetime::{calc_day_of_month, ClockTime, DateTuple, Suffix};
use crate::error::{ParseError, ZoneProcessorError};
use crate::records::{PoliciesMap, RawZoneEra, RawZoneRule, ZonesMap};

use indexmap::IndexMap;

use std::sync::Arc;

/// Map of zone name to its compiled zone
pub type ZoneInfoMap = IndexMap<String, ZoneInfo>;

/// Recurring DST rule of a policy, with truncated times
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ZoneRule {
    /// First year of the rule
    pub from_year: i32,
    /// Last year of the rule, inclusive
    pub to_year: i32,
    /// Month in `[1, 12]`
    pub in_month: u8,
    /// ISO day of week, or `0` for an exact day of the month
    pub on_day_of_week: u8,
    /// Day of the month, negative for `Dow<=D`, `0` for `lastDow`
    pub on_day_of_month: i8,
    /// AT time in seconds
    pub at_seconds: i32,
    /// Clock of the AT time
    pub at_suffix: Suffix,
    /// DST delta in seconds
    pub delta_seconds: i32,
    /// LETTER substituted into the `%s` of the era format
    pub letter: String,
}

impl ZoneRule {
    fn from_raw(policy_name: &str, rule: &RawZoneRule) -> Result<Self, ZoneProcessorError> {
        let missing = |field| ZoneProcessorError::IncompleteRecord { name: policy_name.to_owned(), field };

        Ok(Self {
            from_year: rule.from_year,
            to_year: rule.to_year,
            in_month: rule.in_month,
            on_day_of_week: rule.on_day_of_week.ok_or_else(|| missing("on_day_of_week"))?,
            on_day_of_month: rule.on_day_of_month.ok_or_else(|| missing("on_day_of_month"))?,
            at_seconds: rule.at_seconds_truncated.ok_or_else(|| missing("at_seconds_truncated"))?,
            at_suffix: to_suffix(rule.at_time_suffix).map_err(|_| missing("at_time_suffix"))?,
            delta_seconds: rule.delta_seconds_truncated.ok_or_else(|| missing("delta_seconds_truncated"))?,
            letter: rule.letter.clone(),
        })
    }

    /// Transition time of the rule in a year, in the clock of the AT suffix
    pub fn transition_time(&self, year: i32) -> ClockTime {
        let (month, day) = calc_day_of_month(year, self.in_month, self.on_day_of_week, self.on_day_of_month);
        ClockTime::new(DateTuple::new(year, month, day, self.at_seconds), self.at_suffix)
    }
}

/// Named DST policy
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ZonePolicy {
    /// Policy name
    pub name: String,
    /// Rules, in TZ database order
    pub rules: Vec<ZoneRule>,
}

impl ZonePolicy {
    /// Construct a compiled policy from transformed rules
    pub fn from_raw(name: &str, rules: &[RawZoneRule]) -> Result<Self, ZoneProcessorError> {
        let rules = rules.iter().map(|rule| ZoneRule::from_raw(name, rule)).collect::<Result<_, _>>()?;
        Ok(Self { name: name.to_owned(), rules })
    }
}

/// Source of the DST delta of an era
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum EraPolicy {
    /// RULES is `-`
    NoRules,
    /// RULES is a fixed DST offset
    FixedDelta(i32),
    /// RULES names a policy
    Named(Arc<ZonePolicy>),
}

impl EraPolicy {
    /// Policy name, `-` or `:` as written in the transformed records
    pub fn name(&self) -> &str {
        match self {
            Self::NoRules => "-",
            Self::FixedDelta(_) => ":",
            Self::Named(policy) => &policy.name,
        }
    }
}

/// Era of a zone, ending at its UNTIL time
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ZoneEra {
    /// Standard UTC offset in seconds
    pub offset_seconds: i32,
    /// DST policy
    pub policy: EraPolicy,
    /// FORMAT of the abbreviation
    pub format: String,
    /// UNTIL year
    pub until_year: i32,
    /// UNTIL month in `[1, 12]`
    pub until_month: u8,
    /// UNTIL day of month
    pub until_day: u8,
    /// UNTIL time in seconds
    pub until_seconds: i32,
    /// Clock of the UNTIL time
    pub until_suffix: Suffix,
}

impl ZoneEra {
    fn from_raw(zone_name: &str, era: &RawZoneEra, policies: &IndexMap<String, Arc<ZonePolicy>>) -> Result<Self, ZoneProcessorError> {
        let missing = |field| ZoneProcessorError::IncompleteRecord { name: zone_name.to_owned(), field };

        let policy = match era.rules.as_str() {
            "-" => EraPolicy::NoRules,
            ":" => EraPolicy::FixedDelta(era.rules_delta_seconds_truncated.ok_or_else(|| missing("rules_delta_seconds_truncated"))?),
            name => match policies.get(name) {
                Some(policy) => EraPolicy::Named(Arc::clone(policy)),
                None => return Err(ZoneProcessorError::PolicyNotFound { zone: zone_name.to_owned(), policy: name.to_owned() }),
            },
        };

        Ok(Self {
            offset_seconds: era.offset_seconds_truncated.ok_or_else(|| missing("offset_seconds_truncated"))?,
            policy,
            format: era.format.clone(),
            until_year: era.until_year,
            until_month: era.until_month,
            until_day: era.until_day.ok_or_else(|| missing("until_day"))?,
            until_seconds: era.until_seconds_truncated.ok_or_else(|| missing("until_seconds_truncated"))?,
            until_suffix: to_suffix(era.until_time_suffix).map_err(|_| missing("until_time_suffix"))?,
        })
    }

    /// DST delta of a fixed era, `0` for an era without rules or with a named policy
    pub fn rules_delta_seconds(&self) -> i32 {
        match self.policy {
            EraPolicy::FixedDelta(delta_seconds) => delta_seconds,
            _ => 0,
        }
    }

    /// UNTIL time of the era
    pub fn until(&self) -> ClockTime {
        ClockTime::new(DateTuple::new(self.until_year, self.until_month, self.until_day, self.until_seconds), self.until_suffix)
    }
}

/// Compiled zone
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ZoneInfo {
    /// Zone name
    pub name: String,
    /// Eras, sorted by UNTIL time
    pub eras: Vec<ZoneEra>,
}

impl ZoneInfo {
    /// Construct a compiled zone from its transformed eras.
    ///
    /// Named policies are looked up in `policies`, and shared with the other zones using them.
    pub fn from_raw(name: &str, eras: &[RawZoneEra], policies: &IndexMap<String, Arc<ZonePolicy>>) -> Result<Self, ZoneProcessorError> {
        let eras = eras.iter().map(|era| ZoneEra::from_raw(name, era, policies)).collect::<Result<_, _>>()?;
        Ok(Self { name: name.to_owned(), eras })
    }
}

/// Compile all transformed zones, sharing each policy between its zones
pub fn build_zone_infos(zones_map: &ZonesMap, policies_map: &PoliciesMap) -> Result<ZoneInfoMap, ZoneProcessorError> {
    let policies = policies_map
        .iter()
        .map(|(name, rules)| Ok((name.clone(), Arc::new(ZonePolicy::from_raw(name, rules)?))))
        .collect::<Result<IndexMap<_, _>, ZoneProcessorError>>()?;

    zones_map.iter().map(|(name, eras)| Ok((name.clone(), ZoneInfo::from_raw(name, eras, &policies)?))).collect()
}

fn to_suffix(suffix: Option<char>) -> Result<Suffix, ParseError> {
    Suffix::try_from(suffix.unwrap_or('w'))
}

//! Passes over the rule policies.

use super::{is_year_tiny, seconds_to_hm_string, truncate_to_granularity, Transformer};
use crate::constants::{MAX_YEAR, MIN_YEAR, SECONDS_PER_QUARTER_HOUR};
use crate::datetime::calc_day_of_month;
use crate::parse::{parse_time_seconds, OnDay};
use crate::records::{CommentsMap, PoliciesMap, PoliciesToZones, RawZoneRule, ZonesMap};

use tracing::{info, warn};

use std::collections::BTreeMap;

/// Supported suffixes of an AT time
const AT_TIME_SUFFIXES: [char; 3] = ['w', 's', 'u'];

/// Indexes of the rules overlapping the years `[era_from, era_until)`
pub fn find_matching_rules(rules: &[RawZoneRule], era_from: i32, era_until: i32) -> Vec<usize> {
    rules
        .iter()
        .enumerate()
        .filter(|(_, rule)| rule.from_year < era_until && era_from <= rule.to_year)
        .map(|(index, _)| index)
        .collect()
}

/// Indexes of the most recent rules ending before a year.
///
/// The rules are compared by `(to_year, in_month)` only, so all the rules of the latest month are returned.
pub fn find_latest_prior_rules(rules: &[RawZoneRule], year: i32) -> Vec<usize> {
    let mut candidates = Vec::new();
    let mut candidate_date = (0, 0);

    for (index, rule) in rules.iter().enumerate().filter(|(_, rule)| rule.to_year < year) {
        let rule_date = (rule.to_year, rule.in_month);
        if rule_date > candidate_date {
            candidate_date = rule_date;
            candidates.clear();
            candidates.push(index);
        } else if rule_date == candidate_date {
            candidates.push(index);
        }
    }
    candidates
}

/// Indexes of the earliest rules ending on or after a year.
///
/// The rules are compared by `(to_year, in_month)` only, so all the rules of the earliest month are returned.
pub fn find_earliest_subsequent_rules(rules: &[RawZoneRule], year: i32) -> Vec<usize> {
    let mut candidates = Vec::new();
    let mut candidate_date = (MAX_YEAR, 13);

    for (index, rule) in rules.iter().enumerate().filter(|(_, rule)| rule.to_year >= year) {
        let rule_date = (rule.to_year, rule.in_month);
        if rule_date < candidate_date {
            candidate_date = rule_date;
            candidates.clear();
            candidates.push(index);
        } else if rule_date == candidate_date {
            candidates.push(index);
        }
    }
    candidates
}

/// Expand a time field of a rule, truncated to a granularity
fn expand_time(field: &str, granularity: i32) -> Result<(i32, i32), String> {
    let seconds = parse_time_seconds(field).map_err(|_| format!("invalid AT time '{field}'"))?;
    if seconds < 0 {
        return Err(format!("negative AT time '{field}'"));
    }
    Ok((seconds, truncate_to_granularity(seconds, granularity)))
}

impl Transformer {
    /// Mark the rules needed by the eras of the zones, between the year before the start year and the until year
    pub(super) fn mark_rules_used_by_zones(&mut self, zones_map: &ZonesMap, mut policies_map: PoliciesMap) -> PoliciesMap {
        for (zone_name, eras) in zones_map {
            let mut begin_year = self.config.start_year - 1;

            for era in eras {
                // Eras with fixed rules do not move the beginning of the interval
                let Some(policy_name) = era.policy_name() else { continue };

                let Some(rules) = policies_map.get_mut(policy_name) else {
                    warn!("Zone '{}': policy '{}' not found", zone_name, policy_name);
                    continue;
                };

                // The era may end within its UNTIL year, so the interval is extended to the following year
                let until_year = era.until_year.min(self.config.until_year) + 1;

                let mut used = find_matching_rules(rules, begin_year, until_year);
                used.extend(find_latest_prior_rules(rules, begin_year));
                used.extend(find_earliest_subsequent_rules(rules, until_year));

                for index in used {
                    rules[index].used = true;
                }

                begin_year = era.until_year;
            }
        }
        policies_map
    }

    pub(super) fn remove_rules_unused(&mut self, policies_map: PoliciesMap) -> PoliciesMap {
        let mut removed = CommentsMap::new();
        let mut removed_rule_count = 0;

        let results = policies_map
            .into_iter()
            .filter_map(|(name, rules)| {
                let total = rules.len();
                let used_rules: Vec<_> = rules.into_iter().filter(|rule| rule.used).collect();
                removed_rule_count += total - used_rules.len();

                if used_rules.is_empty() {
                    removed.add(&name, "unused");
                    None
                } else {
                    Some((name, used_rules))
                }
            })
            .collect();

        info!("Removed {} rule policies (with {} rules) not used", removed.len(), removed_rule_count);
        self.removed_policies.merge(&removed);
        results
    }

    /// Remove the policies whose FROM or TO years cannot be stored as tiny years
    pub(super) fn remove_rules_out_of_bounds(&mut self, policies_map: PoliciesMap) -> PoliciesMap {
        self.retain_policies(policies_map, "rule policies with from_year or to_year out of bounds", |_, rule, _| {
            if is_year_tiny(rule.from_year) && is_year_tiny(rule.to_year) {
                Ok(())
            } else {
                Err(format!("from_year ({}) or to_year ({}) out of bounds", rule.from_year, rule.to_year))
            }
        })
    }

    pub(super) fn remove_rules_with_multiple_transitions_in_month(&mut self, policies_map: PoliciesMap) -> PoliciesMap {
        let mut removed = CommentsMap::new();

        let results = policies_map
            .into_iter()
            .filter(|(name, rules)| {
                let mut counts: BTreeMap<(i32, u8), usize> = BTreeMap::new();
                for rule in rules.iter() {
                    for year in rule.from_year..=rule.to_year {
                        *counts.entry((year, rule.in_month)).or_default() += 1;
                    }
                }

                match counts.into_iter().find(|&(_, count)| count > 1) {
                    Some(((year, month), count)) => {
                        removed.add(name, format!("Found {count} transitions in year/month '{year:04}-{month:02}'"));
                        false
                    }
                    None => true,
                }
            })
            .collect();

        CommentsMap::log_pass(&removed, "rule policies with multiple transitions in one month", None);
        self.removed_policies.merge(&removed);
        results
    }

    /// Expand the AT time, adding a note to every zone using a policy with a truncated AT time
    pub(super) fn create_rules_with_expanded_at_time(&mut self, policies_map: PoliciesMap, policies_to_zones: &PoliciesToZones) -> PoliciesMap {
        let config = self.config;
        let mut notable_zones = CommentsMap::new();

        let results = self.retain_policies(policies_map, "rule policies with invalid at_time", |policy_name, rule, notes| {
            let at_time = &rule.at_time;
            let (at_seconds, at_seconds_truncated) = expand_time(at_time, config.until_at_granularity)?;

            if at_seconds != at_seconds_truncated {
                if config.strict {
                    return Err(format!("AT time '{}' must be multiples of '{}' seconds", at_time, config.until_at_granularity));
                }

                let hm = seconds_to_hm_string(at_seconds_truncated);
                notes.push(format!("AT time '{at_time}' truncated to '{hm}'"));
                for zone_name in policies_to_zones.get(policy_name).into_iter().flatten() {
                    notable_zones.add(zone_name, format!("AT time '{at_time}' of RULE '{policy_name}' truncated to '{hm}'"));
                }
            }

            rule.at_seconds = Some(at_seconds);
            rule.at_seconds_truncated = Some(at_seconds_truncated);
            Ok(())
        });

        self.notable_zones.merge(&notable_zones);
        results
    }

    pub(super) fn remove_rules_with_invalid_at_time_suffix(&mut self, policies_map: PoliciesMap) -> PoliciesMap {
        self.retain_policies(policies_map, "rule policies with unsupported AT suffix", |_, rule, _| {
            let suffix = *rule.at_time_suffix.get_or_insert('w');
            if AT_TIME_SUFFIXES.contains(&suffix) {
                Ok(())
            } else {
                Err(format!("unsupported AT time suffix '{suffix}'"))
            }
        })
    }

    pub(super) fn create_rules_with_expanded_delta_offset(&mut self, policies_map: PoliciesMap) -> PoliciesMap {
        let config = self.config;

        self.retain_policies(policies_map, "rule policies with invalid SAVE (delta_offset)", |_, rule, notes| {
            let delta_offset = &rule.delta_offset;
            let delta_seconds = parse_time_seconds(delta_offset).map_err(|_| format!("invalid SAVE (delta_offset) '{delta_offset}'"))?;

            let delta_seconds_truncated = truncate_to_granularity(delta_seconds, config.delta_granularity);
            if delta_seconds != delta_seconds_truncated {
                if config.strict {
                    return Err(format!("SAVE (delta_offset) '{}' must be a multiple of '{}' seconds", delta_offset, config.delta_granularity));
                }
                notes.push(format!("SAVE delta_offset '{}' truncated to a multiple of '{}' seconds", delta_offset, config.delta_granularity));
            }

            // Stored in 4 bits in units of 15 minutes
            let delta_code = delta_seconds_truncated.div_euclid(SECONDS_PER_QUARTER_HOUR);
            if !(-4..=11).contains(&delta_code) {
                return Err(format!("SAVE delta_offset '{delta_offset}' too large for 4-bits"));
            }

            rule.delta_seconds = Some(delta_seconds);
            rule.delta_seconds_truncated = Some(delta_seconds_truncated);
            Ok(())
        })
    }

    /// Expand the ON field, rejecting the expressions which may shift the transition into another year
    pub(super) fn create_rules_with_on_day_expansion(&mut self, policies_map: PoliciesMap) -> PoliciesMap {
        self.retain_policies(policies_map, "rule policies with invalid on_day", |_, rule, _| {
            let on_day_string = &rule.on_day;
            let on_day: OnDay = on_day_string.parse().map_err(|_| format!("invalid on_day '{on_day_string}'"))?;

            let (on_day_of_week, on_day_of_month) = (on_day.day_of_week(), on_day.day_of_month());
            if on_day_of_week != 0 && on_day_of_month != 0 {
                if (-7..-1).contains(&on_day_of_month) && rule.in_month == 1 {
                    return Err(format!("cannot shift '{on_day_string}' from Jan to prev year"));
                }
                if on_day_of_month >= 26 && rule.in_month == 12 {
                    return Err(format!("cannot shift '{on_day_string}' from Dec to next year"));
                }
            }

            rule.on_day_of_week = Some(on_day_of_week);
            rule.on_day_of_month = Some(on_day_of_month);
            Ok(())
        })
    }

    /// Prepend an anchor rule to the policies without any rule before the year preceding the start year.
    ///
    /// The anchor is a copy of the earliest rule with a SAVE of 0, moved to `0-01-01 00:00`.
    pub(super) fn create_rules_with_anchor_transition(&mut self, mut policies_map: PoliciesMap) -> PoliciesMap {
        let min_year = self.config.start_year - 1;
        let mut anchored_policies = Vec::new();

        for (name, rules) in policies_map.iter_mut() {
            if rules.iter().any(|rule| rule.from_year < min_year) {
                continue;
            }

            match anchor_rule(rules) {
                Some(anchor) => {
                    rules.insert(0, anchor);
                    anchored_policies.push(name.as_str());
                }
                None => warn!("Policy '{}': no rule with SAVE 0 to anchor", name),
            }
        }

        info!("Added anchor rule to {} rule policies: {:?}", anchored_policies.len(), anchored_policies);
        policies_map
    }

    /// Remove the policies with a transition on January 1st, which basic targets do not support
    pub(super) fn remove_rules_with_border_transitions(&mut self, policies_map: PoliciesMap) -> PoliciesMap {
        self.retain_policies(policies_map, "rule policies with border Transitions", |_, rule, _| {
            if rule.from_year > MIN_YEAR && rule.to_year > MIN_YEAR && rule.in_month == 1 && rule.on_day_of_month == Some(1) {
                Err(format!("Transition on Jan 1 not supported ({:04}-{:02}-{:02})", rule.from_year, rule.in_month, 1))
            } else {
                Ok(())
            }
        })
    }

    pub(super) fn remove_rules_with_long_letter(&mut self, policies_map: PoliciesMap) -> PoliciesMap {
        self.retain_policies(policies_map, "rule policies with long DST letter", |_, rule, _| {
            if rule.letter.len() > 1 {
                Err(format!("LETTER '{}' too long", rule.letter))
            } else {
                Ok(())
            }
        })
    }
}

/// Construct the anchor rule of a policy from its earliest rule with a SAVE of 0
fn anchor_rule(rules: &[RawZoneRule]) -> Option<RawZoneRule> {
    let earliest = rules
        .iter()
        .filter(|rule| rule.delta_seconds == Some(0))
        .min_by_key(|rule| {
            let (month, day) = calc_day_of_month(rule.from_year, rule.in_month, rule.on_day_of_week.unwrap_or(0), rule.on_day_of_month.unwrap_or(1));
            (rule.from_year, month, day)
        })?;

    Some(RawZoneRule {
        from_year: MIN_YEAR,
        to_year: MIN_YEAR,
        in_month: 1,
        on_day_of_week: Some(0),
        on_day_of_month: Some(1),
        at_time: "0".to_owned(),
        at_time_suffix: Some('w'),
        delta_offset: "0".to_owned(),
        at_seconds: Some(0),
        at_seconds_truncated: Some(0),
        delta_seconds: Some(0),
        delta_seconds_truncated: Some(0),
        raw_line: format!("Anchor: {}", earliest.raw_line),
        ..earliest.clone()
    })
}

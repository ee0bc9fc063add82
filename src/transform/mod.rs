//! Cleansing and normalization of the extracted records.
//!
//! The [`Transformer`] applies an ordered list of passes to the zones, policies and links.
//! Each pass keeps the entries it supports, and records why the other entries were removed,
//! or why a kept entry is notable.

mod links;
mod rules;
mod zones;

pub use rules::{find_earliest_subsequent_rules, find_latest_prior_rules, find_matching_rules};

use crate::config::{CompilerConfig, Scope};
use crate::constants::{MAX_YEAR, SECONDS_PER_HOUR, SECONDS_PER_MINUTE};
use crate::error::TransformError;
use crate::parse::ExtractorResult;
use crate::records::{policies_to_zones, CommentsMap, LinksMap, PoliciesMap, RawZoneEra, RawZoneRule, ZonesMap};

use tracing::info;

/// Outcome of a pass for one era or one rule, with the reason of the removal on error
type Validation = Result<(), String>;

/// Records surviving the transformer passes, with the comments of all passes
#[derive(Debug, Default, Clone)]
pub struct TransformerResult {
    /// Zone name to its eras
    pub zones_map: ZonesMap,
    /// Policy name to its rules
    pub policies_map: PoliciesMap,
    /// Link name to its target zone
    pub links_map: LinksMap,
    /// Reasons of the removed zones
    pub removed_zones: CommentsMap,
    /// Reasons of the removed policies
    pub removed_policies: CommentsMap,
    /// Reasons of the removed links
    pub removed_links: CommentsMap,
    /// Notes on the kept zones
    pub notable_zones: CommentsMap,
    /// Notes on the kept policies
    pub notable_policies: CommentsMap,
    /// Notes on the kept links
    pub notable_links: CommentsMap,
}

/// Transformer of the extracted records
#[derive(Debug)]
pub struct Transformer {
    config: CompilerConfig,
    zones_map: ZonesMap,
    policies_map: PoliciesMap,
    links_map: LinksMap,
    removed_zones: CommentsMap,
    removed_policies: CommentsMap,
    removed_links: CommentsMap,
    notable_zones: CommentsMap,
    notable_policies: CommentsMap,
    notable_links: CommentsMap,
}

impl Transformer {
    /// Construct a transformer from the extracted records
    pub fn new(extracted: ExtractorResult, config: CompilerConfig) -> Self {
        Self {
            config,
            zones_map: extracted.zones_map,
            policies_map: extracted.policies_map,
            links_map: extracted.links_map,
            removed_zones: CommentsMap::new(),
            removed_policies: CommentsMap::new(),
            removed_links: CommentsMap::new(),
            notable_zones: CommentsMap::new(),
            notable_policies: CommentsMap::new(),
            notable_links: CommentsMap::new(),
        }
    }

    /// Apply all passes, in order.
    ///
    /// Only a hash collision between zone and link names is fatal.
    pub fn transform(mut self) -> Result<TransformerResult, TransformError> {
        let zones_map = std::mem::take(&mut self.zones_map);
        let policies_map = std::mem::take(&mut self.policies_map);
        let links_map = std::mem::take(&mut self.links_map);

        let original_counts = (zones_map.len(), policies_map.len(), links_map.len());
        info!("Found {} zones, {} policies, {} links", original_counts.0, original_counts.1, original_counts.2);

        links::detect_hash_collisions(&zones_map, &links_map)?;

        let mut zones_map = self.remove_zone_eras_too_old(zones_map);
        zones_map = self.remove_zone_eras_too_new(zones_map);
        zones_map = self.remove_zones_without_eras(zones_map);
        if self.config.scope == Scope::Basic {
            zones_map = self.remove_zones_with_until_month_day_time(zones_map);
        }
        zones_map = self.create_zones_with_until_day(zones_map);
        zones_map = self.create_zones_with_expanded_until_time(zones_map);
        zones_map = self.remove_zones_with_invalid_until_time_suffix(zones_map);
        zones_map = self.create_zones_with_expanded_offset_string(zones_map);
        zones_map = self.remove_zones_with_invalid_rules_format_combo(zones_map);
        zones_map = self.create_zones_with_rules_expansion(zones_map);
        zones_map = self.remove_zones_with_non_monotonic_until(zones_map);

        let mut policies_map = self.mark_rules_used_by_zones(&zones_map, policies_map);
        let policies_to_zones = policies_to_zones(&zones_map);

        policies_map = self.remove_rules_unused(policies_map);
        policies_map = self.remove_rules_out_of_bounds(policies_map);
        if self.config.scope == Scope::Basic {
            policies_map = self.remove_rules_with_multiple_transitions_in_month(policies_map);
        }
        policies_map = self.create_rules_with_expanded_at_time(policies_map, &policies_to_zones);
        policies_map = self.remove_rules_with_invalid_at_time_suffix(policies_map);
        policies_map = self.create_rules_with_expanded_delta_offset(policies_map);
        policies_map = self.create_rules_with_on_day_expansion(policies_map);
        policies_map = self.create_rules_with_anchor_transition(policies_map);
        if self.config.scope == Scope::Basic {
            policies_map = self.remove_rules_with_border_transitions(policies_map);
            policies_map = self.remove_rules_with_long_letter(policies_map);
        }

        let zones_map = self.remove_zones_without_rules(zones_map, &policies_map);
        let links_map = self.remove_links_to_missing_zones(links_map, &zones_map);
        let (zones_map, links_map) = self.remove_zones_and_links_with_similar_names(zones_map, links_map);

        let result = TransformerResult {
            zones_map,
            policies_map,
            links_map,
            removed_zones: self.removed_zones,
            removed_policies: self.removed_policies,
            removed_links: self.removed_links,
            notable_zones: self.notable_zones,
            notable_policies: self.notable_policies,
            notable_links: self.notable_links,
        };

        result.print_summary(original_counts);
        Ok(result)
    }

    /// Keep the zones whose eras all pass a validation.
    ///
    /// The validation receives the era and a list where it can push notes on the zone.
    fn retain_zones<F>(&mut self, zones_map: ZonesMap, explanation: &str, mut validate: F) -> ZonesMap
    where
        F: FnMut(&mut RawZoneEra, &mut Vec<String>) -> Validation,
    {
        let mut removed = CommentsMap::new();
        let mut notable = CommentsMap::new();
        let mut notes = Vec::new();

        let results = zones_map
            .into_iter()
            .filter_map(|(name, mut eras)| {
                let validation = eras.iter_mut().try_for_each(|era| validate(era, &mut notes));
                for note in notes.drain(..) {
                    notable.add(&name, note);
                }

                match validation {
                    Ok(()) => Some((name, eras)),
                    Err(reason) => {
                        removed.add(&name, reason);
                        None
                    }
                }
            })
            .collect();

        CommentsMap::log_pass(&removed, explanation, Some(&notable));
        self.removed_zones.merge(&removed);
        self.notable_zones.merge(&notable);
        results
    }

    /// Keep the policies whose rules all pass a validation.
    ///
    /// The validation receives the policy name, the rule and a list where it can push notes on the policy.
    fn retain_policies<F>(&mut self, policies_map: PoliciesMap, explanation: &str, mut validate: F) -> PoliciesMap
    where
        F: FnMut(&str, &mut RawZoneRule, &mut Vec<String>) -> Validation,
    {
        let mut removed = CommentsMap::new();
        let mut notable = CommentsMap::new();
        let mut notes = Vec::new();

        let results = policies_map
            .into_iter()
            .filter_map(|(name, mut rules)| {
                let validation = rules.iter_mut().try_for_each(|rule| validate(&name, rule, &mut notes));
                for note in notes.drain(..) {
                    notable.add(&name, note);
                }

                match validation {
                    Ok(()) => Some((name, rules)),
                    Err(reason) => {
                        removed.add(&name, reason);
                        None
                    }
                }
            })
            .collect();

        CommentsMap::log_pass(&removed, explanation, Some(&notable));
        self.removed_policies.merge(&removed);
        self.notable_policies.merge(&notable);
        results
    }
}

impl TransformerResult {
    /// Log the original, generated, removed and noted counts
    fn print_summary(&self, (zone_count, policy_count, link_count): (usize, usize, usize)) {
        info!(
            "Summary: Zones: original={}; generated={}; removed={}; noted={}",
            zone_count,
            self.zones_map.len(),
            self.removed_zones.len(),
            self.notable_zones.len()
        );
        info!(
            "Summary: Policies: original={}; generated={}; removed={}; noted={}",
            policy_count,
            self.policies_map.len(),
            self.removed_policies.len(),
            self.notable_policies.len()
        );
        info!(
            "Summary: Links: original={}; generated={}; removed={}; noted={}",
            link_count,
            self.links_map.len(),
            self.removed_links.len(),
            self.notable_links.len()
        );
    }
}

/// Truncate a number of seconds toward zero, to a multiple of a granularity
pub fn truncate_to_granularity(seconds: i32, granularity: i32) -> i32 {
    granularity * (seconds / granularity)
}

/// Format a number of seconds as `[-]HH:MM`
pub fn seconds_to_hm_string(seconds: i32) -> String {
    let sign = if seconds < 0 { "-" } else { "" };
    let minutes = seconds.abs() / SECONDS_PER_MINUTE;
    format!("{}{:02}:{:02}", sign, minutes / (SECONDS_PER_HOUR / SECONDS_PER_MINUTE), minutes % 60)
}

/// Check if a FROM or TO year can be stored as a tiny year, [`MAX_YEAR`] standing for `max`
pub fn is_year_tiny(year: i32) -> bool {
    year >= 1872 && (year == MAX_YEAR || year <= 2127)
}

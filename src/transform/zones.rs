//! Passes over the zones.

use super::{seconds_to_hm_string, truncate_to_granularity, Transformer, Validation};
use crate::config::Scope;
use crate::constants::{MAX_UNTIL_YEAR, MIN_YEAR, SECONDS_PER_QUARTER_HOUR};
use crate::datetime::calc_day_of_month;
use crate::parse::{parse_time_seconds, OnDay};
use crate::records::{CommentsMap, PoliciesMap, RawZoneEra, ZonesMap};

use tracing::info;

/// Supported suffixes of an UNTIL time for a scope
fn until_time_suffixes(scope: Scope) -> &'static [char] {
    match scope {
        Scope::Basic => &['w'],
        Scope::Extended => &['w', 's', 'u'],
    }
}

impl Transformer {
    /// Remove the eras ending before the year preceding the start year.
    ///
    /// A zone losing all its eras is kept empty, so that it is reported by the next pass.
    pub(super) fn remove_zone_eras_too_old(&mut self, zones_map: ZonesMap) -> ZonesMap {
        let min_until_year = self.config.start_year - 1;
        let mut count = 0;

        let results = zones_map
            .into_iter()
            .map(|(name, eras)| {
                let total = eras.len();
                let eras: Vec<_> = eras.into_iter().filter(|era| era.until_year >= min_until_year).collect();
                count += total - eras.len();
                (name, eras)
            })
            .collect();

        info!("Removed {} zone eras before year {:04}", count, self.config.start_year);
        results
    }

    /// Remove the eras starting after the year following the until year
    pub(super) fn remove_zone_eras_too_new(&mut self, zones_map: ZonesMap) -> ZonesMap {
        let max_start_year = self.config.until_year + 1;
        let mut count = 0;

        let results = zones_map
            .into_iter()
            .map(|(name, eras)| {
                let mut start_year = MIN_YEAR;
                let mut keep_eras = Vec::with_capacity(eras.len());
                for era in eras {
                    let until_year = era.until_year;
                    if start_year <= max_start_year {
                        keep_eras.push(era);
                    } else {
                        count += 1;
                    }
                    start_year = until_year;
                }
                (name, keep_eras)
            })
            .collect();

        info!("Removed {} zone eras starting after {:04}", count, self.config.until_year);
        results
    }

    pub(super) fn remove_zones_without_eras(&mut self, zones_map: ZonesMap) -> ZonesMap {
        let mut removed = CommentsMap::new();

        let results = zones_map
            .into_iter()
            .filter(|(name, eras)| {
                if eras.is_empty() {
                    removed.add(name, "no ZoneEra found");
                }
                !eras.is_empty()
            })
            .collect();

        CommentsMap::log_pass(&removed, "zone infos without ZoneEras", None);
        self.removed_zones.merge(&removed);
        results
    }

    pub(super) fn remove_zones_with_until_month_day_time(&mut self, zones_map: ZonesMap) -> ZonesMap {
        self.retain_zones(zones_map, "zone infos with UNTIL month/day/time", |era, _| {
            if era.until_year_only {
                Ok(())
            } else {
                Err("UNTIL contains month/day/time".to_owned())
            }
        })
    }

    /// Resolve the UNTIL day expression to a day of month, which may shift the UNTIL month
    pub(super) fn create_zones_with_until_day(&mut self, zones_map: ZonesMap) -> ZonesMap {
        self.retain_zones(zones_map, "zone infos with invalid until_day", |era, notes| {
            let until_day_string = &era.until_day_string;
            let on_day: OnDay = until_day_string.parse().map_err(|_| format!("invalid until_day '{until_day_string}'"))?;

            let (month, day) = calc_day_of_month(era.until_year, era.until_month, on_day.day_of_week(), on_day.day_of_month());
            match month {
                0 => return Err(format!("Shift to previous year unsupported for {until_day_string}")),
                13 => return Err(format!("Shift to following year unsupported for {until_day_string}")),
                _ => {}
            }

            if month != era.until_month {
                notes.push(format!("until_month shifted from '{}' to '{}' due to {}", era.until_month, month, until_day_string));
            }

            era.until_month = month;
            era.until_day = Some(day);
            Ok(())
        })
    }

    pub(super) fn create_zones_with_expanded_until_time(&mut self, zones_map: ZonesMap) -> ZonesMap {
        let config = self.config;

        self.retain_zones(zones_map, "zone infos with invalid UNTIL time", |era, notes| {
            let until_time = &era.until_time;
            let until_seconds = parse_time_seconds(until_time).map_err(|_| format!("invalid UNTIL time '{until_time}'"))?;
            if until_seconds < 0 {
                return Err(format!("negative UNTIL time '{until_time}'"));
            }

            let until_seconds_truncated = truncate_to_granularity(until_seconds, config.until_at_granularity);
            if until_seconds != until_seconds_truncated {
                if config.strict {
                    return Err(format!("UNTIL time '{}' must be multiples of '{}' seconds", until_time, config.until_at_granularity));
                }
                notes.push(format!("UNTIL time '{}' truncated to '{}'", until_time, seconds_to_hm_string(until_seconds_truncated)));
            }

            era.until_seconds = Some(until_seconds);
            era.until_seconds_truncated = Some(until_seconds_truncated);
            Ok(())
        })
    }

    pub(super) fn remove_zones_with_invalid_until_time_suffix(&mut self, zones_map: ZonesMap) -> ZonesMap {
        let supported = until_time_suffixes(self.config.scope);

        self.retain_zones(zones_map, "zone infos with unsupported UNTIL time suffix", |era, _| {
            let suffix = *era.until_time_suffix.get_or_insert('w');
            if supported.contains(&suffix) {
                Ok(())
            } else {
                Err(format!("unsupported UNTIL time suffix '{suffix}'"))
            }
        })
    }

    pub(super) fn create_zones_with_expanded_offset_string(&mut self, zones_map: ZonesMap) -> ZonesMap {
        let config = self.config;

        self.retain_zones(zones_map, "zones with invalid offset_string", |era, notes| {
            let offset_string = &era.offset_string;
            let offset_seconds = parse_time_seconds(offset_string).map_err(|_| format!("invalid STDOFF '{offset_string}'"))?;

            let offset_seconds_truncated = truncate_to_granularity(offset_seconds, config.offset_granularity);
            if offset_seconds != offset_seconds_truncated {
                if config.strict {
                    return Err(format!("STDOFF '{}' must be multiples of '{}' seconds", offset_string, config.offset_granularity));
                }
                notes.push(format!("STDOFF '{}' truncated to '{}'", offset_string, seconds_to_hm_string(offset_seconds_truncated)));
            }

            // Stored as a signed byte in units of 15 minutes
            let offset_code = offset_seconds_truncated / SECONDS_PER_QUARTER_HOUR;
            if !(-127..=127).contains(&offset_code) {
                return Err(format!("STDOFF '{offset_string}' too large for 8-bits"));
            }

            era.offset_seconds = Some(offset_seconds);
            era.offset_seconds_truncated = Some(offset_seconds_truncated);
            Ok(())
        })
    }

    pub(super) fn remove_zones_with_invalid_rules_format_combo(&mut self, zones_map: ZonesMap) -> ZonesMap {
        self.retain_zones(zones_map, "zones with invalid RULES and FORMAT combo", |era, notes| {
            if era.format.is_empty() {
                return Err("FORMAT is empty".to_owned());
            }

            if era.has_fixed_rules() {
                if era.format.contains('%') {
                    return Err("RULES is fixed but FORMAT contains '%'".to_owned());
                }
            } else if !era.format.contains('%') && !era.format.contains('/') {
                notes.push("RULES not fixed but FORMAT is missing '%' or '/'".to_owned());
            }

            Ok(())
        })
    }

    /// Normalize the RULES field to `-`, `:` for a fixed DST offset, or a policy name
    pub(super) fn create_zones_with_rules_expansion(&mut self, zones_map: ZonesMap) -> ZonesMap {
        let config = self.config;

        self.retain_zones(zones_map, "zone infos with invalid RULES", |era, notes| {
            if !era.rules.contains(':') {
                era.rules_delta_seconds = Some(0);
                era.rules_delta_seconds_truncated = Some(0);
                return Ok(());
            }

            let rules_string = &era.rules;
            if config.scope == Scope::Basic {
                return Err(format!("offset in RULES '{rules_string}'"));
            }

            let rules_delta_seconds = parse_time_seconds(rules_string).map_err(|_| format!("invalid RULES string '{rules_string}'"))?;
            if rules_delta_seconds == 0 {
                return Err(format!("unexpected 0:00 RULES string '{rules_string}'"));
            }

            let rules_delta_seconds_truncated = truncate_to_granularity(rules_delta_seconds, config.delta_granularity);
            if rules_delta_seconds != rules_delta_seconds_truncated {
                if config.strict {
                    return Err(format!("RULES delta '{}' must be multiples of '{}' seconds", rules_string, config.delta_granularity));
                }
                notes.push(format!("RULES delta offset '{}' truncated to '{}'", rules_string, seconds_to_hm_string(rules_delta_seconds_truncated)));
            }

            // Stored in 4 bits in units of 15 minutes
            let rules_delta_code = rules_delta_seconds_truncated.div_euclid(SECONDS_PER_QUARTER_HOUR);
            if !(-4..=11).contains(&rules_delta_code) {
                return Err(format!("RULES '{rules_string}' too large for 4-bits"));
            }

            era.rules = ":".to_owned();
            era.rules_delta_seconds = Some(rules_delta_seconds);
            era.rules_delta_seconds_truncated = Some(rules_delta_seconds_truncated);
            Ok(())
        })
    }

    /// Remove the zones whose UNTIL fields do not strictly increase, or do not end with [`MAX_UNTIL_YEAR`]
    pub(super) fn remove_zones_with_non_monotonic_until(&mut self, zones_map: ZonesMap) -> ZonesMap {
        let mut removed = CommentsMap::new();

        let results = zones_map
            .into_iter()
            .filter(|(name, eras)| match check_monotonic_until(eras) {
                Ok(()) => true,
                Err(reason) => {
                    removed.add(name, reason);
                    false
                }
            })
            .collect();

        CommentsMap::log_pass(&removed, "zone infos with invalid UNTIL fields", None);
        self.removed_zones.merge(&removed);
        results
    }

    pub(super) fn remove_zones_without_rules(&mut self, zones_map: ZonesMap, policies_map: &PoliciesMap) -> ZonesMap {
        self.retain_zones(zones_map, "zone infos without rules", |era, _| match era.policy_name() {
            Some(policy_name) if !policies_map.contains_key(policy_name) => Err(format!("policy '{policy_name}' not found")),
            _ => Ok(()),
        })
    }
}

/// Check that the UNTIL fields of the eras of a zone strictly increase and end with [`MAX_UNTIL_YEAR`]
fn check_monotonic_until(eras: &[RawZoneEra]) -> Validation {
    let untils: Vec<_> = eras
        .iter()
        .map(|era| (era.until_year, era.until_month, era.until_day.unwrap_or(0), era.until_seconds.unwrap_or(0)))
        .collect();

    let format_until = |(year, month, day, seconds): (i32, u8, u8, i32)| format!("{year:04}-{month:02}-{day:02} {seconds}s");

    if let Some(window) = untils.windows(2).find(|window| window[1] <= window[0]) {
        return Err(format!("non increasing UNTIL: {}", format_until(window[1])));
    }

    match untils.last() {
        Some(&last) if last.0 != MAX_UNTIL_YEAR => Err(format!("invalid final UNTIL: {}", format_until(last))),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::transform::test_utils::era;

    #[test]
    fn test_check_monotonic_until() {
        assert_eq!(check_monotonic_until(&[era(0, 2000), era(0, MAX_UNTIL_YEAR)]), Ok(()));

        let mut same_year = era(0, 2000);
        same_year.until_month = 6;
        assert_eq!(check_monotonic_until(&[era(0, 2000), same_year, era(0, MAX_UNTIL_YEAR)]), Ok(()));

        assert_eq!(
            check_monotonic_until(&[era(0, 2000), era(0, 2000), era(0, MAX_UNTIL_YEAR)]),
            Err("non increasing UNTIL: 2000-01-01 0s".to_owned())
        );
        assert_eq!(check_monotonic_until(&[era(0, 2000), era(0, 2010)]), Err("invalid final UNTIL: 2010-01-01 0s".to_owned()));
    }
}

//! Steps computing the matches and transitions of a year.

use super::transition::{calc_abbrev, MatchPosition, Transition, ZoneMatch};
use crate::constants::MIN_YEAR;
use crate::datetime::{ClockTime, DateTuple};
use crate::zone_info::{ZoneEra, ZonePolicy};

use std::cmp::Ordering;

/// Year and month, with the day implicitly being the first of the month
pub type YearMonth = (i32, u8);

/// UNTIL time of the sentinel era preceding the first era of a zone
const ANCHOR_UNTIL: ClockTime = ClockTime::Wall(DateTuple::new(MIN_YEAR, 1, 1, 0));

/// Compare an UNTIL time to the first day of a month, ignoring its suffix
fn compare_until_to_year_month(until: ClockTime, (year, month): YearMonth) -> Ordering {
    let date = until.date();
    date.year.cmp(&year).then(date.month.cmp(&month)).then_with(|| if date.day > 1 { Ordering::Greater } else { date.seconds.cmp(&0) })
}

/// Find the eras overlapping `[start_ym, until_ym)`, clipped to this interval
pub fn find_matches(eras: &[ZoneEra], start_ym: YearMonth, until_ym: YearMonth) -> Vec<ZoneMatch> {
    let window_start = ClockTime::Wall(DateTuple::new(start_ym.0, start_ym.1, 1, 0));
    let window_until = ClockTime::Wall(DateTuple::new(until_ym.0, until_ym.1, 1, 0));

    let mut matches = Vec::new();
    let mut prev_until = ANCHOR_UNTIL;

    for (era_index, era) in eras.iter().enumerate() {
        let until = era.until();

        let overlaps = compare_until_to_year_month(prev_until, until_ym) == Ordering::Less
            && compare_until_to_year_month(until, start_ym) == Ordering::Greater;

        if overlaps {
            matches.push(ZoneMatch { start: prev_until.max(window_start), until: until.min(window_until), era_index });
        }

        prev_until = until;
    }

    matches
}

/// Most recent year of a rule before the start year of a match
fn most_recent_prior_year(from_year: i32, to_year: i32, start_year: i32) -> Option<i32> {
    if from_year < start_year {
        Some(to_year.min(start_year - 1))
    } else {
        None
    }
}

fn latest_prior(prior: Option<Transition>, transition: Transition) -> Transition {
    match prior {
        Some(prior) if transition.transition_time <= prior.transition_time => prior,
        _ => transition,
    }
}

/// Sort transitions by transition time, keeping the insertion order of equal times
pub(super) fn sort_transitions(transitions: &mut [Transition]) {
    transitions.sort_by_key(|transition| transition.transition_time);
}

/// Check if transitions are sorted by transition time
pub(super) fn is_sorted(transitions: &[Transition]) -> bool {
    transitions.windows(2).all(|x| x[0].transition_time <= x[1].transition_time)
}

/// Find the candidate transitions of a match with a named policy.
///
/// The rules are instantiated for the whole years of the match.
/// Only the latest of the transitions before the match is kept, as the single "most recent prior" candidate.
pub(super) fn find_candidate_transitions(zone_match: &ZoneMatch, era: &ZoneEra, policy: &ZonePolicy) -> Vec<Transition> {
    let start_year = zone_match.start.date().year;
    let until = zone_match.until.date();
    let end_year = if until.month == 1 && until.day == 1 && until.seconds == 0 { until.year - 1 } else { until.year };

    let mut candidates = Vec::new();
    let mut prior = None;

    for rule in &policy.rules {
        for year in rule.from_year.max(start_year)..=rule.to_year.min(end_year) {
            let transition = Transition::for_rule(zone_match, era, rule, year);
            match transition.compare_to_match_fuzzy(zone_match) {
                MatchPosition::Before => prior = Some(latest_prior(prior, transition)),
                MatchPosition::Within => candidates.push(transition),
                MatchPosition::AtStart | MatchPosition::After => (),
            }
        }

        if let Some(year) = most_recent_prior_year(rule.from_year, rule.to_year, start_year) {
            prior = Some(latest_prior(prior, Transition::for_rule(zone_match, era, rule, year)));
        }
    }

    candidates.extend(prior);
    sort_transitions(&mut candidates);
    candidates
}

/// Select the candidates overlapping a match, and the latest transition at or before its start.
///
/// The prior transition is shifted to the start of the match.
/// Returns `None` if there is no prior transition.
pub(super) fn select_active_transitions(mut transitions: Vec<Transition>, zone_match: &ZoneMatch) -> Option<Vec<Transition>> {
    let mut prior: Option<usize> = None;

    for index in 0..transitions.len() {
        match transitions[index].compare_to_match(zone_match) {
            MatchPosition::After => transitions[index].is_active = false,
            MatchPosition::Within => transitions[index].is_active = true,
            MatchPosition::AtStart => {
                if let Some(prior_index) = prior {
                    transitions[prior_index].is_active = false;
                }
                transitions[index].is_active = true;
                prior = Some(index);
            }
            MatchPosition::Before => {
                let is_latest = prior.map_or(true, |prior_index| transitions[index].transition_time > transitions[prior_index].transition_time);
                if is_latest {
                    if let Some(prior_index) = prior {
                        transitions[prior_index].is_active = false;
                    }
                    transitions[index].is_active = true;
                    prior = Some(index);
                }
            }
        }
    }

    let prior = &mut transitions[prior?];
    if prior.transition_time < zone_match.start {
        prior.original_transition_time = Some(prior.transition_time);
        prior.transition_time = zone_match.start;
    }

    Some(transitions.into_iter().filter(|transition| transition.is_active).collect())
}

/// Express the transition times in wall time, using the offsets of the previous transition.
///
/// The first transition uses its own offsets.
pub(super) fn fix_transition_times(transitions: &mut [Transition]) {
    let Some(first) = transitions.first() else { return };
    let mut prev_offsets = (first.offset_seconds, first.delta_seconds);

    for transition in transitions.iter_mut() {
        transition.expanded = transition.transition_time.expand(prev_offsets.0, prev_offsets.1);
        transition.transition_time = ClockTime::Wall(transition.expanded.wall);
        prev_offsets = (transition.offset_seconds, transition.delta_seconds);
    }
}

/// Compute the start and until wall times of the transitions, and their start epoch seconds.
///
/// The transition times must be fixed.
pub(super) fn generate_start_until_times(transitions: &mut [Transition]) {
    let Some(first) = transitions.first() else { return };
    let mut prev_total_offset = first.total_offset();

    for index in 0..transitions.len() {
        let transition_time = transitions[index].transition_time.date();

        if index > 0 {
            transitions[index - 1].until_date_time = transition_time;
        }

        let transition = &mut transitions[index];
        let total_offset = transition.total_offset();

        let start = DateTuple { seconds: transition_time.seconds - prev_total_offset + total_offset, ..transition_time }.normalize();
        transition.start_date_time = start;
        transition.start_epoch_second = start.epoch_seconds() - total_offset as i64;

        prev_total_offset = total_offset;
    }

    if let Some(last) = transitions.last_mut() {
        last.until_date_time = last.match_until.expand(last.offset_seconds, last.delta_seconds).wall;
    }
}

/// Compute the abbreviations of the transitions
pub(super) fn calc_abbrevs(transitions: &mut [Transition]) {
    for transition in transitions {
        transition.abbrev = calc_abbrev(&transition.format, transition.letter(), transition.delta_seconds);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::datetime::Suffix;
    use crate::zone_info::{EraPolicy, ZoneRule};

    fn era(until_year: i32, until_month: u8, until_day: u8) -> ZoneEra {
        ZoneEra {
            offset_seconds: 3600,
            policy: EraPolicy::NoRules,
            format: "CET".to_owned(),
            until_year,
            until_month,
            until_day,
            until_seconds: 0,
            until_suffix: Suffix::Utc,
        }
    }

    #[test]
    fn test_find_matches() {
        let eras = [era(1998, 1, 1), era(2000, 3, 26), era(2000, 10, 1), era(10000, 1, 1)];

        let matches = find_matches(&eras, (1999, 12), (2001, 2));
        assert_eq!(matches.len(), 3);

        assert_eq!(matches[0].era_index, 1);
        assert_eq!(matches[0].start, ClockTime::Wall(DateTuple::new(1999, 12, 1, 0)));
        assert_eq!(matches[0].until, ClockTime::Utc(DateTuple::new(2000, 3, 26, 0)));

        assert_eq!(matches[1].start, ClockTime::Utc(DateTuple::new(2000, 3, 26, 0)));
        assert_eq!(matches[1].until, ClockTime::Utc(DateTuple::new(2000, 10, 1, 0)));

        assert_eq!(matches[2].start, ClockTime::Utc(DateTuple::new(2000, 10, 1, 0)));
        assert_eq!(matches[2].until, ClockTime::Wall(DateTuple::new(2001, 2, 1, 0)));

        // An era ending exactly at the start of the window does not overlap it
        let matches = find_matches(&[era(1999, 12, 1), era(10000, 1, 1)], (1999, 12), (2001, 2));
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].era_index, 1);
    }

    #[test]
    fn test_most_recent_prior_year() {
        assert_eq!(most_recent_prior_year(1967, 2006, 1999), Some(1998));
        assert_eq!(most_recent_prior_year(1976, 1986, 1999), Some(1986));
        assert_eq!(most_recent_prior_year(0, 0, 1999), Some(0));
        assert_eq!(most_recent_prior_year(2007, 9999, 2007), None);
    }

    #[test]
    fn test_find_candidate_transitions() {
        let rule = |from_year, to_year, in_month, on_day_of_month, delta_seconds| ZoneRule {
            from_year,
            to_year,
            in_month,
            on_day_of_week: 7,
            on_day_of_month,
            at_seconds: 7200,
            at_suffix: Suffix::Wall,
            delta_seconds,
            letter: if delta_seconds == 0 { "S" } else { "D" }.to_owned(),
        };

        let policy = ZonePolicy {
            name: "US".to_owned(),
            rules: vec![rule(1967, 2006, 10, 0, 0), rule(1976, 1986, 4, 0, 3600), rule(1987, 2006, 4, 1, 3600), rule(2007, 9999, 3, 8, 3600)],
        };

        let named = ZoneEra { offset_seconds: -28800, policy: EraPolicy::NoRules, format: "P%sT".to_owned(), ..era(10000, 1, 1) };
        let zone_match = ZoneMatch {
            start: ClockTime::Wall(DateTuple::new(1999, 12, 1, 0)),
            until: ClockTime::Wall(DateTuple::new(2001, 2, 1, 0)),
            era_index: 0,
        };

        let candidates = find_candidate_transitions(&zone_match, &named, &policy);
        let times: Vec<_> = candidates.iter().map(|transition| transition.transition_time.date()).collect();
        assert_eq!(times, [DateTuple::new(1999, 10, 31, 7200), DateTuple::new(2000, 4, 2, 7200), DateTuple::new(2000, 10, 29, 7200)]);
        assert!(is_sorted(&candidates));

        let mut candidates = candidates;
        fix_transition_times(&mut candidates);
        let active = select_active_transitions(candidates, &zone_match);
        let active = active.as_deref().unwrap_or_default();
        assert_eq!(active.len(), 3);
        assert_eq!(active[0].transition_time, zone_match.start);
        assert_eq!(active[0].original_transition_time, Some(ClockTime::Wall(DateTuple::new(1999, 10, 31, 7200))));
    }

    #[test]
    fn test_missing_prior() {
        let zone_match = ZoneMatch {
            start: ClockTime::Wall(DateTuple::new(1999, 12, 1, 0)),
            until: ClockTime::Wall(DateTuple::new(2001, 2, 1, 0)),
            era_index: 0,
        };
        let mut transition = Transition::for_simple_match(&zone_match, &era(10000, 1, 1));
        transition.transition_time = ClockTime::Wall(DateTuple::new(2000, 6, 1, 0));

        let mut transitions = vec![transition];
        fix_transition_times(&mut transitions);
        assert_eq!(select_active_transitions(transitions, &zone_match), None);
    }

    #[test]
    fn test_generate_start_until_times() {
        let zone_match = ZoneMatch {
            start: ClockTime::Wall(DateTuple::new(2000, 1, 1, 0)),
            until: ClockTime::Wall(DateTuple::new(2001, 1, 1, 0)),
            era_index: 0,
        };
        let standard = Transition::for_simple_match(&zone_match, &era(10000, 1, 1));
        let mut summer = standard.clone();
        summer.transition_time = ClockTime::Utc(DateTuple::new(2000, 3, 26, 3600));
        summer.delta_seconds = 3600;

        let mut transitions = vec![standard, summer];
        fix_transition_times(&mut transitions);
        generate_start_until_times(&mut transitions);
        calc_abbrevs(&mut transitions);

        assert_eq!(transitions[0].start_date_time, DateTuple::new(2000, 1, 1, 0));
        assert_eq!(transitions[0].start_epoch_second, -3600);
        assert_eq!(transitions[0].until_date_time, DateTuple::new(2000, 3, 26, 7200));
        assert_eq!(transitions[1].start_date_time, DateTuple::new(2000, 3, 26, 10800));
        assert_eq!(transitions[1].start_epoch_second, DateTuple::new(2000, 3, 26, 3600).epoch_seconds());
        assert_eq!(transitions[1].until_date_time, DateTuple::new(2001, 1, 1, 0));
        assert_eq!(transitions[1].abbrev, "CET");
    }
}

//! Resolution of the transitions of a compiled zone.
//!
//! For a year of interest, the [`ZoneProcessor`] runs the following steps:
//!
//! * Find the eras overlapping a viewing window around the year, clipped to this window (the matches).
//! * Find the transitions of each match, from the era itself or from the rules of its policy.
//! * Express the transition times in wall time.
//! * Compute the start and until times of each transition, in the offsets of the transition.
//! * Compute the abbreviations.
//!
//! The result is cached for the last year only.

mod find;
mod transition;

pub use find::{find_matches, YearMonth};
pub use transition::{calc_abbrev, OffsetInfo, Transition, ZoneMatch};

use crate::constants::SECONDS_SINCE_UNIX_EPOCH;
use crate::datetime::DateTuple;
use crate::error::ZoneProcessorError;
use crate::zone_info::{EraPolicy, ZoneInfo};

use tracing::debug;

/// Size of the viewing window around a year of interest
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub enum ViewingMonths {
    /// `[Y-Jan, Y+1-Jan)`
    Twelve,
    /// `[Y-Jan, Y+1-Feb)`
    Thirteen,
    /// `[Y-1-Dec, Y+1-Feb)`
    #[default]
    Fourteen,
    /// `[Y-1-Jan, Y+2-Jan)`
    ThirtySix,
}

impl ViewingMonths {
    /// Number of months of the window
    pub const fn months(self) -> u8 {
        match self {
            Self::Twelve => 12,
            Self::Thirteen => 13,
            Self::Fourteen => 14,
            Self::ThirtySix => 36,
        }
    }

    /// Start and end months of the window of a year
    pub const fn window(self, year: i32) -> (YearMonth, YearMonth) {
        match self {
            Self::Twelve => ((year, 1), (year + 1, 1)),
            Self::Thirteen => ((year, 1), (year + 1, 2)),
            Self::Fourteen => ((year - 1, 12), (year + 1, 2)),
            Self::ThirtySix => ((year - 1, 1), (year + 2, 1)),
        }
    }
}

impl TryFrom<u8> for ViewingMonths {
    type Error = ZoneProcessorError;

    fn try_from(months: u8) -> Result<Self, Self::Error> {
        match months {
            12 => Ok(Self::Twelve),
            13 => Ok(Self::Thirteen),
            14 => Ok(Self::Fourteen),
            36 => Ok(Self::ThirtySix),
            _ => Err(ZoneProcessorError::UnsupportedViewingMonths(months)),
        }
    }
}

/// Transitions containing a local date time, found by [`ZoneProcessor::for_local_date_time`]
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FoundLocalDateTime<'a> {
    /// The local date time is in exactly one transition
    Unique(&'a Transition),
    /// The local date time was skipped by a forward transition
    Gap,
    /// The local date time happens twice, because of a backward transition
    Ambiguous {
        /// Earliest transition containing the local date time
        early: &'a Transition,
        /// Latest transition containing the local date time
        late: &'a Transition,
    },
}

impl<'a> FoundLocalDateTime<'a> {
    /// Returns the transition if unique
    pub fn unique(&self) -> Option<&'a Transition> {
        match *self {
            Self::Unique(transition) => Some(transition),
            _ => None,
        }
    }

    /// Returns the earliest transition if existing
    pub fn earliest(&self) -> Option<&'a Transition> {
        match *self {
            Self::Unique(transition) | Self::Ambiguous { early: transition, .. } => Some(transition),
            Self::Gap => None,
        }
    }

    /// Returns the latest transition if existing
    pub fn latest(&self) -> Option<&'a Transition> {
        match *self {
            Self::Unique(transition) | Self::Ambiguous { late: transition, .. } => Some(transition),
            Self::Gap => None,
        }
    }
}

/// Largest transition counts over a range of years, as `(count, year)` pairs.
///
/// The year is the first year reaching the count.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub struct BufferSizeInfo {
    /// Largest number of active transitions
    pub max_actives: (usize, i32),
    /// Largest number of transitions held at once while searching, active and candidates
    pub max_buffer_size: (usize, i32),
}

/// Transition resolution engine of a compiled zone
#[derive(Debug, Clone)]
pub struct ZoneProcessor<'a> {
    zone_info: &'a ZoneInfo,
    viewing_months: ViewingMonths,
    year: Option<i32>,
    matches: Vec<ZoneMatch>,
    transitions: Vec<Transition>,
    max_transition_buffer_size: usize,
}

impl<'a> ZoneProcessor<'a> {
    /// Construct a zone processor
    pub fn new(zone_info: &'a ZoneInfo, viewing_months: ViewingMonths) -> Self {
        Self { zone_info, viewing_months, year: None, matches: Vec::new(), transitions: Vec::new(), max_transition_buffer_size: 0 }
    }

    /// Returns the compiled zone
    pub fn zone_info(&self) -> &'a ZoneInfo {
        self.zone_info
    }

    /// Returns the matches of the last initialized year
    pub fn matches(&self) -> &[ZoneMatch] {
        &self.matches
    }

    /// Returns the transitions of the last initialized year
    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    /// Returns the largest number of transitions held at once while searching the last initialized year
    pub fn max_transition_buffer_size(&self) -> usize {
        self.max_transition_buffer_size
    }

    /// Compute the matches and transitions of a year, unless already cached
    pub fn init_for_year(&mut self, year: i32) -> Result<(), ZoneProcessorError> {
        if self.year == Some(year) {
            return Ok(());
        }

        self.year = None;
        self.matches.clear();
        self.transitions.clear();
        self.max_transition_buffer_size = 0;

        let (start_ym, until_ym) = self.viewing_months.window(year);
        let matches = find_matches(&self.zone_info.eras, start_ym, until_ym);

        let mut transitions = Vec::new();
        let mut max_buffer_size = 0;

        for zone_match in &matches {
            let era = &self.zone_info.eras[zone_match.era_index];

            match &era.policy {
                EraPolicy::Named(policy) => {
                    let mut candidates = find::find_candidate_transitions(zone_match, era, policy);
                    self.check_sorted(&candidates, year)?;

                    find::fix_transition_times(&mut candidates);
                    self.check_sorted(&candidates, year)?;

                    max_buffer_size = max_buffer_size.max(candidates.len() + transitions.len());

                    let active = find::select_active_transitions(candidates, zone_match)
                        .ok_or_else(|| ZoneProcessorError::MissingPriorTransition { zone: self.zone_info.name.clone(), year })?;
                    self.check_sorted(&active, year)?;

                    transitions.extend(active);
                }
                EraPolicy::NoRules | EraPolicy::FixedDelta(_) => {
                    max_buffer_size = max_buffer_size.max(1 + transitions.len());
                    transitions.push(Transition::for_simple_match(zone_match, era));
                }
            }
        }

        find::fix_transition_times(&mut transitions);
        find::generate_start_until_times(&mut transitions);
        find::calc_abbrevs(&mut transitions);

        debug!(zone = %self.zone_info.name, year, matches = matches.len(), transitions = transitions.len(), "initialized zone processor");

        self.matches = matches;
        self.transitions = transitions;
        self.max_transition_buffer_size = max_buffer_size;
        self.year = Some(year);
        Ok(())
    }

    fn check_sorted(&self, transitions: &[Transition], year: i32) -> Result<(), ZoneProcessorError> {
        if find::is_sorted(transitions) {
            Ok(())
        } else {
            Err(ZoneProcessorError::TransitionsNotSorted { zone: self.zone_info.name.clone(), year })
        }
    }

    /// Find the transition in effect at a time in seconds since `2000-01-01T00:00:00Z`
    pub fn for_epoch_seconds(&mut self, epoch_seconds: i64) -> Result<Option<&Transition>, ZoneProcessorError> {
        let date = DateTuple::from_epoch_seconds(epoch_seconds);

        // Jan 1 in UTC may still be Dec 31 in local time
        let year = if self.viewing_months.months() < 14 && date.month == 1 && date.day == 1 { date.year - 1 } else { date.year };
        self.init_for_year(year)?;

        Ok(self.transitions.iter().take_while(|transition| transition.start_epoch_second <= epoch_seconds).last())
    }

    /// Find the transition in effect at a Unix time
    pub fn for_unix_seconds(&mut self, unix_seconds: i64) -> Result<Option<&Transition>, ZoneProcessorError> {
        self.for_epoch_seconds(unix_seconds - SECONDS_SINCE_UNIX_EPOCH)
    }

    /// Find the transitions whose wall time interval contains a local date time
    pub fn for_local_date_time(&mut self, date_time: DateTuple) -> Result<FoundLocalDateTime<'_>, ZoneProcessorError> {
        self.init_for_year(date_time.year)?;

        let mut containing = self.transitions.iter().filter(|transition| transition.contains(date_time));

        Ok(match (containing.next(), containing.last()) {
            (None, _) => FoundLocalDateTime::Gap,
            (Some(transition), None) => FoundLocalDateTime::Unique(transition),
            (Some(early), Some(late)) => FoundLocalDateTime::Ambiguous { early, late },
        })
    }

    /// Find the first transition whose wall time interval contains a local date time
    pub fn transition_for_local_date_time(&mut self, date_time: DateTuple) -> Result<Option<&Transition>, ZoneProcessorError> {
        self.init_for_year(date_time.year)?;
        Ok(self.transitions.iter().find(|transition| transition.contains(date_time)))
    }

    /// Find the largest numbers of active transitions and of buffered transitions over `[start_year, until_year)`
    pub fn get_buffer_sizes(&mut self, start_year: i32, until_year: i32) -> Result<BufferSizeInfo, ZoneProcessorError> {
        let mut info = BufferSizeInfo::default();

        for year in start_year..until_year {
            self.init_for_year(year)?;

            if self.transitions.len() > info.max_actives.0 {
                info.max_actives = (self.transitions.len(), year);
            }

            if self.max_transition_buffer_size > info.max_buffer_size.0 {
                info.max_buffer_size = (self.max_transition_buffer_size, year);
            }
        }

        Ok(info)
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;
    use crate::config::CompilerConfig;
    use crate::error::Error;
    use crate::parse::Extractor;
    use crate::transform::Transformer;
    use crate::zone_info::{build_zone_infos, ZoneInfoMap};

    pub(crate) const DATA: &str = "\
Rule    US      1967    2006    -   Oct     lastSun 2:00    0       S
Rule    US      1967    1973    -   Apr     lastSun 2:00    1:00    D
Rule    US      1976    1986    -   Apr     lastSun 2:00    1:00    D
Rule    US      1987    2006    -   Apr     Sun>=1  2:00    1:00    D
Rule    US      2007    max     -   Mar     Sun>=8  2:00    1:00    D
Rule    US      2007    max     -   Nov     Sun>=1  2:00    0       S
Rule    Pakistan 2002   only    -   Apr     Sun>=2  0:00    1:00    S
Rule    Pakistan 2002   only    -   Oct     Sun>=2  0:00    0       -
Rule    Pakistan 2008   only    -   Jun     1       0:00    1:00    S
Rule    Pakistan 2008   2009    -   Nov     1       0:00    0       -
Rule    Pakistan 2009   only    -   Apr     15      0:00    1:00    S

Zone America/Los_Angeles -7:52:58 - LMT 1883 Nov 18 12:07:02
\t\t\t-8:00\tUS\tP%sT
Zone Asia/Karachi 4:28:12 - LMT 1907
\t\t\t5:00\t-\t+05\t1971 Mar 26
\t\t\t5:00\tPakistan\tPK%sT
Zone Test/Fixed -5:00 - EST
";

    pub(crate) fn zone_infos() -> Result<ZoneInfoMap, Error> {
        let mut extractor = Extractor::new();
        extractor.read_str(DATA);
        let result = Transformer::new(extractor.extract(), CompilerConfig::default()).transform()?;
        Ok(build_zone_infos(&result.zones_map, &result.policies_map)?)
    }

    #[test]
    fn test_viewing_months() -> Result<(), ZoneProcessorError> {
        assert_eq!(ViewingMonths::try_from(13)?, ViewingMonths::Thirteen);
        assert_eq!(ViewingMonths::try_from(15), Err(ZoneProcessorError::UnsupportedViewingMonths(15)));
        assert_eq!(ViewingMonths::default().window(2000), ((1999, 12), (2001, 2)));
        assert_eq!(ViewingMonths::ThirtySix.window(2000), ((1999, 1), (2002, 1)));
        Ok(())
    }

    #[test]
    fn test_los_angeles_2000() -> Result<(), Error> {
        let zone_infos = zone_infos()?;
        let mut processor = ZoneProcessor::new(&zone_infos["America/Los_Angeles"], ViewingMonths::Fourteen);
        processor.init_for_year(2000)?;

        let transitions = processor.transitions();
        assert_eq!(transitions.len(), 3);
        assert!(transitions.windows(2).all(|x| x[0].transition_time <= x[1].transition_time));
        assert!(transitions[0].start_date_time <= DateTuple::new(1999, 12, 1, 0));

        let summary: Vec<_> = transitions.iter().map(|x| (x.start_date_time, x.until_date_time, x.abbrev.as_str())).collect();
        assert_eq!(
            summary,
            [
                (DateTuple::new(1999, 12, 1, 0), DateTuple::new(2000, 4, 2, 7200), "PST"),
                (DateTuple::new(2000, 4, 2, 10800), DateTuple::new(2000, 10, 29, 7200), "PDT"),
                (DateTuple::new(2000, 10, 29, 3600), DateTuple::new(2001, 2, 1, 0), "PST"),
            ]
        );

        assert_eq!(transitions[1].offset_info(), OffsetInfo { total_offset: -25200, utc_offset: -28800, dst_offset: 3600, abbrev: "PDT".to_owned() });
        assert_eq!(transitions[1].start_epoch_second, 7_984_800);
        assert_eq!(processor.max_transition_buffer_size(), 3);
        Ok(())
    }

    #[test]
    fn test_fixed_zone() -> Result<(), Error> {
        let zone_infos = zone_infos()?;
        let mut processor = ZoneProcessor::new(&zone_infos["Test/Fixed"], ViewingMonths::default());
        processor.init_for_year(2020)?;

        let transitions = processor.transitions();
        assert_eq!(transitions.len(), 1);
        assert_eq!(transitions[0].delta_seconds, 0);
        assert_eq!(transitions[0].offset_seconds, -18000);
        assert_eq!(transitions[0].abbrev, "EST");
        assert_eq!(transitions[0].start_date_time, DateTuple::new(2019, 12, 1, 0));
        Ok(())
    }

    #[test]
    fn test_anchor_prior() -> Result<(), Error> {
        let zone_infos = zone_infos()?;
        let mut processor = ZoneProcessor::new(&zone_infos["Asia/Karachi"], ViewingMonths::default());
        processor.init_for_year(2000)?;

        let transitions = processor.transitions();
        assert_eq!(transitions.len(), 1);
        assert_eq!(transitions[0].rule.as_ref().map(|rule| rule.from_year), Some(0));
        assert_eq!(transitions[0].original_transition_time.map(|time| time.date()), Some(DateTuple::new(0, 1, 1, 0)));
        assert_eq!(transitions[0].abbrev, "PKT");
        assert_eq!(transitions[0].total_offset(), 18000);
        Ok(())
    }

    #[test]
    fn test_init_for_year_idempotent() -> Result<(), Error> {
        let zone_infos = zone_infos()?;
        let mut processor = ZoneProcessor::new(&zone_infos["America/Los_Angeles"], ViewingMonths::default());

        processor.init_for_year(2008)?;
        let first = processor.transitions().to_vec();
        processor.init_for_year(2008)?;
        assert_eq!(processor.transitions(), first.as_slice());

        processor.init_for_year(2012)?;
        processor.init_for_year(2008)?;
        assert_eq!(processor.transitions(), first.as_slice());
        assert_eq!(processor.matches().len(), 1);
        Ok(())
    }

    #[test]
    fn test_point_queries() -> Result<(), Error> {
        let zone_infos = zone_infos()?;
        let mut processor = ZoneProcessor::new(&zone_infos["America/Los_Angeles"], ViewingMonths::default());

        let abbrev = |transition: Option<&Transition>| transition.map(|x| x.abbrev.clone());
        assert_eq!(abbrev(processor.for_epoch_seconds(7_984_799)?), Some("PST".to_owned()));
        assert_eq!(abbrev(processor.for_epoch_seconds(7_984_800)?), Some("PDT".to_owned()));
        assert_eq!(abbrev(processor.for_unix_seconds(7_984_800 + SECONDS_SINCE_UNIX_EPOCH)?), Some("PDT".to_owned()));

        assert_eq!(processor.for_local_date_time(DateTuple::new(2000, 4, 2, 9000))?, FoundLocalDateTime::Gap);

        let found = processor.for_local_date_time(DateTuple::new(2000, 7, 1, 43200))?;
        assert_eq!(found.unique().map(|x| x.abbrev.as_str()), Some("PDT"));

        let found = processor.for_local_date_time(DateTuple::new(2000, 10, 29, 5400))?;
        assert!(matches!(found, FoundLocalDateTime::Ambiguous { .. }));
        assert_eq!(found.earliest().map(|x| x.abbrev.as_str()), Some("PDT"));
        assert_eq!(found.latest().map(|x| x.abbrev.as_str()), Some("PST"));

        let transition = processor.transition_for_local_date_time(DateTuple::new(2000, 10, 29, 5400))?;
        assert_eq!(transition.map(|x| x.delta_seconds), Some(3600));
        Ok(())
    }

    #[test]
    fn test_instant_and_local_agree() -> Result<(), Error> {
        let zone_infos = zone_infos()?;
        let mut processor = ZoneProcessor::new(&zone_infos["America/Los_Angeles"], ViewingMonths::default());

        let mut epoch_seconds = 0;
        while epoch_seconds < 366 * 86400 {
            let Some(transition) = processor.for_epoch_seconds(epoch_seconds)?.cloned() else {
                panic!("no transition at {epoch_seconds}");
            };

            let local = DateTuple::from_epoch_seconds(epoch_seconds + transition.total_offset() as i64);
            let found = processor.for_local_date_time(local)?;
            let offset_info = Some(transition.offset_info());
            assert!(found.earliest().map(Transition::offset_info) == offset_info || found.latest().map(Transition::offset_info) == offset_info, "{local}");

            epoch_seconds += 7 * 3600 + 1234;
        }

        Ok(())
    }

    #[test]
    fn test_new_year_in_every_window() -> Result<(), Error> {
        let zone_infos = zone_infos()?;

        let windows = [
            (ViewingMonths::Twelve, 2000),
            (ViewingMonths::Thirteen, 2000),
            (ViewingMonths::Fourteen, 2001),
            (ViewingMonths::ThirtySix, 2001),
        ];

        // 2001-01-01T03:00:00Z and 2001-01-01T12:00:00Z
        for unix_seconds in [978_318_000, 978_350_400] {
            for (viewing_months, cached_year) in windows {
                let mut processor = ZoneProcessor::new(&zone_infos["America/Los_Angeles"], viewing_months);

                let transition = processor.for_unix_seconds(unix_seconds)?;
                assert_eq!(transition.map(|x| x.abbrev.as_str()), Some("PST"), "{viewing_months:?}");
                assert_eq!(transition.map(Transition::total_offset), Some(-28800), "{viewing_months:?}");
                assert_eq!(processor.year, Some(cached_year), "{viewing_months:?}");
            }
        }

        Ok(())
    }

    #[test]
    fn test_buffer_sizes() -> Result<(), Error> {
        let zone_infos = zone_infos()?;

        let mut processor = ZoneProcessor::new(&zone_infos["America/Los_Angeles"], ViewingMonths::default());
        let info = processor.get_buffer_sizes(2000, 2038)?;
        assert_eq!(info.max_actives, (3, 2000));
        assert_eq!(info.max_buffer_size, (5, 2008));

        let mut processor = ZoneProcessor::new(&zone_infos["Test/Fixed"], ViewingMonths::default());
        let info = processor.get_buffer_sizes(2000, 2038)?;
        assert_eq!(info, BufferSizeInfo { max_actives: (1, 2000), max_buffer_size: (1, 2000) });
        Ok(())
    }

    #[test]
    fn test_missing_prior_transition() -> Result<(), Error> {
        let mut zone_infos = zone_infos()?;
        let mut karachi = zone_infos.swap_remove("Asia/Karachi").ok_or_else(|| ZoneProcessorError::ZoneNotFound("Asia/Karachi".to_owned()))?;

        for era in &mut karachi.eras {
            if let EraPolicy::Named(policy) = &mut era.policy {
                std::sync::Arc::make_mut(policy).rules.retain(|rule| rule.from_year != 0);
            }
        }

        let mut processor = ZoneProcessor::new(&karachi, ViewingMonths::default());
        assert_eq!(processor.init_for_year(2000), Err(ZoneProcessorError::MissingPriorTransition { zone: "Asia/Karachi".to_owned(), year: 2000 }));
        assert!(processor.transitions().is_empty());
        Ok(())
    }
}

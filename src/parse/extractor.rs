//! Extraction of `Rule`, `Zone` and `Link` entries from the TZ database files.

use crate::constants::{MAX_UNTIL_YEAR, MAX_YEAR};
use crate::error::{Error, ParseError};
use crate::parse::fields::{parse_month, split_time_suffix};
use crate::records::{LinksMap, PoliciesMap, RawZoneEra, RawZoneRule, ZonesMap};

use indexmap::IndexMap;
use tracing::{info, warn};

use std::fs;
use std::path::Path;

/// TZ database files read by the extractor, in reading order
pub const ZONE_FILES: [&str; 9] = ["africa", "antarctica", "asia", "australasia", "backward", "etcetera", "europe", "northamerica", "southamerica"];

/// Line-oriented collector of TZ database entries.
///
/// Lines are grouped by name while reading, and parsed into records by [`Extractor::extract`].
#[derive(Debug, Default)]
pub struct Extractor {
    /// Policy name to its `Rule` lines
    rule_lines: IndexMap<String, Vec<String>>,
    /// Zone name to its `Zone` line and continuation lines, without the `Zone NAME` prefix
    zone_lines: IndexMap<String, Vec<String>>,
    /// Link name to its target zone names
    link_lines: IndexMap<String, Vec<String>>,
    /// Number of lines read for each kind of entry
    counts: LineCounts,
}

/// Line counters of an extraction
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LineCounts {
    /// Number of `Rule` lines
    pub rule_lines: usize,
    /// Number of `Zone` lines, including continuation lines
    pub zone_lines: usize,
    /// Number of `Link` lines
    pub link_lines: usize,
    /// Number of lines outside of any entry
    pub ignored_lines: usize,
    /// Number of invalid `Rule` lines
    pub invalid_rule_lines: usize,
    /// Number of invalid `Zone` lines
    pub invalid_zone_lines: usize,
    /// Number of invalid `Link` lines
    pub invalid_link_lines: usize,
}

/// Records extracted from the TZ database
#[derive(Debug, Default)]
pub struct ExtractorResult {
    /// Policy name to its rules
    pub policies_map: PoliciesMap,
    /// Zone name to its eras
    pub zones_map: ZonesMap,
    /// Link name to its target zone
    pub links_map: LinksMap,
    /// Line counters
    pub counts: LineCounts,
}

impl Extractor {
    /// Construct an empty extractor
    pub fn new() -> Self {
        Self::default()
    }

    /// Read all [`ZONE_FILES`] from a TZ database directory
    pub fn read_dir(&mut self, input_dir: &Path) -> Result<(), Error> {
        for file_name in ZONE_FILES {
            let path = input_dir.join(file_name);
            info!("Processing {}", path.display());
            let text = fs::read_to_string(&path).map_err(|error| Error::io(&path, error))?;
            self.read_str(&text);
        }
        Ok(())
    }

    /// Read the content of one TZ database file
    pub fn read_str(&mut self, text: &str) {
        let mut zone_name: Option<String> = None;

        for line in text.lines().filter_map(strip_line) {
            match line.get(..4) {
                Some("Rule") => {
                    zone_name = None;
                    self.counts.rule_lines += 1;
                    match line.split_whitespace().nth(1) {
                        Some(name) => self.rule_lines.entry(name.to_owned()).or_default().push(line.to_owned()),
                        None => self.invalid_line(line, ParseError::MissingFields { expected: 2, found: 1 }),
                    }
                }
                Some("Link") => {
                    zone_name = None;
                    self.counts.link_lines += 1;
                    let tokens: Vec<&str> = line.split_whitespace().collect();
                    match tokens[..] {
                        [_, target, name, ..] => self.link_lines.entry(name.to_owned()).or_default().push(target.to_owned()),
                        _ => self.invalid_line(line, ParseError::MissingFields { expected: 3, found: tokens.len() }),
                    }
                }
                Some("Zone") => {
                    self.counts.zone_lines += 1;
                    let tokens: Vec<&str> = line.split_whitespace().collect();
                    match tokens[..] {
                        [_, name, ref fields @ ..] => {
                            self.zone_lines.entry(name.to_owned()).or_default().push(fields.join(" "));
                            zone_name = Some(name.to_owned());
                        }
                        _ => {
                            zone_name = None;
                            self.invalid_line(line, ParseError::MissingFields { expected: 2, found: tokens.len() });
                        }
                    }
                }
                _ => match zone_name.as_ref().filter(|_| line.starts_with('\t')) {
                    Some(name) => {
                        self.counts.zone_lines += 1;
                        self.zone_lines.entry(name.clone()).or_default().push(line.to_owned());
                    }
                    None => {
                        self.counts.ignored_lines += 1;
                        zone_name = None;
                    }
                },
            }
        }
    }

    /// Log and count a line which cannot be grouped
    fn invalid_line(&mut self, line: &str, error: ParseError) {
        warn!("Invalid line: {}: {}", error, line);
        match line.get(..4) {
            Some("Rule") => self.counts.invalid_rule_lines += 1,
            Some("Link") => self.counts.invalid_link_lines += 1,
            _ => self.counts.invalid_zone_lines += 1,
        }
    }

    /// Parse the collected lines into records
    pub fn extract(self) -> ExtractorResult {
        let mut counts = self.counts;

        let mut policies_map = PoliciesMap::new();
        for (name, lines) in self.rule_lines {
            for line in lines {
                match parse_rule_line(&line) {
                    Ok(rule) => policies_map.entry(name.clone()).or_default().push(rule),
                    Err(error) => {
                        warn!("Invalid Rule line: {}: {}", error, line);
                        counts.invalid_rule_lines += 1;
                    }
                }
            }
        }

        let mut zones_map = ZonesMap::new();
        for (name, lines) in self.zone_lines {
            for line in lines {
                match parse_zone_line(&line) {
                    Ok(era) => zones_map.entry(name.clone()).or_default().push(era),
                    Err(error) => {
                        warn!("Invalid Zone line: {}: {}: {}", name, error, line);
                        counts.invalid_zone_lines += 1;
                    }
                }
            }
        }

        let mut links_map = LinksMap::new();
        for (name, targets) in self.link_lines {
            match &targets[..] {
                [target] => {
                    links_map.insert(name, target.clone());
                }
                _ => {
                    warn!("Link '{}' defined {} times", name, targets.len());
                    counts.invalid_link_lines += targets.len();
                }
            }
        }

        ExtractorResult { policies_map, zones_map, links_map, counts }
    }
}

impl ExtractorResult {
    /// Total number of invalid lines
    pub fn invalid_line_count(&self) -> usize {
        self.counts.invalid_rule_lines + self.counts.invalid_zone_lines + self.counts.invalid_link_lines
    }

    /// Log the extraction counters
    pub fn log_summary(&self) {
        let rule_count: usize = self.policies_map.values().map(Vec::len).sum();
        let era_count: usize = self.zones_map.values().map(Vec::len).sum();
        let counts = &self.counts;

        info!("Summary: Line count (Rule, Zone, Link): ({}, {}, {})", counts.rule_lines, counts.zone_lines, counts.link_lines);
        info!("Summary: Name count (Rule, Zone, Link): ({}, {}, {})", self.policies_map.len(), self.zones_map.len(), self.links_map.len());
        info!("Summary: Rule entry count: {}", rule_count);
        info!("Summary: Zone entry count: {}", era_count);
        info!("Summary: Ignored lines: {}", counts.ignored_lines);
        info!(
            "Summary: Invalid lines (Rule, Zone, Link): ({}, {}, {})",
            counts.invalid_rule_lines, counts.invalid_zone_lines, counts.invalid_link_lines
        );
    }
}

/// Strip the comment and the trailing whitespaces of a line, skipping blank lines
fn strip_line(line: &str) -> Option<&str> {
    let line = match line.find('#') {
        Some(index) => &line[..index],
        None => line,
    };

    let line = line.trim_end();
    if line.is_empty() {
        None
    } else {
        Some(line)
    }
}

/// Parse a `Rule NAME FROM TO - IN ON AT SAVE LETTER` line
fn parse_rule_line(line: &str) -> Result<RawZoneRule, ParseError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let [_, _, from, to, _, in_month, on_day, at, save, letter, ..] = tokens[..] else {
        return Err(ParseError::MissingFields { expected: 10, found: tokens.len() });
    };

    let from_year: i32 = from.parse()?;
    let to_year = match to {
        "only" => from_year,
        "max" => MAX_YEAR,
        _ => to.parse()?,
    };

    let (at_time, at_time_suffix) = split_time_suffix(at)?;

    Ok(RawZoneRule {
        from_year,
        to_year,
        in_month: parse_month(in_month)?,
        on_day: on_day.to_owned(),
        at_time: at_time.to_owned(),
        at_time_suffix,
        delta_offset: save.to_owned(),
        letter: letter.to_owned(),
        raw_line: line.to_owned(),
        on_day_of_week: None,
        on_day_of_month: None,
        at_seconds: None,
        at_seconds_truncated: None,
        delta_seconds: None,
        delta_seconds_truncated: None,
        encoded: None,
        used: false,
    })
}

/// Parse a `STDOFF RULES FORMAT [UNTIL]` zone line
fn parse_zone_line(line: &str) -> Result<RawZoneEra, ParseError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let [offset, rules, format, ref until @ ..] = tokens[..] else {
        return Err(ParseError::MissingFields { expected: 3, found: tokens.len() });
    };

    let until_year = match until.first() {
        Some(year) => year.parse()?,
        None => MAX_UNTIL_YEAR,
    };

    let (until_month, until_year_only) = match until.get(1) {
        Some(month) => (parse_month(month)?, false),
        None => (1, true),
    };

    let until_day_string = until.get(2).copied().unwrap_or("1");

    let (until_time, until_time_suffix) = match until.get(3) {
        Some(time) => split_time_suffix(time)?,
        None => ("00:00", Some('w')),
    };

    Ok(RawZoneEra {
        offset_string: offset.to_owned(),
        rules: rules.to_owned(),
        format: format.to_owned(),
        until_year,
        until_year_only,
        until_month,
        until_day_string: until_day_string.to_owned(),
        until_time: until_time.to_owned(),
        until_time_suffix,
        raw_line: line.to_owned(),
        until_day: None,
        until_seconds: None,
        until_seconds_truncated: None,
        offset_seconds: None,
        offset_seconds_truncated: None,
        rules_delta_seconds: None,
        rules_delta_seconds_truncated: None,
        encoded: None,
    })
}

//! Compact encodings of the transformed records, for 8-bit and 32-bit targets.
//!
//! Times and offsets are stored in units of 15 minutes, with the remaining minutes in a modifier,
//! and years are stored as signed offsets from [`EPOCH_YEAR`].

use crate::config::Scope;
use crate::constants::*;
use crate::error::EncodeError;
use crate::records::{CommentsMap, PoliciesMap, RawZoneEra, RawZoneRule, ZonesMap};
use crate::transform::TransformerResult;

use indexmap::IndexMap;
use serde::Serialize;
use tracing::info;

use std::collections::BTreeSet;

/// Map of policy name to its multi-character letters and their indexes
pub type LettersPerPolicy = IndexMap<String, IndexMap<String, usize>>;

/// Encoded fields of a rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedRule {
    /// FROM year as a tiny year
    pub from_year_tiny: i32,
    /// TO year as a tiny year
    pub to_year_tiny: i32,
    /// AT time in units of 15 minutes
    pub at_time_code: i32,
    /// Remaining minutes of the AT time
    pub at_time_minute: i32,
    /// AT suffix code and remaining minutes
    pub at_time_modifier: i32,
    /// SAVE in units of 15 minutes
    pub delta_code: i32,
    /// SAVE code shifted for the target scope
    pub delta_code_encoded: i32,
    /// Index of a multi-character LETTER in its policy, `-1` for a single character
    pub letter_index: i32,
}

/// Encoded fields of an era
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedEra {
    /// STDOFF in units of 15 minutes
    pub offset_code: i32,
    /// Remaining minutes of the STDOFF
    pub offset_minute: i32,
    /// DST offset of a fixed RULES field in units of 15 minutes
    pub delta_code: i32,
    /// DST offset code packed with the STDOFF minutes for the target scope
    pub delta_code_encoded: i32,
    /// UNTIL year as a tiny year
    pub until_year_tiny: i32,
    /// UNTIL time in units of 15 minutes
    pub until_time_code: i32,
    /// Remaining minutes of the UNTIL time
    pub until_time_minute: i32,
    /// UNTIL suffix code and remaining minutes
    pub until_time_modifier: i32,
    /// FORMAT with `%s` replaced by `%`
    pub format_short: String,
}

/// Time of day split into a 15-minute code and a modifier
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct EncodedTime {
    /// Time in units of 15 minutes, rounded toward negative infinity
    pub code: i32,
    /// Remaining minutes in `[0, 14]`
    pub minute: i32,
    /// Suffix code in the upper 4 bits
    pub suffix_code: i32,
    /// Sum of the suffix code and the remaining minutes
    pub modifier: i32,
}

impl EncodedTime {
    /// Encode a number of seconds with its suffix letter
    pub fn new(seconds: i32, suffix: char) -> Self {
        let code = seconds.div_euclid(SECONDS_PER_QUARTER_HOUR);
        let minute = seconds.rem_euclid(SECONDS_PER_QUARTER_HOUR) / SECONDS_PER_MINUTE;
        let suffix_code = suffix_code(suffix);
        Self { code, minute, suffix_code, modifier: suffix_code + minute }
    }
}

/// Suffix code stored in the upper 4 bits of a time modifier
fn suffix_code(suffix: char) -> i32 {
    match suffix {
        's' => 0x10,
        'u' => 0x20,
        _ => 0x00,
    }
}

/// Convert a FROM or TO year into a tiny year
pub fn to_tiny_year(year: i32) -> i32 {
    match year {
        MAX_YEAR => MAX_TINY_YEAR,
        MIN_YEAR => MIN_TINY_YEAR,
        _ => year - EPOCH_YEAR,
    }
}

/// Convert an UNTIL year into a tiny year
pub fn to_tiny_until_year(year: i32) -> i32 {
    match year {
        MAX_UNTIL_YEAR => MAX_UNTIL_TINY_YEAR,
        MIN_YEAR => MIN_TINY_YEAR,
        _ => year - EPOCH_YEAR,
    }
}

/// Collect the multi-character letters of each policy, sorted by policy name then by letter
pub fn collect_letters_per_policy(policies_map: &PoliciesMap) -> LettersPerPolicy {
    let mut policy_names: Vec<&String> = policies_map.keys().collect();
    policy_names.sort();

    let mut letters_per_policy = LettersPerPolicy::new();
    for policy_name in policy_names {
        let letters: BTreeSet<&str> = policies_map[policy_name].iter().map(|rule| rule.letter.as_str()).filter(|letter| letter.len() > 1).collect();

        if !letters.is_empty() {
            let indexed = letters.into_iter().enumerate().map(|(index, letter)| (letter.to_owned(), index)).collect();
            letters_per_policy.insert(policy_name.clone(), indexed);
        }
    }
    letters_per_policy
}

/// Encoder of the transformed records
#[derive(Debug, Copy, Clone)]
pub struct Encoder {
    scope: Scope,
}

impl Encoder {
    /// Construct an encoder for a target scope
    pub fn new(scope: Scope) -> Self {
        Self { scope }
    }

    /// Fill the `encoded` block of every rule and era, adding the notable entries to the result.
    ///
    /// Returns the multi-character letters of each policy.
    pub fn encode(&self, result: &mut TransformerResult) -> Result<LettersPerPolicy, EncodeError> {
        let letters_per_policy = collect_letters_per_policy(&result.policies_map);

        self.encode_rules(&mut result.policies_map, &letters_per_policy, &mut result.notable_policies)?;
        self.encode_eras(&mut result.zones_map, &mut result.notable_zones)?;

        info!("Summary: Zones {}; Policies {}; Links {}", result.zones_map.len(), result.policies_map.len(), result.links_map.len());
        Ok(letters_per_policy)
    }

    fn encode_rules(&self, policies_map: &mut PoliciesMap, letters_per_policy: &LettersPerPolicy, notable: &mut CommentsMap) -> Result<(), EncodeError> {
        for (policy_name, rules) in policies_map.iter_mut() {
            for rule in rules.iter_mut() {
                let encoded = self.encode_rule(policy_name, rule, letters_per_policy.get(policy_name))?;

                if encoded.at_time_minute != 0 {
                    notable.add(policy_name, format!("AT '{}' not on 15-minute boundary", rule.at_time));
                }
                if rule.letter.len() > 1 {
                    notable.add(policy_name, format!("LETTER '{}' not single character", rule.letter));
                }

                rule.encoded = Some(encoded);
            }
        }
        Ok(())
    }

    fn encode_rule(&self, policy_name: &str, rule: &RawZoneRule, letters: Option<&IndexMap<String, usize>>) -> Result<EncodedRule, EncodeError> {
        let missing = |field| EncodeError::MissingField { name: policy_name.to_owned(), field };

        let at_seconds = rule.at_seconds_truncated.ok_or_else(|| missing("at_seconds_truncated"))?;
        let delta_seconds = rule.delta_seconds_truncated.ok_or_else(|| missing("delta_seconds_truncated"))?;

        let at_time = EncodedTime::new(at_seconds, rule.at_time_suffix.unwrap_or('w'));
        let delta_code = delta_seconds.div_euclid(SECONDS_PER_QUARTER_HOUR);
        let delta_code_encoded = match self.scope {
            Scope::Basic => delta_code,
            Scope::Extended => delta_code + 4,
        };

        Ok(EncodedRule {
            from_year_tiny: to_tiny_year(rule.from_year),
            to_year_tiny: to_tiny_year(rule.to_year),
            at_time_code: at_time.code,
            at_time_minute: at_time.minute,
            at_time_modifier: at_time.modifier,
            delta_code,
            delta_code_encoded,
            letter_index: letter_index(policy_name, &rule.letter, letters)?,
        })
    }

    fn encode_eras(&self, zones_map: &mut ZonesMap, notable: &mut CommentsMap) -> Result<(), EncodeError> {
        for (zone_name, eras) in zones_map.iter_mut() {
            for era in eras.iter_mut() {
                let encoded = self.encode_era(zone_name, era)?;

                if encoded.offset_minute != 0 {
                    notable.add(zone_name, format!("STDOFF '{}' not on 15-minute boundary", era.offset_string));
                }
                if encoded.until_time_minute != 0 {
                    notable.add(zone_name, format!("UNTIL '{}' not on 15-minute boundary", era.until_time));
                }

                era.encoded = Some(encoded);
            }
        }
        Ok(())
    }

    fn encode_era(&self, zone_name: &str, era: &RawZoneEra) -> Result<EncodedEra, EncodeError> {
        let missing = |field| EncodeError::MissingField { name: zone_name.to_owned(), field };

        let offset_seconds = era.offset_seconds_truncated.ok_or_else(|| missing("offset_seconds_truncated"))?;
        let until_seconds = era.until_seconds_truncated.ok_or_else(|| missing("until_seconds_truncated"))?;
        let delta_seconds = if era.rules == ":" {
            era.rules_delta_seconds_truncated.ok_or_else(|| missing("rules_delta_seconds_truncated"))?
        } else {
            0
        };

        let offset_code = offset_seconds.div_euclid(SECONDS_PER_QUARTER_HOUR);
        let offset_minute = offset_seconds.rem_euclid(SECONDS_PER_QUARTER_HOUR) / SECONDS_PER_MINUTE;
        let delta_code = delta_seconds.div_euclid(SECONDS_PER_QUARTER_HOUR);
        let delta_code_encoded = match self.scope {
            Scope::Basic => delta_code,
            Scope::Extended => (offset_minute << 4) + (delta_code + 4),
        };

        let until_time = EncodedTime::new(until_seconds, era.until_time_suffix.unwrap_or('w'));

        Ok(EncodedEra {
            offset_code,
            offset_minute,
            delta_code,
            delta_code_encoded,
            until_year_tiny: to_tiny_until_year(era.until_year),
            until_time_code: until_time.code,
            until_time_minute: until_time.minute,
            until_time_modifier: until_time.modifier,
            format_short: era.format.replace("%s", "%"),
        })
    }
}

/// Index of a LETTER in the letters of its policy, or `-1` for a single character
fn letter_index(policy_name: &str, letter: &str, letters: Option<&IndexMap<String, usize>>) -> Result<i32, EncodeError> {
    match letter.len() {
        0 => Err(EncodeError::EmptyLetter { policy: policy_name.to_owned() }),
        1 => Ok(-1),
        _ => {
            let index = letters
                .and_then(|letters| letters.get(letter))
                .copied()
                .ok_or_else(|| EncodeError::UnknownLetter { policy: policy_name.to_owned(), letter: letter.to_owned() })?;

            if index >= MAX_LETTERS_PER_POLICY {
                return Err(EncodeError::TooManyLetters { policy: policy_name.to_owned(), count: index + 1 });
            }
            Ok(index as i32)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::transform::test_utils::{era, rule};

    #[test]
    fn test_tiny_years() {
        assert_eq!(to_tiny_year(MAX_YEAR), 126);
        assert_eq!(to_tiny_year(MIN_YEAR), -127);
        assert_eq!(to_tiny_year(2018), 18);
        assert_eq!(to_tiny_year(1974), -26);
        assert_eq!(to_tiny_until_year(MAX_UNTIL_YEAR), 127);
        assert_eq!(to_tiny_until_year(MIN_YEAR), -127);
        assert_eq!(to_tiny_until_year(2011), 11);
    }

    #[test]
    fn test_encoded_time() {
        assert_eq!(EncodedTime::new(7200, 'w'), EncodedTime { code: 8, minute: 0, suffix_code: 0, modifier: 0 });
        assert_eq!(EncodedTime::new(7200 + 600, 's'), EncodedTime { code: 8, minute: 10, suffix_code: 0x10, modifier: 0x1a });
        assert_eq!(EncodedTime::new(0, 'u'), EncodedTime { code: 0, minute: 0, suffix_code: 0x20, modifier: 0x20 });
        assert_eq!(EncodedTime::new(-60, 'w'), EncodedTime { code: -1, minute: 14, suffix_code: 0, modifier: 14 });
    }

    #[test]
    fn test_letter_index() -> Result<(), EncodeError> {
        let mut policies_map = PoliciesMap::new();
        policies_map.insert("Zed".to_owned(), vec![rule(2000, 2010, 3, "CAT"), rule(2000, 2010, 10, "D")]);
        policies_map.insert("Alpha".to_owned(), vec![rule(2000, 2010, 3, "WAT"), rule(2000, 2010, 10, "CAT"), rule(2011, 2012, 3, "WAT")]);

        let letters_per_policy = collect_letters_per_policy(&policies_map);
        assert_eq!(letters_per_policy.keys().collect::<Vec<_>>(), ["Alpha", "Zed"]);
        assert_eq!(letters_per_policy["Alpha"]["CAT"], 0);
        assert_eq!(letters_per_policy["Alpha"]["WAT"], 1);

        assert_eq!(letter_index("Alpha", "WAT", letters_per_policy.get("Alpha"))?, 1);
        assert_eq!(letter_index("Zed", "D", letters_per_policy.get("Zed"))?, -1);
        assert_eq!(letter_index("Zed", "", None), Err(EncodeError::EmptyLetter { policy: "Zed".to_owned() }));
        assert_eq!(
            letter_index("Zed", "XYZ", letters_per_policy.get("Zed")),
            Err(EncodeError::UnknownLetter { policy: "Zed".to_owned(), letter: "XYZ".to_owned() })
        );
        Ok(())
    }

    #[test]
    fn test_encode() -> Result<(), EncodeError> {
        let mut result = TransformerResult::default();

        let mut dst = rule(2007, MAX_YEAR, 3, "D");
        dst.at_seconds_truncated = Some(7200 + 60);
        dst.at_time = "2:01".to_owned();
        dst.at_time_suffix = Some('s');
        dst.delta_seconds_truncated = Some(3600);
        result.policies_map.insert("US".to_owned(), vec![dst]);

        let mut fixed = era(-19800, MAX_UNTIL_YEAR);
        fixed.offset_string = "-5:30".to_owned();
        fixed.rules = ":".to_owned();
        fixed.format = "X%sT".to_owned();
        fixed.rules_delta_seconds_truncated = Some(1800);
        result.zones_map.insert("Test/Fixed".to_owned(), vec![fixed]);

        Encoder::new(Scope::Extended).encode(&mut result)?;

        let encoded_rule = result.policies_map["US"][0].encoded.clone();
        assert_eq!(
            encoded_rule,
            Some(EncodedRule {
                from_year_tiny: 7,
                to_year_tiny: 126,
                at_time_code: 8,
                at_time_minute: 1,
                at_time_modifier: 0x11,
                delta_code: 4,
                delta_code_encoded: 8,
                letter_index: -1,
            })
        );

        let encoded_era = result.zones_map["Test/Fixed"][0].encoded.clone();
        assert_eq!(
            encoded_era,
            Some(EncodedEra {
                offset_code: -22,
                offset_minute: 0,
                delta_code: 2,
                delta_code_encoded: 6,
                until_year_tiny: 127,
                until_time_code: 0,
                until_time_minute: 0,
                until_time_modifier: 0,
                format_short: "X%T".to_owned(),
            })
        );

        assert!(result.notable_policies.get("US").map_or(false, |x| x.contains("AT '2:01' not on 15-minute boundary")));
        assert!(!result.notable_zones.contains("Test/Fixed"));
        Ok(())
    }

    #[test]
    fn test_encode_missing_field() {
        let mut result = TransformerResult::default();
        let mut era = era(0, MAX_UNTIL_YEAR);
        era.offset_seconds_truncated = None;
        result.zones_map.insert("Test/Zone".to_owned(), vec![era]);

        assert_eq!(
            Encoder::new(Scope::Basic).encode(&mut result),
            Err(EncodeError::MissingField { name: "Test/Zone".to_owned(), field: "offset_seconds_truncated" })
        );
    }
}

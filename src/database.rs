//! Compiled database and identifiers of zones and links.

use crate::config::{CompilerConfig, Scope};
use crate::encode::LettersPerPolicy;
use crate::error::CompileError;
use crate::estimator::BufSizeInfo;
use crate::records::{CommentsMap, LinksMap, PoliciesMap, ZonesMap};
use crate::transform::TransformerResult;

use indexmap::IndexMap;
use serde::Serialize;

use std::collections::{BTreeMap, BTreeSet};

/// Compute the djb2 hash of a name, over its characters
pub fn hash_name(name: &str) -> u32 {
    name.chars().fold(5381u32, |hash, c| hash.wrapping_mul(33).wrapping_add(c as u32))
}

/// Convert a name into a valid identifier, with `+` becoming `_PLUS_` and other invalid characters becoming `_`
pub fn normalize_name(name: &str) -> String {
    name.replace('+', "_PLUS_").chars().map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' }).collect()
}

/// Convert a TZ database version to the `YYNN` form, e.g. `2020a` becomes `2001`
pub fn tz_version_number(tz_version: &str) -> Result<u32, CompileError> {
    let invalid = || CompileError::InvalidTzVersion(tz_version.to_owned());

    let (year, patch) = match tz_version.as_bytes() {
        [y0, y1, y2, y3, patch @ b'a'..=b'z'] if [y0, y1, y2, y3].iter().all(|x| x.is_ascii_digit()) => (&tz_version[..4], *patch),
        _ => return Err(invalid()),
    };

    let year: u32 = year.parse().map_err(|_| invalid())?;
    if year < 2000 {
        return Err(invalid());
    }

    Ok((year - 2000) * 100 + (patch - b'a' + 1) as u32)
}

/// Index sorted strings
fn index_sorted<'a>(strings: impl IntoIterator<Item = &'a str>) -> IndexMap<String, usize> {
    let sorted: BTreeSet<_> = strings.into_iter().collect();
    sorted.into_iter().enumerate().map(|(index, s)| (s.to_owned(), index)).collect()
}

/// Compiled TZ database, rendered as JSON by the compiler
#[derive(Debug, Clone, Serialize)]
pub struct ZoneInfoDatabase {
    /// TZ database version, e.g. `2020a`
    pub tz_version: String,
    /// TZ database version in the `YYNN` form
    pub tz_version_number: u32,
    /// Names of the TZ database files read by the extractor
    pub tz_files: Vec<String>,
    /// Target scope
    pub scope: Scope,
    /// Keep only the years on or after this year
    pub start_year: i32,
    /// Keep only the years before this year
    pub until_year: i32,
    /// Truncation of UNTIL and AT times, in seconds
    pub until_at_granularity: i32,
    /// Truncation of STDOFF, in seconds
    pub offset_granularity: i32,
    /// Truncation of SAVE and RULES offsets, in seconds
    pub delta_granularity: i32,
    /// Strict mode of the transformer
    pub strict: bool,
    /// Number of zones
    pub num_zones: usize,

    /// Zone name to its eras
    pub zones_map: ZonesMap,
    /// Policy name to its rules
    pub policies_map: PoliciesMap,
    /// Link name to its target zone
    pub links_map: LinksMap,

    /// Reasons of the removed zones
    pub removed_zones: CommentsMap,
    /// Reasons of the removed links
    pub removed_links: CommentsMap,
    /// Reasons of the removed policies
    pub removed_policies: CommentsMap,
    /// Notes on the kept zones
    pub notable_zones: CommentsMap,
    /// Notes on the kept links
    pub notable_links: CommentsMap,
    /// Notes on the kept policies
    pub notable_policies: CommentsMap,

    /// Zone name to its transition buffer size
    pub buf_sizes: BTreeMap<String, usize>,
    /// Largest transition buffer size
    pub max_buf_size: usize,

    /// Zone name to its hash
    pub zone_ids: BTreeMap<String, u32>,
    /// Link name to its hash
    pub link_ids: BTreeMap<String, u32>,
    /// Policy name to the index of each of its multi-character letters
    pub letters_per_policy: LettersPerPolicy,
    /// Index of every multi-character letter
    pub letters_map: IndexMap<String, usize>,
    /// Index of every short format
    pub formats_map: IndexMap<String, usize>,
}

impl ZoneInfoDatabase {
    /// Assemble the database from the results of the compiler stages
    pub fn new(
        tz_version: &str,
        tz_files: Vec<String>,
        config: &CompilerConfig,
        result: TransformerResult,
        letters_per_policy: LettersPerPolicy,
        buf_size_info: BufSizeInfo,
    ) -> Result<Self, CompileError> {
        let zone_ids = result.zones_map.keys().map(|name| (name.clone(), hash_name(name))).collect();
        let link_ids = result.links_map.keys().map(|name| (name.clone(), hash_name(name))).collect();

        let letters_map = index_sorted(letters_per_policy.values().flat_map(|letters| letters.keys().map(String::as_str)));

        let formats_map = index_sorted(
            result.zones_map.values().flatten().filter_map(|era| era.encoded.as_ref()).map(|encoded| encoded.format_short.as_str()),
        );

        Ok(Self {
            tz_version: tz_version.to_owned(),
            tz_version_number: tz_version_number(tz_version)?,
            tz_files,
            scope: config.scope,
            start_year: config.start_year,
            until_year: config.until_year,
            until_at_granularity: config.until_at_granularity,
            offset_granularity: config.offset_granularity,
            delta_granularity: config.delta_granularity,
            strict: config.strict,
            num_zones: result.zones_map.len(),
            zones_map: result.zones_map,
            policies_map: result.policies_map,
            links_map: result.links_map,
            removed_zones: result.removed_zones,
            removed_links: result.removed_links,
            removed_policies: result.removed_policies,
            notable_zones: result.notable_zones,
            notable_links: result.notable_links,
            notable_policies: result.notable_policies,
            buf_sizes: buf_size_info.buf_sizes,
            max_buf_size: buf_size_info.max_buf_size,
            zone_ids,
            link_ids,
            letters_per_policy,
            letters_map,
            formats_map,
        })
    }

    /// Sorted list of zone and link names
    pub fn zone_list(&self) -> Vec<&str> {
        let names: BTreeSet<_> = self.zones_map.keys().chain(self.links_map.keys()).map(String::as_str).collect();
        names.into_iter().collect()
    }
}

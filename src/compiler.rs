//! Compiler pipeline, from the TZ database files to the [`ZoneInfoDatabase`].

use crate::config::CompilerConfig;
use crate::constants::MAX_TRANSITIONS;
use crate::database::ZoneInfoDatabase;
use crate::encode::Encoder;
use crate::error::CompileError;
use crate::estimator;
use crate::parse::{Extractor, ExtractorResult, ZONE_FILES};
use crate::transform::Transformer;
use crate::zone_info::build_zone_infos;
use crate::Result;

use tracing::{info, warn};

use std::path::Path;

/// Compile the TZ database files of a directory
pub fn compile(input_dir: &Path, tz_version: &str, config: &CompilerConfig) -> Result<ZoneInfoDatabase> {
    let mut extractor = Extractor::new();
    extractor.read_dir(input_dir)?;

    let tz_files = ZONE_FILES.iter().map(|file_name| file_name.to_string()).collect();
    compile_extracted(extractor.extract(), tz_version, tz_files, config)
}

/// Compile the content of TZ database files
pub fn compile_str(text: &str, tz_version: &str, config: &CompilerConfig) -> Result<ZoneInfoDatabase> {
    let mut extractor = Extractor::new();
    extractor.read_str(text);
    compile_extracted(extractor.extract(), tz_version, Vec::new(), config)
}

fn compile_extracted(extracted: ExtractorResult, tz_version: &str, tz_files: Vec<String>, config: &CompilerConfig) -> Result<ZoneInfoDatabase> {
    config.validate()?;
    extracted.log_summary();

    let counts = extracted.counts;
    if extracted.invalid_line_count() > 0 {
        return Err(CompileError::InvalidLines { rules: counts.invalid_rule_lines, zones: counts.invalid_zone_lines, links: counts.invalid_link_lines }.into());
    }

    info!("======== Transforming zones and rules");
    let mut result = Transformer::new(extracted, *config).transform()?;

    info!("======== Encoding zones and rules for scope '{}'", config.scope);
    let letters_per_policy = Encoder::new(config.scope).encode(&mut result)?;

    info!("======== Estimating transition buffer sizes");
    let zone_infos = build_zone_infos(&result.zones_map, &result.policies_map)?;
    let buf_size_info = estimator::estimate(&zone_infos, config.start_year, config.until_year)?;

    if buf_size_info.max_buf_size > MAX_TRANSITIONS {
        let error = CompileError::BufSizeTooLarge { max_buf_size: buf_size_info.max_buf_size, capacity: MAX_TRANSITIONS };
        if !config.ignore_buf_size_too_large {
            return Err(error.into());
        }
        warn!("{error}, ignored");
    }

    Ok(ZoneInfoDatabase::new(tz_version, tz_files, config, result, letters_per_policy, buf_size_info)?)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::database::hash_name;
    use crate::error::{Error, TzError};
    use crate::processor::test::DATA;
    use crate::records::CommentsMap;

    #[test]
    fn test_compile_str() -> Result<()> {
        let data = format!("{DATA}Link America/Los_Angeles US/Pacific\n");
        let database = compile_str(&data, "2020a", &CompilerConfig::default())?;

        assert_eq!(database.tz_version_number, 2001);
        assert_eq!(database.num_zones, 3);
        assert_eq!(database.max_buf_size, 6);
        assert_eq!(database.buf_sizes["America/Los_Angeles"], 6);
        assert_eq!(database.zone_ids["America/Los_Angeles"], 0xb7f7_e8f2);
        assert_eq!(database.link_ids["US/Pacific"], hash_name("US/Pacific"));
        assert!(database.letters_map.is_empty());

        let formats: Vec<_> = database.formats_map.iter().map(|(format, index)| (format.as_str(), *index)).collect();
        assert_eq!(formats, [("EST", 0), ("P%T", 1), ("PK%T", 2)]);

        assert_eq!(database.zone_list(), ["America/Los_Angeles", "Asia/Karachi", "Test/Fixed", "US/Pacific"]);

        let json = serde_json::to_value(&database).map_err(|error| CompileError::InvalidConfig(error.to_string()))?;
        assert_eq!(json["scope"], "extended");
        assert_eq!(json["zones_map"]["Test/Fixed"][0]["offsetSeconds"], -18000);
        Ok(())
    }

    #[test]
    fn test_multi_character_letters() -> Result<()> {
        let data = "\
Rule    Zion    2000    max     -   Mar     lastSun 2:00    1:00    IDT
Rule    Zion    2000    max     -   Oct     lastSun 2:00    0       IST
Zone    Asia/Test   2:00    Zion    %s
";
        let database = compile_str(data, "2020a", &CompilerConfig::default())?;

        assert_eq!(database.letters_per_policy["Zion"]["IDT"], 0);
        assert_eq!(database.letters_per_policy["Zion"]["IST"], 1);
        assert_eq!(database.letters_map.get("IST"), Some(&1));
        assert!(database.notable_policies.contains("Zion"));
        Ok(())
    }

    #[test]
    fn test_invalid_day_expressions() -> Result<()> {
        let data = format!(
            "{DATA}\
Rule    Bad     2000    max     -   Mar     lastFoo 2:00    1:00    D
Zone    Test/Bad    1:00    Bad     B%sT
Zone    Test/Until  1:00    -       XT      2001 Mar lastFoo
\t\t\t2:00\t-\tYT
"
        );
        let database = compile_str(&data, "2020a", &CompilerConfig::default())?;

        let has_reason = |comments: &CommentsMap, name: &str, reason: &str| comments.get(name).map_or(false, |reasons| reasons.contains(reason));

        assert!(has_reason(&database.removed_policies, "Bad", "invalid on_day 'lastFoo'"));
        assert!(has_reason(&database.removed_zones, "Test/Bad", "policy 'Bad' not found"));
        assert!(has_reason(&database.removed_zones, "Test/Until", "invalid until_day 'lastFoo'"));
        assert_eq!(database.zone_list(), ["America/Los_Angeles", "Asia/Karachi", "Test/Fixed"]);
        Ok(())
    }

    #[test]
    fn test_invalid_lines() {
        let data = format!("{DATA}Link America/Los_Angeles\n");
        let result = compile_str(&data, "2020a", &CompilerConfig::default());
        assert!(matches!(result, Err(Error::Tz(TzError::Compile(CompileError::InvalidLines { rules: 0, zones: 0, links: 1 })))));
    }

    #[test]
    fn test_invalid_tz_version() {
        let result = compile_str(DATA, "latest", &CompilerConfig::default());
        assert!(matches!(result, Err(Error::Tz(TzError::Compile(CompileError::InvalidTzVersion(_))))));
    }
}

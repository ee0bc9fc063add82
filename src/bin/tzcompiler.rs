//! Command-line compiler of the TZ database.
//!
//! Reads the TZ database files of `--input-dir` and writes the selected artifacts into `--output-dir`:
//! * `tzdb`: the compiled database as `tzdb.json`
//! * `zonelist`: the sorted zone and link names as `zones.txt`

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tzdb::{compile, CompilerConfig, Scope};

use std::fs;
use std::path::{Path, PathBuf};

/// Artifact written by the compiler
#[derive(Debug, Copy, Clone, Eq, PartialEq, clap::ValueEnum)]
enum Action {
    /// Compiled database as JSON
    Tzdb,
    /// Sorted zone and link names
    Zonelist,
}

/// Compile the IANA TZ database
#[derive(Debug, Parser)]
#[command(name = "tzcompiler", version, about, long_about = None)]
struct Cli {
    /// Directory of the TZ database files
    #[arg(long)]
    input_dir: PathBuf,

    /// Directory of the generated files
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// TZ database version, e.g. 2020a
    #[arg(long)]
    tz_version: String,

    /// Artifacts to generate
    #[arg(long, value_enum, value_delimiter = ',', default_value = "tzdb")]
    action: Vec<Action>,

    /// JSON configuration file, overridden by the other flags
    #[arg(long)]
    config: Option<PathBuf>,

    /// Target scope: basic or extended
    #[arg(long)]
    scope: Option<Scope>,

    /// Keep only the years on or after this year [default: 2000]
    #[arg(long)]
    start_year: Option<i32>,

    /// Keep only the years before this year [default: 2038]
    #[arg(long)]
    until_year: Option<i32>,

    /// Truncation of UNTIL and AT times, in seconds
    #[arg(long)]
    until_at_granularity: Option<i32>,

    /// Truncation of STDOFF, in seconds
    #[arg(long)]
    offset_granularity: Option<i32>,

    /// Truncation of SAVE and RULES offsets, in seconds
    #[arg(long)]
    delta_granularity: Option<i32>,

    /// Remove zones and policies not aligned on the granularities instead of truncating them
    #[arg(long)]
    strict: bool,

    /// Only warn when the estimated transition buffer is too large
    #[arg(long)]
    ignore_buf_size_too_large: bool,
}

impl Cli {
    /// Configuration of the JSON file or of the scope, with the flags applied
    fn compiler_config(&self) -> Result<CompilerConfig> {
        let mut config = match &self.config {
            Some(path) => CompilerConfig::from_json_file(path)?,
            None => CompilerConfig::new(self.scope.unwrap_or(Scope::Extended)),
        };

        if let Some(scope) = self.scope {
            if scope != config.scope {
                config.offset_granularity = scope.default_offset_granularity();
            }
            config.scope = scope;
        }

        let overrides = [
            (&mut config.start_year, self.start_year),
            (&mut config.until_year, self.until_year),
            (&mut config.until_at_granularity, self.until_at_granularity),
            (&mut config.offset_granularity, self.offset_granularity),
            (&mut config.delta_granularity, self.delta_granularity),
        ];

        for (field, value) in overrides {
            if let Some(value) = value {
                *field = value;
            }
        }

        config.strict |= self.strict;
        config.ignore_buf_size_too_large |= self.ignore_buf_size_too_large;

        config.validate()?;
        Ok(config)
    }
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content).with_context(|| format!("unable to write {}", path.display()))?;
    info!("Created {}", path.display());
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = cli.compiler_config()?;

    let database = compile(&cli.input_dir, &cli.tz_version, &config)?;

    fs::create_dir_all(&cli.output_dir).with_context(|| format!("unable to create {}", cli.output_dir.display()))?;

    if cli.action.contains(&Action::Tzdb) {
        let json = serde_json::to_string_pretty(&database)?;
        write_file(&cli.output_dir.join("tzdb.json"), &json)?;
    }

    if cli.action.contains(&Action::Zonelist) {
        let mut zone_list = database.zone_list().join("\n");
        zone_list.push('\n');
        write_file(&cli.output_dir.join("zones.txt"), &zone_list)?;
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_compiler_config() -> Result<()> {
        let cli = Cli::parse_from(["tzcompiler", "--input-dir", "tzfiles", "--tz-version", "2020a", "--scope", "basic", "--until-year", "2050", "--strict"]);
        let config = cli.compiler_config()?;

        assert_eq!(config.scope, Scope::Basic);
        assert_eq!(config.offset_granularity, 900);
        assert_eq!(config.start_year, 2000);
        assert_eq!(config.until_year, 2050);
        assert!(config.strict);
        assert!(!config.ignore_buf_size_too_large);
        assert_eq!(cli.action, [Action::Tzdb]);
        Ok(())
    }

    #[test]
    fn test_actions() {
        let cli = Cli::parse_from(["tzcompiler", "--input-dir", "tzfiles", "--tz-version", "2020a", "--action", "tzdb,zonelist"]);
        assert_eq!(cli.action, [Action::Tzdb, Action::Zonelist]);
    }

    #[test]
    fn test_invalid_years() {
        let cli = Cli::parse_from(["tzcompiler", "--input-dir", "tzfiles", "--tz-version", "2020a", "--start-year", "2040"]);
        assert!(cli.compiler_config().is_err());
    }
}

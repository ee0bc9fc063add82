#![forbid(unsafe_code)]
#![deny(missing_docs)]

//! This crate compiles the [IANA TZ database](https://www.iana.org/time-zones) into a validated and normalized zone model,
//! and provides a zone processor resolving the UTC offset, the DST offset and the abbreviation of a zone for any instant or local date time.
//!
//! The compiler is made of several stages:
//! * The [`Extractor`] groups the `Rule`, `Zone` and `Link` lines of the TZ database files into raw records.
//! * The [`Transformer`] validates, truncates and cross-references the raw records, removing the unsupported zones and policies with a reason.
//! * The [`Encoder`] fills the compact encodings used by 8-bit and 32-bit targets.
//! * The [`estimator`] predicts the transition buffer size needed by each zone.
//!
//! The result is an immutable [`ZoneInfoDatabase`], which can be rendered as JSON.
//!
//! # Usage
//!
//! ```rust
//! # fn main() -> Result<(), tzdb::Error> {
//!     use tzdb::{compile_str, build_zone_infos, CompilerConfig, ViewingMonths, ZoneProcessor};
//!
//!     let data = "\
//! Rule    US      2007    max     -   Mar     Sun>=8  2:00    1:00    D
//! Rule    US      2007    max     -   Nov     Sun>=1  2:00    0       S
//! Zone    America/New_York    -5:00   US  E%sT
//! ";
//!
//!     let database = compile_str(data, "2020a", &CompilerConfig::default())?;
//!     assert_eq!(database.zone_list(), ["America/New_York"]);
//!
//!     let zone_infos = build_zone_infos(&database.zones_map, &database.policies_map)?;
//!     let mut processor = ZoneProcessor::new(&zone_infos["America/New_York"], ViewingMonths::default());
//!
//!     // 2020-07-01T00:00:00Z
//!     let transition = processor.for_unix_seconds(1_593_561_600)?;
//!     assert_eq!(transition.map(|x| x.abbrev.as_str()), Some("EDT"));
//!     assert_eq!(transition.map(|x| x.total_offset()), Some(-4 * 3600));
//! # Ok(())
//! # }
//! ```

pub mod compiler;
pub mod config;
pub mod constants;
pub mod database;
pub mod datetime;
pub mod encode;
pub mod error;
pub mod estimator;
pub mod parse;
pub mod processor;
pub mod records;
pub mod transform;
pub mod zone_info;

pub use compiler::{compile, compile_str};
pub use config::{CompilerConfig, Scope};
pub use database::ZoneInfoDatabase;
pub use datetime::{ClockTime, DateTuple, Suffix};
pub use encode::Encoder;
pub use error::{Error, TzError};
pub use estimator::BufSizeInfo;
pub use parse::{Extractor, ExtractorResult};
pub use processor::{FoundLocalDateTime, Transition, ViewingMonths, ZoneProcessor};
pub use transform::{Transformer, TransformerResult};
pub use zone_info::{build_zone_infos, ZoneInfo, ZoneInfoMap};

/// Alias for [`std::result::Result`] with the crate unified error as default error
pub type Result<T, E = Error> = std::result::Result<T, E>;

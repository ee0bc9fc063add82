//! Estimation of the transition buffer size needed by each zone.

use crate::error::ZoneProcessorError;
use crate::processor::{ViewingMonths, ZoneProcessor};
use crate::zone_info::{ZoneInfo, ZoneInfoMap};

use serde::Serialize;
use tracing::info;

use std::collections::BTreeMap;

/// Zone needing one more buffer slot than estimated.
///
/// The zone processor finds a buffer of 4 transitions for this zone,
/// but a fixed capacity transition storage was measured to need 6 slots.
pub const ATYRAU_ZONE_NAME: &str = "Asia/Atyrau";

/// Extra buffer slots of [`ATYRAU_ZONE_NAME`]
pub const ATYRAU_EXTRA_BUF_SIZE: usize = 1;

/// Estimated transition buffer sizes
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize)]
pub struct BufSizeInfo {
    /// Zone name to its buffer size, sorted by name
    pub buf_sizes: BTreeMap<String, usize>,
    /// Largest buffer size of all zones
    pub max_buf_size: usize,
}

/// Buffer size of a zone over `[start_year, until_year)`.
///
/// The buffer needs one free slot in addition to the largest number of transitions held at once.
fn estimate_zone(zone_info: &ZoneInfo, start_year: i32, until_year: i32) -> Result<(String, usize), ZoneProcessorError> {
    let mut processor = ZoneProcessor::new(zone_info, ViewingMonths::default());
    let info = processor.get_buffer_sizes(start_year, until_year)?;

    let mut buf_size = info.max_buffer_size.0 + 1;
    if zone_info.name == ATYRAU_ZONE_NAME {
        buf_size += ATYRAU_EXTRA_BUF_SIZE;
    }

    Ok((zone_info.name.clone(), buf_size))
}

/// Estimate the transition buffer size of each zone over `[start_year, until_year)`
pub fn estimate(zone_infos: &ZoneInfoMap, start_year: i32, until_year: i32) -> Result<BufSizeInfo, ZoneProcessorError> {
    let zone_infos: Vec<&ZoneInfo> = zone_infos.values().collect();

    #[cfg(feature = "parallel")]
    let buf_sizes: BTreeMap<String, usize> = {
        use rayon::prelude::*;
        zone_infos.par_iter().map(|zone_info| estimate_zone(zone_info, start_year, until_year)).collect::<Result<_, _>>()?
    };

    #[cfg(not(feature = "parallel"))]
    let buf_sizes: BTreeMap<String, usize> = zone_infos.iter().map(|zone_info| estimate_zone(zone_info, start_year, until_year)).collect::<Result<_, _>>()?;

    let max_buf_size = buf_sizes.values().copied().max().unwrap_or_default();

    info!("Estimated buffer sizes of {} zones: max_buf_size={}", buf_sizes.len(), max_buf_size);
    Ok(BufSizeInfo { buf_sizes, max_buf_size })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::Error;
    use crate::processor::test::zone_infos;

    #[test]
    fn test_estimate() -> Result<(), Error> {
        let mut zone_infos = zone_infos()?;

        let mut atyrau = zone_infos["Test/Fixed"].clone();
        atyrau.name = ATYRAU_ZONE_NAME.to_owned();
        zone_infos.insert(atyrau.name.clone(), atyrau);

        let info = estimate(&zone_infos, 2000, 2038)?;

        let buf_sizes: Vec<_> = info.buf_sizes.iter().map(|(name, size)| (name.as_str(), *size)).collect();
        assert_eq!(buf_sizes, [("America/Los_Angeles", 6), ("Asia/Atyrau", 3), ("Asia/Karachi", 5), ("Test/Fixed", 2)]);
        assert_eq!(info.max_buf_size, 6);
        Ok(())
    }

    #[test]
    fn test_estimate_empty() -> Result<(), ZoneProcessorError> {
        assert_eq!(estimate(&ZoneInfoMap::new(), 2000, 2038)?, BufSizeInfo::default());
        Ok(())
    }
}

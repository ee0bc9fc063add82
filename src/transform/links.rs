//! Passes over the names of the zones and the links.

use super::Transformer;
use crate::database::{hash_name, normalize_name};
use crate::error::transform::EntityKind;
use crate::error::TransformError;
use crate::records::{CommentsMap, LinksMap, ZonesMap};

use tracing::info;

use std::collections::{HashMap, HashSet};

/// Check that the djb2 hashes of all zone and link names are unique
pub(super) fn detect_hash_collisions(zones_map: &ZonesMap, links_map: &LinksMap) -> Result<(), TransformError> {
    let mut hashes: HashMap<u32, &str> = HashMap::new();

    let names = zones_map.keys().map(|name| (EntityKind::Zone, name)).chain(links_map.keys().map(|name| (EntityKind::Link, name)));

    for (kind, name) in names {
        if let Some(existing) = hashes.insert(hash_name(name), name) {
            return Err(TransformError::HashCollision { kind, name: name.clone(), existing: existing.to_owned() });
        }
    }

    info!("Detected no hash collisions");
    Ok(())
}

impl Transformer {
    pub(super) fn remove_links_to_missing_zones(&mut self, links_map: LinksMap, zones_map: &ZonesMap) -> LinksMap {
        let mut removed = CommentsMap::new();

        let results = links_map
            .into_iter()
            .filter(|(link_name, zone_name)| {
                let found = zones_map.contains_key(zone_name);
                if !found {
                    removed.add(link_name, format!("Target Zone \"{zone_name}\" missing"));
                }
                found
            })
            .collect();

        CommentsMap::log_pass(&removed, "links with missing zones", None);
        self.removed_links.merge(&removed);
        results
    }

    /// Remove the zones, then the links, whose normalized name is already used by a previous entry
    pub(super) fn remove_zones_and_links_with_similar_names(&mut self, zones_map: ZonesMap, links_map: LinksMap) -> (ZonesMap, LinksMap) {
        let mut normalized_names = HashSet::new();
        let mut removed_zones = CommentsMap::new();
        let mut removed_links = CommentsMap::new();

        let zones_map: ZonesMap = zones_map
            .into_iter()
            .filter(|(name, _)| {
                let unique = normalized_names.insert(normalize_name(name));
                if !unique {
                    removed_zones.add(name, "Duplicate normalized name");
                }
                unique
            })
            .collect();

        let links_map: LinksMap = links_map
            .into_iter()
            .filter(|(name, _)| {
                let unique = normalized_names.insert(normalize_name(name));
                if !unique {
                    removed_links.add(name, "Duplicate normalized name");
                }
                unique
            })
            .collect();

        info!("Removed {} Zones and {} Links with duplicate names", removed_zones.len(), removed_links.len());
        self.removed_zones.merge(&removed_zones);
        self.removed_links.merge(&removed_links);
        (zones_map, links_map)
    }
}

//! Diagnostic comments attached to zones, policies and links.

use serde::Serialize;
use tracing::info;

use std::collections::{BTreeMap, BTreeSet};

/// Map of zone, policy or link name to the sorted reasons why it was removed or is notable
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CommentsMap(BTreeMap<String, BTreeSet<String>>);

impl CommentsMap {
    /// Construct an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a reason for a name
    pub fn add(&mut self, name: &str, reason: impl Into<String>) {
        self.0.entry(name.to_owned()).or_default().insert(reason.into());
    }

    /// Merge all reasons of another map
    pub fn merge(&mut self, other: &CommentsMap) {
        for (name, reasons) in &other.0 {
            self.0.entry(name.clone()).or_default().extend(reasons.iter().cloned());
        }
    }

    /// Reasons for a name
    pub fn get(&self, name: &str) -> Option<&BTreeSet<String>> {
        self.0.get(name)
    }

    /// Check if a name has comments
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Number of names
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the map is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the names and their reasons, sorted by name
    pub fn iter(&self) -> impl Iterator<Item = (&String, &BTreeSet<String>)> {
        self.0.iter()
    }

    /// Log the removed entries of a pass, and its notable entries if any.
    ///
    /// At most [`MAX_LOGGED_COMMENTS`] removed entries are logged, taken from both ends of the map.
    pub fn log_pass(removed: &CommentsMap, explanation: &str, notable: Option<&CommentsMap>) {
        info!("Removed {} {}", removed.len(), explanation);

        let count = removed.len();
        if count <= MAX_LOGGED_COMMENTS {
            for (name, reasons) in removed.iter() {
                info!("- {} ({:?})", name, reasons);
            }
        } else {
            let limit = (MAX_LOGGED_COMMENTS - 1) / 2;
            let mut ellipsis_logged = false;
            for (index, (name, reasons)) in removed.iter().enumerate() {
                if index < limit || index >= count - limit {
                    info!("- {} ({:?})", name, reasons);
                } else if !ellipsis_logged {
                    info!("- [...]");
                    ellipsis_logged = true;
                }
            }
        }

        if let Some(notable) = notable.filter(|notable| !notable.is_empty()) {
            info!("Noted {} {}", notable.len(), explanation);
            for (name, reasons) in notable.iter() {
                info!("- {} ({:?})", name, reasons);
            }
        }
    }
}

/// Maximum number of removed entries logged by a pass
pub const MAX_LOGGED_COMMENTS: usize = 5;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_comments_map() {
        let mut comments = CommentsMap::new();
        comments.add("b", "second");
        comments.add("b", "first");
        comments.add("a", "only");
        comments.add("b", "first");

        assert_eq!(comments.len(), 2);
        assert_eq!(comments.get("b").map(|x| x.iter().cloned().collect::<Vec<_>>()), Some(vec!["first".to_owned(), "second".to_owned()]));

        let mut merged = CommentsMap::new();
        merged.add("a", "other");
        merged.merge(&comments);
        assert_eq!(merged.get("a").map(BTreeSet::len), Some(2));
        assert!(merged.contains("b"));
        assert!(!merged.contains("c"));

        let names: Vec<_> = merged.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn test_comments_map_serialize() -> Result<(), serde_json::Error> {
        let mut comments = CommentsMap::new();
        comments.add("Zone/B", "y");
        comments.add("Zone/B", "x");
        comments.add("Zone/A", "z");
        assert_eq!(serde_json::to_string(&comments)?, r#"{"Zone/A":["z"],"Zone/B":["x","y"]}"#);
        Ok(())
    }
}

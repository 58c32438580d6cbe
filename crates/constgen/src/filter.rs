//! Prefix filtering and deduplication of parsed definitions

use crate::config::PrefixAllowlist;
use crate::record::{ConstantRecord, ConstantSet};
use log::{debug, info};

/// Statistics about filtering
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FilterStats {
    pub kept: usize,
    pub ignored: usize,
    pub superseded: usize,
}

/// Keeps definitions from the allowed namespace, last definition wins
pub struct PrefixFilter {
    allowlist: PrefixAllowlist,
    stats: FilterStats,
}

impl Default for PrefixFilter {
    fn default() -> Self {
        Self::new(PrefixAllowlist::default())
    }
}

impl PrefixFilter {
    pub fn new(allowlist: PrefixAllowlist) -> Self {
        Self {
            allowlist,
            stats: FilterStats::default(),
        }
    }

    pub fn stats(&self) -> &FilterStats {
        &self.stats
    }

    /// Filter records in order.
    ///
    /// A record whose name was already seen replaces the earlier one and
    /// moves to the end. Records outside the allowlist are dropped; that is
    /// informational, never an error.
    pub fn filter(&mut self, records: impl IntoIterator<Item = ConstantRecord>) -> ConstantSet {
        let mut set = ConstantSet::new();

        for record in records {
            if !self.allowlist.allows(&record.name) {
                info!("Symbol ignored due to unmatched prefix: {}", record.name);
                self.stats.ignored += 1;
                continue;
            }

            if let Some(previous) = set.insert(record) {
                debug!(
                    "{} redefined, dropping definition from {}:{}",
                    previous.name, previous.source_file, previous.source_line
                );
                self.stats.superseded += 1;
            }
        }

        self.stats.kept += set.len();
        set
    }
}

/// Filter with the given allowlist, discarding statistics.
pub fn filter(
    records: impl IntoIterator<Item = ConstantRecord>,
    allowlist: &PrefixAllowlist,
) -> ConstantSet {
    PrefixFilter::new(allowlist.clone()).filter(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(set: &ConstantSet) -> Vec<&str> {
        set.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn test_duplicate_name_last_wins() {
        let records = vec![ConstantRecord::new("CKA_X", "1"), ConstantRecord::new("CKA_X", "2")];
        let set = filter(records, &PrefixAllowlist::default());

        assert_eq!(set.len(), 1);
        assert_eq!(set.get("CKA_X").unwrap().raw_value(), "2");
    }

    #[test]
    fn test_unknown_prefix_dropped_without_error() {
        let mut filter = PrefixFilter::default();
        let set = filter.filter(vec![
            ConstantRecord::new("FOO_BAR", "1"),
            ConstantRecord::new("CKA_CLASS", "0x00000000UL"),
        ]);

        assert_eq!(names(&set), vec!["CKA_CLASS"]);
        assert_eq!(filter.stats().ignored, 1);
        assert_eq!(filter.stats().kept, 1);
    }

    #[test]
    fn test_redefinition_moves_to_end() {
        let mut filter = PrefixFilter::default();
        let set = filter.filter(vec![
            ConstantRecord::new("CKA_A", "1"),
            ConstantRecord::new("CKA_B", "2"),
            ConstantRecord::new("CKA_A", "3"),
            ConstantRecord::new("CKA_C", "4"),
        ]);

        assert_eq!(names(&set), vec!["CKA_B", "CKA_A", "CKA_C"]);
        assert_eq!(set.get("CKA_A").unwrap().raw_value(), "3");
        assert_eq!(filter.stats().superseded, 1);
    }
}

//! NFP cache (component C).
//!
//! A flat `NfpKey -> NfpValue` map shared read-only across a generation's
//! worth of placement evaluations. Entries are computed once per distinct
//! `(a_id, b_id, inside, rotation)` combination and reused by every
//! individual in the population that needs that pair (spec §4.4).

use std::collections::HashMap;

use crate::nfp::{NfpKey, NfpValue};

/// Thread-safe map from [`NfpKey`] to its computed contours. Populated by
/// the coordinator's parallel NFP pass before each generation's placement
/// evaluation, then handed out read-only to the placement workers.
#[derive(Debug, Default)]
pub struct NfpCache {
    entries: HashMap<NfpKey, NfpValue>,
}

impl NfpCache {
    pub fn new() -> Self {
        NfpCache { entries: HashMap::new() }
    }

    pub fn get(&self, key: &NfpKey) -> Option<&NfpValue> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &NfpKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn insert(&mut self, key: NfpKey, value: NfpValue) {
        self.entries.insert(key, value);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Merges another cache's entries in, used after a parallel NFP pass
    /// returns per-worker partial caches back to the coordinator.
    pub fn merge(&mut self, other: NfpCache) {
        self.entries.extend(other.entries);
    }

    /// Drops every entry referencing a part id not in `live_ids` (`-1`,
    /// the bin, is always live). Called when the part set changes between
    /// runs so stale NFPs for removed parts don't linger (spec §4.4
    /// "cache lifetime").
    pub fn prune_unused(&mut self, live_ids: &[i64]) {
        self.entries.retain(|key, _| {
            (key.a_id == -1 || live_ids.contains(&key.a_id)) && (key.b_id == -1 || live_ids.contains(&key.b_id))
        });
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    fn dummy_nfp() -> NfpValue {
        vec![vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0), Point::new(1.0, 1.0)]]
    }

    #[test]
    fn insert_and_get_round_trips() {
        let mut cache = NfpCache::new();
        let key = NfpKey::new(-1, 0, true, 0.0, 0.0);
        cache.insert(key, dummy_nfp());
        assert!(cache.get(&key).is_some());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn prune_unused_drops_stale_part_ids() {
        let mut cache = NfpCache::new();
        cache.insert(NfpKey::new(-1, 0, true, 0.0, 0.0), dummy_nfp());
        cache.insert(NfpKey::new(0, 1, false, 0.0, 0.0), dummy_nfp());
        cache.insert(NfpKey::new(0, 2, false, 0.0, 0.0), dummy_nfp());

        cache.prune_unused(&[0, 1]);

        assert_eq!(cache.len(), 2);
        assert!(cache.get(&NfpKey::new(0, 2, false, 0.0, 0.0)).is_none());
    }

    #[test]
    fn merge_combines_two_caches() {
        let mut a = NfpCache::new();
        a.insert(NfpKey::new(-1, 0, true, 0.0, 0.0), dummy_nfp());
        let mut b = NfpCache::new();
        b.insert(NfpKey::new(-1, 1, true, 0.0, 0.0), dummy_nfp());
        a.merge(b);
        assert_eq!(a.len(), 2);
    }
}

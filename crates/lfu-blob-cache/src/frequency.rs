//! In-memory access counts used to pick eviction victims

use crate::types::FrequencyRecord;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub(crate) struct FrequencyIndex {
    counts: HashMap<String, u64>,
}

impl FrequencyIndex {
    /// Increment the count for `key`, creating it at 1. Returns the new count.
    pub fn touch(&mut self, key: &str) -> u64 {
        match self.counts.get_mut(key) {
            Some(count) => {
                *count += 1;
                *count
            }
            None => {
                self.counts.insert(key.to_string(), 1);
                1
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<u64> {
        self.counts.get(key).copied()
    }

    pub fn remove(&mut self, key: &str) -> Option<u64> {
        self.counts.remove(key)
    }

    pub fn clear(&mut self) {
        self.counts.clear();
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Keys sharing the lowest access count, sorted.
    ///
    /// Empty when the index is empty or when every key shares the same
    /// count, so a pass with no discriminating signal never wipes the cache.
    pub fn eviction_candidates(&self) -> Vec<String> {
        let Some(min_count) = self.counts.values().min().copied() else {
            return Vec::new();
        };

        let mut victims = self
            .counts
            .iter()
            .filter(|(_, count)| **count == min_count)
            .map(|(key, _)| key.clone())
            .collect::<Vec<_>>();

        if victims.len() == self.counts.len() {
            return Vec::new();
        }

        victims.sort();
        victims
    }

    pub fn records(&self) -> Vec<FrequencyRecord> {
        let mut records = self
            .counts
            .iter()
            .map(|(key, count)| FrequencyRecord {
                key: key.clone(),
                access_count: *count,
            })
            .collect::<Vec<_>>();
        records.sort_by(|a, b| a.key.cmp(&b.key));
        records
    }
}

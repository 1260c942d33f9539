use rustc_hash::FxHashMap;
use serde::Serialize;
use std::collections::btree_map;
use std::collections::hash_map::Entry;
use std::collections::BTreeMap;

use crate::utils::constants::DEFAULT_PARTIAL_CAPACITY;

/// Station name bytes, stored once per distinct station.
pub type StationKey = Box<[u8]>;

/// Running statistics for one station, in tenths of a degree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StationStats {
    pub min: i16,
    pub max: i16,
    pub sum: i64,
    pub count: u64,
}

impl StationStats {
    pub fn new(value: i16) -> Self {
        Self {
            min: value,
            max: value,
            sum: i64::from(value),
            count: 1,
        }
    }

    #[inline]
    pub fn record(&mut self, value: i16) {
        self.min = self.min.min(value);
        self.max = self.max.max(value);
        self.sum += i64::from(value);
        self.count += 1;
    }

    pub fn merge(&mut self, other: &StationStats) {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
        self.sum += other.sum;
        self.count += other.count;
    }
}

/// Per-chunk statistics, owned by the worker that built them.
#[derive(Debug, Clone, Default)]
pub struct PartialResult {
    stations: FxHashMap<StationKey, StationStats>,
}

impl PartialResult {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_PARTIAL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            stations: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
        }
    }

    /// Add one measurement. The station bytes are copied only on first sight.
    #[inline]
    pub fn record(&mut self, station: &[u8], value: i16) {
        match self.stations.get_mut(station) {
            Some(stats) => stats.record(value),
            None => {
                self.stations.insert(station.into(), StationStats::new(value));
            }
        }
    }

    /// Fold `other` into this partial, consuming it.
    pub fn merge(&mut self, other: PartialResult) {
        if self.stations.len() < other.stations.len() {
            let smaller = std::mem::replace(&mut self.stations, other.stations);
            self.absorb(smaller);
        } else {
            self.absorb(other.stations);
        }
    }

    fn absorb(&mut self, stations: FxHashMap<StationKey, StationStats>) {
        for (station, stats) in stations {
            match self.stations.entry(station) {
                Entry::Occupied(mut entry) => entry.get_mut().merge(&stats),
                Entry::Vacant(entry) => {
                    entry.insert(stats);
                }
            }
        }
    }

    pub fn get(&self, station: &[u8]) -> Option<&StationStats> {
        self.stations.get(station)
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    pub fn record_count(&self) -> u64 {
        self.stations.values().map(|s| s.count).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &StationStats)> {
        self.stations.iter().map(|(k, v)| (k.as_ref(), v))
    }
}

impl IntoIterator for PartialResult {
    type Item = (StationKey, StationStats);
    type IntoIter = std::collections::hash_map::IntoIter<StationKey, StationStats>;

    fn into_iter(self) -> Self::IntoIter {
        self.stations.into_iter()
    }
}

/// Merged statistics for the whole input, ordered by station bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FinalResult {
    stations: BTreeMap<StationKey, StationStats>,
}

impl FinalResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn absorb(&mut self, partial: PartialResult) {
        for (station, stats) in partial {
            match self.stations.entry(station) {
                btree_map::Entry::Occupied(mut entry) => entry.get_mut().merge(&stats),
                btree_map::Entry::Vacant(entry) => {
                    entry.insert(stats);
                }
            }
        }
    }

    pub fn get(&self, station: &[u8]) -> Option<&StationStats> {
        self.stations.get(station)
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    pub fn record_count(&self) -> u64 {
        self.stations.values().map(|s| s.count).sum()
    }

    /// Stations in ascending byte order
    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &StationStats)> {
        self.stations.iter().map(|(k, v)| (k.as_ref(), v))
    }
}

impl From<PartialResult> for FinalResult {
    fn from(partial: PartialResult) -> Self {
        let mut result = FinalResult::new();
        result.absorb(partial);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_station_stats_record() {
        let mut stats = StationStats::new(100);
        stats.record(-50);
        stats.record(200);

        assert_eq!(stats.min, -50);
        assert_eq!(stats.max, 200);
        assert_eq!(stats.sum, 250);
        assert_eq!(stats.count, 3);
    }

    #[test]
    fn test_sum_uses_wide_accumulator() {
        let mut stats = StationStats::new(999);
        for _ in 0..100_000 {
            stats.record(999);
        }

        assert_eq!(stats.sum, 999 * 100_001);
        assert_eq!(stats.count, 100_001);
    }

    #[test]
    fn test_partial_reuses_station_key() {
        let mut partial = PartialResult::new();
        partial.record(b"Hamburg", 120);
        partial.record(b"Hamburg", 80);
        partial.record(b"Oslo", -30);

        assert_eq!(partial.len(), 2);
        assert_eq!(partial.record_count(), 3);
        let hamburg = partial.get(b"Hamburg").unwrap();
        assert_eq!((hamburg.min, hamburg.max, hamburg.count), (80, 120, 2));
    }

    #[test]
    fn test_partial_merge_combines_overlapping_stations() {
        let mut a = PartialResult::new();
        a.record(b"A", 10);
        a.record(b"B", 5);

        let mut b = PartialResult::new();
        b.record(b"A", -20);
        b.record(b"A", 40);
        b.record(b"C", 0);

        a.merge(b);

        assert_eq!(a.len(), 3);
        assert_eq!(
            *a.get(b"A").unwrap(),
            StationStats {
                min: -20,
                max: 40,
                sum: 30,
                count: 3
            }
        );
        assert_eq!(a.get(b"C").unwrap().count, 1);
    }

    #[test]
    fn test_final_result_is_sorted() {
        let mut partial = PartialResult::new();
        for name in ["Zurich", "Abha", "Oslo", "Accra"] {
            partial.record(name.as_bytes(), 0);
        }

        let result = FinalResult::from(partial);
        let names: Vec<&[u8]> = result.iter().map(|(name, _)| name).collect();

        assert_eq!(
            names,
            vec![&b"Abha"[..], &b"Accra"[..], &b"Oslo"[..], &b"Zurich"[..]]
        );
    }
}

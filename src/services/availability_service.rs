use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use chrono::NaiveDate;
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::{Client, Collection};

use crate::db::mongo::{AVAILABILITY, GARDEN_DB};
use crate::models::bookings::AvailabilityRecord;

pub struct AvailabilityService;

impl AvailabilityService {
    /// Accommodations with at least one BOOKED or HOLD night in
    /// `[check_in, check_out)`.
    pub async fn unavailable_accommodations(
        client: &Client,
        check_in: NaiveDate,
        check_out: NaiveDate,
    ) -> mongodb::error::Result<HashSet<ObjectId>> {
        let availability: Collection<AvailabilityRecord> =
            client.database(GARDEN_DB).collection(AVAILABILITY);
        let filter = doc! {
            "status": { "$in": ["BOOKED", "HOLD"] },
            "date": { "$gte": check_in.to_string(), "$lt": check_out.to_string() },
        };
        let records: Vec<AvailabilityRecord> =
            availability.find(filter).await?.try_collect().await?;
        Ok(records.into_iter().map(|r| r.accommodation_id).collect())
    }
}

/// Availability lookups keyed by the queried range, with a generation
/// counter for cancellation. A lookup takes a token before it queries; if
/// the cache is invalidated while the query is in flight, the token goes
/// stale and the result is dropped instead of stored.
///
/// Keys come straight off an unauthenticated query string, so the map is
/// capped: past `MAX_ENTRIES` the oldest range is evicted on insert.
pub struct AvailabilityCache {
    generation: AtomicU64,
    entries: Mutex<Entries>,
}

/// How many distinct ranges stay resident between invalidations.
pub const MAX_ENTRIES: usize = 128;

#[derive(Default)]
struct Entries {
    map: HashMap<(NaiveDate, NaiveDate), HashSet<ObjectId>>,
    // Insertion order, oldest first.
    order: VecDeque<(NaiveDate, NaiveDate)>,
}

impl AvailabilityCache {
    pub fn new() -> Self {
        Self {
            generation: AtomicU64::new(0),
            entries: Mutex::new(Entries::default()),
        }
    }

    /// Token identifying the state of the world when a lookup starts.
    pub fn begin(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Drop everything and retire in-flight lookups.
    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        let mut entries = self.entries.lock().unwrap();
        entries.map.clear();
        entries.order.clear();
    }

    pub fn get(&self, check_in: NaiveDate, check_out: NaiveDate) -> Option<HashSet<ObjectId>> {
        self.entries
            .lock()
            .unwrap()
            .map
            .get(&(check_in, check_out))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Store a lookup result; returns false (and stores nothing) when the
    /// token is stale. A full cache evicts its oldest range first.
    pub fn store(
        &self,
        token: u64,
        check_in: NaiveDate,
        check_out: NaiveDate,
        unavailable: HashSet<ObjectId>,
    ) -> bool {
        if self.generation.load(Ordering::Acquire) != token {
            return false;
        }
        let key = (check_in, check_out);
        let mut entries = self.entries.lock().unwrap();
        if entries.map.insert(key, unavailable).is_none() {
            entries.order.push_back(key);
            if entries.order.len() > MAX_ENTRIES {
                if let Some(oldest) = entries.order.pop_front() {
                    entries.map.remove(&oldest);
                }
            }
        }
        true
    }
}

impl Default for AvailabilityCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn stores_and_serves_results_for_current_generation() {
        let cache = AvailabilityCache::new();
        let token = cache.begin();
        let mut set = HashSet::new();
        set.insert(ObjectId::new());

        assert!(cache.store(token, date(2024, 4, 1), date(2024, 4, 15), set.clone()));
        assert_eq!(cache.get(date(2024, 4, 1), date(2024, 4, 15)), Some(set));
        assert_eq!(cache.get(date(2024, 4, 1), date(2024, 4, 8)), None);
    }

    #[test]
    fn invalidation_discards_in_flight_results() {
        let cache = AvailabilityCache::new();
        let token = cache.begin();
        // Selection changed while the query was out.
        cache.invalidate();

        let mut set = HashSet::new();
        set.insert(ObjectId::new());
        assert!(!cache.store(token, date(2024, 4, 1), date(2024, 4, 15), set));
        assert_eq!(cache.get(date(2024, 4, 1), date(2024, 4, 15)), None);
    }

    #[test]
    fn invalidation_clears_stored_entries() {
        let cache = AvailabilityCache::new();
        let token = cache.begin();
        cache.store(token, date(2024, 4, 1), date(2024, 4, 15), HashSet::new());
        cache.invalidate();
        assert_eq!(cache.get(date(2024, 4, 1), date(2024, 4, 15)), None);
    }

    #[test]
    fn cache_evicts_oldest_range_at_capacity() {
        let cache = AvailabilityCache::new();
        let token = cache.begin();
        let start = date(2024, 1, 1);

        // One entry per distinct week range, well past the cap.
        for i in 0..(MAX_ENTRIES as i64 * 3) {
            let check_in = start + chrono::Duration::weeks(i);
            let check_out = check_in + chrono::Duration::weeks(1);
            assert!(cache.store(token, check_in, check_out, HashSet::new()));
            assert!(cache.len() <= MAX_ENTRIES);
        }
        assert_eq!(cache.len(), MAX_ENTRIES);

        // The earliest range was evicted, the latest is still served.
        assert_eq!(cache.get(start, start + chrono::Duration::weeks(1)), None);
        let last_in = start + chrono::Duration::weeks(MAX_ENTRIES as i64 * 3 - 1);
        assert!(cache.get(last_in, last_in + chrono::Duration::weeks(1)).is_some());
    }

    #[test]
    fn restoring_a_cached_range_does_not_grow_the_cache() {
        let cache = AvailabilityCache::new();
        let token = cache.begin();
        for _ in 0..5 {
            cache.store(token, date(2024, 4, 1), date(2024, 4, 8), HashSet::new());
        }
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn fresh_token_after_invalidation_stores_again() {
        let cache = AvailabilityCache::new();
        cache.invalidate();
        let token = cache.begin();
        assert!(cache.store(token, date(2024, 4, 1), date(2024, 4, 15), HashSet::new()));
        assert!(cache.get(date(2024, 4, 1), date(2024, 4, 15)).is_some());
    }
}

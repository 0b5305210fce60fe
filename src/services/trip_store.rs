use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::repositories::kv_repository::KvRepository;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::itinerary::Itinerary;
use crate::models::trip::{SavedTrip, TripDetails};

/// Key under which the whole saved-trip list is stored as one JSON array.
pub const STORAGE_KEY: &str = "tripwise_saved_trips";

/// Minimal string key-value persistence.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> AppResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> AppResult<()>;
}

#[derive(Clone, Debug)]
pub struct SqliteKeyValueStore {
    db_pool: DbPool,
}

impl SqliteKeyValueStore {
    pub fn new(db_pool: DbPool) -> Self {
        Self { db_pool }
    }
}

impl KeyValueStore for SqliteKeyValueStore {
    fn get(&self, key: &str) -> AppResult<Option<String>> {
        self.db_pool
            .with_connection(|conn| KvRepository::get(conn, key))
    }

    fn set(&self, key: &str, value: &str) -> AppResult<()> {
        self.db_pool
            .with_connection(|conn| KvRepository::upsert(conn, key, value))
    }
}

#[derive(Debug, Default, Clone)]
pub struct MemoryKeyValueStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> AppResult<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| AppError::other("in-memory store lock poisoned"))
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> AppResult<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Saved trips, newest first, mirrored to a single key on every change.
pub struct TripStore {
    store: Arc<dyn KeyValueStore>,
    trips: Vec<SavedTrip>,
}

impl TripStore {
    /// Loads the saved list once. A missing key or an unreadable value both
    /// start from an empty list.
    pub fn open(store: Arc<dyn KeyValueStore>) -> AppResult<Self> {
        let trips = match store.get(STORAGE_KEY)? {
            Some(raw) => match serde_json::from_str::<Vec<SavedTrip>>(&raw) {
                Ok(trips) => trips,
                Err(error) => {
                    warn!(
                        target: "app::store",
                        error = %error,
                        "saved trips are unreadable; starting empty"
                    );
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        info!(target: "app::store", count = trips.len(), "saved trips loaded");
        Ok(Self { store, trips })
    }

    pub fn trips(&self) -> &[SavedTrip] {
        &self.trips
    }

    pub fn get(&self, id: &str) -> Option<&SavedTrip> {
        self.trips.iter().find(|trip| trip.id == id)
    }

    /// Snapshots the trip under a fresh id and prepends it.
    pub fn save(&mut self, details: &TripDetails, itinerary: &Itinerary) -> AppResult<SavedTrip> {
        let trip = SavedTrip {
            id: Uuid::new_v4().to_string(),
            details: details.clone(),
            itinerary: itinerary.clone(),
            saved_at: Utc::now(),
        };

        let mut next = Vec::with_capacity(self.trips.len() + 1);
        next.push(trip.clone());
        next.extend(self.trips.iter().cloned());
        self.persist(next)?;

        info!(target: "app::store", id = %trip.id, destination = %details.destination, "trip saved");
        Ok(trip)
    }

    /// Removes the trip with `id`; unknown ids still rewrite the list.
    pub fn delete(&mut self, id: &str) -> AppResult<()> {
        let next: Vec<SavedTrip> = self
            .trips
            .iter()
            .filter(|trip| trip.id != id)
            .cloned()
            .collect();
        let removed = self.trips.len() - next.len();
        self.persist(next)?;

        info!(target: "app::store", id, removed, "trip deleted");
        Ok(())
    }

    fn persist(&mut self, trips: Vec<SavedTrip>) -> AppResult<()> {
        let raw = serde_json::to_string(&trips)?;
        self.store.set(STORAGE_KEY, &raw)?;
        self.trips = trips;
        Ok(())
    }
}

//! The tracked-city collection and its persistence.
//!
//! [`CitySynchronizer`] owns the in-memory list of [`City`] snapshots, keeps the
//! persisted name list in step with it, and resolves names through a
//! [`WeatherProvider`]. Handles are cheap to clone and share one state; locks
//! are never held across an await.

use std::sync::Arc;

use futures::future::join_all;
use parking_lot::{Mutex, MutexGuard};

use crate::{
    error::WeatherError,
    input::validate_city_name,
    model::{City, CityId},
    provider::WeatherProvider,
    storage::{KeyValueStore, load_names, save_names},
};

/// Read-only view handed to whatever renders the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardState {
    pub cities: Vec<City>,
    pub loading_city_id: Option<CityId>,
    pub is_loading_initial: bool,
}

#[derive(Debug, Clone, Copy)]
struct Loading {
    id: CityId,
    seq: u64,
}

#[derive(Debug)]
struct SyncState {
    cities: Vec<City>,
    // Single slot: only the most recently started refresh is visible.
    loading: Option<Loading>,
    refresh_seq: u64,
    is_loading_initial: bool,
    // Bumped on every persisted mutation.
    revision: u64,
    // Ids removed while `initialize` was resolving names.
    deleted_during_load: Vec<CityId>,
}

impl SyncState {
    fn position(&self, id: CityId) -> Option<usize> {
        self.cities.iter().position(|c| c.id == id)
    }

    fn names(&self) -> Vec<&str> {
        self.cities.iter().map(|c| c.name.as_str()).collect()
    }
}

struct Inner<S> {
    provider: Arc<dyn WeatherProvider>,
    state: Mutex<SyncState>,
    store: Mutex<S>,
}

pub struct CitySynchronizer<S> {
    inner: Arc<Inner<S>>,
}

impl<S> Clone for CitySynchronizer<S> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

/// Clears the loading marker when the refresh that set it finishes or is dropped.
struct LoadingMarker<'a> {
    state: &'a Mutex<SyncState>,
    seq: u64,
}

impl Drop for LoadingMarker<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        if state.loading.is_some_and(|l| l.seq == self.seq) {
            state.loading = None;
        }
    }
}

impl<S: KeyValueStore> CitySynchronizer<S> {
    /// Create an empty synchronizer. Call [`initialize`](Self::initialize) to
    /// load the persisted cities.
    pub fn new(provider: Arc<dyn WeatherProvider>, store: S) -> Self {
        Self {
            inner: Arc::new(Inner {
                provider,
                state: Mutex::new(SyncState {
                    cities: Vec::new(),
                    loading: None,
                    refresh_seq: 0,
                    is_loading_initial: true,
                    revision: 0,
                    deleted_during_load: Vec::new(),
                }),
                store: Mutex::new(store),
            }),
        }
    }

    /// Resolve every persisted name concurrently and install the results once
    /// all lookups have settled.
    ///
    /// Names that fail to resolve are logged and left out. The persisted list
    /// is only rewritten if the collection was mutated while lookups were in
    /// flight: cities added meanwhile follow the loaded ones, and cities
    /// deleted meanwhile stay deleted.
    pub async fn initialize(&self) {
        let names = load_names(&*self.inner.store.lock());
        if names.is_empty() {
            self.inner.state.lock().is_loading_initial = false;
            return;
        }

        let start_revision = {
            let mut state = self.inner.state.lock();
            state.is_loading_initial = true;
            state.deleted_during_load.clear();
            state.revision
        };

        let provider = &self.inner.provider;
        let lookups = names.iter().map(|name| async move {
            match provider.city_weather(name).await {
                Ok(city) => Some(city),
                Err(err) => {
                    tracing::warn!(city = %name, error = %err, "city not found or provider error");
                    None
                }
            }
        });

        let mut cities: Vec<City> = Vec::with_capacity(names.len());
        for city in join_all(lookups).await.into_iter().flatten() {
            if cities.iter().any(|c| c.id == city.id) {
                tracing::debug!(id = city.id, name = %city.name, "skipping duplicate persisted city");
                continue;
            }
            cities.push(city);
        }

        tracing::info!(
            requested = names.len(),
            resolved = cities.len(),
            "loaded persisted cities"
        );

        let mut state = self.inner.state.lock();
        state.is_loading_initial = false;
        let deleted = std::mem::take(&mut state.deleted_during_load);

        if state.revision == start_revision {
            state.cities = cities;
            return;
        }

        cities.retain(|c| !deleted.contains(&c.id));
        for city in std::mem::take(&mut state.cities) {
            if !cities.iter().any(|c| c.id == city.id) {
                cities.push(city);
            }
        }
        state.cities = cities;
        tracing::debug!("collection changed during initial load, merging");
        self.persist(state);
    }

    /// Append `city` unless one with the same id is already tracked.
    ///
    /// Returns `true` when the collection changed.
    pub fn add_city(&self, city: City) -> bool {
        let mut state = self.inner.state.lock();
        if state.position(city.id).is_some() {
            tracing::debug!(id = city.id, "city already tracked");
            return false;
        }

        state.cities.push(city);
        self.persist(state);
        true
    }

    /// Look up `input` at the provider and add the result.
    ///
    /// Returns the resolved city; on failure nothing is changed and the error
    /// carries a [`user_message`](WeatherError::user_message).
    pub async fn add_by_name(&self, input: &str) -> Result<City, WeatherError> {
        let name = validate_city_name(input)?;
        let city = self.inner.provider.city_weather(name).await?;
        self.add_city(city.clone());
        Ok(city)
    }

    /// Remove the city with `id`, returning it. Absent ids are a no-op.
    pub fn delete_city(&self, id: CityId) -> Option<City> {
        let mut state = self.inner.state.lock();
        let pos = state.position(id)?;
        let removed = state.cities.remove(pos);
        if state.is_loading_initial {
            state.deleted_during_load.push(id);
        }
        self.persist(state);
        Some(removed)
    }

    /// Fetch fresh conditions for the tracked city `id` and swap them in, keeping `id`.
    ///
    /// Returns `Ok(None)` if `id` is not tracked, or stopped being tracked while
    /// the lookup was in flight. A failed lookup leaves the entry untouched.
    pub async fn refresh_city(&self, id: CityId) -> Result<Option<City>, WeatherError> {
        let (name, marker) = {
            let mut state = self.inner.state.lock();
            let Some(pos) = state.position(id) else {
                return Ok(None);
            };
            let name = state.cities[pos].name.clone();

            state.refresh_seq += 1;
            let seq = state.refresh_seq;
            state.loading = Some(Loading { id, seq });

            (name, LoadingMarker { state: &self.inner.state, seq })
        };

        let result = self.inner.provider.city_weather(&name).await;
        drop(marker);

        let fresh = match result {
            Ok(fresh) => fresh,
            Err(err) => {
                tracing::error!(id, city = %name, error = %err, "failed to refresh city");
                return Err(err);
            }
        };

        let mut state = self.inner.state.lock();
        let Some(pos) = state.position(id) else {
            tracing::debug!(id, "city removed during refresh, dropping result");
            return Ok(None);
        };

        let updated = City { id, ..fresh };
        state.cities[pos] = updated.clone();
        self.persist(state);
        Ok(Some(updated))
    }

    pub fn cities(&self) -> Vec<City> {
        self.inner.state.lock().cities.clone()
    }

    /// Cities whose name contains `query`, ignoring case, in collection order.
    pub fn filter_cities(&self, query: &str) -> Vec<City> {
        let needle = query.to_lowercase();
        self.inner
            .state
            .lock()
            .cities
            .iter()
            .filter(|c| c.name.to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }

    pub fn loading_city_id(&self) -> Option<CityId> {
        self.inner.state.lock().loading.map(|l| l.id)
    }

    pub fn is_loading_initial(&self) -> bool {
        self.inner.state.lock().is_loading_initial
    }

    pub fn snapshot(&self) -> DashboardState {
        let state = self.inner.state.lock();
        DashboardState {
            cities: state.cities.clone(),
            loading_city_id: state.loading.map(|l| l.id),
            is_loading_initial: state.is_loading_initial,
        }
    }

    /// Names currently held in the store.
    pub fn persisted_names(&self) -> Vec<String> {
        load_names(&*self.inner.store.lock())
    }

    /// Rewrite the persisted names from `state`, consuming its guard.
    ///
    /// The store lock is taken before the state lock is released, so writes
    /// land in mutation order while readers of the collection are not held up
    /// by the write. The write itself is synchronous and blocks the calling
    /// task for the duration of the store's `set`.
    fn persist(&self, mut state: MutexGuard<'_, SyncState>) {
        state.revision += 1;
        let names: Vec<String> = state.names().into_iter().map(str::to_owned).collect();
        let mut store = self.inner.store.lock();
        drop(state);

        tracing::debug!(?names, "rewriting persisted city names");
        if let Err(err) = save_names(&mut *store, &names) {
            tracing::warn!(error = %err, "failed to persist city names");
        }
    }
}

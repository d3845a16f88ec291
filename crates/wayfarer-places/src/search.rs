//! Location search with result caching and request coalescing.
//!
//! `SearchLayer` sits between the UI and a [`Geocoder`]:
//! - queries shorter than the minimum length never reach the geocoder
//! - successful lookups are reused for `cache_ttl`, keyed by the trimmed query
//! - concurrent lookups of the same query share one geocoder call
//!
//! `SearchSession` adds the presentation rule: only the latest query's
//! results are published; results for superseded queries are dropped.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{watch, OnceCell};
use tokio::time::Instant;
use wayfarer_core::{NetworkError, SearchConfig};

use crate::geocode::Geocoder;
use crate::types::Location;

type Lookup = Result<Vec<Location>, NetworkError>;

/// What the UI renders for a query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchState {
    pub results: Vec<Location>,
    pub loading: bool,
    pub error: Option<NetworkError>,
}

impl SearchState {
    pub fn loading() -> Self {
        Self {
            loading: true,
            ..Self::default()
        }
    }

    fn settled(lookup: Lookup) -> Self {
        match lookup {
            Ok(results) => Self {
                results,
                ..Self::default()
            },
            Err(error) => Self {
                error: Some(error),
                ..Self::default()
            },
        }
    }
}

struct CachedLookup {
    results: Vec<Location>,
    fetched_at: Instant,
}

#[derive(Default)]
struct SearchTables {
    cache: HashMap<String, CachedLookup>,
    in_flight: HashMap<String, Arc<OnceCell<Lookup>>>,
}

pub struct SearchLayer<G> {
    geocoder: G,
    min_query_len: usize,
    cache_ttl: Duration,
    tables: Mutex<SearchTables>,
}

/// Trim surrounding whitespace; the result is the cache key.
pub fn normalize_query(query: &str) -> &str {
    query.trim()
}

impl<G: Geocoder> SearchLayer<G> {
    pub fn new(geocoder: G, min_query_len: usize, cache_ttl: Duration) -> Self {
        Self {
            geocoder,
            min_query_len,
            cache_ttl,
            tables: Mutex::new(SearchTables::default()),
        }
    }

    pub fn from_config(geocoder: G, config: &SearchConfig) -> Self {
        Self::new(geocoder, config.min_query_len, config.cache_ttl())
    }

    /// Whether `query` is long enough to be sent to the geocoder.
    pub fn accepts(&self, query: &str) -> bool {
        normalize_query(query).chars().count() >= self.min_query_len
    }

    /// Look up `query`, serving from cache or joining an in-flight request when possible.
    pub async fn search(&self, query: &str) -> SearchState {
        if !self.accepts(query) {
            return SearchState::default();
        }
        let key = normalize_query(query).to_string();

        let cell = {
            let mut tables = self.tables.lock();
            if let Some(results) = self.fresh(&mut tables, &key) {
                tracing::debug!("Search cache hit for '{}'", key);
                return SearchState::settled(Ok(results));
            }
            tables
                .in_flight
                .entry(key.clone())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };

        let lookup = cell
            .get_or_init(|| async {
                tracing::debug!("Searching geocoder for '{}'", key);
                self.geocoder.search(&key).await
            })
            .await
            .clone();

        self.finish(&key, &cell, &lookup);

        if let Err(e) = &lookup {
            tracing::warn!("Search for '{}' failed: {}", key, e);
        }
        SearchState::settled(lookup)
    }

    /// Drop any cached results for `query`.
    pub fn invalidate(&self, query: &str) {
        self.tables.lock().cache.remove(normalize_query(query));
    }

    /// Drop every cached lookup older than the freshness window.
    pub fn purge_expired(&self) -> usize {
        let ttl = self.cache_ttl;
        let mut tables = self.tables.lock();
        let before = tables.cache.len();
        tables.cache.retain(|_, c| c.fetched_at.elapsed() < ttl);
        before - tables.cache.len()
    }

    pub fn cached_queries(&self) -> usize {
        self.tables.lock().cache.len()
    }

    fn fresh(&self, tables: &mut SearchTables, key: &str) -> Option<Vec<Location>> {
        let cached = tables.cache.get(key)?;
        if cached.fetched_at.elapsed() < self.cache_ttl {
            return Some(cached.results.clone());
        }
        tables.cache.remove(key);
        None
    }

    /// Retire the in-flight entry once; the first waiter to get here caches success.
    fn finish(&self, key: &str, cell: &Arc<OnceCell<Lookup>>, lookup: &Lookup) {
        let mut tables = self.tables.lock();
        let ours = tables
            .in_flight
            .get(key)
            .is_some_and(|current| Arc::ptr_eq(current, cell));
        if !ours {
            return;
        }
        tables.in_flight.remove(key);

        if let Ok(results) = lookup {
            if !self.cache_ttl.is_zero() {
                tables.cache.insert(
                    key.to_string(),
                    CachedLookup {
                        results: results.clone(),
                        fetched_at: Instant::now(),
                    },
                );
            }
        }
    }
}

/// Search state for one input box, where the latest query wins.
pub struct SearchSession<G> {
    layer: Arc<SearchLayer<G>>,
    generation: Arc<AtomicU64>,
    tx: Arc<watch::Sender<SearchState>>,
}

impl<G: Geocoder + 'static> SearchSession<G> {
    pub fn new(layer: Arc<SearchLayer<G>>) -> Self {
        let (tx, _) = watch::channel(SearchState::default());
        Self {
            layer,
            generation: Arc::new(AtomicU64::new(0)),
            tx: Arc::new(tx),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> SearchState {
        self.tx.borrow().clone()
    }

    /// Start searching for `query`. Must be called from within a tokio runtime.
    ///
    /// Earlier lookups keep running but their results are discarded.
    pub fn update_query(&self, query: &str) {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;

        if !self.layer.accepts(query) {
            self.tx.send_replace(SearchState::default());
            return;
        }

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                tracing::error!("Search requested outside of a tokio runtime");
                self.tx.send_replace(SearchState {
                    error: Some(NetworkError::ConnectionFailed(
                        "search service not initialized".into(),
                    )),
                    ..SearchState::default()
                });
                return;
            }
        };

        self.tx.send_replace(SearchState::loading());

        let layer = self.layer.clone();
        let latest = self.generation.clone();
        let tx = self.tx.clone();
        let query = query.to_string();

        runtime.spawn(async move {
            let state = layer.search(&query).await;
            let published = tx.send_if_modified(|current| {
                if latest.load(Ordering::Acquire) != generation {
                    return false;
                }
                *current = state;
                true
            });
            if !published {
                tracing::debug!("Discarding stale results for '{}'", query);
            }
        });
    }
}

use crate::core::constants::{DEFAULT_TILE_CACHE_CAPACITY, TILE_MAX_ATTEMPTS, TILE_RETRY_BASE};
use crate::core::geo::TileCoord;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// Lifecycle of one tile slot.
#[derive(Debug, Clone)]
pub enum TileState {
    /// A fetch is in flight; `attempts` counts the failures before it
    Loading { attempts: u32 },
    /// Decoded and ready to draw
    Ready(Arc<image::RgbaImage>),
    /// Last fetch failed; eligible for another attempt after `retry_after`
    Failed { attempts: u32, retry_after: Instant },
    /// Failed too many times; drawn as a placeholder and never retried
    Broken,
}

impl TileState {
    pub fn is_ready(&self) -> bool {
        matches!(self, TileState::Ready(_))
    }
}

/// Bounded in-memory tile cache with LRU eviction.
///
/// Slots carry the full tile lifecycle, so the cache is also the retry
/// ledger: failures are recorded here with their backoff deadline, and
/// tiles that exhaust their attempts park in `Broken` for good.
#[derive(Debug)]
pub struct TileCache {
    cache: Arc<Mutex<LruCache<TileCoord, TileState>>>,
}

impl TileCache {
    /// Create a new tile cache with the given capacity
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Arc::new(Mutex::new(LruCache::new(capacity))),
        }
    }

    /// Create a new tile cache with default capacity (1024 tiles)
    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_TILE_CACHE_CAPACITY)
    }

    /// Get the current state of a tile, bumping its recency
    pub fn get(&self, coord: &TileCoord) -> Option<TileState> {
        self.cache.lock().ok()?.get(coord).cloned()
    }

    /// Mark a fresh tile as having its first fetch in flight
    pub fn mark_loading(&self, coord: TileCoord) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.put(coord, TileState::Loading { attempts: 0 });
        }
    }

    /// Move a failed tile back to loading for another attempt, keeping its
    /// failure count so the backoff keeps growing.
    pub fn mark_retrying(&self, coord: TileCoord) {
        if let Ok(mut cache) = self.cache.lock() {
            let attempts = match cache.peek(&coord) {
                Some(TileState::Failed { attempts, .. }) => *attempts,
                _ => 0,
            };
            cache.put(coord, TileState::Loading { attempts });
        }
    }

    /// Store a decoded tile
    pub fn mark_ready(&self, coord: TileCoord, pixels: Arc<image::RgbaImage>) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.put(coord, TileState::Ready(pixels));
        }
    }

    /// Record a failed fetch, advancing the slot through its retry budget.
    /// Returns the state the slot moved to.
    pub fn record_failure(&self, coord: TileCoord, now: Instant) -> TileState {
        let mut cache = match self.cache.lock() {
            Ok(cache) => cache,
            Err(_) => return TileState::Broken,
        };

        let attempts = match cache.peek(&coord) {
            Some(TileState::Loading { attempts }) => attempts + 1,
            Some(TileState::Failed { attempts, .. }) => attempts + 1,
            Some(TileState::Broken) => {
                return TileState::Broken;
            }
            _ => 1,
        };

        let state = if attempts >= TILE_MAX_ATTEMPTS {
            log::error!("tile {:?} broken after {} attempts", coord, attempts);
            TileState::Broken
        } else {
            // 500ms, 1s, 2s, ...
            let backoff = TILE_RETRY_BASE * 2_u32.pow(attempts - 1);
            TileState::Failed {
                attempts,
                retry_after: now + backoff,
            }
        };
        cache.put(coord, state.clone());
        state
    }

    /// Check if a tile has an entry (any state)
    pub fn contains(&self, coord: &TileCoord) -> bool {
        self.cache
            .lock()
            .ok()
            .map(|cache| cache.contains(coord))
            .unwrap_or(false)
    }

    /// Remove a tile from the cache
    pub fn remove(&self, coord: &TileCoord) -> Option<TileState> {
        self.cache.lock().ok()?.pop(coord)
    }

    /// Clear all tiles from the cache
    pub fn clear(&self) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.clear();
        }
    }

    /// Get the current number of cached slots
    pub fn len(&self) -> usize {
        self.cache
            .lock()
            .ok()
            .map(|cache| cache.len())
            .unwrap_or(0)
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get cache capacity
    pub fn capacity(&self) -> usize {
        self.cache
            .lock()
            .ok()
            .map(|cache| cache.cap().get())
            .unwrap_or(0)
    }

    /// Coordinates of every slot currently in a given-state, for inspection
    /// in tests and debugging overlays.
    pub fn coords_where<F>(&self, mut predicate: F) -> Vec<TileCoord>
    where
        F: FnMut(&TileState) -> bool,
    {
        self.cache
            .lock()
            .ok()
            .map(|cache| {
                cache
                    .iter()
                    .filter(|(_, state)| predicate(state))
                    .map(|(coord, _)| *coord)
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl Clone for TileCache {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
        }
    }
}

impl Default for TileCache {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

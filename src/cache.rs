//! Tiered asset cache: memory, then the durable store, then the generator
//!
//! `resolve` never fails. Every tier reports a [`TierOutcome`] and any miss
//! or failure falls through to the next tier, ending at the direct generator
//! URL which is computed before any tier is consulted.

use crate::catalog::ProductImage;
use crate::config::CacheConfig;
use crate::key::{seed, AssetKey};
use crate::locator::Locator;
use crate::remote::RemoteGenerator;
use crate::store::{CacheEntry, DisabledOpener, DurableStore, SqliteOpener, StoreOpener};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::OnceCell;
use tokio::task::JoinHandle;

const UNINITIALIZED: u8 = 0;
const INITIALIZING: u8 = 1;
const READY: u8 = 2;
const UNAVAILABLE: u8 = 3;

/// Initialization state of the durable tier
///
/// `Unavailable` is terminal for the lifetime of the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DurableState {
    Uninitialized,
    Initializing,
    Ready,
    Unavailable,
}

/// Outcome of consulting a single tier
#[derive(Debug)]
enum TierOutcome {
    Hit(Locator),
    Miss,
    Unavailable,
}

/// Result of warming the cache for a batch of product images
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PrefetchReport {
    /// Assets now held locally
    pub local: usize,
    /// Assets that fell back to the direct URL
    pub remote: usize,
}

/// Lazily opened durable tier, shared with the task that opens it
struct DurableTier {
    opener: Arc<dyn StoreOpener>,
    store: OnceCell<Option<Arc<dyn DurableStore>>>,
    state: AtomicU8,
}

impl DurableTier {
    fn new(opener: Arc<dyn StoreOpener>) -> Self {
        Self {
            opener,
            store: OnceCell::new(),
            state: AtomicU8::new(UNINITIALIZED),
        }
    }

    /// Open the store once and memoize the outcome, including "unavailable"
    async fn get_or_open(&self) -> Option<Arc<dyn DurableStore>> {
        self.store
            .get_or_init(|| async {
                self.state.store(INITIALIZING, Ordering::Release);
                let opener = Arc::clone(&self.opener);
                let store = match tokio::task::spawn_blocking(move || opener.open()).await {
                    Ok(Ok(store)) => Some(store),
                    Ok(Err(e)) => {
                        log::warn!("Durable store unavailable, skipping tier: {}", e);
                        None
                    }
                    Err(e) => {
                        log::warn!("Durable store initialization aborted: {}", e);
                        None
                    }
                };
                let state = if store.is_some() { READY } else { UNAVAILABLE };
                self.state.store(state, Ordering::Release);
                store
            })
            .await
            .clone()
    }
}

/// Image cache with memory, durable and remote tiers
pub struct AssetCache {
    memory: Mutex<HashMap<String, Locator>>,
    durable: Arc<DurableTier>,
    remote: RemoteGenerator,
    pending: Mutex<Vec<JoinHandle<()>>>,
}

impl AssetCache {
    pub fn new(remote: RemoteGenerator, opener: Arc<dyn StoreOpener>) -> Self {
        Self {
            memory: Mutex::new(HashMap::new()),
            durable: Arc::new(DurableTier::new(opener)),
            remote,
            pending: Mutex::new(Vec::new()),
        }
    }

    /// Build a cache from configuration; no store path disables the durable tier
    pub fn from_config(config: &CacheConfig) -> Self {
        let opener: Arc<dyn StoreOpener> = match &config.store_path {
            Some(path) => Arc::new(SqliteOpener::new(path.clone())),
            None => Arc::new(DisabledOpener),
        };
        Self::new(RemoteGenerator::from_config(config), opener)
    }

    /// Direct generator URL for an asset; needs no cache state
    pub fn remote_url(&self, id: &str, prompt: &str, size: u32) -> String {
        self.remote.url_for(prompt, size, seed(id))
    }

    /// Resolve an asset to a displayable locator
    ///
    /// Always returns a locator: a local reference when the bytes are cached
    /// or could be fetched, otherwise the direct generator URL.
    pub async fn resolve(&self, id: &str, prompt: &str, size: u32) -> Locator {
        let key = AssetKey::new(id, size);
        let remote_url = self.remote_url(id, prompt, size);

        let cached = self.memory().get(key.as_str()).cloned();
        if let Some(locator) = cached {
            log::debug!("Memory hit for {}", key);
            return locator;
        }

        match self.durable_lookup(&key).await {
            TierOutcome::Hit(locator) => return locator,
            TierOutcome::Miss | TierOutcome::Unavailable => {}
        }

        match self.network_fetch(&key, &remote_url).await {
            TierOutcome::Hit(locator) => locator,
            TierOutcome::Miss | TierOutcome::Unavailable => Locator::remote(remote_url),
        }
    }

    /// Resolve a batch of product images one after another
    pub async fn prefetch(&self, images: &[ProductImage]) -> PrefetchReport {
        let mut report = PrefetchReport::default();
        for image in images {
            let locator = self.resolve(&image.id, &image.prompt, image.size).await;
            if locator.is_local() {
                report.local += 1;
            } else {
                report.remote += 1;
            }
        }
        log::info!(
            "Prefetched {} images ({} local, {} direct)",
            images.len(),
            report.local,
            report.remote
        );
        report
    }

    pub fn durable_state(&self) -> DurableState {
        match self.durable.state.load(Ordering::Acquire) {
            UNINITIALIZED => DurableState::Uninitialized,
            INITIALIZING => DurableState::Initializing,
            READY => DurableState::Ready,
            _ => DurableState::Unavailable,
        }
    }

    /// Number of entries in the memory tier
    pub fn memory_len(&self) -> usize {
        self.memory().len()
    }

    /// Drop every memory entry; local locators already handed out stay valid
    pub fn clear_memory(&self) {
        self.memory().clear();
    }

    /// Wait for background store writes started so far
    pub async fn flush_pending(&self) {
        let handles: Vec<JoinHandle<()>> = std::mem::take(&mut *self.pending_writes());
        for handle in handles {
            if let Err(e) = handle.await {
                log::warn!("Background store write failed: {}", e);
            }
        }
    }

    fn memory(&self) -> MutexGuard<'_, HashMap<String, Locator>> {
        // The map stays consistent even if a holder panicked
        self.memory.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn pending_writes(&self) -> MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Durable store handle, opening it on first use
    ///
    /// The open runs on its own task, so it completes and is memoized even
    /// if the resolve that started it is dropped.
    async fn durable(&self) -> Option<Arc<dyn DurableStore>> {
        if let Some(store) = self.durable.store.get() {
            return store.clone();
        }

        let tier = Arc::clone(&self.durable);
        match tokio::spawn(async move { tier.get_or_open().await }).await {
            Ok(store) => store,
            Err(e) => {
                log::warn!("Durable store initialization aborted: {}", e);
                None
            }
        }
    }

    async fn durable_lookup(&self, key: &AssetKey) -> TierOutcome {
        let Some(store) = self.durable().await else {
            return TierOutcome::Unavailable;
        };

        let lookup_key = key.to_string();
        match tokio::task::spawn_blocking(move || store.get(&lookup_key)).await {
            Ok(Ok(Some(entry))) => {
                log::info!("Durable store hit for {}", key);
                let locator = Locator::local(entry.blob);
                self.memory().insert(key.to_string(), locator.clone());
                TierOutcome::Hit(locator)
            }
            Ok(Ok(None)) => TierOutcome::Miss,
            Ok(Err(e)) => {
                log::warn!("Durable store read failed for {}: {}", key, e);
                TierOutcome::Miss
            }
            Err(e) => {
                log::warn!("Durable store read aborted for {}: {}", key, e);
                TierOutcome::Miss
            }
        }
    }

    async fn network_fetch(&self, key: &AssetKey, url: &str) -> TierOutcome {
        log::info!("Cache miss for {}, fetching from generator", key);
        match self.remote.fetch(url).await {
            Ok(bytes) => {
                self.spawn_store_write(CacheEntry::from_bytes(key.as_str(), bytes.clone()));
                let locator = Locator::local(bytes);
                self.memory().insert(key.to_string(), locator.clone());
                TierOutcome::Hit(locator)
            }
            Err(e) => {
                log::warn!("Generator fetch failed for {}, using direct URL: {}", key, e);
                TierOutcome::Miss
            }
        }
    }

    /// Write an entry to the durable tier without waiting for it
    fn spawn_store_write(&self, entry: CacheEntry) {
        let Some(store) = self.durable.store.get().cloned().flatten() else {
            return;
        };

        let handle = tokio::task::spawn_blocking(move || {
            if let Err(e) = store.put(&entry) {
                log::warn!("Failed to store asset {}: {}", entry.id, e);
            }
        });

        let mut pending = self.pending_writes();
        pending.retain(|h| !h.is_finished());
        pending.push(handle);
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;

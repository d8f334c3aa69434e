//! Oracle Assets - tiered image cache for generated artwork
//!
//! Resolves product and reading images to a displayable source by checking an
//! in-process memory map, then a SQLite store, then the remote generator.
//! Resolution never fails: the direct generator URL is the last resort.

pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod key;
pub mod locator;
pub mod remote;
pub mod store;
pub mod web;

pub use cache::{AssetCache, DurableState, PrefetchReport};
pub use catalog::ProductImage;
pub use config::CacheConfig;
pub use error::{AssetError, Result};
pub use key::{seed, AssetKey};
pub use locator::Locator;
pub use remote::RemoteGenerator;
pub use store::{CacheEntry, DurableStore, SqliteStore, StoreOpener};

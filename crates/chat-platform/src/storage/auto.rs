//! Pick a cache backend.
//!
//! Priority for `Auto`: IndexedDB → localStorage → Memory (fallback).
//! An explicitly requested backend that fails to open also falls back to
//! memory, so the client always gets a working cache.

use std::rc::Rc;
use chat_core::ports::CachePort;
use chat_types::config::StorageBackendType;
use super::{IndexedDbCache, LocalStorageCache, MemoryCache};

pub async fn open_cache(backend: StorageBackendType) -> Rc<dyn CachePort> {
    match backend {
        StorageBackendType::Memory => {
            log::info!("Cache backend: memory (requested)");
            Rc::new(MemoryCache::new())
        }
        StorageBackendType::IndexedDb => match IndexedDbCache::open().await {
            Ok(idb) => {
                log::info!("Cache backend: IndexedDB");
                Rc::new(idb)
            }
            Err(e) => {
                log::warn!("IndexedDB unavailable ({}), falling back to memory", e);
                Rc::new(MemoryCache::new())
            }
        },
        StorageBackendType::LocalStorage => match LocalStorageCache::open() {
            Ok(ls) => {
                log::info!("Cache backend: localStorage");
                Rc::new(ls)
            }
            Err(e) => {
                log::warn!("localStorage unavailable ({}), falling back to memory", e);
                Rc::new(MemoryCache::new())
            }
        },
        StorageBackendType::Auto => {
            match IndexedDbCache::open().await {
                Ok(idb) => {
                    log::info!("Cache backend: IndexedDB");
                    return Rc::new(idb);
                }
                Err(e) => log::warn!("IndexedDB unavailable ({}), trying localStorage", e),
            }
            match LocalStorageCache::open() {
                Ok(ls) => {
                    log::info!("Cache backend: localStorage");
                    Rc::new(ls)
                }
                Err(e) => {
                    log::warn!("localStorage unavailable ({}), falling back to memory", e);
                    Rc::new(MemoryCache::new())
                }
            }
        }
    }
}

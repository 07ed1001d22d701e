//! Per-installation identity, used to partition remote data.

use std::rc::Rc;
use chat_types::{Result, ids::new_identity};
use crate::ports::{CacheKey, CachePort};

pub struct IdentityProvider {
    cache: Rc<dyn CachePort>,
}

impl IdentityProvider {
    pub fn new(cache: Rc<dyn CachePort>) -> Self {
        Self { cache }
    }

    /// Cached identity, minting and persisting one on first use.
    ///
    /// If the cache is unreadable the identity is still returned, but it only
    /// lives for this run.
    pub async fn get_or_create(&self) -> String {
        match self.cache.get(CacheKey::Identity).await {
            Ok(Some(identity)) if !identity.is_empty() => return identity,
            Ok(_) => {}
            Err(e) => {
                log::error!("Failed to read identity from cache: {}", e);
                return new_identity();
            }
        }

        let identity = new_identity();
        match self.cache.set(CacheKey::Identity, &identity).await {
            Ok(()) => log::info!("Created new identity {}", identity),
            Err(e) => log::error!("Failed to persist identity {}: {}", identity, e),
        }
        identity
    }

    /// Forget the identity; the next `get_or_create` mints a new one.
    pub async fn clear(&self) -> Result<()> {
        self.cache.remove(CacheKey::Identity).await?;
        log::info!("Identity cleared");
        Ok(())
    }
}

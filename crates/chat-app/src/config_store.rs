//! Client configuration persisted in the local cache.

use std::rc::Rc;
use chat_core::ports::{CacheKey, CachePort};
use chat_types::{Result, config::ClientConfig};

/// Saved config, or `None` if absent or unreadable.
pub async fn restore_config(cache: &Rc<dyn CachePort>) -> Option<ClientConfig> {
    match cache.get(CacheKey::Config).await {
        Ok(Some(raw)) => match serde_json::from_str::<ClientConfig>(&raw) {
            Ok(config) => {
                log::info!("Config restored from {}", cache.backend_name());
                Some(config)
            }
            Err(e) => {
                log::warn!("Ignoring unreadable saved config: {}", e);
                None
            }
        },
        Ok(None) => None,
        Err(e) => {
            log::warn!("Failed to read saved config: {}", e);
            None
        }
    }
}

pub async fn save_config(cache: &Rc<dyn CachePort>, config: &ClientConfig) -> Result<()> {
    let json = serde_json::to_string(config)?;
    cache.set(CacheKey::Config, &json).await?;
    log::info!("Config saved to {}", cache.backend_name());
    Ok(())
}

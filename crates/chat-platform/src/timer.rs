//! Tick source for the response renderer.

use async_trait::async_trait;
use gloo_timers::future::TimeoutFuture;
use chat_core::ports::TickerPort;

/// `setTimeout`-backed ticker.
#[derive(Debug, Default, Clone, Copy)]
pub struct GlooTicker;

#[async_trait(?Send)]
impl TickerPort for GlooTicker {
    async fn sleep(&self, ms: u64) {
        TimeoutFuture::new(ms.min(u32::MAX as u64) as u32).await;
    }
}

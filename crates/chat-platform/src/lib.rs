//! Browser adapters for the chat-core ports.
//!
//! - `storage`: `CachePort` over IndexedDB, localStorage, or memory
//! - `remote`: `RemoteStorePort` over the chat backend's HTTP API
//! - `timer`: `TickerPort` backed by `setTimeout`
//! - `spawn`: `LocalSpawn` onto the JS microtask queue

pub mod storage;
pub mod remote;
pub mod timer;
pub mod spawn;

pub use remote::HttpRemoteStore;
pub use spawn::WasmSpawner;
pub use timer::GlooTicker;

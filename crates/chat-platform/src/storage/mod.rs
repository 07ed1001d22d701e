pub mod memory;
pub mod indexeddb;
pub mod local_storage;
pub mod auto;

pub use memory::MemoryCache;
pub use indexeddb::IndexedDbCache;
pub use local_storage::LocalStorageCache;
pub use auto::open_cache;

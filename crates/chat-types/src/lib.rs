pub mod message;
pub mod session;
pub mod collection;
pub mod config;
pub mod error;
pub mod event;
pub mod ids;


pub use error::ChatError;
pub type Result<T> = std::result::Result<T, ChatError>;

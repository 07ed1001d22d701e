pub mod ports;
pub mod event_bus;
pub mod lanes;
pub mod mirror;
pub mod identity;
pub mod sync;
pub mod renderer;
pub mod turn;

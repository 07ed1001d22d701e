//! Chat App: WASM entry point.
//!
//! This crate is the composition root (DI wiring layer).
//! It assembles the platform adapters, hands them to the sync engine and
//! renderer, and exposes the result to the host UI as [`ChatClient`].

mod client;
mod config_store;

pub use client::ChatClient;

use wasm_bindgen::prelude::*;

/// WASM entry point, runs once when the module is instantiated
#[wasm_bindgen(start)]
pub fn main() {
    wasm_logger::init(wasm_logger::Config::default());
    log::info!("Chat client WASM loaded");
}

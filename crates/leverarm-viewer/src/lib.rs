//! Lever Arm Viewer - Application assembly
//!
//! Builds the Bevy app around the core session and the scene plugin. On the
//! web the entry point is [`start`]; natively it is the `leverarm` binary.

pub mod app;

#[cfg(target_arch = "wasm32")]
mod web;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// WASM entry point
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() {
    // Set up panic hook for better error messages
    console_error_panic_hook::set_once();

    // Initialize logging with filtering to reduce noise
    tracing_wasm::set_as_global_default_with_config(
        tracing_wasm::WASMLayerConfigBuilder::new()
            .set_max_level(tracing::Level::INFO)
            .build(),
    );

    if let Err(e) = web::launch() {
        tracing::error!("Viewer did not start: {:#}", e);
    }
}

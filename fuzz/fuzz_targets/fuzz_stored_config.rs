//! Fuzz target: stored configuration blob
//!
//! Feeds arbitrary bytes to `MemoryConfigStore` and builds a controller
//! from it, verifying:
//! - No panics under arbitrary byte inputs
//! - Any config that loads also validates
//! - The resulting controller always runs with a valid config
//!
//! cargo fuzz run fuzz_stored_config

#![no_main]

use libfuzzer_sys::fuzz_target;
use pulsemind::adapters::memory_store::MemoryConfigStore;
use pulsemind::{ConfigPort, PacingController};

fuzz_target!(|data: &[u8]| {
    let store = MemoryConfigStore::with_raw(data.to_vec());

    if let Ok(config) = store.load() {
        assert!(config.validate().is_ok(), "loaded config must validate");
    }

    let controller = PacingController::from_store(&store);
    assert!(controller.config().validate().is_ok());
});

//! Fuzz target for TOML config parsing and validation.
//!
//! Ensures that malformed TOML input doesn't cause panics, and that
//! validation handles whatever field values survive parsing.

#![no_main]

use libfuzzer_sys::fuzz_target;
use werbench::Config;

fuzz_target!(|data: &[u8]| {
    // Only process valid UTF-8 strings
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(config) = toml::from_str::<Config>(s) {
            // Validation must reject, never panic
            let _ = config.validate();
        }
    }
});

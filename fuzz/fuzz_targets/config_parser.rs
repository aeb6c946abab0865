//! Fuzz target for the resolver configuration parser.
//!
//! Feeds arbitrary TOML strings to the parser and validates whatever parses.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_config_parser
//! ```

#![no_main]

use libfuzzer_sys::fuzz_target;
use sluice_migrate::ResolverConfig;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // The parser should never panic, only return errors
        if let Ok(config) = ResolverConfig::from_str(input) {
            let _ = config.validate();
            let _ = config.parsed_locations();
        }
    }
});

//! Structured fuzzing for migration name extraction.
//!
//! Generates names from arbitrary prefixes, separators and bodies to check
//! that extraction returns errors instead of panicking on odd input.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_migration_name
//! ```

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use sluice_migrate::NamingConvention;

#[derive(Debug, Arbitrary)]
struct FuzzName<'a> {
    prefix: &'a str,
    separator: &'a str,
    suffix: &'a str,
    name: &'a str,
    repeatable: bool,
}

fuzz_target!(|input: FuzzName<'_>| {
    if input.prefix.is_empty() || input.separator.is_empty() {
        return;
    }
    let convention = NamingConvention::new(input.prefix, input.separator, input.suffix);
    if !convention.matches(input.name) {
        return;
    }

    if let Ok((version, description)) = convention.extract(input.name, input.repeatable) {
        assert_eq!(version.is_none(), input.repeatable);
        assert!(!description.trim().is_empty());
    }
});

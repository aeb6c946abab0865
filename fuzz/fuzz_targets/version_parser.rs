//! Fuzz target for version parsing and comparison.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_version_parser
//! ```

#![no_main]

use std::cmp::Ordering;

use libfuzzer_sys::fuzz_target;
use sluice_migrate::Version;

fuzz_target!(|input: (&str, &str)| {
    let (Ok(a), Ok(b)) = (Version::parse(input.0), Version::parse(input.1)) else {
        return;
    };

    // Comparison must be antisymmetric and agree with equality.
    assert_eq!(a.cmp(&b), b.cmp(&a).reverse());
    assert_eq!(a == b, a.cmp(&b) == Ordering::Equal);

    // The display form parses back to an equal version.
    let reparsed = Version::parse(&a.to_string()).expect("display form must parse");
    assert_eq!(reparsed, a);
});

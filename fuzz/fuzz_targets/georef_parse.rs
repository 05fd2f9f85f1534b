//! Fuzz target for the geoReference descriptor codec.
//!
//! Any descriptor that parses must also rewrite and re-parse to the new
//! origin.

#![no_main]

use libfuzzer_sys::fuzz_target;
use xodr_transform::geo::{GeoPoint, GeoReference};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(georef) = GeoReference::parse(text) {
        let origin = GeoPoint::new(12.5, -45.25);
        let rewritten = georef.rewrite(origin);
        let reparsed = GeoReference::parse(&rewritten).expect("rewritten descriptor parses");
        assert_eq!(reparsed.origin(), origin);
    }
});

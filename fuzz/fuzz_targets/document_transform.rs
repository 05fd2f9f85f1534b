//! Fuzz target for whole-document transforms.
//!
//! This fuzzer feeds arbitrary byte sequences to the document transform,
//! checking for panics, crashes, or hangs.

#![no_main]

use libfuzzer_sys::fuzz_target;
use xodr_transform::transform::transform_document;
use xodr_transform::TransformRequest;

fuzz_target!(|data: &[u8]| {
    // Cap input size to avoid excessive memory usage.
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    let request = TransformRequest::new().with_rotation_deg(45.0);
    let _ = transform_document(text, &request);
});

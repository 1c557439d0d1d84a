//! Fuzzing target for spec key parsing
//!
//! Any string must either parse into a path element or produce an error,
//! and every parsed element must render a canonical form.
//!
//! Copyright (c) 2025 Treeshift Team
//! Licensed under the Apache-2.0 license

#![no_main]

use libfuzzer_sys::fuzz_target;
use treeshift_core::path::{split_alternatives, PathElement, Transpose};
use treeshift_core::OutputPath;

fuzz_target!(|data: &[u8]| {
    let key = String::from_utf8_lossy(data);

    if let Ok(element) = PathElement::parse(&key) {
        let _ = element.canonical();
    }
    if let Ok(alternatives) = split_alternatives(&key) {
        for alternative in alternatives {
            let _ = PathElement::parse(&alternative);
        }
    }
    let _ = OutputPath::parse(&key, "root");
    let _ = Transpose::parse(&key);
});

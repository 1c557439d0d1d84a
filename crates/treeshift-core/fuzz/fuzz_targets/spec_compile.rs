//! Fuzzing target for spec compilation
//!
//! Arbitrary JSON documents are compiled by every operation; compilation
//! must return an error instead of panicking.
//!
//! Copyright (c) 2025 Treeshift Team
//! Licensed under the Apache-2.0 license

#![no_main]

use libfuzzer_sys::fuzz_target;
use serde_json::Value;
use treeshift_core::{Cardinality, Chain, Defaults, Modify, ModifyMode, Remove, Shift};

fuzz_target!(|data: &[u8]| {
    let Ok(spec) = serde_json::from_slice::<Value>(data) else {
        return;
    };

    let _ = Shift::new(&spec);
    let _ = Defaults::new(&spec);
    let _ = Remove::new(&spec);
    let _ = Cardinality::new(&spec);
    let _ = Modify::new(ModifyMode::Overwrite, &spec);
    let _ = Chain::new(&spec);
});

//! Fuzzing target for applying compiled specs
//!
//! The first byte picks the split between a spec and an input document.
//! Whenever both parse and the spec compiles, applying it must not panic.
//!
//! Copyright (c) 2025 Treeshift Team
//! Licensed under the Apache-2.0 license

#![no_main]

use libfuzzer_sys::fuzz_target;
use serde_json::{json, Value};
use treeshift_core::{Defaults, Modify, ModifyMode, Remove, Shift};

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }

    let split_point = (data[0] as usize) % data.len();
    let (spec_bytes, input_bytes) = data[1..].split_at(split_point.min(data.len() - 1));

    let Ok(spec) = serde_json::from_slice::<Value>(spec_bytes) else {
        return;
    };
    let mut inputs = vec![json!(null), json!([1, [2, 3]]), json!({"a": {"b": [{"c": 1}]}})];
    if let Ok(input) = serde_json::from_slice::<Value>(input_bytes) {
        inputs.push(input);
    }

    let shift = Shift::new(&spec).ok();
    let defaults = Defaults::new(&spec).ok();
    let remove = Remove::new(&spec).ok();
    let modify = Modify::new(ModifyMode::Overwrite, &spec).ok();

    for input in &inputs {
        if let Some(shift) = &shift {
            let _ = shift.apply(input);
        }
        if let Some(defaults) = &defaults {
            let _ = defaults.apply(input);
        }
        if let Some(remove) = &remove {
            let _ = remove.apply(input);
        }
        if let Some(modify) = &modify {
            let _ = modify.apply(input);
        }
    }
});

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fuzz target for the unpacking pass
//!
//! Feeds arbitrary bytes to deserialization of leaves, containers, tagged
//! values and derived aggregates. None of these operations should panic on
//! any input; re-serializing a successful result must also succeed.

#![no_main]

use libfuzzer_sys::fuzz_target;
use stowage::{Reconstruct, Serialize};

#[derive(Debug, Default, Serialize, Reconstruct)]
struct Header {
    version: u16,
    name: String,
    sections: Vec<(u32, Vec<u8>)>,
    checksum: Option<u64>,
}

#[derive(Debug, Default, Serialize, Reconstruct)]
enum Node {
    #[default]
    Leaf,
    Value(i64),
    Branch(Vec<Node>),
    Labeled { label: char, child: Box<Node> },
}

fuzz_target!(|data: &[u8]| {
    // ----------------------------------------------------------------
    // 1. Leaves and validated scalars
    // ----------------------------------------------------------------
    let _ = stowage::deserialize_value::<u64>(data);
    let _ = stowage::deserialize_value::<f64>(data);
    let _ = stowage::deserialize_value::<bool>(data);
    let _ = stowage::deserialize_value::<char>(data);
    let _ = stowage::deserialize_value::<[u32; 4]>(data);

    // ----------------------------------------------------------------
    // 2. Containers - hostile length prefixes must not allocate blindly
    // ----------------------------------------------------------------
    let _ = stowage::deserialize_value::<String>(data);
    let _ = stowage::deserialize_value::<Vec<u8>>(data);
    let _ = stowage::deserialize_value::<Vec<String>>(data);
    let _ = stowage::deserialize_value::<Option<Vec<f32>>>(data);
    let _ = stowage::deserialize_value::<(u8, String, [bool; 3])>(data);

    // ----------------------------------------------------------------
    // 3. Derived aggregates, round trip on success
    // ----------------------------------------------------------------
    if let Ok(mut header) = stowage::deserialize_value::<Header>(data) {
        let _ = stowage::serialize(&mut header);
    }
    if let Ok(mut node) = stowage::deserialize::<Node>(data) {
        let _ = stowage::serialize(&mut *node);
    }

    // ----------------------------------------------------------------
    // 4. In-place into an existing value
    // ----------------------------------------------------------------
    let mut target = Header {
        version: 1,
        name: "seed".into(),
        sections: vec![(0, vec![1, 2, 3])],
        checksum: Some(0),
    };
    let _ = stowage::deserialize_in_place(data, &mut target);
});

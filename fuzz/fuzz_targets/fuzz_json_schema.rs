#![no_main]

use libfuzzer_sys::fuzz_target;
use schemata::fragment::{Fragment, or_merge};
use schemata::{JsonSchemaOptions, Schema, Target, serialize};
use serde_json::Value;

const TARGETS: [Target; 3] = [Target::Default, Target::JsonSchema, Target::OpenApi];

fuzz_target!(|data: &[u8]| {
    let Ok(expr) = serde_json::from_slice::<Value>(data) else {
        return;
    };
    let Ok(schema) = Schema::new(expr) else {
        return;
    };

    for target in TARGETS {
        let Ok(Some(derived)) = schema.json_schema(&JsonSchemaOptions::new(target)) else {
            continue;
        };
        let text = match serialize::to_json(&derived) {
            Ok(t) => t,
            Err(_) => continue,
        };
        let Ok(back) = serde_json::from_str::<Value>(&text) else {
            panic!("derived schema does not read back:\n{text}");
        };
        if back != derived {
            panic!("derived schema changed through JSON:\n{derived}\n{back}");
        }

        let fragment = Fragment::from_value(derived);
        let once = or_merge([fragment.clone()], target);
        let twice = or_merge([fragment.clone(), fragment], target);
        if once != twice {
            panic!("or_merge is not idempotent: {once:?} vs {twice:?}");
        }
    }
});

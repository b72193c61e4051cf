#![no_main]

use json_stamp::substitution::path::resolve;
use libfuzzer_sys::fuzz_target;
use serde_json::json;

fuzz_target!(|path: &str| {
    let mut document = json!({
        "Foo": [1, {"Bar": [true, null]}, [2, 3]],
        "foo": "shadow",
        "Nested": {"Value": 1.5}
    });
    let _ = resolve(&mut document, path);
});

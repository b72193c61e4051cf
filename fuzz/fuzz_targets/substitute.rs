#![no_main]

use json_stamp::substitution::JsonSubstituter;
use json_stamp::variables::Variables;
use libfuzzer_sys::fuzz_target;

// Input layout: key, value and document separated by NUL bytes.
fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let mut parts = text.splitn(3, '\0');
    let (Some(key), Some(value), Some(source)) = (parts.next(), parts.next(), parts.next()) else {
        return;
    };

    let mut vars = Variables::new();
    vars.insert(key, value);
    let out = JsonSubstituter::default().substitute(&vars, source);
    if !out.was_substituted {
        assert_eq!(out.text, source);
    }
});

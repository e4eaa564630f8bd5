#![no_main]
use devector::hardware::Request;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(value) = serde_json::from_slice::<serde_json::Value>(data) {
        // never panics, unknown input maps to Request::Unknown
        let _ = Request::from_json(&value);
    }
});

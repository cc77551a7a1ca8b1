#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Parsing arbitrary bytes as a DEFLATE stream must never panic,
    // whether it succeeds or returns an error.
    let _ = deflopt::parse_stream(data);
});

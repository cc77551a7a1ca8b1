#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Any stream that parses must also survive dump -> load -> serialize
    // without panicking, and must round-trip to the same bytes.
    if let Ok(blocks) = deflopt::parse_stream(data) {
        let dumped = deflopt::text::dump_stream(&blocks);
        if let Ok(reloaded) = deflopt::text::load_stream(&dumped) {
            if let Ok(original_bytes) = deflopt::serialize_stream(&blocks) {
                if let Ok(reloaded_bytes) = deflopt::serialize_stream(&reloaded) {
                    assert_eq!(original_bytes, reloaded_bytes);
                }
            }
        }
    }
});

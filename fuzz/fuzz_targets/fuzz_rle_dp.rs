#![no_main]
use deflopt::cl::RleDpCache;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() < 19 {
        return;
    }
    let mut cl_lengths = [0u8; 19];
    cl_lengths.copy_from_slice(&data[..19]);
    for l in cl_lengths.iter_mut() {
        *l %= 8;
    }
    let combined: Vec<u8> = data[19..].iter().map(|b| b % 19).collect();
    let mut cache = RleDpCache::new();
    // Must never panic regardless of how degenerate the cost table is.
    let _ = cache.encode(&combined, &cl_lengths);
});

//! End-to-end integration tests for deflopt.
//!
//! Exercises the library against real DEFLATE streams produced by flate2,
//! not just hand-built synthetic blocks, so the parser/serializer/optimizer
//! are tested against streams nobody wrote by hand.

use std::io::{Read, Write};
use std::process::Command;

use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;

use deflopt::huffman::canonical::{is_valid as huffman_lengths_valid, CanonicalHuffman};
use deflopt::{optimize_deflate_stream, parse_stream, serialize_stream, text, Block, ByteLengthScore, OptimizerParams};

fn compress(data: &[u8], level: Compression) -> Vec<u8> {
    let mut enc = DeflateEncoder::new(Vec::new(), level);
    enc.write_all(data).unwrap();
    enc.finish().unwrap()
}

fn decompress(data: &[u8]) -> Vec<u8> {
    let mut dec = DeflateDecoder::new(data);
    let mut out = Vec::new();
    dec.read_to_end(&mut out).unwrap();
    out
}

fn repetitive_text(reps: usize) -> Vec<u8> {
    "the quick brown fox jumps over the lazy dog, the quick brown fox sleeps. ".repeat(reps).into_bytes()
}

fn mixed_binary(size: usize, seed: u64) -> Vec<u8> {
    let mut data = Vec::with_capacity(size);
    let mut state = seed | 1;
    for _ in 0..size {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        data.push((state & 0xFF) as u8);
    }
    data
}

// ============================================================================
// Parse / serialize round trips against real compressed streams
// ============================================================================

#[test]
fn test_parse_then_serialize_preserves_decompressed_content() {
    for level in [Compression::fast(), Compression::default(), Compression::best()] {
        let original = repetitive_text(40);
        let compressed = compress(&original, level);

        let blocks = parse_stream(&compressed).unwrap();
        let reserialized = serialize_stream(&blocks).unwrap();

        assert_eq!(decompress(&reserialized), original);
    }
}

#[test]
fn test_parse_then_serialize_on_incompressible_binary() {
    let original = mixed_binary(5_000, 42);
    let compressed = compress(&original, Compression::fast());

    let blocks = parse_stream(&compressed).unwrap();
    let reserialized = serialize_stream(&blocks).unwrap();

    assert_eq!(decompress(&reserialized), original);
}

#[test]
fn test_parsed_dynamic_block_lengths_satisfy_kraft() {
    let original = repetitive_text(100);
    let compressed = compress(&original, Compression::best());
    let blocks = parse_stream(&compressed).unwrap();

    let mut saw_dynamic = false;
    for block in &blocks {
        if let Block::Dynamic { litlen_lengths, dist_lengths, .. } = block {
            saw_dynamic = true;
            assert!(huffman_lengths_valid(litlen_lengths, 15));
            assert!(huffman_lengths_valid(dist_lengths, 15));
        }
    }
    assert!(saw_dynamic, "expected at least one dynamic block from repetitive input");
}

// ============================================================================
// Huffman canonicalization and Kraft guard
// ============================================================================

#[test]
fn test_oversubscribed_lengths_are_rejected() {
    // Three length-1 codes cannot coexist in a binary tree.
    assert!(CanonicalHuffman::from_lengths(&[1, 1, 1]).is_err());
}

#[test]
fn test_incomplete_tree_is_rejected() {
    // A single length-3 code leaves the tree incomplete.
    assert!(CanonicalHuffman::from_lengths(&[0, 0, 3]).is_err());
}

#[test]
fn test_canonical_code_round_trips_every_symbol() {
    let lengths = deflopt::huffman::tables::fixed_literal_lengths();
    let huff = CanonicalHuffman::from_lengths(&lengths).unwrap();

    let mut bw = deflopt::bits::BitWriter::new();
    for sym in 0..288usize {
        if lengths[sym] > 0 {
            huff.write(&mut bw, sym);
        }
    }
    let bytes = bw.finish();
    let mut br = deflopt::bits::BitReader::new(bytes.as_slice());
    for sym in 0..288usize {
        if lengths[sym] > 0 {
            assert_eq!(huff.read(&mut br).unwrap() as usize, sym);
        }
    }
}

// ============================================================================
// RLE-DP optimality vs. the greedy reference encoder
// ============================================================================

#[test]
fn test_rle_dp_never_costs_more_than_greedy_on_real_header() {
    use deflopt::cl::RleDpCache;

    let original = repetitive_text(200);
    let compressed = compress(&original, Compression::best());
    let blocks = parse_stream(&compressed).unwrap();

    for block in &blocks {
        if let Block::Dynamic { litlen_lengths, dist_lengths, cl_lengths, .. } = block {
            let mut combined = litlen_lengths.clone();
            combined.extend_from_slice(dist_lengths);

            let mut cache = RleDpCache::new();
            let dp = cache.encode(&combined, cl_lengths).unwrap();
            let greedy = deflopt::cl::rle_dp::encode_greedy(&combined, cl_lengths);

            let cost = |emissions: &[deflopt::cl::ClEmission]| -> i64 {
                emissions.iter().map(|&(sym, _, extra)| cl_lengths[sym as usize] as i64 + extra as i64).sum()
            };
            assert!(cost(&dp) <= cost(&greedy));
        }
    }
}

// ============================================================================
// Optimizer: monotone improvement, determinism, content preservation
// ============================================================================

#[test]
fn test_optimizer_never_grows_a_real_stream() {
    let original = repetitive_text(150);
    let compressed = compress(&original, Compression::best());
    let blocks = parse_stream(&compressed).unwrap();

    let scorer = ByteLengthScore;
    let params = OptimizerParams { num_iteration: 100, ..Default::default() };
    let optimized = optimize_deflate_stream(&blocks, &scorer, &params, false).unwrap();

    assert!(optimized.len() <= compressed.len());
    assert_eq!(decompress(&optimized), original);
}

#[test]
fn test_optimizer_is_deterministic_under_fixed_seed() {
    let original = repetitive_text(150);
    let compressed = compress(&original, Compression::best());
    let blocks = parse_stream(&compressed).unwrap();

    let scorer = ByteLengthScore;
    let params = OptimizerParams { num_iteration: 80, seed: 99, ..Default::default() };

    let a = optimize_deflate_stream(&blocks, &scorer, &params, false).unwrap();
    let b = optimize_deflate_stream(&blocks, &scorer, &params, false).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_optimizer_preserves_content_on_binary_data() {
    let original = mixed_binary(3_000, 7);
    let compressed = compress(&original, Compression::fast());
    let blocks = parse_stream(&compressed).unwrap();

    let scorer = ByteLengthScore;
    let params = OptimizerParams { num_iteration: 60, ..Default::default() };
    let optimized = optimize_deflate_stream(&blocks, &scorer, &params, false).unwrap();

    assert_eq!(decompress(&optimized), original);
}

// ============================================================================
// Text dump/load fixture format
// ============================================================================

#[test]
fn test_text_dump_load_round_trips_real_stream() {
    let original = repetitive_text(60);
    let compressed = compress(&original, Compression::default());
    let blocks = parse_stream(&compressed).unwrap();

    let dumped = text::dump_stream(&blocks);
    let reloaded = text::load_stream(&dumped).unwrap();

    let original_bytes = serialize_stream(&blocks).unwrap();
    let reloaded_bytes = serialize_stream(&reloaded).unwrap();
    assert_eq!(original_bytes, reloaded_bytes);
    assert_eq!(decompress(&reloaded_bytes), original);
}

// ============================================================================
// CLI (requires the binary to be built; run with --ignored)
// ============================================================================

#[test]
#[ignore]
fn test_cli_dump_then_load_round_trips() {
    let original = repetitive_text(60);
    let compressed = compress(&original, Compression::default());

    let dir = tempfile::tempdir().unwrap();
    let input_path = dir.path().join("in.deflate");
    let dump_path = dir.path().join("dump.txt");
    let output_path = dir.path().join("out.deflate");
    std::fs::write(&input_path, &compressed).unwrap();

    let dump_status = Command::new("cargo")
        .args(["run", "--bin", "deflopt", "--", "dump", "--input"])
        .arg(&input_path)
        .arg("--output")
        .arg(&dump_path)
        .status()
        .expect("failed to run dump subcommand");
    assert!(dump_status.success());

    let load_status = Command::new("cargo")
        .args(["run", "--bin", "deflopt", "--", "load", "--input"])
        .arg(&dump_path)
        .arg("--output")
        .arg(&output_path)
        .status()
        .expect("failed to run load subcommand");
    assert!(load_status.success());

    let round_tripped = std::fs::read(&output_path).unwrap();
    assert_eq!(decompress(&round_tripped), original);
}

#[test]
#[ignore]
fn test_cli_optimize_shrinks_or_matches_input() {
    let original = repetitive_text(150);
    let compressed = compress(&original, Compression::best());

    let dir = tempfile::tempdir().unwrap();
    let input_path = dir.path().join("in.deflate");
    let output_path = dir.path().join("out.deflate");
    std::fs::write(&input_path, &compressed).unwrap();

    let status = Command::new("cargo")
        .args(["run", "--bin", "deflopt", "--", "optimize", "--input"])
        .arg(&input_path)
        .arg("--output")
        .arg(&output_path)
        .args(["--iterations", "100"])
        .status()
        .expect("failed to run optimize subcommand");
    assert!(status.success());

    let optimized = std::fs::read(&output_path).unwrap();
    assert!(optimized.len() <= compressed.len());
    assert_eq!(decompress(&optimized), original);
}

//! Rebuilds a dynamic-block header from a candidate pair of litlen/dist
//! code-length vectors: trims trailing unused lengths, re-runs the CL
//! run-length DP (using the *previous* CL tree's costs as a guide) to see
//! which CL symbols are actually used, then fits a fresh length-limited CL
//! tree to that usage and derives `HCLEN` from it.

use crate::cl::RleDpCache;
use crate::deflate::tables::CODE_LENGTH_ORDER;
use crate::huffman::length_limited::lengths_from_frequencies;

pub struct BuiltHeader {
    pub litlen_lengths: Vec<u8>,
    pub dist_lengths: Vec<u8>,
    pub cl_lengths: [u8; 19],
    pub hclen: usize,
}

fn last_nonzero_index(lengths: &[u8]) -> Option<usize> {
    lengths.iter().rposition(|&l| l != 0)
}

pub fn build_header_from_lengths(
    litlen_lengths_in: &[u8],
    dist_lengths_in: &[u8],
    prev_cl_lengths: &[u8; 19],
    cache: &mut RleDpCache,
) -> BuiltHeader {
    let num_litlen = last_nonzero_index(litlen_lengths_in).map(|i| i + 1).unwrap_or(0).max(257);
    let num_dist = last_nonzero_index(dist_lengths_in).map(|i| i + 1).unwrap_or(0).max(1);

    let mut litlen_lengths = litlen_lengths_in[..num_litlen.min(litlen_lengths_in.len())].to_vec();
    litlen_lengths.resize(num_litlen, 0);
    let mut dist_lengths = dist_lengths_in[..num_dist.min(dist_lengths_in.len())].to_vec();
    dist_lengths.resize(num_dist, 0);

    let mut combined = Vec::with_capacity(num_litlen + num_dist);
    combined.extend_from_slice(&litlen_lengths);
    combined.extend_from_slice(&dist_lengths);

    // A guide RLE pass, priced by the header we're replacing; only its
    // symbol *usage* matters here, not the exact bits it would write.
    let emissions = match cache.encode(&combined, prev_cl_lengths) {
        Ok(e) => e,
        Err(_) => cache.encode(&combined, &[1u8; 19]).expect("uniform-cost CL encode cannot fail"),
    };

    let mut cl_freq = [0u64; 19];
    for (sym, _, _) in &emissions {
        cl_freq[*sym as usize] += 1;
    }

    let cl_lengths_vec = lengths_from_frequencies(&cl_freq, 7);
    let mut cl_lengths = [0u8; 19];
    cl_lengths.copy_from_slice(&cl_lengths_vec);

    let last_order_idx = (0..19).rev().find(|&i| cl_lengths[CODE_LENGTH_ORDER[i]] != 0);
    let hclen = match last_order_idx {
        Some(i) if i + 1 > 4 => i + 1 - 4,
        _ => 0,
    };

    // Lengths beyond the transmitted window are already zero by
    // construction (the window is sized to cover every nonzero length);
    // this just makes that invariant explicit.
    for &sym in CODE_LENGTH_ORDER.iter().skip(hclen + 4) {
        cl_lengths[sym] = 0;
    }

    BuiltHeader { litlen_lengths, dist_lengths, cl_lengths, hclen }
}

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::bits::BitWriter;
use crate::cl::{ClEmission, RleDpCache};
use crate::deflate::tables::{encode_distance, encode_length};
use crate::deflate::{Block, Token};
use crate::error::{Error, Result};
use crate::huffman::canonical::is_valid as huffman_lengths_valid;
use crate::score::ScoreFn;

use super::header_builder::{build_header_from_lengths, BuiltHeader};
use super::params::{OptimizerParams, LITLEN_PERTURBATION_PROBABILITY};

const INF_BITS: i64 = 1 << 60;

/// Per-symbol usage counts for a block's token stream, seeded with the
/// mandatory end-of-block symbol so its cost is never forgotten when
/// estimating a candidate header's size.
struct Usage {
    litlen_freq: [u64; 286],
    dist_freq: [u64; 30],
    extra_bits_sum: i64,
}

fn collect_usage(tokens: &[Token]) -> Usage {
    let mut litlen_freq = [0u64; 286];
    let mut dist_freq = [0u64; 30];
    let mut extra_bits_sum = 0i64;
    litlen_freq[256] = 1;

    for tok in tokens {
        match *tok {
            Token::Literal(b) => litlen_freq[b as usize] += 1,
            Token::Match { length, distance } => {
                let (lcode, _, lextra_bits) = encode_length(length).expect("length in range");
                litlen_freq[lcode as usize] += 1;
                extra_bits_sum += lextra_bits as i64;

                let (dcode, _, dextra_bits) = encode_distance(distance).expect("distance in range");
                dist_freq[dcode as usize] += 1;
                extra_bits_sum += dextra_bits as i64;
            }
        }
    }

    Usage { litlen_freq, dist_freq, extra_bits_sum }
}

fn header_bits(built: &BuiltHeader, emissions: &[ClEmission]) -> i64 {
    let mut bits = 5 + 5 + 4 + (built.hclen as i64 + 4) * 3;
    for &(sym, _, extra_bits) in emissions {
        bits += built.cl_lengths[sym as usize] as i64 + extra_bits as i64;
    }
    bits
}

/// Estimates the total bit length a block would serialize to, given a
/// built header and a token stream's usage. A candidate whose tree doesn't
/// cover a symbol actually used in the stream costs effectively infinite,
/// so it is never mistaken for an improvement.
fn estimate_block_bits(built: &BuiltHeader, usage: &Usage, emissions: &[ClEmission]) -> i64 {
    let mut total = usage.extra_bits_sum + header_bits(built, emissions);
    for (sym, &freq) in usage.litlen_freq.iter().enumerate() {
        if freq == 0 {
            continue;
        }
        let len = built.litlen_lengths.get(sym).copied().unwrap_or(0);
        if len == 0 {
            return INF_BITS;
        }
        total += len as i64 * freq as i64;
    }
    for (sym, &freq) in usage.dist_freq.iter().enumerate() {
        if freq == 0 {
            continue;
        }
        let len = built.dist_lengths.get(sym).copied().unwrap_or(0);
        if len == 0 {
            return INF_BITS;
        }
        total += len as i64 * freq as i64;
    }
    total
}

fn perturb_swap(lengths: &mut [u8], rng: &mut StdRng) {
    let nonzero: Vec<usize> = lengths.iter().enumerate().filter(|&(_, &l)| l > 0).map(|(i, _)| i).collect();
    if nonzero.len() < 2 {
        return;
    }
    let a = nonzero[rng.gen_range(0..nonzero.len())];
    let mut b = nonzero[rng.gen_range(0..nonzero.len())];
    let mut guard = 0;
    while b == a && guard < 8 {
        b = nonzero[rng.gen_range(0..nonzero.len())];
        guard += 1;
    }
    lengths.swap(a, b);
}

/// Applies `num` individual swaps, each landing on the litlen vector with
/// probability `LITLEN_PERTURBATION_PROBABILITY` and the distance vector
/// otherwise.
fn random_perturb_lengths(litlen: &mut [u8], dist: &mut [u8], num: u32, rng: &mut StdRng) {
    for _ in 0..num {
        if rng.gen::<f64>() < LITLEN_PERTURBATION_PROBABILITY {
            perturb_swap(litlen, rng);
        } else {
            perturb_swap(dist, rng);
        }
    }
}

pub struct BlockOptimizeResult {
    pub best_block: Block,
    pub best_score: u64,
    /// Candidates that passed the Kraft/tolerance gates and were built.
    pub tried: u32,
    /// Candidates that made it all the way to a full sandwich score.
    pub accepted: u32,
}

/// Scores `block` as it would appear sandwiched between everything already
/// emitted (`prefix`) and the next block's leading bits (`suffix`), handing
/// only the whole-byte portion of the result to `scorer`.
fn sandwich_score(
    prefix: &BitWriter,
    suffix_bits: u32,
    suffix_width: u8,
    block: &Block,
    cache: &mut RleDpCache,
    scorer: &dyn ScoreFn,
) -> Result<u64> {
    let mut bw = prefix.clone();
    block.to_bits(&mut bw, cache)?;
    bw.write_bits(suffix_bits, suffix_width);
    Ok(scorer.score(bw.as_bytes()))
}

/// Runs the perturbation search over one dynamic-Huffman block's code
/// lengths, returning the best-scoring header found (or the original
/// block's header, if nothing improved on it).
#[allow(clippy::too_many_arguments)]
pub fn optimize_deflate_block(
    base: &Block,
    scorer: &dyn ScoreFn,
    prefix: &BitWriter,
    suffix_bits: u32,
    suffix_width: u8,
    params: &OptimizerParams,
    cache: &mut RleDpCache,
) -> Result<BlockOptimizeResult> {
    let Block::Dynamic { bfinal, litlen_lengths, dist_lengths, cl_lengths, tokens, .. } = base else {
        return Err(Error::InvalidArgument("optimize_deflate_block requires a dynamic block".into()));
    };

    let base_score = sandwich_score(prefix, suffix_bits, suffix_width, base, cache, scorer)?;
    let usage = collect_usage(tokens);

    let mut rng = StdRng::seed_from_u64(params.seed);

    let mut search_litlen = litlen_lengths.clone();
    let mut search_dist = dist_lengths.clone();
    // The CL tree used to cost a candidate header evolves with the best
    // block found so far, matching the reference search (it always rebuilds
    // against `best_block`'s CL lengths, not the original input's).
    let mut best_cl_lengths = *cl_lengths;

    // `base_bits` is the fixed baseline estimate from the original block's
    // own header; it never moves and anchors the tolerance gate below. It
    // happens to equal the initial `search_bits`, since the search starts
    // from the same lengths.
    let base_built = build_header_from_lengths(&search_litlen, &search_dist, &best_cl_lengths, cache);
    let base_combined = combined_lengths(&base_built);
    let base_emissions = cache.encode(&base_combined, &base_built.cl_lengths)?;
    let base_bits = estimate_block_bits(&base_built, &usage, &base_emissions);
    let mut search_bits = base_bits;

    let mut best_score = base_score;
    let mut best_litlen = litlen_lengths.clone();
    let mut best_dist = dist_lengths.clone();

    let mut tried = 0u32;
    let mut accepted = 0u32;

    while best_score as i64 > params.terminate_threshold as i64 && tried < params.num_iteration {
        let mut cand_litlen = search_litlen.clone();
        let mut cand_dist = search_dist.clone();
        random_perturb_lengths(&mut cand_litlen, &mut cand_dist, params.num_perturbation, &mut rng);

        if !huffman_lengths_valid(&cand_litlen, 15) || !huffman_lengths_valid(&cand_dist, 15) {
            continue;
        }
        tried += 1;

        let built = build_header_from_lengths(&cand_litlen, &cand_dist, &best_cl_lengths, cache);
        let combined = combined_lengths(&built);
        let emissions = match cache.encode(&combined, &built.cl_lengths) {
            Ok(e) => e,
            Err(_) => continue,
        };
        let est_bits = estimate_block_bits(&built, &usage, &emissions);

        // Gated against the fixed baseline, not the drifting search base,
        // so the tolerance window stays anchored to the original block.
        if est_bits - base_bits > params.tolerance_bit {
            continue;
        }

        // Fast-estimate improvement moves the search base even when it
        // doesn't beat the true best found so far; the two are decoupled
        // on purpose so the search can wander through plausible-looking
        // candidates without the opaque scorer vetoing every step.
        if est_bits < search_bits {
            search_litlen = cand_litlen.clone();
            search_dist = cand_dist.clone();
            search_bits = est_bits;
        }

        let candidate = Block::Dynamic {
            bfinal: *bfinal,
            litlen_lengths: built.litlen_lengths.clone(),
            dist_lengths: built.dist_lengths.clone(),
            cl_lengths: built.cl_lengths,
            hclen: built.hclen,
            tokens: tokens.clone(),
        };
        let full_score = sandwich_score(prefix, suffix_bits, suffix_width, &candidate, cache, scorer)?;
        accepted += 1;
        if full_score < best_score {
            best_score = full_score;
            best_litlen = built.litlen_lengths;
            best_dist = built.dist_lengths;
            best_cl_lengths = built.cl_lengths;
        }
    }

    let best_built = build_header_from_lengths(&best_litlen, &best_dist, &best_cl_lengths, cache);
    let best_block = Block::Dynamic {
        bfinal: *bfinal,
        litlen_lengths: best_built.litlen_lengths,
        dist_lengths: best_built.dist_lengths,
        cl_lengths: best_built.cl_lengths,
        hclen: best_built.hclen,
        tokens: tokens.clone(),
    };

    Ok(BlockOptimizeResult { best_block, best_score, tried, accepted })
}

fn combined_lengths(built: &BuiltHeader) -> Vec<u8> {
    let mut combined = Vec::with_capacity(built.litlen_lengths.len() + built.dist_lengths.len());
    combined.extend_from_slice(&built.litlen_lengths);
    combined.extend_from_slice(&built.dist_lengths);
    combined
}

/// Runs the block-by-block optimization pass over a whole parsed stream.
/// Stored and fixed-Huffman blocks pass through unchanged; dynamic blocks
/// go through `optimize_deflate_block` with the prefix/suffix sandwich
/// built from the stream's actual neighboring bits.
///
/// With `verbose` set, prints one line per dynamic block before the search
/// (its unmodified length and score) and one line after (how many
/// candidates were tried/scored and the best score found).
pub fn optimize_deflate_stream(blocks: &[Block], scorer: &dyn ScoreFn, params: &OptimizerParams, verbose: bool) -> Result<Vec<u8>> {
    let mut cache = RleDpCache::new();
    let mut output = BitWriter::new();

    for (i, block) in blocks.iter().enumerate() {
        match block {
            Block::Dynamic { .. } => {
                if verbose {
                    let mut solo = BitWriter::new();
                    let mut solo_cache = RleDpCache::new();
                    block.to_bits(&mut solo, &mut solo_cache)?;
                    let block_bytes = solo.finish();
                    eprintln!("[block#{i}] initial_length={} initial_score={}", block_bytes.len(), scorer.score(&block_bytes));
                }

                let prefix = output.clone();
                let (suffix_bits, suffix_width) = if block.is_final() {
                    (0u32, 7u8)
                } else {
                    let mut tmp = BitWriter::new();
                    let mut tmp_cache = RleDpCache::new();
                    blocks[i + 1].to_bits(&mut tmp, &mut tmp_cache)?;
                    (tmp.first_bits(7), 7u8)
                };
                let result = optimize_deflate_block(block, scorer, &prefix, suffix_bits, suffix_width, params, &mut cache)?;
                if verbose {
                    eprintln!("[block#{i}] tried={} accepted={} best_score={}", result.tried, result.accepted, result.best_score);
                }
                result.best_block.to_bits(&mut output, &mut cache)?;
            }
            _ => {
                if verbose {
                    eprintln!("[block#{i}] skipped (not dynamic huffman)");
                }
                block.to_bits(&mut output, &mut cache)?;
            }
        }
    }

    Ok(output.finish())
}

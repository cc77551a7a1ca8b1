use crate::bits::{BitReader, BitWriter};
use crate::cl::RleDpCache;
use crate::error::{Error, Result};
use crate::huffman::{tables as huff_tables, CanonicalHuffman};
use std::io::Read;

use super::header::DynHeader;
use super::tables::{decode_distance, decode_length, encode_distance, encode_length, DISTANCE_TABLE, LENGTH_TABLE};
use super::tokens::Token;

const EOB: u16 = 256;

/// One DEFLATE block, in any of the three RFC 1951 encodings.
///
/// Stored blocks carry raw bytes; fixed and dynamic blocks carry a token
/// stream with the end-of-block marker implicit (never stored in `tokens`).
/// A dynamic block additionally owns the exact code lengths its header was
/// built from, so an unmodified parse round-trips bit-for-bit.
pub enum Block {
    Stored {
        bfinal: bool,
        data: Vec<u8>,
    },
    Fixed {
        bfinal: bool,
        tokens: Vec<Token>,
    },
    Dynamic {
        bfinal: bool,
        litlen_lengths: Vec<u8>,
        dist_lengths: Vec<u8>,
        cl_lengths: [u8; 19],
        hclen: usize,
        tokens: Vec<Token>,
    },
}

impl Block {
    pub fn is_final(&self) -> bool {
        match self {
            Block::Stored { bfinal, .. } | Block::Fixed { bfinal, .. } | Block::Dynamic { bfinal, .. } => *bfinal,
        }
    }

    pub fn parse<R: Read>(br: &mut BitReader<R>) -> Result<Self> {
        let bfinal = br.read_bit()?;
        let btype = br.read_bits(2)?;
        match btype {
            0b00 => Self::parse_stored(br, bfinal),
            0b01 => Self::parse_fixed(br, bfinal),
            0b10 => Self::parse_dynamic(br, bfinal),
            _ => Err(Error::ReservedBlockType),
        }
    }

    fn parse_stored<R: Read>(br: &mut BitReader<R>, bfinal: bool) -> Result<Self> {
        br.align_to_byte();
        let len = br.read_u16_le()?;
        let nlen = br.read_u16_le()?;
        if len != !nlen {
            return Err(Error::StoredBlockLengthMismatch { len, nlen });
        }
        let mut data = vec![0u8; len as usize];
        br.read_bytes(&mut data)?;
        Ok(Block::Stored { bfinal, data })
    }

    fn parse_fixed<R: Read>(br: &mut BitReader<R>, bfinal: bool) -> Result<Self> {
        let litlen = CanonicalHuffman::from_lengths(&huff_tables::fixed_literal_lengths())?;
        let dist = CanonicalHuffman::from_lengths(&huff_tables::fixed_distance_lengths())?;
        let tokens = decode_tokens(br, &litlen, &dist)?;
        Ok(Block::Fixed { bfinal, tokens })
    }

    fn parse_dynamic<R: Read>(br: &mut BitReader<R>, bfinal: bool) -> Result<Self> {
        let (header, litlen, dist) = DynHeader::parse(br)?;
        let tokens = decode_tokens(br, &litlen, &dist)?;
        Ok(Block::Dynamic {
            bfinal,
            litlen_lengths: header.litlen_lengths,
            dist_lengths: header.dist_lengths,
            cl_lengths: header.cl_lengths,
            hclen: header.hclen,
            tokens,
        })
    }

    /// Serializes the block onto `bw`. For dynamic blocks this recomputes
    /// the CL run-length encoding from the stored code lengths via
    /// `cache`, rather than replaying whatever bit pattern was originally
    /// parsed — the two agree for an unmodified block, and this is the
    /// same code path the optimizer uses to emit a perturbed candidate.
    pub fn to_bits(&self, bw: &mut BitWriter, cache: &mut RleDpCache) -> Result<()> {
        match self {
            Block::Stored { bfinal, data } => {
                bw.write_bit(*bfinal);
                bw.write_bits(0b00, 2);
                bw.align_to_byte();
                let len = data.len() as u16;
                bw.write_u16_le(len);
                bw.write_u16_le(!len);
                bw.write_bytes(data);
                Ok(())
            }
            Block::Fixed { bfinal, tokens } => {
                bw.write_bit(*bfinal);
                bw.write_bits(0b01, 2);
                let litlen = CanonicalHuffman::from_lengths(&huff_tables::fixed_literal_lengths())?;
                let dist = CanonicalHuffman::from_lengths(&huff_tables::fixed_distance_lengths())?;
                encode_tokens(bw, tokens, &litlen, &dist);
                Ok(())
            }
            Block::Dynamic { bfinal, litlen_lengths, dist_lengths, cl_lengths, hclen, tokens } => {
                bw.write_bit(*bfinal);
                bw.write_bits(0b10, 2);
                write_dynamic_header_and_tokens(bw, cache, litlen_lengths, dist_lengths, cl_lengths, *hclen, tokens)
            }
        }
    }
}

fn decode_tokens<R: Read>(br: &mut BitReader<R>, litlen: &CanonicalHuffman, dist: &CanonicalHuffman) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    loop {
        let sym = litlen.read(br)?;
        if sym == EOB {
            break;
        }
        if sym < 256 {
            tokens.push(Token::Literal(sym as u8));
            continue;
        }
        let idx = (sym - 257) as usize;
        let (_, extra_bits) = LENGTH_TABLE[idx];
        let extra = br.read_bits(extra_bits)?;
        let length = decode_length(sym, extra).ok_or(Error::InvalidLengthCode(sym))?;

        let dsym = dist.read(br)?;
        if dsym as usize >= DISTANCE_TABLE.len() {
            return Err(Error::InvalidDistanceCode(dsym));
        }
        let (_, dextra_bits) = DISTANCE_TABLE[dsym as usize];
        let dextra = br.read_bits(dextra_bits)?;
        let distance = decode_distance(dsym, dextra).ok_or(Error::InvalidDistanceCode(dsym))?;

        tokens.push(Token::Match { length, distance });
    }
    Ok(tokens)
}

fn encode_tokens(bw: &mut BitWriter, tokens: &[Token], litlen: &CanonicalHuffman, dist: &CanonicalHuffman) {
    for tok in tokens {
        match *tok {
            Token::Literal(b) => litlen.write(bw, b as usize),
            Token::Match { length, distance } => {
                let (lcode, lextra_val, lextra_bits) = encode_length(length).expect("length in range");
                litlen.write(bw, lcode as usize);
                bw.write_bits(lextra_val as u32, lextra_bits);

                let (dcode, dextra_val, dextra_bits) = encode_distance(distance).expect("distance in range");
                dist.write(bw, dcode as usize);
                bw.write_bits(dextra_val as u32, dextra_bits);
            }
        }
    }
    litlen.write(bw, EOB as usize);
}

fn write_dynamic_header_and_tokens(
    bw: &mut BitWriter,
    cache: &mut RleDpCache,
    litlen_lengths: &[u8],
    dist_lengths: &[u8],
    cl_lengths: &[u8; 19],
    hclen: usize,
    tokens: &[Token],
) -> Result<()> {
    let hlit = litlen_lengths.len() - 257;
    let hdist = dist_lengths.len() - 1;

    let header = DynHeader {
        hlit,
        hdist,
        hclen,
        cl_lengths: *cl_lengths,
        litlen_lengths: litlen_lengths.to_vec(),
        dist_lengths: dist_lengths.to_vec(),
    };
    header.write_fixed_part(bw);

    let cl_huff = CanonicalHuffman::from_lengths(cl_lengths)?;
    let mut combined = Vec::with_capacity(litlen_lengths.len() + dist_lengths.len());
    combined.extend_from_slice(litlen_lengths);
    combined.extend_from_slice(dist_lengths);
    let emissions = cache.encode(&combined, cl_lengths)?;
    for (sym, extra_value, extra_bits) in emissions {
        cl_huff.write(bw, sym as usize);
        if extra_bits > 0 {
            bw.write_bits(extra_value as u32, extra_bits);
        }
    }

    let litlen = CanonicalHuffman::from_lengths(litlen_lengths)?;
    let dist = build_distance_codec(dist_lengths)?;
    encode_tokens(bw, tokens, &litlen, &dist);
    Ok(())
}

fn build_distance_codec(dist_lengths: &[u8]) -> Result<CanonicalHuffman> {
    if dist_lengths.iter().all(|&l| l == 0) {
        let mut placeholder = vec![0u8; dist_lengths.len().max(1)];
        placeholder[0] = 1;
        CanonicalHuffman::from_lengths(&placeholder)
    } else {
        CanonicalHuffman::from_lengths(dist_lengths)
    }
}

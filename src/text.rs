//! Line-oriented text dump/load format for DEFLATE streams: a debugging
//! and test-fixture format, not a wire format. `dump_stream` followed by
//! `load_stream` is the identity on the original byte stream.
//!
//! Layout, one block per group of lines:
//!   `<bfinal> <btype>`
//!   stored (btype 0):  `<len>` then `<len> space-separated byte values`
//!   fixed (btype 1):    `<token count>` then one `L <byte>` / `M <length> <distance>` line per token
//!   dynamic (btype 2):  `<hclen>` then 19 space-separated CL lengths (in CODE_LENGTH_ORDER)
//!                       `<hlit+257>` then that many litlen lengths
//!                       `<hdist+1>` then that many distance lengths
//!                       `<token count>` then one token line per token, as above

use crate::cl::RleDpCache;
use crate::deflate::tables::CODE_LENGTH_ORDER;
use crate::deflate::{Block, Token};
use crate::error::{Error, Result};

fn parse_err(msg: impl Into<String>) -> Error {
    Error::Internal(msg.into())
}

fn dump_tokens(out: &mut String, tokens: &[Token]) {
    out.push_str(&tokens.len().to_string());
    out.push('\n');
    for tok in tokens {
        match *tok {
            Token::Literal(b) => out.push_str(&format!("L {}\n", b)),
            Token::Match { length, distance } => out.push_str(&format!("M {} {}\n", length, distance)),
        }
    }
}

fn load_tokens<'a, I: Iterator<Item = &'a str>>(lines: &mut I) -> Result<Vec<Token>> {
    let count: usize = lines.next().ok_or_else(|| parse_err("missing token count"))?.trim().parse().map_err(|_| parse_err("bad token count"))?;
    let mut tokens = Vec::with_capacity(count);
    for _ in 0..count {
        let line = lines.next().ok_or_else(|| parse_err("missing token line"))?;
        let mut parts = line.split_whitespace();
        match parts.next() {
            Some("L") => {
                let b: u8 = parts.next().ok_or_else(|| parse_err("missing literal byte"))?.parse().map_err(|_| parse_err("bad literal byte"))?;
                tokens.push(Token::Literal(b));
            }
            Some("M") => {
                let length: u16 = parts.next().ok_or_else(|| parse_err("missing match length"))?.parse().map_err(|_| parse_err("bad match length"))?;
                let distance: u16 = parts.next().ok_or_else(|| parse_err("missing match distance"))?.parse().map_err(|_| parse_err("bad match distance"))?;
                tokens.push(Token::Match { length, distance });
            }
            _ => return Err(parse_err("unknown token tag")),
        }
    }
    Ok(tokens)
}

pub fn dump_block(block: &Block) -> String {
    let mut out = String::new();
    match block {
        Block::Stored { bfinal, data } => {
            out.push_str(&format!("{} 0\n", *bfinal as u8));
            out.push_str(&format!("{}\n", data.len()));
            let bytes: Vec<String> = data.iter().map(|b| b.to_string()).collect();
            out.push_str(&bytes.join(" "));
            out.push('\n');
        }
        Block::Fixed { bfinal, tokens } => {
            out.push_str(&format!("{} 1\n", *bfinal as u8));
            dump_tokens(&mut out, tokens);
        }
        Block::Dynamic { bfinal, litlen_lengths, dist_lengths, cl_lengths, hclen, tokens } => {
            out.push_str(&format!("{} 2\n", *bfinal as u8));
            out.push_str(&format!("{}\n", hclen));
            let cl: Vec<String> = (0..(hclen + 4)).map(|i| cl_lengths[CODE_LENGTH_ORDER[i]].to_string()).collect();
            out.push_str(&cl.join(" "));
            out.push('\n');

            out.push_str(&format!("{}\n", litlen_lengths.len()));
            let ll: Vec<String> = litlen_lengths.iter().map(|l| l.to_string()).collect();
            out.push_str(&ll.join(" "));
            out.push('\n');

            out.push_str(&format!("{}\n", dist_lengths.len()));
            let dl: Vec<String> = dist_lengths.iter().map(|l| l.to_string()).collect();
            out.push_str(&dl.join(" "));
            out.push('\n');

            dump_tokens(&mut out, tokens);
        }
    }
    out
}

fn load_block<'a, I: Iterator<Item = &'a str>>(lines: &mut I) -> Result<Block> {
    let header = lines.next().ok_or_else(|| parse_err("missing block header line"))?;
    let mut parts = header.split_whitespace();
    let bfinal: u8 = parts.next().ok_or_else(|| parse_err("missing bfinal"))?.parse().map_err(|_| parse_err("bad bfinal"))?;
    let btype: u8 = parts.next().ok_or_else(|| parse_err("missing btype"))?.parse().map_err(|_| parse_err("bad btype"))?;
    let bfinal = bfinal != 0;

    match btype {
        0 => {
            let len: usize = lines.next().ok_or_else(|| parse_err("missing stored length"))?.trim().parse().map_err(|_| parse_err("bad stored length"))?;
            let byte_line = lines.next().unwrap_or("");
            let data: Vec<u8> = if len == 0 {
                Vec::new()
            } else {
                byte_line
                    .split_whitespace()
                    .map(|s| s.parse::<u8>().map_err(|_| parse_err("bad stored byte")))
                    .collect::<Result<Vec<u8>>>()?
            };
            if data.len() != len {
                return Err(parse_err("stored byte count mismatch"));
            }
            Ok(Block::Stored { bfinal, data })
        }
        1 => {
            let tokens = load_tokens(lines)?;
            Ok(Block::Fixed { bfinal, tokens })
        }
        2 => {
            let hclen: usize = lines.next().ok_or_else(|| parse_err("missing hclen"))?.trim().parse().map_err(|_| parse_err("bad hclen"))?;
            let cl_line = lines.next().ok_or_else(|| parse_err("missing cl lengths"))?;
            let mut cl_lengths = [0u8; 19];
            for (i, tok) in cl_line.split_whitespace().enumerate() {
                if i >= hclen + 4 {
                    break;
                }
                cl_lengths[CODE_LENGTH_ORDER[i]] = tok.parse().map_err(|_| parse_err("bad cl length"))?;
            }

            let hlit_total: usize = lines.next().ok_or_else(|| parse_err("missing litlen count"))?.trim().parse().map_err(|_| parse_err("bad litlen count"))?;
            let ll_line = lines.next().ok_or_else(|| parse_err("missing litlen lengths"))?;
            let litlen_lengths: Vec<u8> = ll_line.split_whitespace().map(|s| s.parse().map_err(|_| parse_err("bad litlen length"))).collect::<Result<Vec<u8>>>()?;
            if litlen_lengths.len() != hlit_total {
                return Err(parse_err("litlen length count mismatch"));
            }

            let hdist_total: usize = lines.next().ok_or_else(|| parse_err("missing dist count"))?.trim().parse().map_err(|_| parse_err("bad dist count"))?;
            let dl_line = lines.next().ok_or_else(|| parse_err("missing dist lengths"))?;
            let dist_lengths: Vec<u8> = dl_line.split_whitespace().map(|s| s.parse().map_err(|_| parse_err("bad dist length"))).collect::<Result<Vec<u8>>>()?;
            if dist_lengths.len() != hdist_total {
                return Err(parse_err("dist length count mismatch"));
            }

            let tokens = load_tokens(lines)?;
            Ok(Block::Dynamic { bfinal, litlen_lengths, dist_lengths, cl_lengths, hclen, tokens })
        }
        _ => Err(Error::ReservedBlockType),
    }
}

/// Dumps a whole parsed stream to the text format, one block after another
/// in order.
pub fn dump_stream(blocks: &[Block]) -> String {
    let mut out = String::new();
    for block in blocks {
        out.push_str(&dump_block(block));
    }
    out
}

/// Parses the text format back into blocks, reading until the final block
/// (`bfinal == 1`) is consumed.
pub fn load_stream(text: &str) -> Result<Vec<Block>> {
    let mut lines = text.lines();
    let mut blocks = Vec::new();
    loop {
        let block = load_block(&mut lines)?;
        let is_final = block.is_final();
        blocks.push(block);
        if is_final {
            break;
        }
    }
    Ok(blocks)
}

/// Serializes a loaded stream of blocks back to raw DEFLATE bytes.
pub fn blocks_to_bytes(blocks: &[Block]) -> Result<Vec<u8>> {
    let mut cache = RleDpCache::new();
    let mut bw = crate::bits::BitWriter::new();
    for block in blocks {
        block.to_bits(&mut bw, &mut cache)?;
    }
    Ok(bw.finish())
}

pub mod bits;
pub mod cl;
pub mod deflate;
pub mod error;
pub mod huffman;
pub mod optimizer;
pub mod score;
pub mod text;

pub use deflate::{Block, Token};
pub use error::{Error, Result};
pub use optimizer::{optimize_deflate_block, optimize_deflate_stream, OptimizerParams};
pub use score::{ByteLengthScore, ScoreFn};

use crate::bits::BitReader;

/// Parses a raw RFC 1951 DEFLATE stream into its sequence of blocks,
/// stopping after the first block with `BFINAL` set.
pub fn parse_stream(data: &[u8]) -> Result<Vec<Block>> {
    let mut br = BitReader::new(data);
    let mut blocks = Vec::new();
    loop {
        let block = Block::parse(&mut br)?;
        let is_final = block.is_final();
        blocks.push(block);
        if is_final {
            break;
        }
    }
    Ok(blocks)
}

/// Serializes a sequence of blocks back to raw DEFLATE bytes, unchanged
/// from however they were parsed or constructed.
pub fn serialize_stream(blocks: &[Block]) -> Result<Vec<u8>> {
    text::blocks_to_bytes(blocks)
}

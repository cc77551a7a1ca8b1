/// A single LZ77 token inside a compressed block's token stream.
///
/// End-of-block is never represented as a `Token`: it is implicit, written
/// once after every compressed block's last token and consumed once after
/// decoding the last literal/length symbol. Keeping it out of the token
/// vector means tokens identify only the payload a block carries, matching
/// what the optimizer perturbs and what `usage` accounting counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    Literal(u8),
    Match { length: u16, distance: u16 },
}

impl Token {
    pub fn uncompressed_len(&self) -> usize {
        match self {
            Token::Literal(_) => 1,
            Token::Match { length, .. } => *length as usize,
        }
    }
}

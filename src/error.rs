use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("invalid reserved block type 0b11")]
    ReservedBlockType,

    #[error("invalid code-length alphabet symbol: {0}")]
    InvalidClSymbol(u8),

    #[error("code-length symbol 16 has no previous code length to repeat")]
    ClSymbol16WithoutPrevious,

    #[error("dynamic block's literal/length or distance tree is missing an end-of-block code")]
    MissingEob,

    #[error("invalid Huffman prefix while decoding")]
    InvalidPrefix,

    #[error("Huffman code lengths overflow the Kraft inequality (oversubscribed)")]
    KraftOverflow,

    #[error("Huffman code lengths leave the tree incomplete")]
    IncompleteTree,

    #[error("Huffman code has no non-zero lengths")]
    HuffmanEmpty,

    #[error("stored block length mismatch: LEN={len}, NLEN={nlen}")]
    StoredBlockLengthMismatch { len: u16, nlen: u16 },

    #[error("invalid length code: {0}")]
    InvalidLengthCode(u16),

    #[error("invalid distance code: {0}")]
    InvalidDistanceCode(u16),

    #[error("run-length DP has no feasible encoding for the requested run")]
    RleDpInfeasible,

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

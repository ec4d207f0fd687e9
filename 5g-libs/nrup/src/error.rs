use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NrupError {
    #[error("empty NR-U container")]
    Empty,

    #[error("unknown NR-U PDU type {0}")]
    UnknownPduType(u8),

    #[error("expected NR-U PDU type {expected}, got {actual}")]
    UnexpectedPduType { expected: u8, actual: u8 },

    #[error("NR-U container truncated: need {needed} more bytes at offset {offset}")]
    Truncated { offset: usize, needed: usize },

    #[error("{count} {what} exceeds the maximum of {max}")]
    TooMany {
        what: &'static str,
        count: usize,
        max: usize,
    },

    #[error("NR-U padding of {actual} bytes, expected {expected}")]
    BadPadding { expected: usize, actual: usize },

    #[error("{what} value {value:#x} does not fit in {bits} bits")]
    OutOfRange {
        what: &'static str,
        value: u64,
        bits: u32,
    },
}

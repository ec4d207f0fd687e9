use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PsupError {
    #[error("empty PDU session container")]
    Empty,

    #[error("unknown PDU session container PDU type {0}")]
    UnknownPduType(u8),

    #[error("expected PDU session container PDU type {expected}, got {actual}")]
    UnexpectedPduType { expected: u8, actual: u8 },

    #[error("PDU session container truncated: need {needed} more bytes at offset {offset}")]
    Truncated { offset: usize, needed: usize },

    #[error("PDU session container padding of {actual} bytes, expected {expected}")]
    BadPadding { expected: usize, actual: usize },

    #[error("{what} value {value:#x} does not fit in {bits} bits")]
    OutOfRange {
        what: &'static str,
        value: u64,
        bits: u32,
    },
}

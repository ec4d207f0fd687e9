use crate::GtpuMessageType;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GtpuError {
    #[error("buffer too short: need {needed} bytes, have {available}")]
    BufferTooShort { needed: usize, available: usize },

    #[error("invalid GTP version {0}, expected 1")]
    InvalidVersion(u8),

    #[error("protocol type is GTP' - only GTP is supported")]
    NotGtp,

    /// The PN flag is rejected on receive.  Supporting it means carrying the N-PDU number
    /// through to the tunnel; flip `GtpuHeader::N_PDU_NUMBER_SUPPORTED` once that exists.
    #[error("N-PDU number flag is set - not supported")]
    NPduNumberUnsupported,

    #[error("unknown message type {0}")]
    UnknownMessageType(u8),

    #[error("unexpected message type {0:?}")]
    UnexpectedMessageType(GtpuMessageType),

    #[error("zero length extension header of type {0:#04x}")]
    ZeroLengthExtension(u8),

    #[error("extension header container of {0} bytes is not 4n-2 bytes long")]
    MisalignedExtension(usize),

    #[error("extension headers present but E flag not set")]
    ExtensionFlagMismatch,

    #[error("message length {0} does not fit the 16 bit length field")]
    LengthOverflow(usize),

    #[error("malformed information element of type {0}")]
    MalformedIe(u8),

    #[error("missing mandatory information element of type {0}")]
    MissingIe(u8),
}

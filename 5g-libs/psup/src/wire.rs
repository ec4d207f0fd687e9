//! wire - field access and padding for PDU session container frames

use crate::PsupError;
use gtpu::{ContainerError, ContainerReader};
use slog::{Logger, debug};

// The container is padded so that the extension header content is 4n-2 octets.  TS38.415, 5.5.3.
pub(crate) use gtpu::pad_container as pad;

pub(crate) type Reader<'a> = ContainerReader<'a, PsupError>;

impl ContainerError for PsupError {
    fn truncated(offset: usize, needed: usize) -> Self {
        PsupError::Truncated { offset, needed }
    }

    fn bad_padding(expected: usize, actual: usize) -> Self {
        PsupError::BadPadding { expected, actual }
    }
}

pub(crate) fn check_bits(value: u64, bits: u32, what: &'static str) -> Result<(), PsupError> {
    if value >> bits != 0 {
        return Err(PsupError::OutOfRange { what, value, bits });
    }
    Ok(())
}

pub(crate) fn finish(r: Reader, logger: &Logger) -> Result<(), PsupError> {
    let padding = r.finish()?;
    if padding.iter().any(|b| *b != 0) {
        debug!(logger, "Non-zero PDU session container padding {:x?}", padding);
    }
    Ok(())
}

//! wire - field access and padding shared by the NR-U frame formats

use crate::NrupError;
use bytes::BufMut;
use gtpu::{ContainerError, ContainerReader};
use slog::{Logger, debug};

// NR-U frames sit in an NR RAN container extension header, so they are padded to 4n-2 octets.
// TS38.425, 5.5.3.
pub(crate) use gtpu::pad_container as pad;

pub(crate) type Reader<'a> = ContainerReader<'a, NrupError>;

impl ContainerError for NrupError {
    fn truncated(offset: usize, needed: usize) -> Self {
        NrupError::Truncated { offset, needed }
    }

    fn bad_padding(expected: usize, actual: usize) -> Self {
        NrupError::BadPadding { expected, actual }
    }
}

pub(crate) fn put_u24(out: &mut Vec<u8>, value: u32, what: &'static str) -> Result<(), NrupError> {
    if value > 0x00ff_ffff {
        return Err(NrupError::OutOfRange {
            what,
            value: value as u64,
            bits: 24,
        });
    }
    out.put_uint(value as u64, 3);
    Ok(())
}

/// Check the padding that ends a frame.  Non-zero padding is only logged.
pub(crate) fn finish(r: Reader, logger: &Logger) -> Result<(), NrupError> {
    let padding = r.finish()?;
    if padding.iter().any(|b| *b != 0) {
        debug!(logger, "Non-zero NR-U padding {:x?}", padding);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn container_errors_map_to_nrup_errors() {
        let mut r = Reader::new(&[0x00, 0x01]);
        assert_eq!(
            r.u24(),
            Err(NrupError::Truncated {
                offset: 0,
                needed: 1
            })
        );

        let mut r = Reader::new(&[0x00, 0x01]);
        r.u8().unwrap();
        let logger = Logger::root(slog::Discard, slog::o!());
        assert_eq!(finish(r, &logger), Ok(()));

        let mut r = Reader::new(&[0x00, 0x01, 0x00]);
        r.u8().unwrap();
        assert_eq!(
            finish(r, &logger),
            Err(NrupError::BadPadding {
                expected: 1,
                actual: 2
            })
        );
    }
}

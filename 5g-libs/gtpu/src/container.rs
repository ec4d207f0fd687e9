//! container - reading and padding frames carried in an extension header container
//!
//! NR-U (TS38.425) and PDU session container (TS38.415) frames both fill the content of an
//! extension header, which is 4n-2 octets, so both pad the same way and both refuse a frame
//! whose trailing padding is too short or too long.

use bytes::{Buf, BufMut};
use std::marker::PhantomData;

/// Zero octets needed after a frame of `frame_len` octets to fill a container.
pub fn container_padding_len(frame_len: usize) -> usize {
    (4 - (frame_len + 2) % 4) % 4
}

/// Zero pad the frame that starts at `frame_start` in `out`.
pub fn pad_container(out: &mut Vec<u8>, frame_start: usize) {
    let len = out.len() - frame_start;
    out.put_bytes(0, container_padding_len(len));
}

/// How a frame codec reports a short or badly padded container.
pub trait ContainerError {
    fn truncated(offset: usize, needed: usize) -> Self;
    fn bad_padding(expected: usize, actual: usize) -> Self;
}

/// Big endian field reader over a container, reporting errors as `E`.
pub struct ContainerReader<'a, E> {
    buf: &'a [u8],
    consumed: usize,
    _error: PhantomData<fn() -> E>,
}

impl<'a, E: ContainerError> ContainerReader<'a, E> {
    pub fn new(buf: &'a [u8]) -> Self {
        ContainerReader {
            buf,
            consumed: 0,
            _error: PhantomData,
        }
    }

    fn need(&mut self, needed: usize) -> Result<(), E> {
        if self.buf.remaining() < needed {
            return Err(E::truncated(self.consumed, needed - self.buf.remaining()));
        }
        self.consumed += needed;
        Ok(())
    }

    pub fn u8(&mut self) -> Result<u8, E> {
        self.need(1)?;
        Ok(self.buf.get_u8())
    }

    pub fn u24(&mut self) -> Result<u32, E> {
        self.need(3)?;
        Ok(self.buf.get_uint(3) as u32)
    }

    pub fn u32(&mut self) -> Result<u32, E> {
        self.need(4)?;
        Ok(self.buf.get_u32())
    }

    pub fn u64(&mut self) -> Result<u64, E> {
        self.need(8)?;
        Ok(self.buf.get_u64())
    }

    /// Check that what's left is exactly the padding the frame needs, no more and no less.
    /// Returns the padding, which the caller may want to check is zero.
    pub fn finish(self) -> Result<&'a [u8], E> {
        let expected = container_padding_len(self.consumed);
        if self.buf.len() != expected {
            return Err(E::bad_padding(expected, self.buf.len()));
        }
        Ok(self.buf)
    }
}

//! extension - GTP-U extension headers, TS29.281, 5.2

use crate::GtpuError;
use bytes::{Buf, BufMut};

/// Next Extension Header Type.  TS29.281, figure 5.2.1-3.  Unrecognized values are kept as is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExtensionHeaderType(pub u8);

impl ExtensionHeaderType {
    pub const NO_MORE: Self = Self(0x00);
    pub const SERVICE_CLASS_INDICATOR: Self = Self(0x20);
    pub const UDP_PORT: Self = Self(0x40);
    pub const RAN_CONTAINER: Self = Self(0x81);
    pub const LONG_PDCP_PDU_NUMBER: Self = Self(0x82);
    pub const XW_RAN_CONTAINER: Self = Self(0x83);
    pub const NR_RAN_CONTAINER: Self = Self(0x84);
    pub const PDU_SESSION_CONTAINER: Self = Self(0x85);
    pub const PDCP_PDU_NUMBER: Self = Self(0xc0);
}

/// One extension header.  The container excludes the length octet and the next type octet, so
/// its length is always 4n-2.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionHeader {
    pub ext_type: ExtensionHeaderType,
    pub container: Vec<u8>,
}

impl ExtensionHeader {
    pub fn new(ext_type: ExtensionHeaderType, container: Vec<u8>) -> Self {
        ExtensionHeader {
            ext_type,
            container,
        }
    }

    pub fn encoded_len(&self) -> usize {
        self.container.len() + 2
    }

    pub(crate) fn pack(
        &self,
        next: ExtensionHeaderType,
        out: &mut Vec<u8>,
    ) -> Result<(), GtpuError> {
        let len = self.encoded_len();
        if len % 4 != 0 || len / 4 > u8::MAX as usize {
            return Err(GtpuError::MisalignedExtension(self.container.len()));
        }
        out.put_u8((len / 4) as u8);
        out.put_slice(&self.container);
        out.put_u8(next.0);
        Ok(())
    }

    /// Unpack a chain of extension headers starting with `first`.  Returns the headers and the
    /// number of bytes consumed.
    pub(crate) fn unpack_chain(
        first: ExtensionHeaderType,
        mut buf: &[u8],
    ) -> Result<(Vec<ExtensionHeader>, usize), GtpuError> {
        let available = buf.len();
        let mut ext_list = vec![];
        let mut ext_type = first;
        while ext_type != ExtensionHeaderType::NO_MORE {
            if !buf.has_remaining() {
                return Err(GtpuError::BufferTooShort {
                    needed: available + 1,
                    available,
                });
            }
            let len_words = buf.get_u8() as usize;
            if len_words == 0 {
                return Err(GtpuError::ZeroLengthExtension(ext_type.0));
            }
            let container_len = len_words * 4 - 2;
            if buf.remaining() < container_len + 1 {
                return Err(GtpuError::BufferTooShort {
                    needed: available - buf.remaining() + container_len + 1,
                    available,
                });
            }
            let container = buf[..container_len].to_vec();
            buf.advance(container_len);
            let next = ExtensionHeaderType(buf.get_u8());
            ext_list.push(ExtensionHeader::new(ext_type, container));
            ext_type = next;
        }
        Ok((ext_list, available - buf.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn chain_of_two() {
        let bytes = hex!("01 10 00 85 01 ab cd 00 ff ff");
        let (ext_list, consumed) =
            ExtensionHeader::unpack_chain(ExtensionHeaderType::NR_RAN_CONTAINER, &bytes).unwrap();
        assert_eq!(consumed, 8);
        assert_eq!(ext_list.len(), 2);
        assert_eq!(ext_list[0].ext_type, ExtensionHeaderType::NR_RAN_CONTAINER);
        assert_eq!(ext_list[0].container, vec![0x10, 0x00]);
        assert_eq!(ext_list[1].ext_type, ExtensionHeaderType::PDU_SESSION_CONTAINER);
        assert_eq!(ext_list[1].container, vec![0xab, 0xcd]);
    }

    #[test]
    fn zero_length_is_rejected() {
        let bytes = hex!("00 00 00 00");
        assert_eq!(
            ExtensionHeader::unpack_chain(ExtensionHeaderType::UDP_PORT, &bytes),
            Err(GtpuError::ZeroLengthExtension(0x40))
        );
    }

    #[test]
    fn truncated_container_is_rejected() {
        let bytes = hex!("02 00 00 00");
        assert!(matches!(
            ExtensionHeader::unpack_chain(ExtensionHeaderType::NR_RAN_CONTAINER, &bytes),
            Err(GtpuError::BufferTooShort { .. })
        ));
    }

    #[test]
    fn misaligned_container_is_not_packed() {
        let ext = ExtensionHeader::new(ExtensionHeaderType::PDU_SESSION_CONTAINER, vec![0; 3]);
        let mut out = vec![];
        assert_eq!(
            ext.pack(ExtensionHeaderType::NO_MORE, &mut out),
            Err(GtpuError::MisalignedExtension(3))
        );
    }
}

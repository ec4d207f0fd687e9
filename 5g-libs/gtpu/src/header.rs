#![allow(clippy::unusual_byte_groupings)]
//! header - GTP-U header, TS29.281, 5.1

use crate::{ExtensionHeader, ExtensionHeaderType, GtpTeid, GtpuError};
use bytes::{Buf, BufMut};
use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Length of the mandatory part of the header.
pub const GTPU_BASE_HEADER_LEN: usize = 8;

/// Sequence number, N-PDU number and next extension header type.  Present when any of E, S or
/// PN is set.
pub const GTPU_OPTIONAL_FIELDS_LEN: usize = 4;

const GTPU_VERSION: u8 = 1;

// TS29.281, table 6.1-1
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum GtpuMessageType {
    EchoRequest = 1,
    EchoResponse = 2,
    ErrorIndication = 26,
    SupportedExtensionHeadersNotification = 31,
    EndMarker = 254,
    GPdu = 255,
}

/// First octet of the header.  | version (3) | PT | spare | E | S | PN |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GtpuFlags {
    pub version: u8,
    pub protocol_type: bool,
    pub spare: bool,
    pub ext_hdr: bool,
    pub seq_number: bool,
    pub n_pdu: bool,
}

impl Default for GtpuFlags {
    fn default() -> Self {
        GtpuFlags {
            version: GTPU_VERSION,
            protocol_type: true,
            spare: false,
            ext_hdr: false,
            seq_number: false,
            n_pdu: false,
        }
    }
}

impl GtpuFlags {
    fn to_octet(self) -> u8 {
        (self.version & 0b111) << 5
            | (self.protocol_type as u8) << 4
            | (self.spare as u8) << 3
            | (self.ext_hdr as u8) << 2
            | (self.seq_number as u8) << 1
            | self.n_pdu as u8
    }

    fn from_octet(octet: u8) -> Self {
        GtpuFlags {
            version: octet >> 5,
            protocol_type: octet & 0b000_1_0_0_0_0 != 0,
            spare: octet & 0b000_0_1_0_0_0 != 0,
            ext_hdr: octet & 0b000_0_0_1_0_0 != 0,
            seq_number: octet & 0b000_0_0_0_1_0 != 0,
            n_pdu: octet & 0b000_0_0_0_0_1 != 0,
        }
    }

    fn has_optional_fields(&self) -> bool {
        self.ext_hdr || self.seq_number || self.n_pdu
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GtpuHeader {
    pub flags: GtpuFlags,
    pub message_type: GtpuMessageType,
    /// Octets following the mandatory 8 byte header, including optional fields, extension
    /// headers and payload.
    pub length: u16,
    pub teid: GtpTeid,
    pub seq_number: u16,
    pub n_pdu_number: u8,
    pub ext_list: Vec<ExtensionHeader>,
}

impl GtpuHeader {
    pub const N_PDU_NUMBER_SUPPORTED: bool = false;

    pub fn new(message_type: GtpuMessageType, teid: GtpTeid) -> Self {
        GtpuHeader {
            flags: GtpuFlags::default(),
            message_type,
            length: 0,
            teid,
            seq_number: 0,
            n_pdu_number: 0,
            ext_list: vec![],
        }
    }

    /// Header for a G-PDU, with the E flag set if there are extension headers.
    pub fn g_pdu(teid: GtpTeid, ext_list: Vec<ExtensionHeader>) -> Self {
        let mut header = Self::new(GtpuMessageType::GPdu, teid);
        header.flags.ext_hdr = !ext_list.is_empty();
        header.ext_list = ext_list;
        header
    }

    /// Encoded size of the header including optional fields and extension headers.
    pub fn header_len(&self) -> usize {
        if self.flags.has_optional_fields() {
            GTPU_BASE_HEADER_LEN
                + GTPU_OPTIONAL_FIELDS_LEN
                + self
                    .ext_list
                    .iter()
                    .map(ExtensionHeader::encoded_len)
                    .sum::<usize>()
        } else {
            GTPU_BASE_HEADER_LEN
        }
    }

    /// First extension header of the given type, if any.
    pub fn extension(&self, ext_type: ExtensionHeaderType) -> Option<&ExtensionHeader> {
        self.ext_list.iter().find(|ext| ext.ext_type == ext_type)
    }

    /// Append the encoded header to `out`.  The length field is written as is - see
    /// `encode_pdu()` for a function that derives it.
    pub fn pack(&self, out: &mut Vec<u8>) -> Result<(), GtpuError> {
        if self.flags.n_pdu && !Self::N_PDU_NUMBER_SUPPORTED {
            return Err(GtpuError::NPduNumberUnsupported);
        }
        if !self.ext_list.is_empty() && !self.flags.ext_hdr {
            return Err(GtpuError::ExtensionFlagMismatch);
        }

        out.put_u8(self.flags.to_octet());
        out.put_u8(self.message_type.into());
        out.put_u16(self.length);
        out.put_u32(self.teid.0);

        if !self.flags.has_optional_fields() {
            return Ok(());
        }
        out.put_u16(self.seq_number);
        out.put_u8(self.n_pdu_number);

        let mut ext_types = self.ext_list.iter().map(|ext| ext.ext_type);
        out.put_u8(ext_types.next().unwrap_or(ExtensionHeaderType::NO_MORE).0);
        for ext in self.ext_list.iter() {
            let next = ext_types.next().unwrap_or(ExtensionHeaderType::NO_MORE);
            ext.pack(next, out)?;
        }
        Ok(())
    }

    /// Unpack a header from the start of a GTP-U datagram.  On success, returns the header and
    /// the offset of the payload.  The payload runs from this offset to `8 + length`.
    pub fn unpack(pdu: &[u8]) -> Result<(GtpuHeader, usize), GtpuError> {
        if pdu.len() < GTPU_BASE_HEADER_LEN {
            return Err(GtpuError::BufferTooShort {
                needed: GTPU_BASE_HEADER_LEN,
                available: pdu.len(),
            });
        }
        let mut buf = pdu;
        let flags = GtpuFlags::from_octet(buf.get_u8());
        if flags.version != GTPU_VERSION {
            return Err(GtpuError::InvalidVersion(flags.version));
        }
        if !flags.protocol_type {
            return Err(GtpuError::NotGtp);
        }
        if flags.n_pdu && !Self::N_PDU_NUMBER_SUPPORTED {
            return Err(GtpuError::NPduNumberUnsupported);
        }
        let message_type = buf.get_u8();
        let message_type = GtpuMessageType::try_from(message_type)
            .map_err(|_| GtpuError::UnknownMessageType(message_type))?;
        let length = buf.get_u16();
        let teid = GtpTeid(buf.get_u32());

        // Everything after the mandatory header must be within the declared length.
        let total_len = GTPU_BASE_HEADER_LEN + length as usize;
        if pdu.len() < total_len {
            return Err(GtpuError::BufferTooShort {
                needed: total_len,
                available: pdu.len(),
            });
        }
        let mut buf = &pdu[GTPU_BASE_HEADER_LEN..total_len];

        let mut header = GtpuHeader {
            flags,
            message_type,
            length,
            teid,
            seq_number: 0,
            n_pdu_number: 0,
            ext_list: vec![],
        };
        if !flags.has_optional_fields() {
            return Ok((header, GTPU_BASE_HEADER_LEN));
        }

        if buf.remaining() < GTPU_OPTIONAL_FIELDS_LEN {
            return Err(GtpuError::BufferTooShort {
                needed: GTPU_BASE_HEADER_LEN + GTPU_OPTIONAL_FIELDS_LEN,
                available: total_len,
            });
        }
        header.seq_number = buf.get_u16();
        header.n_pdu_number = buf.get_u8();
        let next_ext_type = ExtensionHeaderType(buf.get_u8());

        // The next extension header type is only interpreted when E is set.  TS29.281, 5.1.
        let mut offset = GTPU_BASE_HEADER_LEN + GTPU_OPTIONAL_FIELDS_LEN;
        if flags.ext_hdr {
            let (ext_list, consumed) = ExtensionHeader::unpack_chain(next_ext_type, buf)?;
            header.ext_list = ext_list;
            offset += consumed;
        }
        Ok((header, offset))
    }
}

/// Encode a complete GTP-U PDU, deriving the length field from the header and payload.
pub fn encode_pdu(mut header: GtpuHeader, payload: &[u8]) -> Result<Vec<u8>, GtpuError> {
    let header_len = header.header_len();
    let length = header_len - GTPU_BASE_HEADER_LEN + payload.len();
    header.length = u16::try_from(length).map_err(|_| GtpuError::LengthOverflow(length))?;
    let mut out = Vec::with_capacity(header_len + payload.len());
    header.pack(&mut out)?;
    out.put_slice(payload);
    Ok(out)
}

/// Read the TEID of a GTP-U datagram without parsing the optional fields or extension headers.
pub fn read_teid(pdu: &[u8]) -> Result<GtpTeid, GtpuError> {
    if pdu.len() < GTPU_BASE_HEADER_LEN {
        return Err(GtpuError::BufferTooShort {
            needed: GTPU_BASE_HEADER_LEN,
            available: pdu.len(),
        });
    }
    let version = pdu[0] >> 5;
    if version != GTPU_VERSION {
        return Err(GtpuError::InvalidVersion(version));
    }
    Ok(GtpTeid(u32::from_be_bytes([pdu[4], pdu[5], pdu[6], pdu[7]])))
}

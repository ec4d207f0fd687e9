//! messages - GTP-U path management and tunnel management messages, TS29.281, 7

use crate::{
    GTPU_PATH_MANAGEMENT_TEID, GtpuError, GtpuHeader, GtpuMessageType, InformationElement,
    encode_pdu,
};
use std::net::IpAddr;

/// Error Indication, TS29.281, 7.3.1.  Sent to a peer that used a TEID we don't know about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorIndication {
    pub seq_number: u16,
    pub teid_i: crate::GtpTeid,
    pub peer_address: IpAddr,
}

impl ErrorIndication {
    pub fn encode(&self) -> Result<Vec<u8>, GtpuError> {
        let mut ies = vec![];
        InformationElement::TeidDataI(self.teid_i).pack(&mut ies)?;
        InformationElement::GtpuPeerAddress(self.peer_address).pack(&mut ies)?;
        encode_pdu(path_header(GtpuMessageType::ErrorIndication, self.seq_number), &ies)
    }

    pub fn decode(pdu: &[u8]) -> Result<Self, GtpuError> {
        let (header, ies) = decode_ies(pdu, GtpuMessageType::ErrorIndication)?;
        let mut teid_i = None;
        let mut peer_address = None;
        for ie in ies {
            match ie {
                InformationElement::TeidDataI(teid) => teid_i = Some(teid),
                InformationElement::GtpuPeerAddress(addr) => peer_address = Some(addr),
                _ => (),
            }
        }
        Ok(ErrorIndication {
            seq_number: header.seq_number,
            teid_i: teid_i.ok_or(GtpuError::MissingIe(InformationElement::TEID_DATA_I))?,
            peer_address: peer_address
                .ok_or(GtpuError::MissingIe(InformationElement::GTPU_PEER_ADDRESS))?,
        })
    }
}

/// Echo Request, TS29.281, 7.2.1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EchoRequest {
    pub seq_number: u16,
}

impl EchoRequest {
    pub fn encode(&self) -> Result<Vec<u8>, GtpuError> {
        encode_pdu(path_header(GtpuMessageType::EchoRequest, self.seq_number), &[])
    }

    pub fn decode(pdu: &[u8]) -> Result<Self, GtpuError> {
        let (header, _ies) = decode_ies(pdu, GtpuMessageType::EchoRequest)?;
        Ok(EchoRequest {
            seq_number: header.seq_number,
        })
    }
}

/// Echo Response, TS29.281, 7.2.2.  The restart counter "should be set to zero by the sender"
/// (TS29.281, 8.2).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EchoResponse {
    pub seq_number: u16,
    pub restart_counter: u8,
}

impl EchoResponse {
    pub fn encode(&self) -> Result<Vec<u8>, GtpuError> {
        let mut ies = vec![];
        InformationElement::Recovery(self.restart_counter).pack(&mut ies)?;
        encode_pdu(path_header(GtpuMessageType::EchoResponse, self.seq_number), &ies)
    }

    pub fn decode(pdu: &[u8]) -> Result<Self, GtpuError> {
        let (header, ies) = decode_ies(pdu, GtpuMessageType::EchoResponse)?;
        let restart_counter = ies
            .iter()
            .find_map(|ie| match ie {
                InformationElement::Recovery(x) => Some(*x),
                _ => None,
            })
            .ok_or(GtpuError::MissingIe(InformationElement::RECOVERY))?;
        Ok(EchoResponse {
            seq_number: header.seq_number,
            restart_counter,
        })
    }
}

// Path management messages use TEID 0 and always carry a sequence number.  TS29.281, 5.1.
fn path_header(message_type: GtpuMessageType, seq_number: u16) -> GtpuHeader {
    let mut header = GtpuHeader::new(message_type, GTPU_PATH_MANAGEMENT_TEID);
    header.flags.seq_number = true;
    header.seq_number = seq_number;
    header
}

fn decode_ies(
    pdu: &[u8],
    expected: GtpuMessageType,
) -> Result<(GtpuHeader, Vec<InformationElement>), GtpuError> {
    let (header, offset) = GtpuHeader::unpack(pdu)?;
    if header.message_type != expected {
        return Err(GtpuError::UnexpectedMessageType(header.message_type));
    }
    let end = crate::GTPU_BASE_HEADER_LEN + header.length as usize;
    let ies = InformationElement::unpack_all(&pdu[offset..end])?;
    Ok((header, ies))
}

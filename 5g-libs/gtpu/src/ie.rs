//! ie - GTP-U information elements, TS29.281, 8

use crate::{GtpTeid, GtpuError};
use bytes::{Buf, BufMut};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InformationElement {
    /// Restart counter.  TV, 1 octet.
    Recovery(u8),
    /// TEID of the tunnel that the error relates to.  TV, 4 octets.
    TeidDataI(GtpTeid),
    /// Address of the GTP-U endpoint sending the message.  TLV, 4 or 16 octets.
    GtpuPeerAddress(IpAddr),
    /// Any other TLV information element, carried opaquely.
    Other { ie_type: u8, value: Vec<u8> },
}

impl InformationElement {
    pub const RECOVERY: u8 = 14;
    pub const TEID_DATA_I: u8 = 16;
    pub const GTPU_PEER_ADDRESS: u8 = 133;

    pub fn ie_type(&self) -> u8 {
        match self {
            Self::Recovery(_) => Self::RECOVERY,
            Self::TeidDataI(_) => Self::TEID_DATA_I,
            Self::GtpuPeerAddress(_) => Self::GTPU_PEER_ADDRESS,
            Self::Other { ie_type, .. } => *ie_type,
        }
    }

    pub fn pack(&self, out: &mut Vec<u8>) -> Result<(), GtpuError> {
        out.put_u8(self.ie_type());
        match self {
            Self::Recovery(restart_counter) => out.put_u8(*restart_counter),
            Self::TeidDataI(teid) => out.put_u32(teid.0),
            Self::GtpuPeerAddress(IpAddr::V4(addr)) => {
                out.put_u16(4);
                out.put_slice(&addr.octets());
            }
            Self::GtpuPeerAddress(IpAddr::V6(addr)) => {
                out.put_u16(16);
                out.put_slice(&addr.octets());
            }
            Self::Other { ie_type, value } => {
                // TV types have a fixed length known only from their definition.
                if *ie_type < 128 {
                    return Err(GtpuError::MalformedIe(*ie_type));
                }
                let len = u16::try_from(value.len())
                    .map_err(|_| GtpuError::LengthOverflow(value.len()))?;
                out.put_u16(len);
                out.put_slice(value);
            }
        }
        Ok(())
    }

    /// Unpack all the information elements in `buf`.
    pub fn unpack_all(mut buf: &[u8]) -> Result<Vec<InformationElement>, GtpuError> {
        let mut ies = vec![];
        while buf.has_remaining() {
            let ie_type = buf.get_u8();
            let ie = match ie_type {
                Self::RECOVERY => {
                    ensure_remaining(buf, 1, ie_type)?;
                    Self::Recovery(buf.get_u8())
                }
                Self::TEID_DATA_I => {
                    ensure_remaining(buf, 4, ie_type)?;
                    Self::TeidDataI(GtpTeid(buf.get_u32()))
                }
                x if x < 128 => return Err(GtpuError::MalformedIe(x)),
                _ => {
                    ensure_remaining(buf, 2, ie_type)?;
                    let len = buf.get_u16() as usize;
                    ensure_remaining(buf, len, ie_type)?;
                    let value = &buf[..len];
                    let ie = if ie_type == Self::GTPU_PEER_ADDRESS {
                        Self::GtpuPeerAddress(peer_address(value)?)
                    } else {
                        Self::Other {
                            ie_type,
                            value: value.to_vec(),
                        }
                    };
                    buf.advance(len);
                    ie
                }
            };
            ies.push(ie);
        }
        Ok(ies)
    }
}

fn ensure_remaining(buf: &[u8], needed: usize, ie_type: u8) -> Result<(), GtpuError> {
    if buf.len() < needed {
        return Err(GtpuError::MalformedIe(ie_type));
    }
    Ok(())
}

fn peer_address(value: &[u8]) -> Result<IpAddr, GtpuError> {
    if let Ok(octets) = <[u8; 4]>::try_from(value) {
        Ok(IpAddr::V4(Ipv4Addr::from(octets)))
    } else if let Ok(octets) = <[u8; 16]>::try_from(value) {
        Ok(IpAddr::V6(Ipv6Addr::from(octets)))
    } else {
        Err(GtpuError::MalformedIe(InformationElement::GTPU_PEER_ADDRESS))
    }
}

#![allow(clippy::unusual_byte_groupings)]
//! ul_pdu_session_information - UL PDU SESSION INFORMATION (PDU type 1), TS38.415, 5.5.2.2
//!
//! ```text
//! | PDU type (4) | QMP | DL delay ind | UL delay ind | SNP |
//! | N3/N9 delay ind | new IE flag | QFI (6) |
//! | DL sending timestamp repeated (8) | DL received timestamp (8) | UL sending timestamp (8) |  if QMP
//! | DL delay result (4) | UL delay result (4) | UL QFI SN (3) | N3/N9 delay result (4) |
//! | D1 UL PDCP delay ind | spare (7) |  if new IE flag
//! | D1 UL PDCP delay result (4) |
//! | padding |
//! ```

use crate::packing::check_pdu_type;
use crate::wire::{Reader, check_bits, finish, pad};
use crate::{PsupError, PsupMessage, PsupPduType};
use bytes::BufMut;
use slog::{Logger, debug};

/// QoS monitoring timestamps, present together when the QMP flag is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QmpTimestamps {
    pub dl_sending_timestamp_repeated: u64,
    pub dl_received_timestamp: u64,
    pub ul_sending_timestamp: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PsupUlPduSessionInformation {
    pub qos_flow_id: u8,
    pub qmp_timestamps: Option<QmpTimestamps>,
    pub dl_delay_result: Option<u32>,
    pub ul_delay_result: Option<u32>,
    pub ul_qfi_sn: Option<u32>,
    pub n3_n9_delay_result: Option<u32>,
    pub d1_ul_pdcp_delay_result: Option<u32>,
}

impl PsupMessage for PsupUlPduSessionInformation {
    const PDU_TYPE: PsupPduType = PsupPduType::UlPduSessionInformation;

    fn pack(&self, out: &mut Vec<u8>) -> Result<(), PsupError> {
        check_bits(self.qos_flow_id as u64, 6, "QFI")?;
        if let Some(sn) = self.ul_qfi_sn {
            check_bits(sn as u64, 24, "UL QFI SN")?;
        }

        let start = out.len();
        out.put_u8(
            u8::from(Self::PDU_TYPE) << 4
                | (self.qmp_timestamps.is_some() as u8) << 3
                | (self.dl_delay_result.is_some() as u8) << 2
                | (self.ul_delay_result.is_some() as u8) << 1
                | self.ul_qfi_sn.is_some() as u8,
        );
        out.put_u8(
            (self.n3_n9_delay_result.is_some() as u8) << 7
                | (self.d1_ul_pdcp_delay_result.is_some() as u8) << 6
                | self.qos_flow_id,
        );
        if let Some(ts) = &self.qmp_timestamps {
            out.put_u64(ts.dl_sending_timestamp_repeated);
            out.put_u64(ts.dl_received_timestamp);
            out.put_u64(ts.ul_sending_timestamp);
        }
        if let Some(result) = self.dl_delay_result {
            out.put_u32(result);
        }
        if let Some(result) = self.ul_delay_result {
            out.put_u32(result);
        }
        if let Some(sn) = self.ul_qfi_sn {
            out.put_uint(sn as u64, 3);
        }
        if let Some(result) = self.n3_n9_delay_result {
            out.put_u32(result);
        }
        if let Some(result) = self.d1_ul_pdcp_delay_result {
            out.put_u8(0b1000_0000);
            out.put_u32(result);
        }
        pad(out, start);
        Ok(())
    }

    fn unpack(container: &[u8], logger: &Logger) -> Result<Self, PsupError> {
        let mut r = Reader::new(container);
        let octet_0 = r.u8()?;
        check_pdu_type::<Self>(octet_0)?;
        let octet_1 = r.u8()?;

        let mut msg = PsupUlPduSessionInformation {
            qos_flow_id: octet_1 & 0b0_0_111111,
            ..Default::default()
        };
        if octet_0 & 0b0000_1_0_0_0 != 0 {
            msg.qmp_timestamps = Some(QmpTimestamps {
                dl_sending_timestamp_repeated: r.u64()?,
                dl_received_timestamp: r.u64()?,
                ul_sending_timestamp: r.u64()?,
            });
        }
        if octet_0 & 0b0000_0_1_0_0 != 0 {
            msg.dl_delay_result = Some(r.u32()?);
        }
        if octet_0 & 0b0000_0_0_1_0 != 0 {
            msg.ul_delay_result = Some(r.u32()?);
        }
        if octet_0 & 0b0000_0_0_0_1 != 0 {
            msg.ul_qfi_sn = Some(r.u24()?);
        }
        if octet_1 & 0b1_0_000000 != 0 {
            msg.n3_n9_delay_result = Some(r.u32()?);
        }
        if octet_1 & 0b0_1_000000 != 0 {
            let new_ie_flags = r.u8()?;
            if new_ie_flags & 0b0_1111111 != 0 {
                debug!(
                    logger,
                    "Spare bits set in UL PDU SESSION INFORMATION new IE flags ({new_ie_flags:#04x})"
                );
            }
            if new_ie_flags & 0b1_0000000 != 0 {
                msg.d1_ul_pdcp_delay_result = Some(r.u32()?);
            }
        }
        finish(r, logger)?;
        Ok(msg)
    }
}

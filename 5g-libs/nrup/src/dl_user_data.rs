#![allow(clippy::unusual_byte_groupings)]
//! dl_user_data - DL USER DATA (PDU type 0), TS38.425, 5.5.2.1
//!
//! ```text
//! | PDU type (4) | spare | discard blocks | DL flush | report polling |
//! | spare (3) | req OOS report | report delivered | user data existence | assist info polling | retx |
//! | NR-U sequence number (3 octets) |
//! | DL discard NR PDCP PDU SN (3 octets, if DL flush) |
//! | DL discard number of blocks (1 octet, if discard blocks) |
//! | { DL discard NR PDCP PDU SN start (3) | discarded block size (1) } ... |
//! | DL report NR PDCP PDU SN (3 octets, if report delivered) |
//! | padding |
//! ```

use crate::packing::check_pdu_type;
use crate::wire::{Reader, finish, pad, put_u24};
use crate::{MAX_NOF_DISCARD_BLOCKS, NrupError, NrupMessage, NrupPduType};
use bytes::BufMut;
use slog::{Logger, debug};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdcpSnDiscardBlock {
    pub pdcp_sn_start: u32,
    pub block_size: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NruDlUserData {
    pub report_polling: bool,
    pub request_out_of_seq_report: bool,
    pub user_data_existence_flag: bool,
    pub assist_info_report_polling_flag: bool,
    pub retransmission_flag: bool,
    pub nru_sn: u32,
    /// Present when the DL flush flag is set.
    pub dl_discard_pdcp_sn: Option<u32>,
    /// Present when the discard blocks flag is set.
    pub discard_blocks: Option<Vec<PdcpSnDiscardBlock>>,
    /// Present when the report delivered flag is set.
    pub dl_report_pdcp_sn: Option<u32>,
}

impl NrupMessage for NruDlUserData {
    const PDU_TYPE: NrupPduType = NrupPduType::DlUserData;

    fn pack(&self, out: &mut Vec<u8>) -> Result<(), NrupError> {
        let start = out.len();
        out.put_u8(
            u8::from(Self::PDU_TYPE) << 4
                | (self.discard_blocks.is_some() as u8) << 2
                | (self.dl_discard_pdcp_sn.is_some() as u8) << 1
                | self.report_polling as u8,
        );
        out.put_u8(
            (self.request_out_of_seq_report as u8) << 4
                | (self.dl_report_pdcp_sn.is_some() as u8) << 3
                | (self.user_data_existence_flag as u8) << 2
                | (self.assist_info_report_polling_flag as u8) << 1
                | self.retransmission_flag as u8,
        );
        put_u24(out, self.nru_sn, "NR-U SN")?;

        if let Some(sn) = self.dl_discard_pdcp_sn {
            put_u24(out, sn, "DL discard NR PDCP PDU SN")?;
        }
        if let Some(blocks) = &self.discard_blocks {
            if blocks.len() > MAX_NOF_DISCARD_BLOCKS {
                return Err(NrupError::TooMany {
                    what: "discard blocks",
                    count: blocks.len(),
                    max: MAX_NOF_DISCARD_BLOCKS,
                });
            }
            out.put_u8(blocks.len() as u8);
            for block in blocks.iter() {
                put_u24(out, block.pdcp_sn_start, "DL discard NR PDCP PDU SN start")?;
                out.put_u8(block.block_size);
            }
        }
        if let Some(sn) = self.dl_report_pdcp_sn {
            put_u24(out, sn, "DL report NR PDCP PDU SN")?;
        }
        pad(out, start);
        Ok(())
    }

    fn unpack(container: &[u8], logger: &Logger) -> Result<Self, NrupError> {
        let mut r = Reader::new(container);
        let octet_0 = r.u8()?;
        check_pdu_type::<Self>(octet_0)?;
        if octet_0 & 0b0000_1_0_0_0 != 0 {
            debug!(logger, "Spare bit set in DL USER DATA octet 0 ({octet_0:#04x})");
        }
        let octet_1 = r.u8()?;
        if octet_1 & 0b111_0_0_0_0_0 != 0 {
            debug!(logger, "Spare bits set in DL USER DATA octet 1 ({octet_1:#04x})");
        }
        let discard_blocks_flag = octet_0 & 0b0000_0_1_0_0 != 0;
        let dl_flush_flag = octet_0 & 0b0000_0_0_1_0 != 0;
        let report_delivered_flag = octet_1 & 0b000_0_1_0_0_0 != 0;

        let mut msg = NruDlUserData {
            report_polling: octet_0 & 0b0000_0_0_0_1 != 0,
            request_out_of_seq_report: octet_1 & 0b000_1_0_0_0_0 != 0,
            user_data_existence_flag: octet_1 & 0b000_0_0_1_0_0 != 0,
            assist_info_report_polling_flag: octet_1 & 0b000_0_0_0_1_0 != 0,
            retransmission_flag: octet_1 & 0b000_0_0_0_0_1 != 0,
            nru_sn: r.u24()?,
            ..Default::default()
        };

        if dl_flush_flag {
            msg.dl_discard_pdcp_sn = Some(r.u24()?);
        }
        if discard_blocks_flag {
            let count = r.u8()? as usize;
            if count > MAX_NOF_DISCARD_BLOCKS {
                return Err(NrupError::TooMany {
                    what: "discard blocks",
                    count,
                    max: MAX_NOF_DISCARD_BLOCKS,
                });
            }
            let mut blocks = Vec::with_capacity(count);
            for _ in 0..count {
                blocks.push(PdcpSnDiscardBlock {
                    pdcp_sn_start: r.u24()?,
                    block_size: r.u8()?,
                });
            }
            msg.discard_blocks = Some(blocks);
        }
        if report_delivered_flag {
            msg.dl_report_pdcp_sn = Some(r.u24()?);
        }
        finish(r, logger)?;
        Ok(msg)
    }
}

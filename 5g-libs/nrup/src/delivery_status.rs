#![allow(clippy::unusual_byte_groupings)]
//! delivery_status - DL DATA DELIVERY STATUS (PDU type 1), TS38.425, 5.5.2.2

use crate::packing::check_pdu_type;
use crate::wire::{Reader, finish, pad, put_u24};
use crate::{
    MAX_NOF_DELIVERED_PDCP_SN_RANGES, MAX_NOF_LOST_NRU_SN_RANGES, NrupError, NrupMessage,
    NrupPduType,
};
use bytes::BufMut;
use slog::{Logger, debug};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NruSnRange {
    pub start: u32,
    pub end: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PdcpSnRange {
    pub start: u32,
    pub end: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NruDlDataDeliveryStatus {
    pub final_frame_ind: bool,
    pub desired_buffer_size: u32,
    pub desired_data_rate: Option<u32>,
    pub lost_nru_sn_ranges: Option<Vec<NruSnRange>>,
    pub highest_delivered_pdcp_sn: Option<u32>,
    pub highest_transmitted_pdcp_sn: Option<u32>,
    pub cause_value: Option<u8>,
    pub highest_delivered_retransmitted_pdcp_sn: Option<u32>,
    pub highest_retransmitted_pdcp_sn: Option<u32>,
    pub delivered_pdcp_sn_ranges: Option<Vec<PdcpSnRange>>,
}

fn put_ranges(
    out: &mut Vec<u8>,
    ranges: impl ExactSizeIterator<Item = (u32, u32)>,
    what: &'static str,
    max: usize,
) -> Result<(), NrupError> {
    let count = ranges.len();
    if count > max {
        return Err(NrupError::TooMany { what, count, max });
    }
    out.put_u8(count as u8);
    for (start, end) in ranges {
        put_u24(out, start, what)?;
        put_u24(out, end, what)?;
    }
    Ok(())
}

fn get_ranges(
    r: &mut Reader,
    what: &'static str,
    max: usize,
) -> Result<Vec<(u32, u32)>, NrupError> {
    let count = r.u8()? as usize;
    if count > max {
        return Err(NrupError::TooMany { what, count, max });
    }
    (0..count).map(|_| Ok((r.u24()?, r.u24()?))).collect()
}

impl NrupMessage for NruDlDataDeliveryStatus {
    const PDU_TYPE: NrupPduType = NrupPduType::DlDataDeliveryStatus;

    fn pack(&self, out: &mut Vec<u8>) -> Result<(), NrupError> {
        let start = out.len();
        out.put_u8(
            u8::from(Self::PDU_TYPE) << 4
                | (self.highest_transmitted_pdcp_sn.is_some() as u8) << 3
                | (self.highest_delivered_pdcp_sn.is_some() as u8) << 2
                | (self.final_frame_ind as u8) << 1
                | self.lost_nru_sn_ranges.is_some() as u8,
        );
        out.put_u8(
            (self.delivered_pdcp_sn_ranges.is_some() as u8) << 4
                | (self.desired_data_rate.is_some() as u8) << 3
                | (self.highest_retransmitted_pdcp_sn.is_some() as u8) << 2
                | (self.highest_delivered_retransmitted_pdcp_sn.is_some() as u8) << 1
                | self.cause_value.is_some() as u8,
        );
        out.put_u32(self.desired_buffer_size);

        if let Some(rate) = self.desired_data_rate {
            out.put_u32(rate);
        }
        if let Some(ranges) = &self.lost_nru_sn_ranges {
            put_ranges(
                out,
                ranges.iter().map(|r| (r.start, r.end)),
                "lost NR-U SN ranges",
                MAX_NOF_LOST_NRU_SN_RANGES,
            )?;
        }
        if let Some(sn) = self.highest_delivered_pdcp_sn {
            put_u24(out, sn, "highest delivered NR PDCP SN")?;
        }
        if let Some(sn) = self.highest_transmitted_pdcp_sn {
            put_u24(out, sn, "highest transmitted NR PDCP SN")?;
        }
        if let Some(cause) = self.cause_value {
            out.put_u8(cause);
        }
        if let Some(sn) = self.highest_delivered_retransmitted_pdcp_sn {
            put_u24(out, sn, "highest delivered retransmitted NR PDCP SN")?;
        }
        if let Some(sn) = self.highest_retransmitted_pdcp_sn {
            put_u24(out, sn, "highest retransmitted NR PDCP SN")?;
        }
        if let Some(ranges) = &self.delivered_pdcp_sn_ranges {
            put_ranges(
                out,
                ranges.iter().map(|r| (r.start, r.end)),
                "delivered NR PDCP SN ranges",
                MAX_NOF_DELIVERED_PDCP_SN_RANGES,
            )?;
        }
        pad(out, start);
        Ok(())
    }

    fn unpack(container: &[u8], logger: &Logger) -> Result<Self, NrupError> {
        let mut r = Reader::new(container);
        let octet_0 = r.u8()?;
        check_pdu_type::<Self>(octet_0)?;
        let octet_1 = r.u8()?;
        if octet_1 & 0b111_0_0_0_0_0 != 0 {
            debug!(
                logger,
                "Spare bits set in DL DATA DELIVERY STATUS octet 1 ({octet_1:#04x})"
            );
        }

        let mut msg = NruDlDataDeliveryStatus {
            final_frame_ind: octet_0 & 0b0000_0_0_1_0 != 0,
            desired_buffer_size: r.u32()?,
            ..Default::default()
        };

        if octet_1 & 0b000_0_1_0_0_0 != 0 {
            msg.desired_data_rate = Some(r.u32()?);
        }
        if octet_0 & 0b0000_0_0_0_1 != 0 {
            let ranges = get_ranges(&mut r, "lost NR-U SN ranges", MAX_NOF_LOST_NRU_SN_RANGES)?;
            msg.lost_nru_sn_ranges = Some(
                ranges
                    .into_iter()
                    .map(|(start, end)| NruSnRange { start, end })
                    .collect(),
            );
        }
        if octet_0 & 0b0000_0_1_0_0 != 0 {
            msg.highest_delivered_pdcp_sn = Some(r.u24()?);
        }
        if octet_0 & 0b0000_1_0_0_0 != 0 {
            msg.highest_transmitted_pdcp_sn = Some(r.u24()?);
        }
        if octet_1 & 0b000_0_0_0_0_1 != 0 {
            msg.cause_value = Some(r.u8()?);
        }
        if octet_1 & 0b000_0_0_0_1_0 != 0 {
            msg.highest_delivered_retransmitted_pdcp_sn = Some(r.u24()?);
        }
        if octet_1 & 0b000_0_0_1_0_0 != 0 {
            msg.highest_retransmitted_pdcp_sn = Some(r.u24()?);
        }
        if octet_1 & 0b000_1_0_0_0_0 != 0 {
            let ranges = get_ranges(
                &mut r,
                "delivered NR PDCP SN ranges",
                MAX_NOF_DELIVERED_PDCP_SN_RANGES,
            )?;
            msg.delivered_pdcp_sn_ranges = Some(
                ranges
                    .into_iter()
                    .map(|(start, end)| PdcpSnRange { start, end })
                    .collect(),
            );
        }
        finish(r, logger)?;
        Ok(msg)
    }
}

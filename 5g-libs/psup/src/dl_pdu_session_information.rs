#![allow(clippy::unusual_byte_groupings)]
//! dl_pdu_session_information - DL PDU SESSION INFORMATION (PDU type 0), TS38.415, 5.5.2.1

use crate::packing::check_pdu_type;
use crate::wire::{Reader, check_bits, finish, pad};
use crate::{PsupError, PsupMessage, PsupPduType};
use bytes::BufMut;
use slog::{Logger, debug};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PsupDlPduSessionInformation {
    pub rqi: bool,
    pub qos_flow_id: u8,
    /// Paging policy indicator (3 bits).
    pub ppi: Option<u8>,
    pub dl_sending_timestamp: Option<u64>,
    pub dl_qfi_sn: Option<u32>,
    pub dl_mbs_qfi_sn: Option<u32>,
}

impl PsupMessage for PsupDlPduSessionInformation {
    const PDU_TYPE: PsupPduType = PsupPduType::DlPduSessionInformation;

    fn pack(&self, out: &mut Vec<u8>) -> Result<(), PsupError> {
        check_bits(self.qos_flow_id as u64, 6, "QFI")?;
        if let Some(ppi) = self.ppi {
            check_bits(ppi as u64, 3, "PPI")?;
        }
        if let Some(sn) = self.dl_qfi_sn {
            check_bits(sn as u64, 24, "DL QFI SN")?;
        }

        let start = out.len();
        out.put_u8(
            u8::from(Self::PDU_TYPE) << 4
                | (self.dl_sending_timestamp.is_some() as u8) << 3
                | (self.dl_qfi_sn.is_some() as u8) << 2
                | (self.dl_mbs_qfi_sn.is_some() as u8) << 1,
        );
        out.put_u8((self.ppi.is_some() as u8) << 7 | (self.rqi as u8) << 6 | self.qos_flow_id);
        if let Some(ppi) = self.ppi {
            out.put_u8(ppi << 5);
        }
        if let Some(timestamp) = self.dl_sending_timestamp {
            out.put_u64(timestamp);
        }
        if let Some(sn) = self.dl_qfi_sn {
            out.put_uint(sn as u64, 3);
        }
        if let Some(sn) = self.dl_mbs_qfi_sn {
            out.put_u32(sn);
        }
        pad(out, start);
        Ok(())
    }

    fn unpack(container: &[u8], logger: &Logger) -> Result<Self, PsupError> {
        let mut r = Reader::new(container);
        let octet_0 = r.u8()?;
        check_pdu_type::<Self>(octet_0)?;
        if octet_0 & 0b0000_0_0_0_1 != 0 {
            debug!(
                logger,
                "Spare bit set in DL PDU SESSION INFORMATION octet 0 ({octet_0:#04x})"
            );
        }
        let octet_1 = r.u8()?;
        let mut msg = PsupDlPduSessionInformation {
            rqi: octet_1 & 0b0_1_000000 != 0,
            qos_flow_id: octet_1 & 0b0_0_111111,
            ..Default::default()
        };
        if octet_1 & 0b1_0_000000 != 0 {
            let ppi_octet = r.u8()?;
            if ppi_octet & 0b000_11111 != 0 {
                debug!(logger, "Spare bits set after PPI ({ppi_octet:#04x})");
            }
            msg.ppi = Some(ppi_octet >> 5);
        }
        if octet_0 & 0b0000_1_0_0_0 != 0 {
            msg.dl_sending_timestamp = Some(r.u64()?);
        }
        if octet_0 & 0b0000_0_1_0_0 != 0 {
            msg.dl_qfi_sn = Some(r.u24()?);
        }
        if octet_0 & 0b0000_0_0_1_0 != 0 {
            msg.dl_mbs_qfi_sn = Some(r.u32()?);
        }
        finish(r, logger)?;
        Ok(msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PsupPacking;
    use hex_literal::hex;
    use proptest::prelude::*;

    fn logger() -> Logger {
        Logger::root(slog::Discard, slog::o!())
    }

    #[test]
    fn qfi_only() {
        let msg = PsupDlPduSessionInformation {
            qos_flow_id: 9,
            ..Default::default()
        };
        let mut out = vec![];
        msg.pack(&mut out).unwrap();
        assert_eq!(out, hex!("00 09").to_vec());
        assert_eq!(
            PsupDlPduSessionInformation::unpack(&out, &logger()).unwrap(),
            msg
        );
    }

    #[test]
    fn ppi_rqi_and_sn() {
        let bytes = hex!("04 c1 a0 00 00 2a");
        let msg = PsupDlPduSessionInformation::unpack(&bytes, &logger()).unwrap();
        assert_eq!(
            msg,
            PsupDlPduSessionInformation {
                rqi: true,
                qos_flow_id: 1,
                ppi: Some(5),
                dl_qfi_sn: Some(42),
                ..Default::default()
            }
        );
        let mut out = vec![];
        msg.pack(&mut out).unwrap();
        assert_eq!(out, bytes.to_vec());
    }

    #[test]
    fn spare_bit_is_tolerated() {
        let msg = PsupDlPduSessionInformation::unpack(&hex!("01 05"), &logger()).unwrap();
        assert_eq!(msg.qos_flow_id, 5);
    }

    #[test]
    fn bad_padding() {
        assert_eq!(
            PsupDlPduSessionInformation::unpack(&hex!("00 05 00"), &logger()),
            Err(PsupError::BadPadding {
                expected: 0,
                actual: 1
            })
        );
    }

    #[test]
    fn ul_is_not_dl() {
        assert_eq!(
            PsupDlPduSessionInformation::unpack(&hex!("10 05"), &logger()),
            Err(PsupError::UnexpectedPduType {
                expected: 0,
                actual: 1
            })
        );
    }

    #[test]
    fn out_of_range_fields_are_not_packed() {
        let packing = PsupPacking::new(logger());
        let mut out = vec![];
        let bad_qfi = PsupDlPduSessionInformation {
            qos_flow_id: 64,
            ..Default::default()
        };
        assert!(matches!(
            packing.pack(&mut out, &bad_qfi),
            Err(PsupError::OutOfRange { bits: 6, .. })
        ));
        let bad_ppi = PsupDlPduSessionInformation {
            ppi: Some(8),
            ..Default::default()
        };
        assert!(matches!(
            packing.pack(&mut out, &bad_ppi),
            Err(PsupError::OutOfRange { bits: 3, .. })
        ));
        assert!(out.is_empty());
    }

    prop_compose! {
        fn dl_info()(
            rqi in any::<bool>(),
            qos_flow_id in 0u8..64,
            ppi in proptest::option::of(0u8..8),
            dl_sending_timestamp in proptest::option::of(any::<u64>()),
            dl_qfi_sn in proptest::option::of(0u32..0x0100_0000),
            dl_mbs_qfi_sn in proptest::option::of(any::<u32>()),
        ) -> PsupDlPduSessionInformation {
            PsupDlPduSessionInformation {
                rqi,
                qos_flow_id,
                ppi,
                dl_sending_timestamp,
                dl_qfi_sn,
                dl_mbs_qfi_sn,
            }
        }
    }

    proptest! {
        #[test]
        fn unpack_inverts_pack(msg in dl_info()) {
            let mut out = vec![];
            msg.pack(&mut out).unwrap();
            prop_assert_eq!((out.len() + 2) % 4, 0);
            prop_assert_eq!(PsupDlPduSessionInformation::unpack(&out, &logger()).unwrap(), msg);
        }
    }
}

use crate::NrupError;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use slog::{Logger, error};

// TS38.425, 5.5.3.1.  Values 3-15 are reserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum NrupPduType {
    DlUserData = 0,
    DlDataDeliveryStatus = 1,
    AssistanceInformation = 2,
}

/// Peek at the PDU type in the top nibble of the first octet.
pub fn get_pdu_type(container: &[u8]) -> Result<NrupPduType, NrupError> {
    let first = container.first().ok_or(NrupError::Empty)?;
    let pdu_type = first >> 4;
    NrupPduType::try_from(pdu_type).map_err(|_| NrupError::UnknownPduType(pdu_type))
}

/// A frame format with its own PDU type.
pub trait NrupMessage: Sized {
    const PDU_TYPE: NrupPduType;

    /// Append the frame, including padding, to `out`.
    fn pack(&self, out: &mut Vec<u8>) -> Result<(), NrupError>;

    /// Decode a whole NR RAN container.  Spare bits are reported to `logger` and otherwise
    /// ignored.
    fn unpack(container: &[u8], logger: &Logger) -> Result<Self, NrupError>;
}

pub(crate) fn check_pdu_type<T: NrupMessage>(first_octet: u8) -> Result<(), NrupError> {
    let expected: u8 = T::PDU_TYPE.into();
    let actual = first_octet >> 4;
    if actual != expected {
        return Err(NrupError::UnexpectedPduType { expected, actual });
    }
    Ok(())
}

/// NR-U packer/unpacker that logs failures against its own logger.
#[derive(Clone)]
pub struct NrupPacking {
    logger: Logger,
}

impl NrupPacking {
    pub fn new(logger: Logger) -> Self {
        NrupPacking { logger }
    }

    pub fn get_pdu_type(&self, container: &[u8]) -> Result<NrupPduType, NrupError> {
        get_pdu_type(container)
    }

    pub fn pack<T: NrupMessage>(&self, out: &mut Vec<u8>, msg: &T) -> Result<(), NrupError> {
        let start = out.len();
        msg.pack(out).inspect_err(|e| {
            out.truncate(start);
            error!(self.logger, "Failed to pack {:?}: {e}", T::PDU_TYPE);
        })
    }

    pub fn unpack<T: NrupMessage>(&self, container: &[u8]) -> Result<T, NrupError> {
        T::unpack(container, &self.logger).inspect_err(|e| {
            error!(
                self.logger,
                "Failed to unpack {:?} from {} bytes: {e}",
                T::PDU_TYPE,
                container.len()
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdu_type_peek() {
        assert_eq!(get_pdu_type(&[0x00]), Ok(NrupPduType::DlUserData));
        assert_eq!(get_pdu_type(&[0x1f]), Ok(NrupPduType::DlDataDeliveryStatus));
        assert_eq!(get_pdu_type(&[0x20]), Ok(NrupPduType::AssistanceInformation));
        assert_eq!(get_pdu_type(&[0x30]), Err(NrupError::UnknownPduType(3)));
        assert_eq!(get_pdu_type(&[0xf0]), Err(NrupError::UnknownPduType(15)));
        assert_eq!(get_pdu_type(&[]), Err(NrupError::Empty));
    }
}

use crate::PsupError;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use slog::{Logger, error};

// TS38.415, 5.5.3.1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum PsupPduType {
    DlPduSessionInformation = 0,
    UlPduSessionInformation = 1,
}

/// Peek at the PDU type in the top nibble of the first octet.
pub fn get_pdu_type(container: &[u8]) -> Result<PsupPduType, PsupError> {
    let first = container.first().ok_or(PsupError::Empty)?;
    let pdu_type = first >> 4;
    PsupPduType::try_from(pdu_type).map_err(|_| PsupError::UnknownPduType(pdu_type))
}

pub trait PsupMessage: Sized {
    const PDU_TYPE: PsupPduType;

    /// Append the frame, including padding, to `out`.
    fn pack(&self, out: &mut Vec<u8>) -> Result<(), PsupError>;

    /// Decode a whole PDU session container.
    fn unpack(container: &[u8], logger: &Logger) -> Result<Self, PsupError>;
}

pub(crate) fn check_pdu_type<T: PsupMessage>(first_octet: u8) -> Result<(), PsupError> {
    let expected: u8 = T::PDU_TYPE.into();
    let actual = first_octet >> 4;
    if actual != expected {
        return Err(PsupError::UnexpectedPduType { expected, actual });
    }
    Ok(())
}

#[derive(Clone)]
pub struct PsupPacking {
    logger: Logger,
}

impl PsupPacking {
    pub fn new(logger: Logger) -> Self {
        PsupPacking { logger }
    }

    pub fn get_pdu_type(&self, container: &[u8]) -> Result<PsupPduType, PsupError> {
        get_pdu_type(container)
    }

    pub fn pack<T: PsupMessage>(&self, out: &mut Vec<u8>, msg: &T) -> Result<(), PsupError> {
        let start = out.len();
        msg.pack(out).inspect_err(|e| {
            out.truncate(start);
            error!(self.logger, "Failed to pack {:?}: {e}", T::PDU_TYPE);
        })
    }

    pub fn unpack<T: PsupMessage>(&self, container: &[u8]) -> Result<T, PsupError> {
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
        assert_eq!(
            get_pdu_type(&[0x00, 0x09]),
            Ok(PsupPduType::DlPduSessionInformation)
        );
        assert_eq!(
            get_pdu_type(&[0x10, 0x09]),
            Ok(PsupPduType::UlPduSessionInformation)
        );
        assert_eq!(get_pdu_type(&[0x20]), Err(PsupError::UnknownPduType(2)));
        assert_eq!(get_pdu_type(&[]), Err(PsupError::Empty));
    }
}

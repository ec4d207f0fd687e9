//! psup - PDU session user plane protocol (TS38.415), carried in the GTP-U PDU session container

mod dl_pdu_session_information;
mod error;
mod packing;
mod ul_pdu_session_information;
mod wire;

pub use dl_pdu_session_information::PsupDlPduSessionInformation;
pub use error::PsupError;
pub use packing::{PsupMessage, PsupPacking, PsupPduType, get_pdu_type};
pub use ul_pdu_session_information::{PsupUlPduSessionInformation, QmpTimestamps};

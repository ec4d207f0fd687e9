//! gtpu - GTP-U header, information element and path management codecs (TS29.281)

mod container;
mod error;
mod extension;
mod header;
mod ie;
mod messages;
mod teid;

pub use container::{ContainerError, ContainerReader, container_padding_len, pad_container};
pub use error::GtpuError;
pub use extension::{ExtensionHeader, ExtensionHeaderType};
pub use header::{
    GTPU_BASE_HEADER_LEN, GTPU_OPTIONAL_FIELDS_LEN, GtpuFlags, GtpuHeader, GtpuMessageType,
    encode_pdu, read_teid,
};
pub use ie::InformationElement;
pub use messages::{EchoRequest, EchoResponse, ErrorIndication};
pub use teid::GtpTeid;

pub const GTPU_PORT: u16 = 2152; // TS29.281, 4.4.2.3

/// TEID used by path management messages (echo, error indication).  TS29.281, 5.1.
pub const GTPU_PATH_MANAGEMENT_TEID: GtpTeid = GtpTeid(0);

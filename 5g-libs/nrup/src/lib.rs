//! nrup - NR user plane protocol (TS38.425), carried in the GTP-U NR RAN container

mod delivery_status;
mod dl_user_data;
mod error;
mod packing;
mod wire;

pub use delivery_status::{NruDlDataDeliveryStatus, NruSnRange, PdcpSnRange};
pub use dl_user_data::{NruDlUserData, PdcpSnDiscardBlock};
pub use error::NrupError;
pub use packing::{NrupMessage, NrupPacking, NrupPduType, get_pdu_type};

/// Maximum number of PDCP SN discard blocks in a DL USER DATA frame.
pub const MAX_NOF_DISCARD_BLOCKS: usize = 2;

/// Maximum number of lost NR-U SN ranges in a DL DATA DELIVERY STATUS frame.
pub const MAX_NOF_LOST_NRU_SN_RANGES: usize = 32;

/// Maximum number of successfully delivered PDCP SN ranges in a DL DATA DELIVERY STATUS frame.
pub const MAX_NOF_DELIVERED_PDCP_SN_RANGES: usize = 32;

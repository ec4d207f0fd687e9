mod mock_bearer;
mod mock_peer;
pub mod framework;

pub use mock_bearer::MockBearer;
pub use mock_peer::{MockPeer, ue_ipv4_udp_packet};

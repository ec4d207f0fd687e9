mod counters;
mod demux;
mod dispatch_queue;
mod error_indication;
mod gateway;
mod loopback;
mod packet_processor;
mod path_management;
mod pcap;
mod tunnel_registry;

pub use counters::{DemuxCounters, DemuxStats, dump_stats};
pub use demux::{DemuxError, GtpuDemux};
pub use dispatch_queue::{DispatchQueueHandle, PduContext};
pub use error_indication::GtpuTx;
pub use gateway::{UdpGateway, create_gtpu_socket, spawn_ingress};
pub use loopback::LoopbackBearer;
pub use packet_processor::PacketProcessor;
pub use path_management::PathManagement;
pub use pcap::{GtpuPcapWriter, NullPcapWriter, PcapWriter};
pub use tunnel_registry::TunnelRxNotifier;

//! pcap - best effort capture of GTP-U PDUs to a legacy pcap file
//!
//! Each PDU is written as a raw IPv4 packet carrying a UDP datagram on port 2152, so that
//! Wireshark and friends dissect it as GTP-U.

use anyhow::{Context, Result};
use async_channel::{Receiver, Sender};
use async_std::fs::File;
use async_std::io::WriteExt;
use async_std::task::JoinHandle;
use atomic_counter::{AtomicCounter, RelaxedCounter};
use gtpu::GTPU_PORT;
use pnet_packet::ip::IpNextHeaderProtocols;
use pnet_packet::ipv4::{self, MutableIpv4Packet};
use pnet_packet::udp::{self, MutableUdpPacket};
use slog::{Logger, info, warn};
use std::net::Ipv4Addr;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// Write-only sink for captured PDUs.
pub trait PcapWriter: Send + Sync {
    fn is_write_enabled(&self) -> bool;
    fn push_pdu(&self, pdu: Vec<u8>);
}

/// Capture switched off.
#[derive(Clone, Copy, Default)]
pub struct NullPcapWriter;

impl PcapWriter for NullPcapWriter {
    fn is_write_enabled(&self) -> bool {
        false
    }
    fn push_pdu(&self, _pdu: Vec<u8>) {}
}

const PCAP_MAGIC: u32 = 0xa1b2_c3d4;
const PCAP_VERSION_MAJOR: u16 = 2;
const PCAP_VERSION_MINOR: u16 = 4;
const PCAP_SNAPLEN: u32 = 65535;
const LINKTYPE_RAW: u32 = 101;
const IPV4_HEADER_LEN: usize = 20;
const UDP_HEADER_LEN: usize = 8;
const CAPTURE_QUEUE_DEPTH: usize = 4096;
const CAPTURE_ADDR: Ipv4Addr = Ipv4Addr::LOCALHOST;

pub struct GtpuPcapWriter {
    sender: Sender<(Duration, Vec<u8>)>,
    dropped: RelaxedCounter,
}

impl GtpuPcapWriter {
    /// Create the capture file and start the task that writes to it.  The task finishes
    /// once [`GtpuPcapWriter::close`] is called and the backlog is written.
    pub async fn create(path: &Path, logger: &Logger) -> Result<(Arc<Self>, JoinHandle<()>)> {
        let mut file = File::create(path)
            .await
            .with_context(|| format!("Failed to create capture file {}", path.display()))?;
        file.write_all(&global_header()).await?;
        info!(logger, "Capturing GTP-U PDUs to {}", path.display());

        let (sender, receiver) = async_channel::bounded(CAPTURE_QUEUE_DEPTH);
        let task = async_std::task::spawn(write_records(file, receiver, logger.clone()));
        Ok((
            Arc::new(GtpuPcapWriter {
                sender,
                dropped: RelaxedCounter::new(0),
            }),
            task,
        ))
    }

    pub fn close(&self) {
        self.sender.close();
    }

    /// PDUs not captured because the writer task had fallen behind.
    pub fn dropped(&self) -> usize {
        self.dropped.get()
    }
}

impl PcapWriter for GtpuPcapWriter {
    fn is_write_enabled(&self) -> bool {
        !self.sender.is_closed()
    }

    fn push_pdu(&self, pdu: Vec<u8>) {
        let timestamp = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or_default();
        if self.sender.try_send((timestamp, pdu)).is_err() {
            self.dropped.inc();
        }
    }
}

async fn write_records(mut file: File, receiver: Receiver<(Duration, Vec<u8>)>, logger: Logger) {
    while let Ok((timestamp, pdu)) = receiver.recv().await {
        let Some(record) = encode_record(timestamp, &pdu) else {
            warn!(logger, "PDU of {} bytes too big to capture", pdu.len());
            continue;
        };
        if let Err(e) = file.write_all(&record).await {
            warn!(logger, "Stopping capture after write failure - {e}");
            receiver.close();
            return;
        }
    }
    if let Err(e) = file.flush().await {
        warn!(logger, "Failed to flush capture file - {e}");
    }
}

fn global_header() -> Vec<u8> {
    let mut header = Vec::with_capacity(24);
    header.extend_from_slice(&PCAP_MAGIC.to_le_bytes());
    header.extend_from_slice(&PCAP_VERSION_MAJOR.to_le_bytes());
    header.extend_from_slice(&PCAP_VERSION_MINOR.to_le_bytes());
    header.extend_from_slice(&0i32.to_le_bytes()); // thiszone
    header.extend_from_slice(&0u32.to_le_bytes()); // sigfigs
    header.extend_from_slice(&PCAP_SNAPLEN.to_le_bytes());
    header.extend_from_slice(&LINKTYPE_RAW.to_le_bytes());
    header
}

/// Record header plus an IPv4/UDP packet wrapping `pdu`.  None if it won't fit in an IPv4 packet.
fn encode_record(timestamp: Duration, pdu: &[u8]) -> Option<Vec<u8>> {
    let udp_len = UDP_HEADER_LEN + pdu.len();
    let ip_len = IPV4_HEADER_LEN + udp_len;
    let total_length = u16::try_from(ip_len).ok()?;

    let mut packet = vec![0u8; ip_len];
    let mut ipv4_packet = MutableIpv4Packet::new(&mut packet[..IPV4_HEADER_LEN])?;
    ipv4_packet.set_version(4);
    ipv4_packet.set_header_length(5);
    ipv4_packet.set_total_length(total_length);
    ipv4_packet.set_ttl(64);
    ipv4_packet.set_next_level_protocol(IpNextHeaderProtocols::Udp);
    ipv4_packet.set_source(CAPTURE_ADDR);
    ipv4_packet.set_destination(CAPTURE_ADDR);
    let checksum = ipv4::checksum(&ipv4_packet.to_immutable());
    ipv4_packet.set_checksum(checksum);

    let mut udp_packet = MutableUdpPacket::new(&mut packet[IPV4_HEADER_LEN..])?;
    udp_packet.set_source(GTPU_PORT);
    udp_packet.set_destination(GTPU_PORT);
    udp_packet.set_length(udp_len as u16);
    udp_packet.set_payload(pdu);
    let checksum = udp::ipv4_checksum(&udp_packet.to_immutable(), &CAPTURE_ADDR, &CAPTURE_ADDR);
    udp_packet.set_checksum(checksum);

    let mut record = Vec::with_capacity(16 + ip_len);
    record.extend_from_slice(&(timestamp.as_secs() as u32).to_le_bytes());
    record.extend_from_slice(&timestamp.subsec_micros().to_le_bytes());
    record.extend_from_slice(&(ip_len as u32).to_le_bytes());
    record.extend_from_slice(&(ip_len as u32).to_le_bytes());
    record.extend_from_slice(&packet);
    Some(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;
    use pcap_parser::traits::PcapReaderIterator;
    use pcap_parser::{LegacyPcapReader, PcapBlockOwned, PcapError};
    use pnet_packet::Packet;
    use pnet_packet::ipv4::Ipv4Packet;
    use pnet_packet::udp::UdpPacket;

    const PDU: [u8; 12] = hex!("30 ff 00 04 00 00 00 10 45 00 00 00");

    #[test]
    fn record_wraps_pdu_in_ipv4_udp() {
        let record = encode_record(Duration::new(3, 4_000), &PDU).unwrap();
        assert_eq!(&record[0..4], &3u32.to_le_bytes());
        assert_eq!(&record[4..8], &4u32.to_le_bytes());
        assert_eq!(&record[8..12], &40u32.to_le_bytes());

        let ip = Ipv4Packet::new(&record[16..]).unwrap();
        assert_eq!(ip.get_total_length(), 40);
        assert_eq!(ip.get_next_level_protocol(), IpNextHeaderProtocols::Udp);
        assert_eq!(ip.get_checksum(), ipv4::checksum(&ip));
        let udp = UdpPacket::new(ip.payload()).unwrap();
        assert_eq!(udp.get_destination(), GTPU_PORT);
        assert_eq!(udp.payload(), &PDU);
    }

    #[test]
    fn oversized_pdu_is_not_captured() {
        assert!(encode_record(Duration::ZERO, &vec![0; 65535]).is_none());
    }

    #[async_std::test]
    async fn capture_file_is_readable() -> Result<()> {
        let logger = Logger::root(slog::Discard, slog::o!());
        let path = std::env::temp_dir()
            .join(format!("cu-up-capture-{}.pcap", rand::random::<u32>()));
        let (writer, task) = GtpuPcapWriter::create(&path, &logger).await?;
        assert!(writer.is_write_enabled());
        writer.push_pdu(PDU.to_vec());
        writer.push_pdu(PDU[..8].to_vec());
        writer.close();
        assert!(!writer.is_write_enabled());
        task.await;

        let file = std::fs::File::open(&path)?;
        let mut reader =
            LegacyPcapReader::new(65536, file).map_err(|e| anyhow::anyhow!("{e:?}"))?;
        let mut link_type = None;
        let mut payloads = vec![];
        loop {
            match reader.next() {
                Ok((offset, block)) => {
                    match block {
                        PcapBlockOwned::LegacyHeader(header) => link_type = Some(header.network.0),
                        PcapBlockOwned::Legacy(packet) => {
                            let ip = Ipv4Packet::new(packet.data).unwrap();
                            let udp = UdpPacket::new(ip.payload()).unwrap();
                            payloads.push(udp.payload().to_vec());
                        }
                        _ => (),
                    }
                    reader.consume(offset);
                }
                Err(PcapError::Eof) => break,
                Err(PcapError::Incomplete(_)) => {
                    reader.refill().map_err(|e| anyhow::anyhow!("{e:?}"))?
                }
                Err(e) => panic!("{e:?}"),
            }
        }
        std::fs::remove_file(&path)?;

        assert_eq!(link_type, Some(LINKTYPE_RAW as i32));
        assert_eq!(payloads, vec![PDU.to_vec(), PDU[..8].to_vec()]);
        Ok(())
    }
}

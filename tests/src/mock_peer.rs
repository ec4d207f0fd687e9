use anyhow::{Result, bail};
use async_net::{SocketAddr, UdpSocket};
use async_std::future;
use gtpu::{
    EchoRequest, EchoResponse, ErrorIndication, ExtensionHeader, GtpTeid, GtpuHeader, encode_pdu,
};
use pnet_packet::ip::IpNextHeaderProtocols;
use pnet_packet::ipv4::MutableIpv4Packet;
use pnet_packet::udp::MutableUdpPacket;
use slog::{Logger, info};
use std::net::Ipv4Addr;
use std::time::Duration;

const RECV_TIMEOUT: Duration = Duration::from_secs(1);
const QUIET_PERIOD: Duration = Duration::from_millis(200);

/// A GTP-U node on the far side of F1-U / N3, for example a DU or a UPF.
pub struct MockPeer {
    gtpu_socket: UdpSocket,
    cu_up_addr: SocketAddr,
    logger: Logger,
}

impl MockPeer {
    pub async fn new(local_ip: &str, cu_up_addr: SocketAddr, logger: Logger) -> Result<Self> {
        let gtpu_socket = UdpSocket::bind(format!("{local_ip}:0")).await?;
        info!(logger, "Mock peer on {}", gtpu_socket.local_addr()?);
        Ok(MockPeer {
            gtpu_socket,
            cu_up_addr,
            logger,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.gtpu_socket.local_addr()?)
    }

    pub async fn send_raw(&self, pdu: &[u8]) -> Result<()> {
        let _bytes_sent = self.gtpu_socket.send_to(pdu, self.cu_up_addr).await?;
        Ok(())
    }

    pub async fn send_g_pdu(
        &self,
        teid: GtpTeid,
        ext_list: Vec<ExtensionHeader>,
        payload: &[u8],
    ) -> Result<Vec<u8>> {
        let pdu = encode_pdu(GtpuHeader::g_pdu(teid, ext_list), payload)?;
        info!(self.logger, "Send G-PDU with TEID {teid}, {} bytes", pdu.len());
        self.send_raw(&pdu).await?;
        Ok(pdu)
    }

    pub async fn send_echo_request(&self, seq_number: u16) -> Result<()> {
        self.send_raw(&EchoRequest { seq_number }.encode()?).await
    }

    pub async fn recv(&self) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; 2000];
        let (bytes_received, source_address) =
            future::timeout(RECV_TIMEOUT, self.gtpu_socket.recv_from(&mut buf)).await??;
        if source_address != self.cu_up_addr {
            bail!("Received datagram from {source_address}, expected {}", self.cu_up_addr);
        }
        buf.truncate(bytes_received);
        Ok(buf)
    }

    pub async fn recv_error_indication(&self) -> Result<ErrorIndication> {
        Ok(ErrorIndication::decode(&self.recv().await?)?)
    }

    pub async fn recv_echo_response(&self) -> Result<EchoResponse> {
        Ok(EchoResponse::decode(&self.recv().await?)?)
    }

    /// Fails if anything arrives within a short period.
    pub async fn expect_nothing(&self) -> Result<()> {
        let mut buf = vec![0u8; 2000];
        match future::timeout(QUIET_PERIOD, self.gtpu_socket.recv_from(&mut buf)).await {
            Err(_) => Ok(()),
            Ok(Ok((n, _))) => bail!("Unexpected {n} byte datagram {:x?}", &buf[..n]),
            Ok(Err(e)) => Err(e.into()),
        }
    }
}

/// A one byte UDP datagram in an IPv4 packet, as a UE would send it.
pub fn ue_ipv4_udp_packet(src: Ipv4Addr, dst: Ipv4Addr, data: u8) -> Vec<u8> {
    const IPV4_HEADER_LEN: usize = 20;
    const UDP_LEN: usize = 9;
    let mut packet = vec![0u8; IPV4_HEADER_LEN + UDP_LEN];

    let mut udp_packet = MutableUdpPacket::new(&mut packet[IPV4_HEADER_LEN..]).unwrap();
    udp_packet.set_source(23215);
    udp_packet.set_destination(23215);
    udp_packet.set_length(UDP_LEN as u16);
    udp_packet.set_payload(&[data]);
    let checksum = pnet_packet::udp::ipv4_checksum(&udp_packet.to_immutable(), &src, &dst);
    udp_packet.set_checksum(checksum);

    let mut ipv4_packet = MutableIpv4Packet::new(&mut packet[..IPV4_HEADER_LEN]).unwrap();
    ipv4_packet.set_version(4);
    ipv4_packet.set_header_length(5);
    ipv4_packet.set_total_length((IPV4_HEADER_LEN + UDP_LEN) as u16);
    ipv4_packet.set_ttl(64);
    ipv4_packet.set_next_level_protocol(IpNextHeaderProtocols::Udp);
    ipv4_packet.set_source(src);
    ipv4_packet.set_destination(dst);
    let checksum = pnet_packet::ipv4::checksum(&ipv4_packet.to_immutable());
    ipv4_packet.set_checksum(checksum);

    packet
}

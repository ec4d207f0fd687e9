//! gateway - the GTP-U UDP endpoint and the ingress task that feeds the demux

use super::demux::GtpuDemux;
use super::error_indication::GtpuTx;
use anyhow::{Context, Result};
use async_std::net::UdpSocket;
use async_std::task::{self, JoinHandle};
use slog::{Logger, debug, info, warn};
use socket2::{Domain, Protocol, Socket, Type};
use std::net::{IpAddr, SocketAddr};
use stop_token::StopToken;
use stop_token::prelude::*;

const MAX_DATAGRAM_LEN: usize = 65535;

pub fn create_gtpu_socket(
    local_ip: IpAddr,
    port: u16,
    logger: &Logger,
) -> Result<std::net::UdpSocket> {
    let transport_address = SocketAddr::new(local_ip, port);
    let domain = match local_ip {
        IpAddr::V4(_) => Domain::IPV4,
        IpAddr::V6(_) => Domain::IPV6,
    };

    let gtpu_socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))?;
    gtpu_socket.set_reuse_port(true)?;
    gtpu_socket
        .bind(&transport_address.into())
        .context(format!("Failed to bind {}", transport_address))?;
    let gtpu_socket: std::net::UdpSocket = gtpu_socket.into();
    info!(logger, "Serving GTP-U on {}", gtpu_socket.local_addr()?);
    Ok(gtpu_socket)
}

/// Sending side of the GTP-U endpoint.  The same socket is cloned for the ingress task.
pub struct UdpGateway {
    socket: std::net::UdpSocket,
    local_addr: SocketAddr,
    logger: Logger,
}

impl UdpGateway {
    pub fn bind(local_ip: IpAddr, port: u16, logger: &Logger) -> Result<Self> {
        let socket = create_gtpu_socket(local_ip, port, logger)?;
        socket.set_nonblocking(true)?;
        let local_addr = socket.local_addr()?;
        Ok(UdpGateway {
            socket,
            local_addr,
            logger: logger.clone(),
        })
    }

    pub fn local_socket_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn ingress_socket(&self) -> Result<UdpSocket> {
        Ok(self.socket.try_clone()?.into())
    }
}

impl GtpuTx for UdpGateway {
    fn local_address(&self) -> Option<IpAddr> {
        let ip = self.local_addr.ip();
        (!ip.is_unspecified()).then_some(ip)
    }

    fn send_to(&self, pdu: Vec<u8>, dst: SocketAddr) {
        if let Err(e) = self.socket.send_to(&pdu, dst) {
            warn!(self.logger, "Failed to send {} bytes to {dst} - {e}", pdu.len());
        }
    }
}

/// Receive datagrams and hand them to the demux until `stop_token` fires.
pub fn spawn_ingress(
    socket: UdpSocket,
    demux: GtpuDemux,
    stop_token: StopToken,
    logger: Logger,
) -> JoinHandle<()> {
    task::spawn(async move {
        let mut buf = vec![0u8; MAX_DATAGRAM_LEN];
        loop {
            match socket.recv_from(&mut buf).timeout_at(stop_token.clone()).await {
                Ok(Ok((bytes_read, src))) => demux.handle_pdu(buf[..bytes_read].to_vec(), src),
                Ok(Err(e)) => {
                    info!(logger, "Exiting GTP-U ingress with error {e}");
                    break;
                }
                Err(_) => {
                    debug!(logger, "GTP-U ingress stopped");
                    break;
                }
            }
        }
    })
}

use anyhow::{Result, bail};
use async_channel::{Receiver, Sender};
use async_std::future;
use cu_up::TunnelRxNotifier;
use std::net::SocketAddr;
use std::sync::{Arc, Weak};
use std::time::Duration;

const RECV_TIMEOUT: Duration = Duration::from_secs(1);
const QUIET_PERIOD: Duration = Duration::from_millis(200);

/// Stands in for the PDCP layer of a bearer.  Delivered PDUs are queued for the test to read.
pub struct MockBearer {
    sender: Sender<(Vec<u8>, SocketAddr)>,
    receiver: Receiver<(Vec<u8>, SocketAddr)>,
}

impl MockBearer {
    pub fn new() -> Arc<Self> {
        let (sender, receiver) = async_channel::unbounded();
        Arc::new(MockBearer { sender, receiver })
    }

    pub fn notifier(self: &Arc<Self>) -> Weak<dyn TunnelRxNotifier> {
        let weak: Weak<MockBearer> = Arc::downgrade(self);
        weak
    }

    pub async fn recv(&self) -> Result<(Vec<u8>, SocketAddr)> {
        Ok(future::timeout(RECV_TIMEOUT, self.receiver.recv()).await??)
    }

    pub async fn expect_nothing(&self) -> Result<()> {
        if let Ok(Ok((pdu, src))) = future::timeout(QUIET_PERIOD, self.receiver.recv()).await {
            bail!("Unexpected {} byte PDU from {src}", pdu.len());
        }
        Ok(())
    }
}

impl TunnelRxNotifier for MockBearer {
    fn on_new_pdu(&self, pdu: Vec<u8>, src: SocketAddr) {
        let _ = self.sender.try_send((pdu, src));
    }
}

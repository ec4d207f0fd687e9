/// Tunnel Endpoint Identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct GtpTeid(pub u32);

impl GtpTeid {
    pub fn to_be_bytes(self) -> [u8; 4] {
        self.0.to_be_bytes()
    }
}

impl From<u32> for GtpTeid {
    fn from(teid: u32) -> Self {
        GtpTeid(teid)
    }
}

impl From<[u8; 4]> for GtpTeid {
    fn from(bytes: [u8; 4]) -> Self {
        GtpTeid(u32::from_be_bytes(bytes))
    }
}

impl std::fmt::Display for GtpTeid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

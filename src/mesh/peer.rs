use std::{
    cmp::Ordering,
    fmt,
    net::{AddrParseError, IpAddr, SocketAddr},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

/// Идентичность узла сети: адрес и порт.
///
/// Хаб не знает про узлы ничего, кроме их идентичности — она нужна
/// только для сравнения при подавлении эха.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeerAddr {
    pub ip: IpAddr,
    pub port: u16,
}

impl PeerAddr {
    pub fn new(ip: IpAddr, port: u16) -> Self {
        Self { ip, port }
    }
}

impl fmt::Display for PeerAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", SocketAddr::new(self.ip, self.port))
    }
}

impl FromStr for PeerAddr {
    type Err = AddrParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let socket: SocketAddr = s.parse()?;
        Ok(Self::new(socket.ip(), socket.port()))
    }
}

impl From<SocketAddr> for PeerAddr {
    fn from(socket: SocketAddr) -> Self {
        Self::new(socket.ip(), socket.port())
    }
}

impl From<PeerAddr> for SocketAddr {
    fn from(peer: PeerAddr) -> Self {
        SocketAddr::new(peer.ip, peer.port)
    }
}

// Порядок: сначала адрес как строка, затем порт.
impl Ord for PeerAddr {
    fn cmp(&self, other: &Self) -> Ordering {
        self.ip
            .to_string()
            .cmp(&other.ip.to_string())
            .then(self.port.cmp(&other.port))
    }
}

impl PartialOrd for PeerAddr {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_parse_roundtrip() {
        let peer: PeerAddr = "127.0.0.1:9001".parse().unwrap();
        assert_eq!(peer.port, 9001);
        assert_eq!(peer.to_string(), "127.0.0.1:9001");
    }

    #[test]
    fn test_ipv6_uses_brackets() {
        let peer: PeerAddr = "[::1]:8048".parse().unwrap();
        assert_eq!(peer.to_string(), "[::1]:8048");
        assert_eq!(peer.to_string().parse::<PeerAddr>().unwrap(), peer);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("not-an-address".parse::<PeerAddr>().is_err());
        assert!("127.0.0.1".parse::<PeerAddr>().is_err());
    }

    #[test]
    fn test_ordering_by_address_then_port() {
        let a: PeerAddr = "10.0.0.1:9000".parse().unwrap();
        let b: PeerAddr = "10.0.0.1:9001".parse().unwrap();
        let c: PeerAddr = "10.0.0.2:1000".parse().unwrap();

        assert!(a < b);
        assert!(b < c);
    }
}

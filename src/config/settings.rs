use std::net::{AddrParseError, IpAddr};

use config::{Config, ConfigError, Environment};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::mesh::PeerAddr;

/// Mesh hub configuration.
///
/// Constructed once at startup and passed by reference to the
/// components that need it; there is no ambient global state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeshSettings {
    /// Mesh group name used by the discovery beacon.
    pub mesh_name: String,
    /// Address the node presents itself on.
    pub bind_ip: String,
    /// Lower bound of the listen port range (inclusive).
    pub from_port: u16,
    /// Upper bound of the listen port range (exclusive).
    pub to_port: u16,
}

impl MeshSettings {
    pub fn load() -> Result<Self, ConfigError> {
        let cfg = Config::builder()
            // Adding default values
            .set_default("mesh_name", "meshbus")?
            .set_default("bind_ip", "127.0.0.1")?
            .set_default("from_port", 8048)?
            .set_default("to_port", 12000)?
            // Add enviroment variables with the MESHBUS_ prefix
            .add_source(Environment::with_prefix("MESHBUS"))
            .build()?;

        let settings: Self = cfg.try_deserialize()?;
        if settings.from_port >= settings.to_port {
            return Err(ConfigError::Message(
                "from_port must be lower than to_port".into(),
            ));
        }
        Ok(settings)
    }

    /// Random listen port from the configured range.
    pub fn pick_port(&self) -> u16 {
        rand::thread_rng().gen_range(self.from_port..self.to_port)
    }

    /// Own peer identity for the given port.
    pub fn self_addr(&self, port: u16) -> Result<PeerAddr, AddrParseError> {
        let ip: IpAddr = self.bind_ip.parse()?;
        Ok(PeerAddr::new(ip, port))
    }
}

impl Default for MeshSettings {
    fn default() -> Self {
        Self {
            mesh_name: "meshbus".into(),
            bind_ip: "127.0.0.1".into(),
            from_port: 8048,
            to_port: 12000,
        }
    }
}

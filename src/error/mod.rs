pub mod bus;
pub mod network;
pub mod wire;

pub use bus::{BusError, SubscriberError};
pub use network::NetworkError;
pub use wire::{DecodeError, EncodeError};

/// Local delivery engine: messages, subscriptions, proxy, messenger hub.
pub mod bus;
/// Hub configuration loading.
pub mod config;
/// Common error types: bus, wire codec, network seam.
pub mod error;
/// Logging initialization (tracing subscriber).
pub mod logging;
/// Mesh extension: wire envelope, type registry, peer broadcast bridge.
pub mod mesh;

// -----------------------------------------------------------------------------
//  Frequently used public types
// -----------------------------------------------------------------------------

/// Local bus: hub, subscriptions, message contracts.
pub use bus::{
    DefaultMessageProxy, DefaultSubscriberErrorHandler, DeliveryAction, GenericMessage,
    MeshMessage, MessageFilter, MessageProxy, MessageSubscription, MessengerHub, SenderRef,
    SubscriberErrorHandler, SubscriptionId, SubscriptionToken, WireMessage,
};
/// config
pub use config::MeshSettings;
/// Operation errors.
pub use error::{BusError, DecodeError, EncodeError, NetworkError, SubscriberError};
pub use logging::init_logging;
/// Mesh: envelope codec, peer identity, broadcast bridge.
pub use mesh::{Envelope, MeshHub, MeshTransport, PeerAddr, WireTypeRegistry};

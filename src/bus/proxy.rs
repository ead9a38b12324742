use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::{
    bus::{message::MeshMessage, subscription::MessageSubscription},
    error::BusError,
};

/// Точка перехвата между диспетчером и подпиской.
///
/// Прокси может подменить сообщение, перенести вызов в другой поток
/// или просто передать его дальше.
pub trait MessageProxy: Send + Sync {
    fn deliver(
        &self,
        message: &dyn MeshMessage,
        subscription: &dyn MessageSubscription,
    ) -> Result<(), BusError>;
}

/// Прокси по умолчанию: ничего не делает, кроме самой доставки.
pub struct DefaultMessageProxy;

static DEFAULT_PROXY: Lazy<Arc<DefaultMessageProxy>> = Lazy::new(|| Arc::new(DefaultMessageProxy));

impl DefaultMessageProxy {
    /// Общий экземпляр для всех подписок без собственного прокси.
    pub fn instance() -> Arc<dyn MessageProxy> {
        DEFAULT_PROXY.clone()
    }
}

impl MessageProxy for DefaultMessageProxy {
    fn deliver(
        &self,
        message: &dyn MeshMessage,
        subscription: &dyn MessageSubscription,
    ) -> Result<(), BusError> {
        subscription.deliver(message)
    }
}

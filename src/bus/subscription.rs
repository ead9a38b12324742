use std::{
    fmt,
    sync::{Arc, Weak},
};

use crate::{bus::message::MeshMessage, error::BusError};

/// Идентификатор подписки, уникальный в пределах одного хаба.
pub type SubscriptionId = u64;

/// Обработчик доставки сообщений типа `M`.
pub type DeliveryAction<M> = dyn Fn(&M) + Send + Sync;

/// Предикат допуска сообщений типа `M`.
pub type MessageFilter<M> = dyn Fn(&M) -> bool + Send + Sync;

/// Типо-стёртая подписка — единица хранения реестра.
pub trait MessageSubscription: Send + Sync {
    fn id(&self) -> SubscriptionId;

    /// Стоит ли вообще пытаться доставить это сообщение:
    /// тип совпадает, обработчик жив (для слабых подписок) и фильтр
    /// пропускает сообщение.
    fn should_attempt_delivery(&self, message: &dyn MeshMessage) -> bool;

    /// Доставка с повторной проверкой типа. Несовпадение типа —
    /// [`BusError::TypeMismatch`]; умершая слабая подписка — тихий no-op.
    fn deliver(&self, message: &dyn MeshMessage) -> Result<(), BusError>;
}

/// Сильная подписка: реестр сам удерживает обработчик и фильтр.
pub(crate) struct StrongSubscription<M> {
    id: SubscriptionId,
    delivery_action: Arc<DeliveryAction<M>>,
    message_filter: Arc<MessageFilter<M>>,
}

impl<M: MeshMessage> StrongSubscription<M> {
    pub(crate) fn new(
        id: SubscriptionId,
        delivery_action: Arc<DeliveryAction<M>>,
        message_filter: Arc<MessageFilter<M>>,
    ) -> Self {
        Self {
            id,
            delivery_action,
            message_filter,
        }
    }
}

impl<M: MeshMessage> MessageSubscription for StrongSubscription<M> {
    fn id(&self) -> SubscriptionId {
        self.id
    }

    fn should_attempt_delivery(&self, message: &dyn MeshMessage) -> bool {
        match message.as_any().downcast_ref::<M>() {
            Some(typed) => (self.message_filter)(typed),
            None => false,
        }
    }

    fn deliver(&self, message: &dyn MeshMessage) -> Result<(), BusError> {
        let typed = message
            .as_any()
            .downcast_ref::<M>()
            .ok_or(BusError::TypeMismatch {
                expected: std::any::type_name::<M>(),
            })?;
        (self.delivery_action)(typed);
        Ok(())
    }
}

/// Слабая подписка: обработчиком и фильтром владеет внешний код.
///
/// Доступность проверяется только в момент доставки (`Weak::upgrade`);
/// умершая подписка сама выбывает из доставки, но из реестра
/// не удаляется.
pub(crate) struct WeakSubscription<M> {
    id: SubscriptionId,
    delivery_action: Weak<DeliveryAction<M>>,
    message_filter: Weak<MessageFilter<M>>,
}

impl<M: MeshMessage> WeakSubscription<M> {
    pub(crate) fn new(
        id: SubscriptionId,
        delivery_action: Weak<DeliveryAction<M>>,
        message_filter: Weak<MessageFilter<M>>,
    ) -> Self {
        Self {
            id,
            delivery_action,
            message_filter,
        }
    }
}

impl<M: MeshMessage> MessageSubscription for WeakSubscription<M> {
    fn id(&self) -> SubscriptionId {
        self.id
    }

    fn should_attempt_delivery(&self, message: &dyn MeshMessage) -> bool {
        let typed = match message.as_any().downcast_ref::<M>() {
            Some(typed) => typed,
            None => return false,
        };

        if self.delivery_action.upgrade().is_none() {
            return false;
        }

        match self.message_filter.upgrade() {
            Some(filter) => filter(typed),
            None => false,
        }
    }

    fn deliver(&self, message: &dyn MeshMessage) -> Result<(), BusError> {
        let typed = message
            .as_any()
            .downcast_ref::<M>()
            .ok_or(BusError::TypeMismatch {
                expected: std::any::type_name::<M>(),
            })?;

        if let Some(action) = self.delivery_action.upgrade() {
            action(typed);
        }
        Ok(())
    }
}

/// Типо-стёртая способность владельца токена снять подписку.
///
/// Токену не нужно знать ни тип сообщения, ни конкретный тип хаба —
/// удаление идёт только по идентификатору.
pub(crate) trait TokenOwner: Send + Sync {
    fn unsubscribe_id(&self, id: SubscriptionId);
}

/// Активная подписка на сообщение.
///
/// Держит невладеющую ссылку на хаб; при `Drop` снимает подписку.
/// Явный [`MessengerHub::unsubscribe`](crate::bus::MessengerHub::unsubscribe)
/// с последующим drop'ом токена безопасен — повторное удаление является
/// no-op.
pub struct SubscriptionToken {
    id: SubscriptionId,
    hub: Weak<dyn TokenOwner>,
}

impl SubscriptionToken {
    pub(crate) fn new(id: SubscriptionId, hub: Weak<dyn TokenOwner>) -> Self {
        Self { id, hub }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }
}

impl Drop for SubscriptionToken {
    fn drop(&mut self) {
        if let Some(hub) = self.hub.upgrade() {
            hub.unsubscribe_id(self.id);
        }
    }
}

impl fmt::Debug for SubscriptionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionToken")
            .field("id", &self.id)
            .finish()
    }
}

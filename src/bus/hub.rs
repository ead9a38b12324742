use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
    sync::{
        atomic::{AtomicU64, AtomicUsize, Ordering},
        Arc, Weak,
    },
};

use parking_lot::Mutex;
use tracing::warn;

use crate::{
    bus::{
        message::MeshMessage,
        proxy::{DefaultMessageProxy, MessageProxy},
        subscription::{
            DeliveryAction, MessageFilter, MessageSubscription, StrongSubscription,
            SubscriptionId, SubscriptionToken, TokenOwner, WeakSubscription,
        },
    },
    error::SubscriberError,
};

/// Приёмник сбоев подписчиков.
///
/// Получает пары (сообщение, ошибка); обязан вернуть управление
/// диспетчеру — прерывать проход доставки он не может.
pub trait SubscriberErrorHandler: Send + Sync {
    fn handle(&self, message: &dyn MeshMessage, error: &SubscriberError);
}

/// Обработчик по умолчанию: записать в лог и продолжить.
pub struct DefaultSubscriberErrorHandler;

impl SubscriberErrorHandler for DefaultSubscriberErrorHandler {
    fn handle(&self, message: &dyn MeshMessage, error: &SubscriberError) {
        warn!(?message, %error, "subscriber failed; continuing delivery");
    }
}

/// Пара (прокси, подписка) — единица хранения реестра.
#[derive(Clone)]
struct SubscriptionItem {
    proxy: Arc<dyn MessageProxy>,
    subscription: Arc<dyn MessageSubscription>,
}

/// Хаб сообщений: реестр подписок и диспетчер локальной доставки.
///
/// Все мутации реестра и скан допуска сериализуются одним замком;
/// вызов подписчиков всегда идёт вне замка (дисциплина
/// «снимок, затем вызов»), поэтому долгий подписчик не блокирует
/// чужие publish/subscribe.
pub struct MessengerHub {
    subscriptions: Mutex<Vec<SubscriptionItem>>,
    error_handler: Box<dyn SubscriberErrorHandler>,
    next_id: AtomicU64,
    /// Общее количество вызовов `publish`.
    pub publish_count: AtomicUsize,
    /// Количество сбоев подписчиков, переданных в обработчик.
    pub subscriber_error_count: AtomicUsize,
}

impl MessengerHub {
    pub fn new() -> Arc<Self> {
        Self::with_error_handler(Box::new(DefaultSubscriberErrorHandler))
    }

    pub fn with_error_handler(error_handler: Box<dyn SubscriberErrorHandler>) -> Arc<Self> {
        Arc::new(Self {
            subscriptions: Mutex::new(Vec::new()),
            error_handler,
            next_id: AtomicU64::new(1),
            publish_count: AtomicUsize::new(0),
            subscriber_error_count: AtomicUsize::new(0),
        })
    }

    /// Подписка на все сообщения типа `M`.
    pub fn subscribe<M, A>(self: &Arc<Self>, delivery_action: A) -> SubscriptionToken
    where
        M: MeshMessage,
        A: Fn(&M) + Send + Sync + 'static,
    {
        self.subscribe_filtered(delivery_action, |_: &M| true)
    }

    /// Подписка с фильтром: доставляются только сообщения,
    /// прошедшие предикат.
    pub fn subscribe_filtered<M, A, F>(
        self: &Arc<Self>,
        delivery_action: A,
        message_filter: F,
    ) -> SubscriptionToken
    where
        M: MeshMessage,
        A: Fn(&M) + Send + Sync + 'static,
        F: Fn(&M) -> bool + Send + Sync + 'static,
    {
        self.subscribe_with_proxy(delivery_action, message_filter, DefaultMessageProxy::instance())
    }

    /// Подписка с фильтром и собственным прокси доставки.
    pub fn subscribe_with_proxy<M, A, F>(
        self: &Arc<Self>,
        delivery_action: A,
        message_filter: F,
        proxy: Arc<dyn MessageProxy>,
    ) -> SubscriptionToken
    where
        M: MeshMessage,
        A: Fn(&M) + Send + Sync + 'static,
        F: Fn(&M) -> bool + Send + Sync + 'static,
    {
        let id = self.allocate_id();
        let delivery_action: Arc<DeliveryAction<M>> = Arc::new(delivery_action);
        let message_filter: Arc<MessageFilter<M>> = Arc::new(message_filter);
        let subscription: Arc<dyn MessageSubscription> =
            Arc::new(StrongSubscription::new(id, delivery_action, message_filter));

        self.add_subscription(proxy, subscription);
        self.token(id)
    }

    /// Слабая подписка: обработчиком и фильтром продолжает владеть
    /// вызывающий код; когда любой из них освобождён, подписка сама
    /// выбывает из доставки.
    pub fn subscribe_weak<M>(
        self: &Arc<Self>,
        delivery_action: &Arc<DeliveryAction<M>>,
        message_filter: &Arc<MessageFilter<M>>,
    ) -> SubscriptionToken
    where
        M: MeshMessage,
    {
        self.subscribe_weak_with_proxy(delivery_action, message_filter, DefaultMessageProxy::instance())
    }

    pub fn subscribe_weak_with_proxy<M>(
        self: &Arc<Self>,
        delivery_action: &Arc<DeliveryAction<M>>,
        message_filter: &Arc<MessageFilter<M>>,
        proxy: Arc<dyn MessageProxy>,
    ) -> SubscriptionToken
    where
        M: MeshMessage,
    {
        let id = self.allocate_id();
        let subscription: Arc<dyn MessageSubscription> = Arc::new(WeakSubscription::new(
            id,
            Arc::downgrade(delivery_action),
            Arc::downgrade(message_filter),
        ));

        self.add_subscription(proxy, subscription);
        self.token(id)
    }

    /// Снятие подписки по токену. Отсутствующий токен — тихий no-op.
    pub fn unsubscribe(&self, token: &SubscriptionToken) {
        self.unsubscribe_id(token.id());
    }

    /// Локальная доставка сообщения всем подходящим подпискам.
    ///
    /// Снимок допущенных подписок берётся под замком и фиксируется на
    /// весь проход: добавленные после снимка подписки это сообщение не
    /// получат, удалённые после снимка — всё равно получат.
    ///
    /// Паника или ошибка одного подписчика изолируется: она уходит в
    /// обработчик сбоев, а доставка остальным продолжается.
    pub fn publish(&self, message: &dyn MeshMessage) {
        self.publish_count.fetch_add(1, Ordering::Relaxed);

        let snapshot: Vec<SubscriptionItem> = {
            let subscriptions = self.subscriptions.lock();
            subscriptions
                .iter()
                .filter(|item| item.subscription.should_attempt_delivery(message))
                .cloned()
                .collect()
        };

        for item in snapshot {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                item.proxy.deliver(message, item.subscription.as_ref())
            }));

            let error = match outcome {
                Ok(Ok(())) => continue,
                Ok(Err(delivery)) => SubscriberError::Delivery(delivery),
                Err(payload) => SubscriberError::Panicked(panic_message(payload)),
            };

            self.subscriber_error_count.fetch_add(1, Ordering::Relaxed);
            self.error_handler.handle(message, &error);
        }
    }

    /// Текущий размер реестра (включая выбывшие слабые подписки).
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.lock().len()
    }

    fn allocate_id(&self) -> SubscriptionId {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    fn add_subscription(&self, proxy: Arc<dyn MessageProxy>, subscription: Arc<dyn MessageSubscription>) {
        self.subscriptions
            .lock()
            .push(SubscriptionItem { proxy, subscription });
    }

    fn token(self: &Arc<Self>, id: SubscriptionId) -> SubscriptionToken {
        let owner: Weak<dyn TokenOwner> = Arc::downgrade(self) as Weak<dyn TokenOwner>;
        SubscriptionToken::new(id, owner)
    }
}

impl TokenOwner for MessengerHub {
    fn unsubscribe_id(&self, id: SubscriptionId) {
        self.subscriptions
            .lock()
            .retain(|item| item.subscription.id() != id);
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(text) = payload.downcast_ref::<&'static str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

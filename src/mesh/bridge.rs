use std::sync::Arc;

use tracing::{debug, error, info, trace, warn};

use crate::{
    bus::{
        hub::MessengerHub,
        message::{MeshMessage, WireMessage},
        proxy::MessageProxy,
        subscription::SubscriptionToken,
    },
    config::MeshSettings,
    mesh::{envelope::Envelope, peer::PeerAddr, transport::MeshTransport, types::WireTypeRegistry},
};

/// Мост между локальным хабом и широковещательной сетью узлов.
///
/// Публикация сначала доставляется локально, затем — если известен
/// хотя бы ещё один узел — кодируется в конверт и рассылается через
/// транспорт. Входящие байты проходят обратный путь: декодирование,
/// подавление собственного эха и локальная доставка. Ретрансляции
/// нет: топология широковещания одношаговая.
pub struct MeshHub {
    hub: Arc<MessengerHub>,
    transport: Arc<dyn MeshTransport>,
    types: WireTypeRegistry,
    self_addr: PeerAddr,
}

impl MeshHub {
    pub fn new(
        self_addr: PeerAddr,
        hub: Arc<MessengerHub>,
        transport: Arc<dyn MeshTransport>,
    ) -> Arc<Self> {
        info!(node = %self_addr, "mesh hub started");
        Arc::new(Self {
            hub,
            transport,
            types: WireTypeRegistry::new(),
            self_addr,
        })
    }

    /// Конструктор из настроек: адрес узла собирается из `bind_ip`
    /// и случайного порта из настроенного диапазона.
    pub fn from_settings(
        settings: &MeshSettings,
        hub: Arc<MessengerHub>,
        transport: Arc<dyn MeshTransport>,
    ) -> Result<Arc<Self>, std::net::AddrParseError> {
        let self_addr = settings.self_addr(settings.pick_port())?;
        Ok(Self::new(self_addr, hub, transport))
    }

    pub fn local(&self) -> &Arc<MessengerHub> {
        &self.hub
    }

    pub fn self_addr(&self) -> &PeerAddr {
        &self.self_addr
    }

    pub fn types(&self) -> &WireTypeRegistry {
        &self.types
    }

    /// Регистрирует wire-тип для восстановления входящих сообщений.
    pub fn register_type<M: WireMessage>(&self) {
        self.types.register::<M>();
    }

    // --- делегирование подписок локальному хабу ---

    pub fn subscribe<M, A>(&self, delivery_action: A) -> SubscriptionToken
    where
        M: MeshMessage,
        A: Fn(&M) + Send + Sync + 'static,
    {
        self.hub.subscribe(delivery_action)
    }

    pub fn subscribe_filtered<M, A, F>(&self, delivery_action: A, message_filter: F) -> SubscriptionToken
    where
        M: MeshMessage,
        A: Fn(&M) + Send + Sync + 'static,
        F: Fn(&M) -> bool + Send + Sync + 'static,
    {
        self.hub.subscribe_filtered(delivery_action, message_filter)
    }

    pub fn subscribe_with_proxy<M, A, F>(
        &self,
        delivery_action: A,
        message_filter: F,
        proxy: Arc<dyn MessageProxy>,
    ) -> SubscriptionToken
    where
        M: MeshMessage,
        A: Fn(&M) + Send + Sync + 'static,
        F: Fn(&M) -> bool + Send + Sync + 'static,
    {
        self.hub
            .subscribe_with_proxy(delivery_action, message_filter, proxy)
    }

    pub fn unsubscribe(&self, token: &SubscriptionToken) {
        self.hub.unsubscribe(token);
    }

    /// Публикация: локальная доставка, затем — одна рассылка на проход.
    ///
    /// Одинокий узел сети не касается: рассылка идёт только когда
    /// известно больше одного узла. Сбои кодирования и рассылки
    /// логируются и наружу не выходят.
    pub fn publish<M: WireMessage>(&self, message: M) {
        let shared = Arc::new(message);
        self.hub.publish(&*shared);
        self.broadcast(shared.as_ref());
    }

    /// Публикация без блокировки вызывающего. Порядок относительно
    /// других асинхронных публикаций не гарантируется.
    ///
    /// Требует запущенного Tokio runtime.
    pub fn publish_async<M: WireMessage>(self: &Arc<Self>, message: M) {
        self.publish_async_with(message, || {});
    }

    /// То же, с колбэком о завершении всей последовательности
    /// (локальная доставка + условная рассылка).
    pub fn publish_async_with<M, C>(self: &Arc<Self>, message: M, callback: C)
    where
        M: WireMessage,
        C: FnOnce() + Send + 'static,
    {
        let bridge = Arc::clone(self);
        tokio::spawn(async move {
            bridge.publish(message);
            callback();
        });
    }

    fn broadcast<M: WireMessage>(&self, message: &M) {
        let peers = self.transport.peers();
        if peers.len() <= 1 {
            trace!(peers = peers.len(), "skipping broadcast: lone node");
            return;
        }

        match Envelope::encode(message, &self.self_addr) {
            Ok(bytes) => {
                if let Err(err) = self.transport.broadcast(bytes) {
                    warn!(error = %err, "broadcast failed");
                }
            }
            Err(err) => error!(error = %err, "failed to encode outgoing message"),
        }
    }

    /// Входящие байты от узла `peer`.
    ///
    /// Возвращает `true`, если конверт обработан (доставлен или
    /// подавлен как эхо), и `false` для байтов, которые не удалось
    /// разобрать — они остаются другим обработчикам транспорта.
    pub fn inbound(&self, peer: &PeerAddr, bytes: &[u8]) -> bool {
        let envelope = match Envelope::decode(bytes) {
            Ok(envelope) => envelope,
            Err(err) => {
                warn!(peer = %peer, error = %err, "dropping undecodable envelope");
                debug!(dump = %String::from_utf8_lossy(bytes), "envelope dump");
                return false;
            }
        };

        let message = match self.types.decode(&envelope) {
            Ok(message) => message,
            Err(err) => {
                warn!(
                    peer = %peer,
                    type_tag = %envelope.type_tag,
                    error = %err,
                    "dropping envelope"
                );
                return false;
            }
        };

        // Собственная рассылка вернулась по кругу — второй раз
        // локально не доставляем.
        if envelope.sender == self.self_addr.to_string() {
            trace!(message = ?message, "suppressing self echo");
            return true;
        }

        debug!(peer = %peer, type_tag = %envelope.type_tag, "peer said");
        // Одношаговая топология: принятое сообщение дальше не рассылаем.
        self.hub.publish(message.as_ref());
        true
    }

    /// Discovery сообщил свежий список узлов: просим транспорт
    /// подключить ещё не известные. Собственный маяк тоже возвращается
    /// сюда — он подключается как обычный узел, а петлю обезвреживает
    /// проверка эха в `inbound`.
    pub fn peers_discovered(&self, discovered: &[PeerAddr]) {
        let connected = self.transport.peers();
        for peer in discovered {
            if connected.contains(peer) {
                continue;
            }
            info!(peer = %peer, "adding peer to mesh");
            if let Err(err) = self.transport.connect(peer.clone()) {
                warn!(peer = %peer, error = %err, "failed to connect peer");
            }
        }
    }

    /// Уведомления транспорта; только журналирование, обязательств
    /// по доставке они не несут.
    pub fn peer_connected(&self, peer: &PeerAddr) {
        info!(peer = %peer, "peer connected");
    }

    pub fn peer_disconnected(&self, peer: &PeerAddr) {
        info!(peer = %peer, "peer disconnected");
    }
}

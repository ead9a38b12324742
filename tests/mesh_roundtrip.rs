//! Два узла в одном процессе, связанные транспортом-трубой: проверка
//! сквозного сценария «чат» из двух процессов, подавления эха и
//! одношаговой топологии.

use std::{
    any::Any,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use bytes::Bytes;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use meshbus::{
    MeshHub, MeshMessage, MeshTransport, MessengerHub, NetworkError, PeerAddr, WireMessage,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ChatMessage {
    from: String,
    msg: String,
}

impl MeshMessage for ChatMessage {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl WireMessage for ChatMessage {
    fn type_tag() -> &'static str {
        "meshbus.ChatMessage"
    }
}

/// Транспорт-труба: рассылка синхронно доставляет байты во входящий
/// обработчик каждого подключённого моста — в том числе обратно
/// отправителю, как это делает настоящая широковещательная сеть.
struct PipeTransport {
    self_addr: PeerAddr,
    peers: Vec<PeerAddr>,
    targets: Mutex<Vec<Arc<MeshHub>>>,
}

impl PipeTransport {
    fn new(self_addr: &str, peers: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            self_addr: self_addr.parse().unwrap(),
            peers: peers.iter().map(|p| p.parse().unwrap()).collect(),
            targets: Mutex::new(Vec::new()),
        })
    }

    fn attach(&self, bridge: &Arc<MeshHub>) {
        self.targets.lock().push(bridge.clone());
    }
}

impl MeshTransport for PipeTransport {
    fn broadcast(&self, bytes: Bytes) -> Result<(), NetworkError> {
        let targets = self.targets.lock().clone();
        for bridge in targets {
            bridge.inbound(&self.self_addr, &bytes);
        }
        Ok(())
    }

    fn peers(&self) -> Vec<PeerAddr> {
        self.peers.clone()
    }

    fn connect(&self, _peer: PeerAddr) -> Result<(), NetworkError> {
        Ok(())
    }
}

struct Node {
    bridge: Arc<MeshHub>,
    transport: Arc<PipeTransport>,
    received: Arc<Mutex<Vec<String>>>,
    hits: Arc<AtomicUsize>,
    _token: meshbus::SubscriptionToken,
}

fn node(self_addr: &str, peers: &[&str]) -> Node {
    let transport = PipeTransport::new(self_addr, peers);
    let bridge = MeshHub::new(
        self_addr.parse().unwrap(),
        MessengerHub::new(),
        transport.clone(),
    );
    bridge.register_type::<ChatMessage>();

    let received: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let hits = Arc::new(AtomicUsize::new(0));

    let sink = received.clone();
    let counter = hits.clone();
    let token = bridge.subscribe(move |m: &ChatMessage| {
        sink.lock().push(format!("{} > {}", m.from, m.msg));
        counter.fetch_add(1, Ordering::SeqCst);
    });

    Node {
        bridge,
        transport,
        received,
        hits,
        _token: token,
    }
}

/// Тест проверяет сквозной сценарий чата: узел A публикует,
/// подписчик узла B получает сообщение один раз, собственный подписчик
/// узла A — ровно один раз (локально, не через эхо).
#[test]
fn test_two_node_chat_roundtrip() {
    let a = node("10.0.0.1:8048", &["10.0.0.1:8048", "10.0.0.2:8050"]);
    let b = node("10.0.0.2:8050", &["10.0.0.1:8048", "10.0.0.2:8050"]);

    // Широковещание возвращается и самому отправителю.
    a.transport.attach(&a.bridge);
    a.transport.attach(&b.bridge);
    b.transport.attach(&a.bridge);
    b.transport.attach(&b.bridge);

    a.bridge.publish(ChatMessage {
        from: "alice".into(),
        msg: "hello mesh".into(),
    });

    assert_eq!(a.hits.load(Ordering::SeqCst), 1);
    assert_eq!(b.hits.load(Ordering::SeqCst), 1);
    assert_eq!(*a.received.lock(), vec!["alice > hello mesh".to_string()]);
    assert_eq!(*b.received.lock(), vec!["alice > hello mesh".to_string()]);

    // Ответ в обратную сторону.
    b.bridge.publish(ChatMessage {
        from: "bob".into(),
        msg: "hi alice".into(),
    });

    assert_eq!(a.hits.load(Ordering::SeqCst), 2);
    assert_eq!(b.hits.load(Ordering::SeqCst), 2);
}

/// Тест проверяет, что фильтр работает и для сообщений, пришедших по
/// сети: пустые сообщения узла A до подписчика узла B не доходят.
#[test]
fn test_filter_applies_to_remote_messages() {
    let a = node("10.0.0.1:8048", &["10.0.0.1:8048", "10.0.0.2:8050"]);

    let transport_b = PipeTransport::new("10.0.0.2:8050", &["10.0.0.1:8048", "10.0.0.2:8050"]);
    let bridge_b = MeshHub::new(
        "10.0.0.2:8050".parse().unwrap(),
        MessengerHub::new(),
        transport_b.clone(),
    );
    bridge_b.register_type::<ChatMessage>();

    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let _token = bridge_b.subscribe_filtered(
        move |_: &ChatMessage| {
            counter.fetch_add(1, Ordering::SeqCst);
        },
        |m: &ChatMessage| !m.msg.is_empty(),
    );

    a.transport.attach(&bridge_b);

    a.bridge.publish(ChatMessage {
        from: "alice".into(),
        msg: String::new(),
    });
    assert_eq!(hits.load(Ordering::SeqCst), 0);

    a.bridge.publish(ChatMessage {
        from: "alice".into(),
        msg: "hi".into(),
    });
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

/// Тест проверяет, что узел без зарегистрированного типа отбрасывает
/// входящий конверт молча — без падения и без доставки.
#[test]
fn test_unknown_type_dropped_by_receiver() {
    let a = node("10.0.0.1:8048", &["10.0.0.1:8048", "10.0.0.2:8050"]);

    let transport_b = PipeTransport::new("10.0.0.2:8050", &[]);
    let bridge_b = MeshHub::new(
        "10.0.0.2:8050".parse().unwrap(),
        MessengerHub::new(),
        transport_b,
    );
    // Тип ChatMessage на узле B не регистрируем.

    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let _token = bridge_b.subscribe(move |_: &ChatMessage| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    a.transport.attach(&bridge_b);
    a.bridge.publish(ChatMessage {
        from: "alice".into(),
        msg: "hi".into(),
    });

    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

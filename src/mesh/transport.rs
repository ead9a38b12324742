use bytes::Bytes;

use crate::{error::NetworkError, mesh::peer::PeerAddr};

/// Транспортный коллаборатор меша.
///
/// Крейт не содержит реализации транспорта: установленные сессии между
/// узлами — забота внешнего кода. Мост требует от транспорта только
/// best-effort рассылку, список известных узлов и подключение новых.
///
/// Входящие байты, а также уведомления о подключении и отключении
/// узлов транспорт передаёт вызовами в
/// [`MeshHub`](crate::mesh::MeshHub): `inbound`, `peer_connected`,
/// `peer_disconnected`.
pub trait MeshTransport: Send + Sync {
    /// Best-effort рассылка всем подключённым узлам.
    fn broadcast(&self, bytes: Bytes) -> Result<(), NetworkError>;

    /// Текущее множество известных узлов. Когда discovery замыкает
    /// петлю, сюда попадает и собственный адрес процесса.
    fn peers(&self) -> Vec<PeerAddr>;

    /// Запрос на подключение узла, о котором сообщил discovery.
    fn connect(&self, peer: PeerAddr) -> Result<(), NetworkError>;
}

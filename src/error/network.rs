use thiserror::Error;

use crate::mesh::PeerAddr;

/// Ошибка транспортного коллаборатора.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("peer {0} is not connected")]
    NotConnected(PeerAddr),

    #[error("broadcast failed: {0}")]
    Broadcast(String),
}

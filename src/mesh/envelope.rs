use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::{
    bus::message::WireMessage,
    error::{DecodeError, EncodeError},
    mesh::peer::PeerAddr,
};

/// Самоописывающий конверт передаваемого сообщения.
///
/// Три строковых поля: полное имя типа, идентичность отправителя
/// (`ip:port`) и сериализованное содержимое. Конверт самодостаточен:
/// принимающей стороне не нужно ничего, кроме разрешения имени типа
/// в собственном реестре.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "FullTypeName")]
    pub type_tag: String,
    #[serde(rename = "Sender")]
    pub sender: String,
    #[serde(rename = "JsonValue")]
    pub payload: String,
}

impl Envelope {
    /// Кодирует сообщение вместе с тегом типа и отправителем в UTF-8
    /// JSON. Без сжатия и без чанкинга.
    pub fn encode<M: WireMessage>(message: &M, sender: &PeerAddr) -> Result<Bytes, EncodeError> {
        let payload = serde_json::to_string(message).map_err(EncodeError::Payload)?;
        let envelope = Envelope {
            type_tag: M::type_tag().to_string(),
            sender: sender.to_string(),
            payload,
        };
        let text = serde_json::to_string(&envelope).map_err(EncodeError::Envelope)?;
        Ok(Bytes::from(text))
    }

    /// Разбирает внешний конверт. Содержимое остаётся строкой —
    /// его декодирует [`WireTypeRegistry`](crate::mesh::WireTypeRegistry).
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let text = std::str::from_utf8(bytes)?;
        serde_json::from_str(text).map_err(DecodeError::Envelope)
    }
}

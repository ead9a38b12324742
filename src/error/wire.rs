use thiserror::Error;

/// Ошибка кодирования исходящего конверта.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("failed to serialize message payload: {0}")]
    Payload(#[source] serde_json::Error),

    #[error("failed to serialize envelope: {0}")]
    Envelope(#[source] serde_json::Error),
}

/// Ошибка разбора входящего конверта.
///
/// Всегда восстановимая: мост логирует её и отбрасывает конверт,
/// до локальных подписчиков она не доходит.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("envelope is not valid utf-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("malformed envelope: {0}")]
    Envelope(#[source] serde_json::Error),

    /// Имя типа из конверта не зарегистрировано в принимающем процессе.
    #[error("unknown message type `{0}`")]
    UnknownType(String),

    /// Тип разрешился, но содержимое не соответствует его форме.
    #[error("payload does not match type `{type_tag}`: {source}")]
    Payload {
        type_tag: String,
        #[source]
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_type_display() {
        let err = DecodeError::UnknownType("ns.Missing".into());
        assert_eq!(err.to_string(), "unknown message type `ns.Missing`");
    }

    #[test]
    fn test_utf8_conversion() {
        let bad = [0xff, 0xfe];
        let err: DecodeError = std::str::from_utf8(&bad).unwrap_err().into();
        assert!(matches!(err, DecodeError::Utf8(_)));
    }
}

use std::{
    any::Any,
    fmt,
    sync::{Arc, Weak},
};

use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Невладеющая ссылка на отправителя сообщения.
///
/// Хранится именно слабой, чтобы задержавшееся в чужих руках сообщение
/// не удерживало отправителя в памяти.
pub type SenderRef = Weak<dyn Any + Send + Sync>;

/// Минимальный контракт передаваемого по шине сообщения.
///
/// Сообщение несёт свой конкретный runtime-тип (через [`Any`]) — он
/// используется и для локального сопоставления с подписками, и для
/// восстановления типа на принимающей стороне. Ссылка на отправителя
/// не сериализуется и не обязана переживать локальную доставку.
pub trait MeshMessage: Any + Send + Sync + fmt::Debug {
    /// Доступ к конкретному типу сообщения для downcast'а.
    fn as_any(&self) -> &dyn Any;

    /// Отправитель, если он ещё жив.
    fn sender(&self) -> Option<Arc<dyn Any + Send + Sync>> {
        None
    }
}

/// Сообщение, способное пересечь границу процесса.
///
/// Тег типа — стабильный строковый идентификатор, по которому принимающий
/// процесс находит процедуру декодирования в своём
/// [`WireTypeRegistry`](crate::mesh::WireTypeRegistry). По умолчанию —
/// полное имя типа; для совместимости между разными сборками его стоит
/// переопределить на фиксированную строку.
pub trait WireMessage: MeshMessage + Serialize + DeserializeOwned + Sized {
    fn type_tag() -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Обобщённое сообщение с произвольным содержимым.
#[derive(Clone, Serialize, Deserialize)]
pub struct GenericMessage<T> {
    pub content: T,
    #[serde(skip)]
    sender: Option<SenderRef>,
}

impl<T> GenericMessage<T> {
    pub fn new(content: T) -> Self {
        Self {
            content,
            sender: None,
        }
    }

    /// Сообщение с привязкой к отправителю (обычно `Arc::downgrade(&self)`).
    pub fn with_sender(content: T, sender: SenderRef) -> Self {
        Self {
            content,
            sender: Some(sender),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for GenericMessage<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenericMessage")
            .field("content", &self.content)
            .finish()
    }
}

impl<T> MeshMessage for GenericMessage<T>
where
    T: Send + Sync + fmt::Debug + 'static,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn sender(&self) -> Option<Arc<dyn Any + Send + Sync>> {
        self.sender.as_ref().and_then(Weak::upgrade)
    }
}

impl<T> WireMessage for GenericMessage<T> where
    T: Serialize + DeserializeOwned + Send + Sync + fmt::Debug + 'static
{
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Тест проверяет, что живой отправитель доступен через слабую ссылку.
    #[test]
    fn test_sender_upgrade_while_alive() {
        let sender: Arc<dyn Any + Send + Sync> = Arc::new("publisher".to_string());
        let msg = GenericMessage::with_sender(42u32, Arc::downgrade(&sender));

        let resolved = msg.sender().expect("sender must be alive");
        assert_eq!(resolved.downcast_ref::<String>().unwrap(), "publisher");
    }

    /// Тест проверяет, что после освобождения отправителя ссылка гаснет.
    #[test]
    fn test_sender_gone_after_drop() {
        let sender: Arc<dyn Any + Send + Sync> = Arc::new(7i64);
        let msg = GenericMessage::with_sender("payload", Arc::downgrade(&sender));
        drop(sender);

        assert!(msg.sender().is_none());
    }

    /// Тест проверяет, что сообщение без отправителя отвечает `None`.
    #[test]
    fn test_message_without_sender() {
        let msg = GenericMessage::new(vec![1u8, 2, 3]);
        assert!(msg.sender().is_none());
    }

    /// Тест проверяет, что ссылка на отправителя не попадает в JSON
    /// и восстанавливается как `None`.
    #[test]
    fn test_serde_skips_sender() {
        let sender: Arc<dyn Any + Send + Sync> = Arc::new(1u8);
        let msg = GenericMessage::with_sender("hello".to_string(), Arc::downgrade(&sender));

        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"content":"hello"}"#);

        let back: GenericMessage<String> = serde_json::from_str(&json).unwrap();
        assert_eq!(back.content, "hello");
        assert!(back.sender().is_none());
    }

    #[test]
    fn test_default_type_tag_is_type_name() {
        assert!(GenericMessage::<u32>::type_tag().contains("GenericMessage"));
    }
}

use std::sync::Arc;

use dashmap::DashMap;

use crate::{
    bus::message::{MeshMessage, WireMessage},
    error::{BusError, DecodeError},
    mesh::envelope::Envelope,
};

type DecodeFn = Arc<dyn Fn(&str) -> Result<Arc<dyn MeshMessage>, serde_json::Error> + Send + Sync>;

/// Реестр wire-типов процесса: тег типа → процедура декодирования.
///
/// Заполняется теми типами сообщений, которые вкомпилированы в
/// принимающий процесс. Неразрешимый тег — восстановимая
/// [`DecodeError::UnknownType`], а не падение.
#[derive(Default)]
pub struct WireTypeRegistry {
    decoders: DashMap<String, DecodeFn>,
}

impl WireTypeRegistry {
    pub fn new() -> Self {
        Self {
            decoders: DashMap::new(),
        }
    }

    /// Регистрирует тип под его собственным тегом (`M::type_tag()`).
    /// Повторная регистрация перезаписывает процедуру.
    pub fn register<M: WireMessage>(&self) {
        self.decoders
            .insert(M::type_tag().to_string(), decode_fn::<M>());
    }

    /// Регистрирует тип под явным тегом — для стабильности между
    /// разными сборками и процессами.
    pub fn register_with_tag<M: WireMessage>(&self, type_tag: &str) -> Result<(), BusError> {
        if type_tag.is_empty() {
            return Err(BusError::InvalidArgument("type tag must not be empty"));
        }
        self.decoders.insert(type_tag.to_string(), decode_fn::<M>());
        Ok(())
    }

    /// Восстанавливает типизированное сообщение из конверта.
    pub fn decode(&self, envelope: &Envelope) -> Result<Arc<dyn MeshMessage>, DecodeError> {
        let decoder = self
            .decoders
            .get(&envelope.type_tag)
            .ok_or_else(|| DecodeError::UnknownType(envelope.type_tag.clone()))?;

        (**decoder)(&envelope.payload).map_err(|source| DecodeError::Payload {
            type_tag: envelope.type_tag.clone(),
            source,
        })
    }

    pub fn contains(&self, type_tag: &str) -> bool {
        self.decoders.contains_key(type_tag)
    }

    pub fn len(&self) -> usize {
        self.decoders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decoders.is_empty()
    }
}

fn decode_fn<M: WireMessage>() -> DecodeFn {
    Arc::new(|payload| {
        serde_json::from_str::<M>(payload).map(|message| Arc::new(message) as Arc<dyn MeshMessage>)
    })
}

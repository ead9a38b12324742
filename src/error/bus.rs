use thiserror::Error;

/// Ошибка операций локальной доставки.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BusError {
    /// Подписке передано сообщение чужого типа. Проверка допуска обязана
    /// была отсеять такое сообщение, поэтому наблюдаемый `TypeMismatch` —
    /// дефект, а не штатная ситуация.
    #[error("message is not of the subscribed type (expected {expected})")]
    TypeMismatch { expected: &'static str },

    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
}

/// Сбой отдельного подписчика во время доставки.
///
/// Перехватывается диспетчером по-штучно и передаётся в
/// [`SubscriberErrorHandler`](crate::bus::SubscriberErrorHandler);
/// никогда не прерывает доставку остальным подписчикам.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubscriberError {
    #[error("subscriber delivery failed: {0}")]
    Delivery(#[from] BusError),

    #[error("subscriber panicked: {0}")]
    Panicked(String),
}

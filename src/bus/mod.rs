//! Локальный движок доставки (publish–subscribe).
//!
//! Модуль реализует типобезопасную шину сообщений внутри процесса:
//!
//! - `message`: контракт сообщения и обобщённое сообщение с содержимым.
//! - `subscription`: сильные/слабые подписки и отзывной токен.
//! - `proxy`: точка перехвата доставки между диспетчером и подпиской.
//! - `hub`: реестр подписок и диспетчер с дисциплиной
//!   «снимок, затем вызов».
//!
//! Публичный API переэкспортирует:
//! - `hub::*`
//! - `message::*`
//! - `proxy::*`
//! - `subscription::*`

pub mod hub;
pub mod message;
pub mod proxy;
pub mod subscription;

pub use hub::*;
pub use message::*;
pub use proxy::*;
pub use subscription::*;

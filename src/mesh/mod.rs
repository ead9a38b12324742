//! Расширение шины на сеть узлов.
//!
//! - `peer`: идентичность узла (`ip:port`).
//! - `envelope`: самоописывающий конверт и его кодек.
//! - `types`: реестр wire-типов для восстановления сообщений по тегу.
//! - `transport`: интерфейс транспортного коллаборатора.
//! - `bridge`: мост публикаций между локальным хабом и сетью.

pub mod bridge;
pub mod envelope;
pub mod peer;
pub mod transport;
pub mod types;

pub use bridge::*;
pub use envelope::*;
pub use peer::*;
pub use transport::*;
pub use types::*;

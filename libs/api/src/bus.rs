use std::future::Future;
use std::pin::Pin;

use crate::BusError;

// ════════════════════════════════════════════════════════════════
//  Bus traits
// ════════════════════════════════════════════════════════════════

/// Управление подписками на шине.
///
/// Все методы неблокирующие: запрос ставится в очередь клиента,
/// подтверждение брокера не ожидается. Ошибка означает только, что
/// запрос не удалось поставить в очередь.
pub trait BusSubscriber: Send + Sync {
    /// Подписаться на topic.
    fn subscribe(&self, topic: &str) -> Result<(), BusError>;

    /// Отписаться от topic'а.
    fn unsubscribe(&self, topic: &str) -> Result<(), BusError>;

    /// Отписаться от всех topic'ов, на которые подписан клиент.
    fn unsubscribe_all(&self) -> Result<(), BusError>;
}

/// Публикация сообщений в шину (fire-and-forget).
pub trait BusPublisher: Send + Sync {
    fn publish(&self, topic: &str, message: &str) -> Result<(), BusError>;
}

/// Полный доступ к шине. Реализуется автоматически для всего,
/// что умеет и публиковать, и подписываться.
pub trait Bus: BusPublisher + BusSubscriber {}

impl<T: BusPublisher + BusSubscriber + ?Sized> Bus for T {}

/// Получатель входящих сообщений шины.
///
/// Consumer шины вызывает `on_message` последовательно, по одному
/// сообщению за раз, в порядке доставки.
pub trait MessageHandler: Send + Sync {
    fn on_message<'a>(
        &'a self,
        topic: &'a str,
        payload: &'a [u8],
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>>;
}

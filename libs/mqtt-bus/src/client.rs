use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use rumqttc::{AsyncClient, EventLoop, MqttOptions, QoS, SubscribeFilter};

use net_state_api::{BusError, BusPublisher, BusSubscriber};

/// Сколько фильтров уходит в одном SUBSCRIBE при переподписке.
const RESUBSCRIBE_BATCH: usize = 32;

// ═══════════════════════════════════════════════════════════════
//  MqttConfig
// ═══════════════════════════════════════════════════════════════

/// Параметры подключения к брокеру.
#[derive(Debug, Clone)]
pub struct MqttConfig {
    pub host: String,
    pub port: u16,
    pub client_id: String,
    pub keepalive: Duration,
    /// Размер очереди запросов клиента. При переполнении
    /// subscribe/publish возвращают ошибку, а не ждут.
    pub request_capacity: usize,
}

// ═══════════════════════════════════════════════════════════════
//  MqttBus
// ═══════════════════════════════════════════════════════════════

/// Клиент шины поверх rumqttc.
///
/// Запоминает все topic'и, на которые подписан: по ним работает
/// `unsubscribe_all`, и они же переподписываются после каждого
/// (пере)подключения к брокеру.
pub struct MqttBus {
    client: AsyncClient,
    topics: Mutex<BTreeSet<String>>,
    closed: AtomicBool,
}

impl MqttBus {
    /// Создать клиент и его event loop. `initial_topics` будут подписаны
    /// при первом ConnAck (event loop должен крутить consumer).
    pub fn connect(config: &MqttConfig, initial_topics: &[String]) -> (Self, EventLoop) {
        let mut options = MqttOptions::new(&config.client_id, &config.host, config.port);
        options.set_keep_alive(config.keepalive);
        options.set_clean_session(true);

        let (client, eventloop) = AsyncClient::new(options, config.request_capacity);
        let bus = Self {
            client,
            topics: Mutex::new(initial_topics.iter().cloned().collect()),
            closed: AtomicBool::new(false),
        };
        (bus, eventloop)
    }

    /// Topic'и, на которые клиент сейчас подписан.
    pub fn topics(&self) -> Vec<String> {
        self.topics.lock().iter().cloned().collect()
    }

    /// Повторить подписки после ConnAck: сессия чистая, брокер их не помнит.
    ///
    /// Topic'и уходят пачками по `RESUBSCRIBE_BATCH` в одном SUBSCRIBE,
    /// так что очередь запросов занимают `ceil(n / RESUBSCRIBE_BATCH)` слотов,
    /// а не `n`. Возвращает число поставленных в очередь запросов.
    pub(crate) fn resubscribe(&self) -> usize {
        let topics = self.topics();
        let mut sent = 0;
        for batch in topics.chunks(RESUBSCRIBE_BATCH) {
            let filters = batch
                .iter()
                .map(|t| SubscribeFilter::new(t.clone(), QoS::AtMostOnce));
            match self.client.try_subscribe_many(filters) {
                Ok(()) => {
                    sent += 1;
                    tracing::info!(topics = ?batch, "subscribed");
                }
                Err(e) => tracing::error!(topics = ?batch, error = %e, "resubscribe failed"),
            }
        }
        sent
    }

    /// Запросить отключение от брокера. Дальнейшие запросы отклоняются.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Err(e) = self.client.try_disconnect() {
            tracing::warn!(error = %e, "mqtt disconnect request failed");
        }
    }

    fn ensure_open(&self, topic: &str) -> Result<(), BusError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(BusError::closed(topic, "bus client is closed"));
        }
        Ok(())
    }
}

impl BusSubscriber for MqttBus {
    fn subscribe(&self, topic: &str) -> Result<(), BusError> {
        self.ensure_open(topic)?;
        self.client
            .try_subscribe(topic, QoS::AtMostOnce)
            .map_err(|e| BusError::rejected(topic, e.to_string()))?;
        self.topics.lock().insert(topic.to_string());
        Ok(())
    }

    fn unsubscribe(&self, topic: &str) -> Result<(), BusError> {
        self.ensure_open(topic)?;
        self.client
            .try_unsubscribe(topic)
            .map_err(|e| BusError::rejected(topic, e.to_string()))?;
        self.topics.lock().remove(topic);
        Ok(())
    }

    fn unsubscribe_all(&self) -> Result<(), BusError> {
        self.ensure_open("*")?;
        let topics = std::mem::take(&mut *self.topics.lock());
        let mut first_err = None;
        for topic in topics {
            if let Err(e) = self.client.try_unsubscribe(topic.as_str()) {
                let err = BusError::rejected(topic.as_str(), e.to_string());
                tracing::warn!(error = ?err, "unsubscribe failed");
                // keep it tracked so it comes back after a reconnect, as the broker still has it
                self.topics.lock().insert(topic);
                first_err.get_or_insert(err);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl BusPublisher for MqttBus {
    fn publish(&self, topic: &str, message: &str) -> Result<(), BusError> {
        self.ensure_open(topic)?;
        self.client
            .try_publish(topic, QoS::AtMostOnce, false, message.as_bytes().to_vec())
            .map_err(|e| BusError::rejected(topic, e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use net_state_api::ErrorKind;

    fn config(capacity: usize) -> MqttConfig {
        MqttConfig {
            host: "127.0.0.1".into(),
            port: 1883,
            client_id: "net-state-test".into(),
            keepalive: Duration::from_secs(60),
            request_capacity: capacity,
        }
    }

    #[test]
    fn initial_topics_are_tracked_not_sent() {
        let (bus, _eventloop) = MqttBus::connect(&config(8), &["realm/proc".to_string()]);
        assert_eq!(bus.topics(), vec!["realm/proc".to_string()]);
    }

    #[test]
    fn subscribe_and_unsubscribe_track_topics() {
        let (bus, _eventloop) = MqttBus::connect(&config(8), &["realm/proc".to_string()]);
        bus.subscribe("realm/proc/r1").unwrap();
        bus.subscribe("realm/proc/r2").unwrap();
        assert_eq!(bus.topics().len(), 3);

        bus.unsubscribe("realm/proc/r1").unwrap();
        assert_eq!(
            bus.topics(),
            vec!["realm/proc".to_string(), "realm/proc/r2".to_string()]
        );

        bus.unsubscribe_all().unwrap();
        assert!(bus.topics().is_empty());
    }

    #[test]
    fn full_request_queue_is_rejected() {
        let (bus, _eventloop) = MqttBus::connect(&config(1), &[]);
        bus.publish("a", "1").unwrap();
        let err = bus.subscribe("b").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Rejected);
        assert_eq!(err.topic(), "b");
        // failed subscribe is not tracked
        assert!(bus.topics().is_empty());
    }

    #[test]
    fn resubscribe_fits_more_topics_than_queue_slots() {
        let initial: Vec<String> = (0..5).map(|i| format!("realm/proc/r{i}")).collect();
        let (bus, _eventloop) = MqttBus::connect(&config(2), &initial);

        assert_eq!(bus.resubscribe(), 1);
        // one slot left for regular traffic
        bus.publish("realm/proc", "x").unwrap();
        assert_eq!(bus.topics().len(), 5);
    }

    #[test]
    fn resubscribe_batches_large_sets() {
        let initial: Vec<String> = (0..70).map(|i| format!("realm/proc/r{i}")).collect();
        let (bus, _eventloop) = MqttBus::connect(&config(4), &initial);

        // 32 + 32 + 6
        assert_eq!(bus.resubscribe(), 3);
        bus.publish("a", "1").unwrap();
        assert_eq!(bus.publish("a", "2").unwrap_err().kind(), ErrorKind::Rejected);
    }

    #[test]
    fn resubscribe_with_nothing_tracked_sends_nothing() {
        let (bus, _eventloop) = MqttBus::connect(&config(1), &[]);
        assert_eq!(bus.resubscribe(), 0);
        bus.publish("a", "1").unwrap();
    }

    #[test]
    fn closed_bus_rejects_requests() {
        let (bus, _eventloop) = MqttBus::connect(&config(8), &[]);
        bus.close();
        assert_eq!(bus.publish("a", "x").unwrap_err().kind(), ErrorKind::Closed);
        assert_eq!(bus.subscribe("a").unwrap_err().kind(), ErrorKind::Closed);
        assert_eq!(bus.unsubscribe_all().unwrap_err().kind(), ErrorKind::Closed);
    }
}

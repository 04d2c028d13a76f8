use std::sync::Arc;

use net_state_api::{BusSubscriber, NodeCmd, NormalizedEvent};

/// Настройки реакции на runtime-события.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpanderPolicy {
    /// Отписываться от дочернего topic'а runtime'а по `rt-stop`.
    /// По умолчанию выключено: подписка живёт до конца процесса.
    pub unsubscribe_on_stop: bool,
}

/// Запрос к шине, вытекающий из lifecycle-события.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expansion {
    Subscribe(String),
    Unsubscribe(String),
}

/// Расширяет дерево подписок: на каждый `rt-start` подписывается на
/// `<topic>/<id>`, где runtime публикует события своих модулей.
pub struct SubscriptionExpander {
    bus: Arc<dyn BusSubscriber>,
    policy: ExpanderPolicy,
}

impl SubscriptionExpander {
    pub fn new(bus: Arc<dyn BusSubscriber>, policy: ExpanderPolicy) -> Self {
        Self { bus, policy }
    }

    pub fn child_topic(topic: &str, id: &str) -> String {
        format!("{topic}/{id}")
    }

    /// Какой запрос к шине нужен для события (если нужен).
    pub fn plan(&self, event: &NormalizedEvent) -> Option<Expansion> {
        match event.cmd {
            NodeCmd::RtStart => Some(Expansion::Subscribe(Self::child_topic(&event.topic, &event.id))),
            NodeCmd::RtStop if self.policy.unsubscribe_on_stop => {
                Some(Expansion::Unsubscribe(Self::child_topic(&event.topic, &event.id)))
            }
            _ => None,
        }
    }

    /// Отправить запрос в шину. Ошибка только логируется: состояние
    /// registry от неё не зависит.
    pub fn dispatch(&self, expansion: Expansion) {
        let result = match &expansion {
            Expansion::Subscribe(topic) => self.bus.subscribe(topic),
            Expansion::Unsubscribe(topic) => self.bus.unsubscribe(topic),
        };
        match result {
            Ok(()) => tracing::info!(request = ?expansion, "runtime subscription updated"),
            Err(e) => tracing::error!(request = ?expansion, error = ?e, "subscription dispatch failed"),
        }
    }
}

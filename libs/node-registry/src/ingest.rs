use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use net_state_api::{normalize, CmdKind, MessageHandler, NormalizedEvent, ParseError};

use crate::expander::SubscriptionExpander;
use crate::registry::NodeRegistry;

/// Чем закончилась обработка одного сообщения шины.
#[derive(Debug)]
pub enum IngestOutcome {
    Inserted,
    Removed,
    /// Start-событие для id, который уже есть в registry.
    DuplicateIgnored,
    /// Stop-событие для id, которого нет в registry.
    AbsentRemoveIgnored,
    UnknownCommandIgnored,
    /// Payload не прошёл нормализацию.
    Dropped(ParseError),
}

impl IngestOutcome {
    /// Изменило ли сообщение состояние registry.
    pub fn is_applied(&self) -> bool {
        matches!(self, IngestOutcome::Inserted | IngestOutcome::Removed)
    }
}

// ═══════════════════════════════════════════════════════════════
//  Ingest
// ═══════════════════════════════════════════════════════════════

/// Путь входящих lifecycle-событий: normalize → registry → expander.
///
/// Вызывается одним consumer'ом шины; каждое сообщение обрабатывается
/// ровно один раз, без повторов. Запросы к шине отправляются уже после
/// того, как lock registry отпущен.
pub struct Ingest {
    registry: Arc<NodeRegistry>,
    expander: SubscriptionExpander,
}

impl Ingest {
    pub fn new(registry: Arc<NodeRegistry>, expander: SubscriptionExpander) -> Self {
        Self { registry, expander }
    }

    pub fn registry(&self) -> &Arc<NodeRegistry> {
        &self.registry
    }

    /// Обработать одно сообщение, пришедшее на `topic`.
    pub async fn handle(&self, topic: &str, payload: &[u8]) -> IngestOutcome {
        let event = match normalize(topic, payload) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(topic = %topic, error = %e, "dropping malformed lifecycle event");
                return IngestOutcome::Dropped(e);
            }
        };

        let expansion = self.expander.plan(&event);
        let id = event.id.clone();
        let cmd = event.cmd.clone();

        let outcome = self.apply(event).await;
        tracing::debug!(topic = %topic, id = %id, cmd = %cmd, outcome = ?outcome, "lifecycle event");

        if let Some(expansion) = expansion {
            self.expander.dispatch(expansion);
        }
        outcome
    }

    async fn apply(&self, event: NormalizedEvent) -> IngestOutcome {
        match event.kind() {
            CmdKind::Start => {
                if self.registry.upsert(event.into_record()).await {
                    IngestOutcome::Inserted
                } else {
                    IngestOutcome::DuplicateIgnored
                }
            }
            CmdKind::Stop => {
                if self.registry.remove(&event.id).await {
                    IngestOutcome::Removed
                } else {
                    IngestOutcome::AbsentRemoveIgnored
                }
            }
            CmdKind::Unknown => IngestOutcome::UnknownCommandIgnored,
        }
    }
}

impl MessageHandler for Ingest {
    fn on_message<'a>(
        &'a self,
        topic: &'a str,
        payload: &'a [u8],
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            self.handle(topic, payload).await;
        })
    }
}

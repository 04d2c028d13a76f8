use std::sync::Arc;
use std::time::Duration;

use rumqttc::{Event, EventLoop, Outgoing, Packet};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use net_state_api::MessageHandler;

use crate::client::MqttBus;

const RECONNECT_DELAY: Duration = Duration::from_secs(1);
const DISCONNECT_TIMEOUT: Duration = Duration::from_secs(1);

// ═══════════════════════════════════════════════════════════════
//  Consumer task: eventloop.poll() → handler.on_message()
// ═══════════════════════════════════════════════════════════════

/// Запустить единственный consumer шины.
///
/// Крутит event loop rumqttc: на каждый ConnAck переподписывается,
/// каждое входящее publish-сообщение последовательно отдаёт в `handler`.
/// Ошибки соединения логируются; rumqttc переподключается на следующем poll.
pub fn spawn_consumer(
    mut eventloop: EventLoop,
    bus: Arc<MqttBus>,
    handler: Arc<dyn MessageHandler>,
    token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                event = eventloop.poll() => match event {
                    Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                        tracing::info!(code = ?ack.code, "connected to mqtt broker");
                        bus.resubscribe();
                    }
                    Ok(Event::Incoming(Packet::Publish(publish))) => {
                        handler.on_message(&publish.topic, &publish.payload[..]).await;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::error!(error = %e, "mqtt connection error");
                        tokio::select! {
                            _ = tokio::time::sleep(RECONNECT_DELAY) => {}
                            _ = token.cancelled() => break,
                        }
                    }
                },
                _ = token.cancelled() => break,
            }
        }

        // Drain until the DISCONNECT packet leaves (or the connection is gone).
        bus.close();
        let drained = tokio::time::timeout(DISCONNECT_TIMEOUT, async {
            loop {
                match eventloop.poll().await {
                    Ok(Event::Outgoing(Outgoing::Disconnect)) | Err(_) => break,
                    Ok(_) => {}
                }
            }
        })
        .await;
        if drained.is_err() {
            tracing::warn!("mqtt disconnect timed out");
        }

        tracing::info!("mqtt consumer finished");
    })
}

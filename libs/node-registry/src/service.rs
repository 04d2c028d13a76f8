use std::sync::Arc;

use net_state_api::NodeEntry;

use crate::registry::NodeRegistry;

/// Запросы viewer'ов к registry: полный snapshot и сброс.
#[derive(Clone)]
pub struct NodeService {
    registry: Arc<NodeRegistry>,
}

impl NodeService {
    pub fn new(registry: Arc<NodeRegistry>) -> Self {
        Self { registry }
    }

    /// Все узлы в виде `{"data": record}`. Пустой registry даёт пустой список.
    pub async fn fetch_all(&self) -> Vec<NodeEntry> {
        self.registry.snapshot().await
    }

    /// Очистить registry.
    pub async fn reset_all(&self) {
        self.registry.clear().await;
        tracing::info!("node registry reset");
    }
}

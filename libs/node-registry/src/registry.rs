use std::collections::{BTreeMap, HashMap};

use tokio::sync::RwLock;

use net_state_api::{NodeEntry, NodeRecord};

// ═══════════════════════════════════════════════════════════════
//  NodeRegistry
// ═══════════════════════════════════════════════════════════════

#[derive(Default)]
struct Inner {
    next_seq: u64,
    /// id → порядковый номер вставки.
    by_id: HashMap<String, u64>,
    /// Записи в порядке вставки.
    ordered: BTreeMap<u64, NodeRecord>,
}

/// Реестр живых узлов: id → NodeRecord.
///
/// Мутации (`upsert`, `remove`, `clear`) берут write lock, `snapshot`
/// берёт read lock, поэтому snapshot никогда не видит частично применённое
/// изменение. Snapshot перечисляет записи в порядке вставки.
pub struct NodeRegistry {
    inner: RwLock<Inner>,
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Вставить запись, если id ещё нет. Существующая запись не
    /// перезаписывается (first-start-wins). Возвращает true при вставке.
    pub async fn upsert(&self, record: NodeRecord) -> bool {
        let mut inner = self.inner.write().await;
        if inner.by_id.contains_key(&record.id) {
            return false;
        }
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.by_id.insert(record.id.clone(), seq);
        inner.ordered.insert(seq, record);
        true
    }

    /// Удалить запись по id. Отсутствующий id: no-op.
    pub async fn remove(&self, id: &str) -> bool {
        let mut inner = self.inner.write().await;
        match inner.by_id.remove(id) {
            Some(seq) => {
                inner.ordered.remove(&seq);
                true
            }
            None => false,
        }
    }

    /// Снимок всех записей на момент вызова, в порядке вставки.
    pub async fn snapshot(&self) -> Vec<NodeEntry> {
        let inner = self.inner.read().await;
        inner.ordered.values().cloned().map(NodeEntry::from).collect()
    }

    /// Атомарно очистить реестр.
    pub async fn clear(&self) {
        let mut inner = self.inner.write().await;
        inner.by_id.clear();
        inner.ordered.clear();
    }

    pub async fn get(&self, id: &str) -> Option<NodeRecord> {
        let inner = self.inner.read().await;
        let seq = inner.by_id.get(id)?;
        inner.ordered.get(seq).cloned()
    }

    pub async fn contains(&self, id: &str) -> bool {
        self.inner.read().await.by_id.contains_key(id)
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.by_id.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

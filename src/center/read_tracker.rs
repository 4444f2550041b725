use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::store::{InboxStore, ReadTable};

/// Read-state capability shared by every acknowledgeable feed.
#[async_trait]
pub trait ReadTracker: Send + Sync {
    fn is_read(&self, id: Uuid) -> bool;

    /// Persist one read row, then record it locally.
    async fn mark_read(&mut self, id: Uuid) -> anyhow::Result<()>;

    /// Persist rows for the unread subset of `ids` in one write and return
    /// that subset. An empty subset performs no write.
    async fn mark_all_read(&mut self, ids: &[Uuid]) -> anyhow::Result<Vec<Uuid>>;
}

/// A [`ReadTracker`] over one of the read-tracking tables, holding the
/// user's acknowledged ids locally.
pub struct TableReadTracker {
    store: Arc<dyn InboxStore>,
    table: ReadTable,
    user_id: Uuid,
    read: Vec<Uuid>,
    index: HashSet<Uuid>,
}

impl TableReadTracker {
    pub fn new(store: Arc<dyn InboxStore>, table: ReadTable, user_id: Uuid) -> Self {
        Self {
            store,
            table,
            user_id,
            read: Vec::new(),
            index: HashSet::new(),
        }
    }

    pub fn table(&self) -> ReadTable {
        self.table
    }

    /// Acknowledged ids in the order they became known.
    pub fn read_ids(&self) -> &[Uuid] {
        &self.read
    }

    /// Replace the local ids with what the store currently holds.
    pub async fn reload(&mut self) -> anyhow::Result<()> {
        let ids = self.store.read_ids(self.table, self.user_id).await?;
        self.read.clear();
        self.index.clear();
        self.extend(ids);
        Ok(())
    }

    fn extend(&mut self, ids: impl IntoIterator<Item = Uuid>) {
        for id in ids {
            if self.index.insert(id) {
                self.read.push(id);
            }
        }
    }
}

#[async_trait]
impl ReadTracker for TableReadTracker {
    fn is_read(&self, id: Uuid) -> bool {
        self.index.contains(&id)
    }

    async fn mark_read(&mut self, id: Uuid) -> anyhow::Result<()> {
        self.store
            .insert_reads(self.table, self.user_id, &[id])
            .await?;
        self.extend([id]);
        Ok(())
    }

    async fn mark_all_read(&mut self, ids: &[Uuid]) -> anyhow::Result<Vec<Uuid>> {
        let mut seen = HashSet::new();
        let unread: Vec<Uuid> = ids
            .iter()
            .copied()
            .filter(|id| !self.is_read(*id) && seen.insert(*id))
            .collect();
        if unread.is_empty() {
            return Ok(unread);
        }
        self.store
            .insert_reads(self.table, self.user_id, &unread)
            .await?;
        self.extend(unread.iter().copied());
        Ok(unread)
    }
}

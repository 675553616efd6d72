use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::info;

use crate::destination::Destination;
use crate::error::EtlResult;
use crate::types::TableSnapshot;

/// In-memory destination for tests and dry runs.
///
/// Keeps the latest snapshot per table, replacing earlier writes like the real destinations
/// do. Clones share the same storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryDestination {
    inner: Arc<Mutex<Vec<TableSnapshot>>>,
}

impl MemoryDestination {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stored snapshots in the order their tables were first written.
    pub async fn snapshots(&self) -> Vec<TableSnapshot> {
        self.inner.lock().await.clone()
    }

    /// Returns the latest snapshot written for `table`.
    pub async fn snapshot(&self, table: &str) -> Option<TableSnapshot> {
        let inner = self.inner.lock().await;
        inner.iter().find(|snapshot| snapshot.name() == table).cloned()
    }

    pub async fn table_names(&self) -> Vec<String> {
        let inner = self.inner.lock().await;
        inner.iter().map(|snapshot| snapshot.name().to_string()).collect()
    }

    pub async fn clear(&self) {
        self.inner.lock().await.clear();
    }
}

#[async_trait]
impl Destination for MemoryDestination {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn write_table(&self, snapshot: &TableSnapshot) -> EtlResult<()> {
        let mut inner = self.inner.lock().await;

        info!(
            table = snapshot.name(),
            rows = snapshot.num_rows(),
            "writing table to memory"
        );

        match inner.iter_mut().find(|stored| stored.name() == snapshot.name()) {
            Some(stored) => *stored = snapshot.clone(),
            None => inner.push(snapshot.clone()),
        }

        Ok(())
    }
}

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::EtlResult;
use crate::types::TableSnapshot;

/// A sink that table snapshots are written to.
///
/// Every write replaces whatever the destination held for the table before: a file is
/// overwritten, a database table is dropped and recreated. Writing the same snapshot twice
/// leaves the same result.
#[async_trait]
pub trait Destination: Send + Sync {
    /// Returns the name of the destination, used in logs and metric labels.
    fn name(&self) -> &'static str;

    /// Writes the whole snapshot.
    async fn write_table(&self, snapshot: &TableSnapshot) -> EtlResult<()>;
}

#[async_trait]
impl<D: Destination + ?Sized> Destination for Arc<D> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    async fn write_table(&self, snapshot: &TableSnapshot) -> EtlResult<()> {
        (**self).write_table(snapshot).await
    }
}

/// Writes each snapshot to several destinations in order.
///
/// Stops at the first failing destination; the ones after it are not written.
#[derive(Clone, Default)]
pub struct FanoutDestination {
    destinations: Vec<Arc<dyn Destination>>,
}

impl FanoutDestination {
    pub fn new(destinations: Vec<Arc<dyn Destination>>) -> Self {
        Self { destinations }
    }

    pub fn push<D: Destination + 'static>(&mut self, destination: D) {
        self.destinations.push(Arc::new(destination));
    }
}

#[async_trait]
impl Destination for FanoutDestination {
    fn name(&self) -> &'static str {
        "fanout"
    }

    async fn write_table(&self, snapshot: &TableSnapshot) -> EtlResult<()> {
        for destination in &self.destinations {
            debug!(
                table = snapshot.name(),
                destination = destination.name(),
                "writing table to destination"
            );
            destination.write_table(snapshot).await?;
        }

        Ok(())
    }
}

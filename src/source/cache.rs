//! Memoized dataset snapshot shared across requests.

use crate::analysis::ColumnResolver;
use crate::models::{Dataset, RoleMapping};
use crate::source::error::Result;
use crate::source::{load_dataset, DatasetSource, LoadOptions};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

/// A loaded dataset together with its role mapping, resolved once.
#[derive(Debug)]
pub struct Snapshot {
    pub dataset: Dataset,
    pub roles: RoleMapping,
}

/// Loads the dataset at most once and hands out the same snapshot.
///
/// Concurrent first callers wait on the same load. Failed loads are not
/// cached, so the next caller tries again.
#[derive(Debug)]
pub struct DatasetCache {
    source: DatasetSource,
    options: LoadOptions,
    resolver: ColumnResolver,
    slot: Mutex<Option<Arc<Snapshot>>>,
}

impl DatasetCache {
    pub fn new(source: DatasetSource, options: LoadOptions, resolver: ColumnResolver) -> Self {
        Self {
            source,
            options,
            resolver,
            slot: Mutex::new(None),
        }
    }

    /// Where the dataset is loaded from.
    pub fn source(&self) -> &DatasetSource {
        &self.source
    }

    /// Get the cached snapshot, loading it on first use.
    pub async fn get(&self) -> Result<Arc<Snapshot>> {
        let mut slot = self.slot.lock().await;
        if let Some(snapshot) = slot.as_ref() {
            return Ok(Arc::clone(snapshot));
        }

        let dataset = load_dataset(&self.source, &self.options).await?;
        let roles = self.resolver.resolve(dataset.columns());
        info!(
            "Cached dataset: {} rows, {} columns",
            dataset.row_count(),
            dataset.columns().len()
        );

        let snapshot = Arc::new(Snapshot { dataset, roles });
        *slot = Some(Arc::clone(&snapshot));
        Ok(snapshot)
    }

    /// Drop the cached snapshot so the next `get` reloads.
    pub async fn invalidate(&self) {
        info!("Invalidating cached dataset");
        *self.slot.lock().await = None;
    }

    /// Returns true once a snapshot is cached.
    #[cfg(test)]
    pub async fn is_loaded(&self) -> bool {
        self.slot.lock().await.is_some()
    }
}

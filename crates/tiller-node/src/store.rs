//! Remote state client boundary.
//!
//! The authoritative record for a node lives on the configuration server;
//! this crate only consumes the narrow fetch/save surface. A production
//! client implements [`NodeStore`] over the server's REST API; the
//! [`InMemoryNodeStore`] here backs tests and embedded use.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use tiller_core::NodeRecord;

use crate::error::NodeResult;

/// Fetch/save access to the authoritative node records.
#[async_trait]
pub trait NodeStore: Send + Sync {
    /// Fetch a record by name; `None` when no such node exists.
    async fn fetch(&self, name: &str) -> NodeResult<Option<NodeRecord>>;

    /// Persist a record, returning it as the server now holds it.
    async fn save(&self, record: NodeRecord) -> NodeResult<NodeRecord>;
}

/// Name-keyed in-memory node store.
#[derive(Default)]
pub struct InMemoryNodeStore {
    records: Arc<RwLock<HashMap<String, NodeRecord>>>,
}

impl InMemoryNodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with a record, replacing any with the same name.
    pub async fn insert(&self, record: NodeRecord) {
        self.records
            .write()
            .await
            .insert(record.name.clone(), record);
    }
}

#[async_trait]
impl NodeStore for InMemoryNodeStore {
    async fn fetch(&self, name: &str) -> NodeResult<Option<NodeRecord>> {
        let records = self.records.read().await;
        debug!(node = %name, found = records.contains_key(name), "fetch");
        Ok(records.get(name).cloned())
    }

    async fn save(&self, record: NodeRecord) -> NodeResult<NodeRecord> {
        debug!(node = %record.name, "save");
        self.records
            .write()
            .await
            .insert(record.name.clone(), record.clone());
        Ok(record)
    }
}

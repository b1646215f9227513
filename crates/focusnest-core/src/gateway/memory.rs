use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::watch;

use super::{Document, DocumentStore, Fields, Query, WriteBatch};
use crate::error::StoreError;

type Collections = HashMap<String, BTreeMap<String, Fields>>;

/// In-process document store.
///
/// Commits are applied to a staged copy and swapped in only when every
/// operation succeeded.
pub struct MemoryStore {
    collections: Mutex<Collections>,
    revision: watch::Sender<u64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            collections: Mutex::new(HashMap::new()),
            revision,
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Collections>, StoreError> {
        self.collections
            .lock()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".into()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let collections = self.lock()?;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|fields| Document {
                id: id.to_string(),
                fields: fields.clone(),
            }))
    }

    async fn query(&self, query: &Query) -> Result<Vec<Document>, StoreError> {
        let collections = self.lock()?;
        let docs = collections
            .get(&query.collection)
            .into_iter()
            .flat_map(|docs| docs.iter())
            .map(|(id, fields)| Document {
                id: id.clone(),
                fields: fields.clone(),
            });
        Ok(query.apply(docs))
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        if batch.is_empty() {
            return Ok(());
        }
        {
            let mut collections = self.lock()?;
            let mut staged = collections.clone();
            for op in batch.ops() {
                let docs = staged.entry(op.collection().to_string()).or_default();
                let next = op.apply(docs.get(op.id()))?;
                docs.insert(op.id().to_string(), next);
            }
            *collections = staged;
        }
        self.revision.send_modify(|rev| *rev += 1);
        Ok(())
    }

    fn changes(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }
}

//! Persistence gateway.
//!
//! The progression store talks to an abstract document store: CRUD by
//! collection and id, predicate queries with ordering, atomic write
//! batches with numeric increments and preconditions, and a revision
//! channel that turns any query into a live subscription.

mod document;
mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::error::StoreError;

pub use document::{
    compare_values, Direction, Document, FieldChange, Fields, Filter, FilterOp, OrderBy,
    Precondition, Query, WriteBatch, WriteOp,
};
pub use memory::MemoryStore;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    async fn query(&self, query: &Query) -> Result<Vec<Document>, StoreError>;

    /// Apply every operation or none of them.
    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError>;

    /// Revision counter bumped after every successful commit.
    fn changes(&self) -> watch::Receiver<u64>;
}

/// Re-run `query` now and after every commit to `store`.
///
/// Commits landing between two polls are coalesced into one emission.
pub fn watch_query(
    store: Arc<dyn DocumentStore>,
    query: Query,
) -> BoxStream<'static, Result<Vec<Document>, StoreError>> {
    WatchStream::new(store.changes())
        .then(move |_revision| {
            let store = Arc::clone(&store);
            let query = query.clone();
            async move { store.query(&query).await }
        })
        .boxed()
}

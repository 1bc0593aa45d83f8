//! Document store wrappers for asserting on writes, injecting failures and
//! interleaving concurrent callers.

use std::sync::{
    Mutex,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

use async_trait::async_trait;
use tokio::sync::Barrier;

use crate::{
    adapters::persistence::InMemoryDocumentStore,
    app_error::{AppError, AppResult},
    application::ports::document_store::{
        CollectionPath, DocPath, Document, DocumentStore, Precondition,
    },
};

// ============================================================================
// CountingDocumentStore
// ============================================================================

/// In-memory store that counts every write attempt (`set`, `set_if`, `delete`).
#[derive(Default)]
pub struct CountingDocumentStore {
    inner: InMemoryDocumentStore,
    writes: AtomicUsize,
}

impl CountingDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl DocumentStore for CountingDocumentStore {
    async fn get(&self, path: &DocPath) -> AppResult<Option<Document>> {
        self.inner.get(path).await
    }

    async fn set(&self, path: &DocPath, data: serde_json::Value) -> AppResult<()> {
        self.record_write();
        self.inner.set(path, data).await
    }

    async fn set_if(
        &self,
        path: &DocPath,
        data: serde_json::Value,
        precondition: Precondition,
    ) -> AppResult<()> {
        self.record_write();
        self.inner.set_if(path, data, precondition).await
    }

    async fn delete(&self, path: &DocPath) -> AppResult<()> {
        self.record_write();
        self.inner.delete(path).await
    }

    async fn list(&self, collection: &CollectionPath) -> AppResult<Vec<(String, Document)>> {
        self.inner.list(collection).await
    }
}

// ============================================================================
// FailingDocumentStore
// ============================================================================

/// Store whose every operation fails like an unreachable database.
#[derive(Default)]
pub struct FailingDocumentStore;

impl FailingDocumentStore {
    pub fn new() -> Self {
        Self
    }

    fn unavailable<T>() -> AppResult<T> {
        Err(AppError::Database("store unavailable".into()))
    }
}

#[async_trait]
impl DocumentStore for FailingDocumentStore {
    async fn get(&self, _path: &DocPath) -> AppResult<Option<Document>> {
        Self::unavailable()
    }

    async fn set(&self, _path: &DocPath, _data: serde_json::Value) -> AppResult<()> {
        Self::unavailable()
    }

    async fn set_if(
        &self,
        _path: &DocPath,
        _data: serde_json::Value,
        _precondition: Precondition,
    ) -> AppResult<()> {
        Self::unavailable()
    }

    async fn delete(&self, _path: &DocPath) -> AppResult<()> {
        Self::unavailable()
    }

    async fn list(&self, _collection: &CollectionPath) -> AppResult<Vec<(String, Document)>> {
        Self::unavailable()
    }
}

// ============================================================================
// FlakyDocumentStore
// ============================================================================

type PathMatcher = Box<dyn Fn(&DocPath) -> bool + Send + Sync>;

/// In-memory store whose first write to a path matching `matches` fails with a
/// transient database error. Later writes go through.
pub struct FlakyDocumentStore {
    inner: InMemoryDocumentStore,
    matches: PathMatcher,
    tripped: AtomicBool,
}

impl FlakyDocumentStore {
    pub fn failing_once_on(matches: impl Fn(&DocPath) -> bool + Send + Sync + 'static) -> Self {
        Self {
            inner: InMemoryDocumentStore::new(),
            matches: Box::new(matches),
            tripped: AtomicBool::new(false),
        }
    }

    fn check(&self, path: &DocPath) -> AppResult<()> {
        if (self.matches)(path) && !self.tripped.swap(true, Ordering::SeqCst) {
            return Err(AppError::Database("transient".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for FlakyDocumentStore {
    async fn get(&self, path: &DocPath) -> AppResult<Option<Document>> {
        self.inner.get(path).await
    }

    async fn set(&self, path: &DocPath, data: serde_json::Value) -> AppResult<()> {
        self.check(path)?;
        self.inner.set(path, data).await
    }

    async fn set_if(
        &self,
        path: &DocPath,
        data: serde_json::Value,
        precondition: Precondition,
    ) -> AppResult<()> {
        self.check(path)?;
        self.inner.set_if(path, data, precondition).await
    }

    async fn delete(&self, path: &DocPath) -> AppResult<()> {
        self.check(path)?;
        self.inner.delete(path).await
    }

    async fn list(&self, collection: &CollectionPath) -> AppResult<Vec<(String, Document)>> {
        self.inner.list(collection).await
    }
}

// ============================================================================
// BarrierDocumentStore
// ============================================================================

/// In-memory store that holds the first `parties` reads of `path` until all of
/// them have arrived, so concurrent callers act on the same snapshot.
pub struct BarrierDocumentStore {
    inner: InMemoryDocumentStore,
    path: Mutex<Option<DocPath>>,
    barrier: Barrier,
    remaining: AtomicUsize,
}

impl BarrierDocumentStore {
    pub fn new(parties: usize) -> Self {
        Self {
            inner: InMemoryDocumentStore::new(),
            path: Mutex::new(None),
            barrier: Barrier::new(parties),
            remaining: AtomicUsize::new(parties),
        }
    }

    /// Start holding reads of `path`.
    pub fn hold_reads_of(&self, path: DocPath) {
        *self.path.lock().unwrap() = Some(path);
    }

    fn should_wait(&self, path: &DocPath) -> bool {
        if self.path.lock().unwrap().as_ref() != Some(path) {
            return false;
        }
        self.remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl DocumentStore for BarrierDocumentStore {
    async fn get(&self, path: &DocPath) -> AppResult<Option<Document>> {
        let doc = self.inner.get(path).await?;
        if self.should_wait(path) {
            self.barrier.wait().await;
        }
        Ok(doc)
    }

    async fn set(&self, path: &DocPath, data: serde_json::Value) -> AppResult<()> {
        self.inner.set(path, data).await
    }

    async fn set_if(
        &self,
        path: &DocPath,
        data: serde_json::Value,
        precondition: Precondition,
    ) -> AppResult<()> {
        self.inner.set_if(path, data, precondition).await
    }

    async fn delete(&self, path: &DocPath) -> AppResult<()> {
        self.inner.delete(path).await
    }

    async fn list(&self, collection: &CollectionPath) -> AppResult<Vec<(String, Document)>> {
        self.inner.list(collection).await
    }
}

// ============================================================================
// InterleavingDocumentStore
// ============================================================================

/// In-memory store that lets another writer replace `path` right after the
/// next read of it, so the reader holds a stale revision.
#[derive(Default)]
pub struct InterleavingDocumentStore {
    inner: InMemoryDocumentStore,
    pending: Mutex<Option<(DocPath, serde_json::Value)>>,
}

impl InterleavingDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_after_next_read(&self, path: DocPath, data: serde_json::Value) {
        *self.pending.lock().unwrap() = Some((path, data));
    }
}

#[async_trait]
impl DocumentStore for InterleavingDocumentStore {
    async fn get(&self, path: &DocPath) -> AppResult<Option<Document>> {
        let doc = self.inner.get(path).await?;
        let pending = {
            let mut pending = self.pending.lock().unwrap();
            match pending.as_ref() {
                Some((target, _)) if target == path => pending.take(),
                _ => None,
            }
        };
        if let Some((target, data)) = pending {
            self.inner.set(&target, data).await?;
        }
        Ok(doc)
    }

    async fn set(&self, path: &DocPath, data: serde_json::Value) -> AppResult<()> {
        self.inner.set(path, data).await
    }

    async fn set_if(
        &self,
        path: &DocPath,
        data: serde_json::Value,
        precondition: Precondition,
    ) -> AppResult<()> {
        self.inner.set_if(path, data, precondition).await
    }

    async fn delete(&self, path: &DocPath) -> AppResult<()> {
        self.inner.delete(path).await
    }

    async fn list(&self, collection: &CollectionPath) -> AppResult<Vec<(String, Document)>> {
        self.inner.list(collection).await
    }
}

//! In-process document store for local development and tests.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::{
    app_error::{AppError, AppResult},
    application::ports::document_store::{
        CollectionPath, DocPath, Document, DocumentStore, Precondition,
    },
};

#[derive(Default)]
pub struct InMemoryDocumentStore {
    docs: Mutex<BTreeMap<DocPath, Document>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> AppResult<std::sync::MutexGuard<'_, BTreeMap<DocPath, Document>>> {
        self.docs
            .lock()
            .map_err(|_| AppError::Internal("Document store lock poisoned".into()))
    }

    fn write(
        docs: &mut BTreeMap<DocPath, Document>,
        path: &DocPath,
        data: serde_json::Value,
    ) {
        let revision = docs.get(path).map_or(1, |d| d.revision + 1);
        docs.insert(path.clone(), Document { data, revision });
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get(&self, path: &DocPath) -> AppResult<Option<Document>> {
        Ok(self.lock()?.get(path).cloned())
    }

    async fn set(&self, path: &DocPath, data: serde_json::Value) -> AppResult<()> {
        let mut docs = self.lock()?;
        Self::write(&mut docs, path, data);
        Ok(())
    }

    async fn set_if(
        &self,
        path: &DocPath,
        data: serde_json::Value,
        precondition: Precondition,
    ) -> AppResult<()> {
        let mut docs = self.lock()?;
        let current = docs.get(path).map(|d| d.revision);
        if !precondition.holds_for(current) {
            return Err(AppError::Conflict);
        }
        Self::write(&mut docs, path, data);
        Ok(())
    }

    async fn delete(&self, path: &DocPath) -> AppResult<()> {
        self.lock()?.remove(path);
        Ok(())
    }

    async fn list(&self, collection: &CollectionPath) -> AppResult<Vec<(String, Document)>> {
        let docs = self.lock()?;
        Ok(docs
            .iter()
            .filter(|(path, _)| path.collection() == *collection)
            .map(|(path, doc)| (path.id().to_string(), doc.clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn set_get_delete() {
        let store = InMemoryDocumentStore::new();
        let path = DocPath::new(&["users", "u1", "subscription", "current"]);

        assert!(store.get(&path).await.unwrap().is_none());

        store.set(&path, json!({"a": 1})).await.unwrap();
        let doc = store.get(&path).await.unwrap().unwrap();
        assert_eq!(doc.data, json!({"a": 1}));
        assert_eq!(doc.revision, 1);

        store.set(&path, json!({"a": 2})).await.unwrap();
        assert_eq!(store.get(&path).await.unwrap().unwrap().revision, 2);

        store.delete(&path).await.unwrap();
        assert!(store.get(&path).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn set_if_enforces_precondition() {
        let store = InMemoryDocumentStore::new();
        let path = DocPath::new(&["teams", "t1"]);

        store
            .set_if(&path, json!({"v": 1}), Precondition::Missing)
            .await
            .unwrap();

        let err = store
            .set_if(&path, json!({"v": 2}), Precondition::Missing)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict));

        let err = store
            .set_if(&path, json!({"v": 2}), Precondition::Revision(7))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict));

        store
            .set_if(&path, json!({"v": 2}), Precondition::Revision(1))
            .await
            .unwrap();
        assert_eq!(store.get(&path).await.unwrap().unwrap().data, json!({"v": 2}));
    }

    #[tokio::test]
    async fn list_returns_direct_children_only() {
        let store = InMemoryDocumentStore::new();
        let members = CollectionPath::new(&["teams", "t1", "members"]);

        store.set(&members.doc("b"), json!({"n": "b"})).await.unwrap();
        store.set(&members.doc("a"), json!({"n": "a"})).await.unwrap();
        store
            .set(&DocPath::new(&["teams", "t2", "members", "c"]), json!({}))
            .await
            .unwrap();
        store.set(&DocPath::new(&["teams", "t1"]), json!({})).await.unwrap();

        let listed = store.list(&members).await.unwrap();
        let ids: Vec<_> = listed.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }
}

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};

use crate::app_error::{AppError, AppResult};

// ============================================================================
// Port Types
// ============================================================================

/// Slash-separated path of a document, e.g. `users/u1/subscription/current`.
///
/// A path always has an even number of segments (collection/id pairs).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocPath(String);

impl DocPath {
    pub fn new(segments: &[&str]) -> Self {
        debug_assert!(segments.len() % 2 == 0, "document paths have even length");
        Self(segments.join("/"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The collection this document lives in.
    pub fn collection(&self) -> CollectionPath {
        match self.0.rsplit_once('/') {
            Some((parent, _)) => CollectionPath(parent.to_string()),
            None => CollectionPath(String::new()),
        }
    }

    /// The last path segment (the document id).
    pub fn id(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or_default()
    }
}

impl std::fmt::Display for DocPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Slash-separated path of a collection, e.g. `teams/t1/members`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollectionPath(String);

impl CollectionPath {
    pub fn new(segments: &[&str]) -> Self {
        debug_assert!(segments.len() % 2 == 1, "collection paths have odd length");
        Self(segments.join("/"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn doc(&self, id: &str) -> DocPath {
        DocPath(format!("{}/{}", self.0, id))
    }
}

impl std::fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A stored document and its store-managed revision.
///
/// The revision starts at 1 and increases by one on every write.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub data: serde_json::Value,
    pub revision: u64,
}

/// Condition a conditional write must satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    /// The document must not exist yet.
    Missing,
    /// The document must exist at exactly this revision.
    Revision(u64),
}

impl Precondition {
    /// Precondition that matches the state of a document as it was read.
    pub fn from_read(doc: Option<&Document>) -> Self {
        match doc {
            Some(d) => Precondition::Revision(d.revision),
            None => Precondition::Missing,
        }
    }

    pub fn holds_for(&self, current: Option<u64>) -> bool {
        match (self, current) {
            (Precondition::Missing, None) => true,
            (Precondition::Revision(expected), Some(actual)) => *expected == actual,
            _ => false,
        }
    }
}

// ============================================================================
// Port Trait
// ============================================================================

/// Keyed, hierarchical document store.
///
/// Writes are single-document; there are no cross-document transactions.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, path: &DocPath) -> AppResult<Option<Document>>;

    /// Unconditionally replace the document.
    async fn set(&self, path: &DocPath, data: serde_json::Value) -> AppResult<()>;

    /// Replace the document only if `precondition` holds; `AppError::Conflict` otherwise.
    async fn set_if(
        &self,
        path: &DocPath,
        data: serde_json::Value,
        precondition: Precondition,
    ) -> AppResult<()>;

    async fn delete(&self, path: &DocPath) -> AppResult<()>;

    /// All documents directly inside `collection`, as `(id, document)` pairs ordered by id.
    async fn list(&self, collection: &CollectionPath) -> AppResult<Vec<(String, Document)>>;
}

impl dyn DocumentStore {
    pub async fn get_as<T: DeserializeOwned>(&self, path: &DocPath) -> AppResult<Option<T>> {
        match self.get(path).await? {
            Some(doc) => Ok(Some(decode(path, doc.data)?)),
            None => Ok(None),
        }
    }

    pub async fn set_as<T: Serialize + Sync>(&self, path: &DocPath, value: &T) -> AppResult<()> {
        self.set(path, serde_json::to_value(value)?).await
    }

    pub async fn list_as<T: DeserializeOwned>(
        &self,
        collection: &CollectionPath,
    ) -> AppResult<Vec<(String, T)>> {
        let docs = self.list(collection).await?;
        let mut out = Vec::with_capacity(docs.len());
        for (id, doc) in docs {
            let path = collection.doc(&id);
            out.push((id, decode(&path, doc.data)?));
        }
        Ok(out)
    }
}

/// Deserialize a stored document, reporting the path on failure.
pub fn decode<T: DeserializeOwned>(path: &DocPath, data: serde_json::Value) -> AppResult<T> {
    serde_json::from_value(data).map_err(|e| {
        tracing::error!(path = %path, error = %e, "Stored document has unexpected shape");
        AppError::Internal(format!("Malformed document at {}", path))
    })
}

// ============================================================================
// Canonical Paths
// ============================================================================

pub mod paths {
    use billing_types::Subject;

    use super::{CollectionPath, DocPath};

    fn subject_root(subject: &Subject) -> (&'static str, &str) {
        match subject {
            Subject::Individual { user_id } => ("users", user_id.as_str()),
            Subject::Team { team_id } => ("teams", team_id.as_str()),
        }
    }

    /// `users/{uid}/subscription/current` or `teams/{teamId}/subscription/current`.
    pub fn subscription(subject: &Subject) -> DocPath {
        let (root, id) = subject_root(subject);
        DocPath::new(&[root, id, "subscription", "current"])
    }

    pub fn payments(subject: &Subject) -> CollectionPath {
        let (root, id) = subject_root(subject);
        CollectionPath::new(&[root, id, "payments"])
    }

    pub fn payment(subject: &Subject, invoice_id: &str) -> DocPath {
        payments(subject).doc(invoice_id)
    }

    pub fn team(team_id: &str) -> DocPath {
        DocPath::new(&["teams", team_id])
    }

    pub fn team_members(team_id: &str) -> CollectionPath {
        CollectionPath::new(&["teams", team_id, "members"])
    }

    pub fn team_member(team_id: &str, member_id: &str) -> DocPath {
        team_members(team_id).doc(member_id)
    }

    /// Index from an owner to the single team they own.
    pub fn owned_team(user_id: &str) -> DocPath {
        DocPath::new(&["users", user_id, "teams", "owned"])
    }
}

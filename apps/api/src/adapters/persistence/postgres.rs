//! Postgres-backed document store: one JSONB row per document path.

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::{
    app_error::{AppError, AppResult},
    application::ports::document_store::{
        CollectionPath, DocPath, Document, DocumentStore, Precondition,
    },
};

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS documents (
        path TEXT PRIMARY KEY,
        collection TEXT NOT NULL,
        data JSONB NOT NULL,
        revision BIGINT NOT NULL DEFAULT 1,
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
"#;

const CREATE_COLLECTION_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS documents_collection_idx ON documents (collection)";

#[derive(Clone)]
pub struct PostgresDocumentStore {
    pool: PgPool,
}

impl PostgresDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        PostgresDocumentStore { pool }
    }

    /// Create the documents table if it does not exist.
    pub async fn ensure_schema(&self) -> AppResult<()> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;
        sqlx::query(CREATE_COLLECTION_INDEX)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

fn row_to_document(row: &sqlx::postgres::PgRow) -> Document {
    Document {
        data: row.get("data"),
        revision: row.get::<i64, _>("revision") as u64,
    }
}

#[async_trait]
impl DocumentStore for PostgresDocumentStore {
    async fn get(&self, path: &DocPath) -> AppResult<Option<Document>> {
        let row = sqlx::query("SELECT data, revision FROM documents WHERE path = $1")
            .bind(path.as_str())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(row_to_document))
    }

    async fn set(&self, path: &DocPath, data: serde_json::Value) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO documents (path, collection, data)
            VALUES ($1, $2, $3)
            ON CONFLICT (path) DO UPDATE
            SET data = EXCLUDED.data,
                revision = documents.revision + 1,
                updated_at = NOW()
            "#,
        )
        .bind(path.as_str())
        .bind(path.collection().as_str())
        .bind(data)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn set_if(
        &self,
        path: &DocPath,
        data: serde_json::Value,
        precondition: Precondition,
    ) -> AppResult<()> {
        let result = match precondition {
            Precondition::Missing => {
                sqlx::query(
                    r#"
                    INSERT INTO documents (path, collection, data)
                    VALUES ($1, $2, $3)
                    ON CONFLICT (path) DO NOTHING
                    "#,
                )
                .bind(path.as_str())
                .bind(path.collection().as_str())
                .bind(data)
                .execute(&self.pool)
                .await?
            }
            Precondition::Revision(expected) => {
                sqlx::query(
                    r#"
                    UPDATE documents
                    SET data = $2, revision = revision + 1, updated_at = NOW()
                    WHERE path = $1 AND revision = $3
                    "#,
                )
                .bind(path.as_str())
                .bind(data)
                .bind(expected as i64)
                .execute(&self.pool)
                .await?
            }
        };

        if result.rows_affected() == 0 {
            return Err(AppError::Conflict);
        }
        Ok(())
    }

    async fn delete(&self, path: &DocPath) -> AppResult<()> {
        sqlx::query("DELETE FROM documents WHERE path = $1")
            .bind(path.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list(&self, collection: &CollectionPath) -> AppResult<Vec<(String, Document)>> {
        let rows = sqlx::query(
            "SELECT path, data, revision FROM documents WHERE collection = $1 ORDER BY path",
        )
        .bind(collection.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| {
                let path: String = row.get("path");
                let id = path.rsplit('/').next().unwrap_or_default().to_string();
                (id, row_to_document(row))
            })
            .collect())
    }
}

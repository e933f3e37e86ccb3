// SQLite-backed DocumentStore
//
// One table holds every collection. Each row is (collection, doc_id, fields)
// with the fields encoded as a JSON object; `seq` gives insertion order.
// Statements run on tokio's blocking pool, never on a runtime worker.

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};

use super::{generate_id, Document, DocumentId, DocumentStore, Fields, NewDocument};
use crate::cycle::{Clock, SystemClock};
use crate::error::{StoreError, StoreResult};

/// Document store persisted in a single SQLite database
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    clock: Arc<dyn Clock>,
}

impl SqliteStore {
    /// Open (or create) a database file; `":memory:"` opens a private in-memory database
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let conn = if path == Path::new(":memory:") {
            Connection::open_in_memory()?
        } else {
            let conn = Connection::open(path)?;
            // WAL for crash recovery
            conn.pragma_update(None, "journal_mode", "WAL")?;
            conn
        };
        Self::from_connection(conn, Arc::new(SystemClock))
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Self::from_connection(Connection::open_in_memory()?, Arc::new(SystemClock))
    }

    /// Wrap an existing connection; server timestamps come from `clock`
    pub fn from_connection(conn: Connection, clock: Arc<dyn Clock>) -> StoreResult<Self> {
        setup_database(&conn)?;
        Ok(SqliteStore {
            conn: Arc::new(Mutex::new(conn)),
            clock,
        })
    }

    /// Run `work` against the connection on the blocking pool
    async fn with_conn<T, F>(&self, work: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> StoreResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().unwrap_or_else(|e| e.into_inner());
            work(&mut *guard)
        })
        .await
        .map_err(|e| StoreError::Unavailable(format!("sqlite worker failed: {}", e)))?
    }
}

fn setup_database(conn: &Connection) -> StoreResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS documents (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            collection TEXT NOT NULL,
            doc_id TEXT NOT NULL,
            fields TEXT NOT NULL,
            UNIQUE (collection, doc_id)
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents(collection, seq)",
        [],
    )?;

    Ok(())
}

fn decode_fields(collection: &str, id: &str, raw: &str) -> StoreResult<Fields> {
    match serde_json::from_str::<Value>(raw)? {
        Value::Object(fields) => Ok(fields),
        other => Err(StoreError::Corrupt {
            collection: collection.to_string(),
            id: id.to_string(),
            reason: format!("expected a JSON object, found {}", json_kind(&other)),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn fetch_fields(conn: &Connection, collection: &str, id: &str) -> StoreResult<Option<Fields>> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT fields FROM documents WHERE collection = ?1 AND doc_id = ?2",
            params![collection, id],
            |row| row.get(0),
        )
        .optional()?;

    raw.map(|raw| decode_fields(collection, id, &raw)).transpose()
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn create(&self, collection: &str, document: NewDocument) -> StoreResult<DocumentId> {
        let fields = document.into_fields(self.clock.now());
        let encoded = serde_json::to_string(&fields)?;
        let id = generate_id();

        let (coll, doc_id) = (collection.to_string(), id.clone());
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO documents (collection, doc_id, fields) VALUES (?1, ?2, ?3)",
                params![coll, doc_id, encoded],
            )?;
            Ok(())
        })
        .await?;

        tracing::debug!(collection, id = %id, "sqlite store: created document");
        Ok(id)
    }

    async fn set(&self, collection: &str, id: &str, fields: Fields) -> StoreResult<()> {
        let (collection, id) = (collection.to_string(), id.to_string());
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;

            let mut merged = fetch_fields(&tx, &collection, &id)?.unwrap_or_default();
            merged.extend(fields);
            let encoded = serde_json::to_string(&merged)?;

            tx.execute(
                "INSERT INTO documents (collection, doc_id, fields) VALUES (?1, ?2, ?3)
                 ON CONFLICT (collection, doc_id) DO UPDATE SET fields = excluded.fields",
                params![collection, id, encoded],
            )?;
            tx.commit()?;
            Ok(())
        })
        .await
    }

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Fields>> {
        let (collection, id) = (collection.to_string(), id.to_string());
        self.with_conn(move |conn| fetch_fields(conn, &collection, &id))
            .await
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        let (collection, id) = (collection.to_string(), id.to_string());
        self.with_conn(move |conn| {
            conn.execute(
                "DELETE FROM documents WHERE collection = ?1 AND doc_id = ?2",
                params![collection, id],
            )?;
            Ok(())
        })
        .await
    }

    async fn list(&self, collection: &str) -> StoreResult<Vec<Document>> {
        let collection = collection.to_string();
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT doc_id, fields FROM documents WHERE collection = ?1 ORDER BY seq",
            )?;

            let rows = stmt.query_map(params![collection], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?;

            let mut documents = Vec::new();
            for row in rows {
                let (id, raw) = row?;
                let fields = decode_fields(&collection, &id, &raw)?;
                documents.push(Document { id, fields });
            }
            Ok(documents)
        })
        .await
    }
}

//! Versioned document-store contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide typed get/put/remove/list access to the shared document tree.
//! - Emit change events to local subscribers on every write.
//!
//! # Invariants
//! - A document's version increases by exactly one per successful write.
//! - `put` with an expected version is rejected on mismatch and leaves the
//!   stored row untouched.
//! - Subscribers registered for a prefix also observe writes to child paths.

use crate::db::DbError;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::cell::RefCell;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::mpsc::{channel, Receiver, Sender};

/// Well-known document paths of the household tree.
pub mod paths {
    use crate::model::expense::ExpenseId;

    pub const TRASH_DUTY: &str = "trashDuty";
    pub const EXPENSES: &str = "expenses";
    pub const PUSH_TOKENS: &str = "pushTokens";
    pub const CURRENT_DATE: &str = "currentDate";

    pub fn expense(id: ExpenseId) -> String {
        format!("{EXPENSES}/{id}")
    }

    pub fn push_token(member: &str) -> String {
        format!("{PUSH_TOKENS}/{member}")
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Storage and concurrency errors for document operations.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    Serde(serde_json::Error),
    NotFound(String),
    /// Conditional write lost against a concurrent writer.
    Conflict {
        path: String,
        expected: u64,
        actual: u64,
    },
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Serde(err) => write!(f, "document body (de)serialization failed: {err}"),
            Self::NotFound(path) => write!(f, "document not found: {path}"),
            Self::Conflict {
                path,
                expected,
                actual,
            } => write!(
                f,
                "conditional write to `{path}` rejected: expected version {expected}, found {actual}"
            ),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Serde(err) => Some(err),
            Self::NotFound(_) | Self::Conflict { .. } => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serde(value)
    }
}

/// A document body together with its stored version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Versioned<T> {
    pub version: u64,
    pub value: T,
}

/// Change delivered to subscribers. `version`/`body` are `None` for removals.
#[derive(Debug, Clone)]
pub struct DocumentEvent {
    pub path: String,
    pub version: Option<u64>,
    pub body: Option<serde_json::Value>,
}

/// Contract for the shared key-value document tree.
///
/// `put` concurrency modes:
/// - `expected = None`: unconditional overwrite, last writer wins.
/// - `expected = Some(0)`: create-only; rejected when the path exists.
/// - `expected = Some(v)`: compare-and-swap against stored version `v`.
pub trait DocumentStore {
    fn get<T: DeserializeOwned>(&self, path: &str) -> StoreResult<Option<Versioned<T>>>;

    /// Writes a document, returning the new stored version.
    fn put<T: Serialize>(&self, path: &str, expected: Option<u64>, value: &T) -> StoreResult<u64>;

    /// Deletes a document. Removing an absent path is a no-op.
    fn remove(&self, path: &str) -> StoreResult<()>;

    /// Lists documents under `prefix/`, ordered by path.
    fn list_prefix<T: DeserializeOwned>(
        &self,
        prefix: &str,
    ) -> StoreResult<Vec<(String, Versioned<T>)>>;

    /// Registers a change feed for `path` and its children.
    fn subscribe(&self, path: &str) -> Receiver<DocumentEvent>;
}

impl<S: DocumentStore> DocumentStore for &S {
    fn get<T: DeserializeOwned>(&self, path: &str) -> StoreResult<Option<Versioned<T>>> {
        (**self).get(path)
    }

    fn put<T: Serialize>(&self, path: &str, expected: Option<u64>, value: &T) -> StoreResult<u64> {
        (**self).put(path, expected, value)
    }

    fn remove(&self, path: &str) -> StoreResult<()> {
        (**self).remove(path)
    }

    fn list_prefix<T: DeserializeOwned>(
        &self,
        prefix: &str,
    ) -> StoreResult<Vec<(String, Versioned<T>)>> {
        (**self).list_prefix(prefix)
    }

    fn subscribe(&self, path: &str) -> Receiver<DocumentEvent> {
        (**self).subscribe(path)
    }
}

struct Watcher {
    prefix: String,
    sender: Sender<DocumentEvent>,
}

/// SQLite-backed document store with a process-local change feed.
pub struct SqliteDocumentStore<'conn> {
    conn: &'conn Connection,
    watchers: RefCell<Vec<Watcher>>,
}

impl<'conn> SqliteDocumentStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self {
            conn,
            watchers: RefCell::new(Vec::new()),
        }
    }

    fn stored_version(&self, path: &str) -> StoreResult<Option<u64>> {
        let version = self
            .conn
            .query_row(
                "SELECT version FROM documents WHERE path = ?1;",
                params![path],
                |row| row.get::<_, u64>(0),
            )
            .optional()?;
        Ok(version)
    }

    fn notify(&self, event: DocumentEvent) {
        // Drop watchers whose receiver has gone away.
        self.watchers.borrow_mut().retain(|watcher| {
            if !watches(&watcher.prefix, &event.path) {
                return true;
            }
            watcher.sender.send(event.clone()).is_ok()
        });
    }
}

fn watches(prefix: &str, path: &str) -> bool {
    path == prefix || path.strip_prefix(prefix).is_some_and(|rest| rest.starts_with('/'))
}

impl DocumentStore for SqliteDocumentStore<'_> {
    fn get<T: DeserializeOwned>(&self, path: &str) -> StoreResult<Option<Versioned<T>>> {
        let row = self
            .conn
            .query_row(
                "SELECT version, body FROM documents WHERE path = ?1;",
                params![path],
                |row| Ok((row.get::<_, u64>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;

        match row {
            Some((version, body)) => Ok(Some(Versioned {
                version,
                value: serde_json::from_str(&body)?,
            })),
            None => Ok(None),
        }
    }

    fn put<T: Serialize>(&self, path: &str, expected: Option<u64>, value: &T) -> StoreResult<u64> {
        let body = serde_json::to_value(value)?;
        let encoded = serde_json::to_string(&body)?;

        let tx = self.conn.unchecked_transaction()?;
        let actual = self.stored_version(path)?;

        if let Some(expected) = expected {
            if actual.unwrap_or(0) != expected {
                return Err(StoreError::Conflict {
                    path: path.to_string(),
                    expected,
                    actual: actual.unwrap_or(0),
                });
            }
        }

        let next_version = actual.unwrap_or(0) + 1;
        tx.execute(
            "INSERT INTO documents (path, version, body, updated_at)
             VALUES (?1, ?2, ?3, strftime('%s', 'now') * 1000)
             ON CONFLICT(path) DO UPDATE SET
                version = excluded.version,
                body = excluded.body,
                updated_at = excluded.updated_at;",
            params![path, next_version, encoded],
        )?;
        tx.commit()?;

        self.notify(DocumentEvent {
            path: path.to_string(),
            version: Some(next_version),
            body: Some(body),
        });

        Ok(next_version)
    }

    fn remove(&self, path: &str) -> StoreResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM documents WHERE path = ?1;", params![path])?;

        if changed > 0 {
            self.notify(DocumentEvent {
                path: path.to_string(),
                version: None,
                body: None,
            });
        }

        Ok(())
    }

    fn list_prefix<T: DeserializeOwned>(
        &self,
        prefix: &str,
    ) -> StoreResult<Vec<(String, Versioned<T>)>> {
        let mut stmt = self.conn.prepare(
            "SELECT path, version, body FROM documents
             WHERE path LIKE ?1 ESCAPE '\\'
             ORDER BY path;",
        )?;

        let pattern = format!("{}/%", escape_like(prefix));
        let mut rows = stmt.query(params![pattern])?;
        let mut documents = Vec::new();
        while let Some(row) = rows.next()? {
            let path: String = row.get(0)?;
            let version: u64 = row.get(1)?;
            let body: String = row.get(2)?;
            documents.push((
                path,
                Versioned {
                    version,
                    value: serde_json::from_str(&body)?,
                },
            ));
        }

        Ok(documents)
    }

    fn subscribe(&self, path: &str) -> Receiver<DocumentEvent> {
        let (sender, receiver) = channel();
        self.watchers.borrow_mut().push(Watcher {
            prefix: path.to_string(),
            sender,
        });
        receiver
    }
}

fn escape_like(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

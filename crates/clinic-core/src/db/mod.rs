//! Database layer for clinic records.

mod appointments;
mod patients;
mod references;
mod schema;
mod treatments;

pub use references::*;
pub use schema::*;

use rusqlite::Connection;
use std::cell::Cell;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use crate::diagnostics::{DiagnosticSink, TracingSink};

/// Database errors.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Persistence error: {0}")]
    Persistence(#[from] rusqlite::Error),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Stored value could not be decoded: {0}")]
    Decode(String),

    #[error("{entity} {id} is still referenced by {dependents}")]
    Referenced {
        entity: &'static str,
        id: i64,
        dependents: Dependents,
    },
}

pub type DbResult<T> = Result<T, DbError>;

/// Database connection wrapper.
///
/// Owns the connection for its whole lifetime. Failed operations are
/// reported to the diagnostic sink and returned to the caller.
pub struct Database {
    conn: Connection,
    sink: Arc<dyn DiagnosticSink>,
    delete_policy: DeletePolicy,
    schema_ready: Cell<bool>,
}

impl Database {
    /// Open database at path, creating if needed.
    ///
    /// A failure to create the tables is recorded but does not fail the
    /// open; see [`Database::is_degraded`].
    pub fn open<P: AsRef<Path>>(path: P, sink: Arc<dyn DiagnosticSink>) -> DbResult<Self> {
        let path = path.as_ref();
        let conn = match Connection::open(path) {
            Ok(conn) => conn,
            Err(e) => {
                let message = format!("Failed to open database {}: {e}", path.display());
                tracing::error!("{message}");
                sink.append(&message);
                return Err(e.into());
            }
        };
        tracing::info!(path = %path.display(), "Opened clinic database");
        Ok(Self::initialize(conn, sink))
    }

    /// Create in-memory database (for testing).
    pub fn open_in_memory(sink: Arc<dyn DiagnosticSink>) -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self::initialize(conn, sink))
    }

    /// In-memory database reporting failures through `tracing` only.
    pub fn open_in_memory_default() -> DbResult<Self> {
        Self::open_in_memory(Arc::new(TracingSink))
    }

    fn initialize(conn: Connection, sink: Arc<dyn DiagnosticSink>) -> Self {
        let db = Self {
            conn,
            sink,
            delete_policy: DeletePolicy::default(),
            schema_ready: Cell::new(false),
        };
        // A failure is logged and leaves the handle in degraded mode
        let _ = db.ensure_schema();
        db
    }

    /// Create the Patients, Appointments and Treatments tables if absent.
    ///
    /// Clears degraded mode on success, so a failed open can be retried.
    pub fn ensure_schema(&self) -> DbResult<()> {
        let result = self.logged("Failed to create tables", || {
            self.conn
                .execute_batch(SCHEMA)
                .map_err(|e| DbError::Schema(e.to_string()))?;
            tracing::debug!("Clinic tables created or already exist");
            Ok(())
        });
        self.schema_ready.set(result.is_ok());
        result
    }

    /// Set how deletes treat dependent appointments and treatments.
    pub fn with_delete_policy(mut self, policy: DeletePolicy) -> Self {
        self.delete_policy = policy;
        self
    }

    pub fn delete_policy(&self) -> DeletePolicy {
        self.delete_policy
    }

    /// True when the last attempt to create the tables failed.
    pub fn is_degraded(&self) -> bool {
        !self.schema_ready.get()
    }

    /// Get raw connection (for advanced queries).
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Run `op`, recording any error to the diagnostic sink before returning it.
    fn logged<T, F>(&self, context: &str, op: F) -> DbResult<T>
    where
        F: FnOnce() -> DbResult<T>,
    {
        let result = op();
        if let Err(e) = &result {
            tracing::warn!(error = %e, "{context}");
            self.sink.append(&format!("{context}: {e}"));
        }
        result
    }
}

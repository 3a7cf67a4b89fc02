use rusqlite::{Connection, OptionalExtension, params};

use crate::error::{MailIndexError, Result};

use super::SqliteIndexStore;

const MIGRATION_SCHEMA_SQL: &str = r"
    PRAGMA foreign_keys = ON;
    CREATE TABLE IF NOT EXISTS documents (
        doc_id INTEGER PRIMARY KEY AUTOINCREMENT,
        message_id TEXT NOT NULL UNIQUE
    );

    CREATE TABLE IF NOT EXISTS document_terms (
        doc_id INTEGER NOT NULL,
        field TEXT NOT NULL,
        value TEXT NOT NULL,
        PRIMARY KEY (doc_id, field, value),
        FOREIGN KEY (doc_id) REFERENCES documents(doc_id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS document_values (
        doc_id INTEGER NOT NULL,
        slot TEXT NOT NULL,
        value TEXT NOT NULL,
        PRIMARY KEY (doc_id, slot),
        FOREIGN KEY (doc_id) REFERENCES documents(doc_id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS index_metadata (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_document_terms_posting
    ON document_terms(field, value, doc_id);
";

const REQUIRED_TABLES: [&str; 4] = [
    "documents",
    "document_terms",
    "document_values",
    "index_metadata",
];

impl SqliteIndexStore {
    pub(super) fn migrate(&self) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute_batch(MIGRATION_SCHEMA_SQL)?;
            Ok(())
        })
    }

    pub(super) fn verify_schema(&self) -> Result<()> {
        self.with_conn(|conn| {
            for table in REQUIRED_TABLES {
                if !has_table(conn, table)? {
                    return Err(MailIndexError::Validation(format!(
                        "unsupported index schema: table {table} is missing; recreate the index"
                    )));
                }
            }
            Ok(())
        })
    }
}

fn has_table(conn: &Connection, table: &str) -> Result<bool> {
    let exists = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1 LIMIT 1",
            params![table],
            |_| Ok(()),
        )
        .optional()?
        .is_some();
    Ok(exists)
}

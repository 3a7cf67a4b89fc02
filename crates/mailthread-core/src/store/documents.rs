use std::collections::{BTreeSet, HashMap};

use rusqlite::{Connection, OptionalExtension, params};

use crate::error::{MailIndexError, Result};
use crate::models::{MessageKind, TermField, ValueSlot};

use super::SqliteIndexStore;

#[derive(Debug, Clone, PartialEq, Eq)]
enum PendingChange {
    AddTerm(TermField, String),
    RemoveTerm(TermField, String),
    SetValue(ValueSlot, String),
}

/// Buffered view of one indexed message. Term and value edits stay local
/// until [`SqliteIndexStore::sync`] writes them.
#[derive(Debug, Clone)]
pub struct Document {
    doc_id: Option<i64>,
    message_id: String,
    terms: HashMap<TermField, BTreeSet<String>>,
    values: HashMap<ValueSlot, String>,
    pending: Vec<PendingChange>,
}

impl Document {
    pub(crate) fn blank(message_id: impl Into<String>) -> Self {
        Self {
            doc_id: None,
            message_id: message_id.into(),
            terms: HashMap::new(),
            values: HashMap::new(),
            pending: Vec::new(),
        }
    }

    #[must_use]
    pub const fn doc_id(&self) -> Option<i64> {
        self.doc_id
    }

    #[must_use]
    pub fn message_id(&self) -> &str {
        &self.message_id
    }

    /// True until the first sync gives the document a row.
    #[must_use]
    pub const fn is_new(&self) -> bool {
        self.doc_id.is_none()
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.is_new() || !self.pending.is_empty()
    }

    #[must_use]
    pub fn terms(&self, field: TermField) -> Vec<&str> {
        self.terms
            .get(&field)
            .map(|set| set.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn has_term(&self, field: TermField, value: &str) -> bool {
        self.terms
            .get(&field)
            .is_some_and(|set| set.contains(value))
    }

    pub fn add_term(&mut self, field: TermField, value: &str) {
        if self
            .terms
            .entry(field)
            .or_default()
            .insert(value.to_string())
        {
            self.pending
                .push(PendingChange::AddTerm(field, value.to_string()));
        }
    }

    pub fn remove_term(&mut self, field: TermField, value: &str) {
        if self
            .terms
            .get_mut(&field)
            .is_some_and(|set| set.remove(value))
        {
            self.pending
                .push(PendingChange::RemoveTerm(field, value.to_string()));
        }
    }

    #[must_use]
    pub fn value(&self, slot: ValueSlot) -> Option<&str> {
        self.values.get(&slot).map(String::as_str)
    }

    pub fn set_value(&mut self, slot: ValueSlot, value: &str) {
        if self.values.get(&slot).map(String::as_str) == Some(value) {
            return;
        }
        self.values.insert(slot, value.to_string());
        self.pending
            .push(PendingChange::SetValue(slot, value.to_string()));
    }

    /// Thread id, if one has been assigned. More than one is a corrupt index.
    pub fn assigned_thread_id(&self) -> Result<Option<&str>> {
        let threads = self.terms(TermField::Thread);
        match threads.as_slice() {
            [] => Ok(None),
            [thread_id] => Ok(Some(*thread_id)),
            many => Err(MailIndexError::InvariantViolation(format!(
                "message {} carries {} thread ids",
                self.message_id,
                many.len()
            ))),
        }
    }

    /// Thread id of a document that must already be threaded.
    pub fn thread_id(&self) -> Result<&str> {
        self.assigned_thread_id()?.ok_or_else(|| {
            MailIndexError::InvariantViolation(format!(
                "message {} has no thread id",
                self.message_id
            ))
        })
    }

    /// `None` until the kind has been initialized. A document in the middle
    /// of ghost promotion already reports `Mail`.
    #[must_use]
    pub fn kind(&self) -> Option<MessageKind> {
        if self.has_term(TermField::Type, MessageKind::Mail.as_str()) {
            Some(MessageKind::Mail)
        } else if self.has_term(TermField::Type, MessageKind::Ghost.as_str()) {
            Some(MessageKind::Ghost)
        } else {
            None
        }
    }
}

impl SqliteIndexStore {
    pub fn find_document(&self, message_id: &str) -> Result<Option<Document>> {
        self.with_conn(|conn| {
            let doc_id = conn
                .query_row(
                    "SELECT doc_id FROM documents WHERE message_id = ?1",
                    params![message_id],
                    |row| row.get::<_, i64>(0),
                )
                .optional()?;
            doc_id
                .map(|doc_id| read_document(conn, doc_id, message_id.to_string()))
                .transpose()
        })
    }

    pub fn load_document(&self, doc_id: i64) -> Result<Document> {
        self.with_conn(|conn| {
            let message_id = conn
                .query_row(
                    "SELECT message_id FROM documents WHERE doc_id = ?1",
                    params![doc_id],
                    |row| row.get::<_, String>(0),
                )
                .optional()?
                .ok_or_else(|| {
                    MailIndexError::InvariantViolation(format!(
                        "posting list names missing document {doc_id}"
                    ))
                })?;
            read_document(conn, doc_id, message_id)
        })
    }

    /// Writes the buffered edits of `doc`, creating its row on first sync.
    pub fn sync(&self, doc: &mut Document) -> Result<()> {
        self.ensure_writable()?;
        if !doc.is_dirty() {
            return Ok(());
        }
        let doc_id = self.with_conn_mut(|conn| {
            let savepoint = conn.savepoint()?;
            let doc_id = match doc.doc_id {
                Some(doc_id) => doc_id,
                None => {
                    savepoint.execute(
                        "INSERT INTO documents(message_id) VALUES (?1)",
                        params![doc.message_id],
                    )?;
                    savepoint.last_insert_rowid()
                }
            };
            for change in &doc.pending {
                match change {
                    PendingChange::AddTerm(field, value) => {
                        savepoint.execute(
                            "INSERT OR IGNORE INTO document_terms(doc_id, field, value) VALUES (?1, ?2, ?3)",
                            params![doc_id, field.as_str(), value],
                        )?;
                    }
                    PendingChange::RemoveTerm(field, value) => {
                        savepoint.execute(
                            "DELETE FROM document_terms WHERE doc_id = ?1 AND field = ?2 AND value = ?3",
                            params![doc_id, field.as_str(), value],
                        )?;
                    }
                    PendingChange::SetValue(slot, value) => {
                        savepoint.execute(
                            r"
                            INSERT INTO document_values(doc_id, slot, value)
                            VALUES (?1, ?2, ?3)
                            ON CONFLICT(doc_id, slot) DO UPDATE SET value = excluded.value
                            ",
                            params![doc_id, slot.as_str(), value],
                        )?;
                    }
                }
            }
            savepoint.commit()?;
            Ok(doc_id)
        })?;
        doc.doc_id = Some(doc_id);
        doc.pending.clear();
        Ok(())
    }

    /// Ids of every synced document carrying `field = value`, ascending.
    pub fn postings(&self, field: TermField, value: &str) -> Result<Vec<i64>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT doc_id FROM document_terms WHERE field = ?1 AND value = ?2 ORDER BY doc_id ASC",
            )?;
            let rows = stmt.query_map(params![field.as_str(), value], |row| row.get::<_, i64>(0))?;

            let mut out = Vec::new();
            for row in rows {
                out.push(row?);
            }
            Ok(out)
        })
    }

    pub fn message_ids_with_term(&self, field: TermField, value: &str) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                r"
                SELECT d.message_id
                FROM document_terms t
                JOIN documents d ON d.doc_id = t.doc_id
                WHERE t.field = ?1 AND t.value = ?2
                ORDER BY d.message_id ASC
                ",
            )?;
            let rows = stmt.query_map(params![field.as_str(), value], |row| row.get::<_, String>(0))?;

            let mut out = Vec::new();
            for row in rows {
                out.push(row?);
            }
            Ok(out)
        })
    }
}

fn read_document(conn: &Connection, doc_id: i64, message_id: String) -> Result<Document> {
    let mut doc = Document::blank(message_id);
    doc.doc_id = Some(doc_id);

    let mut stmt = conn.prepare("SELECT field, value FROM document_terms WHERE doc_id = ?1")?;
    let rows = stmt.query_map(params![doc_id], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;
    for row in rows {
        let (field, value) = row?;
        if let Some(field) = TermField::parse(&field) {
            doc.terms.entry(field).or_default().insert(value);
        }
    }

    let mut stmt = conn.prepare("SELECT slot, value FROM document_values WHERE doc_id = ?1")?;
    let rows = stmt.query_map(params![doc_id], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;
    for row in rows {
        let (slot, value) = row?;
        if let Some(slot) = ValueSlot::parse(&slot) {
            doc.values.insert(slot, value);
        }
    }
    Ok(doc)
}

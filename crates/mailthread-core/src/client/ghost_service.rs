use tracing::debug;

use crate::error::{MailIndexError, Result};
use crate::models::{MessageKind, TermField};
use crate::store::Document;

use super::MailIndex;

pub(crate) const LAST_THREAD_ID_KEY: &str = "last_thread_id";
pub(crate) const THREAD_ID_STASH_PREFIX: &str = "thread_id_";
pub(crate) const HASHED_ID_PREFIX: &str = "mailthread-blake3-";

const THREAD_ID_WIDTH: usize = 16;

/// Formats a counter value as a fixed-width lowercase hex thread id.
#[must_use]
pub fn format_thread_id(value: u64) -> String {
    format!("{value:016x}")
}

/// Inverse of [`format_thread_id`]; rejects anything that is not exactly 16 lowercase hex digits.
#[must_use]
pub fn parse_thread_id(raw: &str) -> Option<u64> {
    let well_formed = raw.len() == THREAD_ID_WIDTH
        && raw
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
    if !well_formed {
        return None;
    }
    u64::from_str_radix(raw, 16).ok()
}

pub(crate) fn hashed_message_id(message_id: &str) -> String {
    format!(
        "{HASHED_ID_PREFIX}{}",
        blake3::hash(message_id.as_bytes()).to_hex()
    )
}

impl MailIndex {
    /// Looks up the document for `message_id`, or returns a blank unsynced one.
    pub(crate) fn find_or_create(&self, message_id: &str) -> Result<(Document, bool)> {
        match self.store.find_document(message_id)? {
            Some(doc) => Ok((doc, false)),
            None => Ok((Document::blank(message_id), true)),
        }
    }

    /// Marks `doc` as a ghost in `thread_id` and syncs it immediately, so later
    /// resolutions in the same add see it.
    pub(crate) fn initialize_ghost(&self, doc: &mut Document, thread_id: &str) -> Result<()> {
        doc.add_term(TermField::Type, MessageKind::Ghost.as_str());
        doc.add_term(TermField::Thread, thread_id);
        self.store.sync(doc)?;
        debug!(message_id = %doc.message_id(), thread_id = %thread_id, "created ghost message");
        Ok(())
    }

    /// Bumps the persisted counter and returns the new id. The counter is
    /// written before the id is handed out.
    pub(crate) fn generate_thread_id(&self) -> Result<String> {
        let last = match self.store.get_metadata(LAST_THREAD_ID_KEY)? {
            Some(raw) => parse_thread_id(&raw).ok_or_else(|| {
                MailIndexError::InvariantViolation(format!(
                    "stored {LAST_THREAD_ID_KEY} is not a thread id: {raw:?}"
                ))
            })?,
            None => 0,
        };
        let next = last.checked_add(1).ok_or_else(|| {
            MailIndexError::InvariantViolation("thread id counter exhausted".to_string())
        })?;
        let thread_id = format_thread_id(next);
        self.store.set_metadata(LAST_THREAD_ID_KEY, &thread_id)?;
        Ok(thread_id)
    }

    pub(crate) fn stash_key(&self, message_id: &str) -> String {
        if message_id.len() > self.config.message_id_max {
            format!("{THREAD_ID_STASH_PREFIX}{}", hashed_message_id(message_id))
        } else {
            format!("{THREAD_ID_STASH_PREFIX}{message_id}")
        }
    }

    pub(crate) fn peek_legacy_stash(&self, message_id: &str) -> Result<Option<String>> {
        Ok(self
            .store
            .get_metadata(&self.stash_key(message_id))?
            .filter(|thread_id| !thread_id.is_empty()))
    }

    pub(crate) fn stash_legacy_thread_id(&self, message_id: &str, thread_id: &str) -> Result<()> {
        self.store
            .set_metadata(&self.stash_key(message_id), thread_id)?;
        debug!(message_id = %message_id, thread_id = %thread_id, "stashed thread id for unseen message");
        Ok(())
    }

    /// Reads and clears the stashed thread id for `message_id`.
    pub(crate) fn consume_legacy_stash(&self, message_id: &str) -> Result<Option<String>> {
        let Some(thread_id) = self.peek_legacy_stash(message_id)? else {
            return Ok(None);
        };
        self.store.clear_metadata(&self.stash_key(message_id))?;
        Ok(Some(thread_id))
    }
}

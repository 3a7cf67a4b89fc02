use crate::error::Result;
use crate::models::{IndexStatus, MessageSummary, TermField, ValueSlot};

use super::MailIndex;
use super::ghost_service::LAST_THREAD_ID_KEY;

impl MailIndex {
    pub fn find_message(&self, message_id: &str) -> Result<Option<MessageSummary>> {
        let Some(doc) = self.store.find_document(message_id)? else {
            return Ok(None);
        };

        Ok(Some(MessageSummary {
            message_id: doc.message_id().to_string(),
            thread_id: doc.assigned_thread_id()?.map(ToString::to_string),
            kind: doc.kind(),
            filenames: owned(doc.terms(TermField::File)),
            references: owned(doc.terms(TermField::Reference)),
            reply_to: doc.terms(TermField::ReplyTo).first().map(ToString::to_string),
            from: doc.value(ValueSlot::From).map(ToString::to_string),
            subject: doc.value(ValueSlot::Subject).map(ToString::to_string),
            date: doc.value(ValueSlot::Date).and_then(|raw| raw.parse().ok()),
        }))
    }

    /// Message ids (ghosts included) currently in `thread_id`, sorted.
    pub fn thread_members(&self, thread_id: &str) -> Result<Vec<String>> {
        self.store.message_ids_with_term(TermField::Thread, thread_id)
    }

    pub fn last_thread_id(&self) -> Result<Option<String>> {
        self.store.get_metadata(LAST_THREAD_ID_KEY)
    }

    pub fn status(&self) -> Result<IndexStatus> {
        Ok(IndexStatus {
            features: self.features,
            last_thread_id: self.last_thread_id()?,
            document_count: self.store.document_count()?,
        })
    }
}

fn owned(values: Vec<&str>) -> Vec<String> {
    values.into_iter().map(ToString::to_string).collect()
}

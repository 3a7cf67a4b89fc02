use std::fs;
use std::path::Path;

use chrono::DateTime;
use tracing::{info, warn};

use crate::error::{MailIndexError, Result};
use crate::message_file::MessageFile;
use crate::models::{AddOutcome, AddStatus, MessageKind, TermField, ValueSlot};
use crate::references::parse_identifier;
use crate::store::Document;
use crate::terms::extract_terms;

use super::MailIndex;
use super::ghost_service::HASHED_ID_PREFIX;

impl MailIndex {
    /// Adds the message file at `path` to the index and threads it.
    ///
    /// A message id that is already indexed as mail is not an error: the
    /// file is recorded as another filename and the outcome status is
    /// [`AddStatus::DuplicateMessageId`].
    pub fn add_message(&self, path: impl AsRef<Path>) -> Result<AddOutcome> {
        let path = path.as_ref();
        self.store.ensure_writable()?;

        let mut file = MessageFile::open(path)?;
        file.parse()?;

        self.store
            .begin_atomic()
            .map_err(MailIndexError::into_store_fault)?;
        let outcome = self.add_parsed_message(&file);
        let closed = self.store.end_atomic();

        match (outcome, closed) {
            (Ok(outcome), Ok(())) => {
                info!(
                    path = %path.display(),
                    message_id = %outcome.message_id,
                    thread_id = %outcome.thread_id,
                    status = ?outcome.status,
                    "indexed message"
                );
                Ok(outcome)
            }
            (Ok(_), Err(err)) => {
                let err = err.into_store_fault();
                warn!(path = %path.display(), error = %err, "closing atomic scope failed");
                Err(err)
            }
            (Err(err), closed) => {
                if let Err(close_err) = closed {
                    warn!(path = %path.display(), error = %close_err, "closing atomic scope failed");
                }
                Err(err)
            }
        }
    }

    fn add_parsed_message(&self, file: &MessageFile) -> Result<AddOutcome> {
        let from = file.header("from");
        let subject = file.header("subject");
        let to = file.header("to");
        if [from, subject, to]
            .iter()
            .all(|value| value.is_none_or(str::is_empty))
        {
            return Err(MailIndexError::NotEmail(file.path().display().to_string()));
        }

        let message_id = message_id_for(file);
        self.admit_message(file, &message_id).map_err(|err| {
            let err = err.into_store_fault();
            if matches!(err, MailIndexError::StoreFault(_)) {
                warn!(message_id = %message_id, error = %err, "store fault while adding message");
            }
            err
        })
    }

    fn admit_message(&self, file: &MessageFile, message_id: &str) -> Result<AddOutcome> {
        let (mut message, created) = self.find_or_create(message_id)?;
        let is_ghost = message.kind() == Some(MessageKind::Ghost);

        message.add_term(TermField::File, &filename_term(file.path()));

        if !created && !is_ghost {
            self.store.sync(&mut message)?;
            return Ok(AddOutcome {
                status: AddStatus::DuplicateMessageId,
                message_id: message_id.to_string(),
                thread_id: message.thread_id()?.to_string(),
            });
        }

        message.add_term(TermField::Type, MessageKind::Mail.as_str());
        if is_ghost {
            message.remove_term(TermField::Type, MessageKind::Ghost.as_str());
        }

        let thread_id = self.link_message(
            &mut message,
            is_ghost,
            file.header("references"),
            file.header("in-reply-to"),
        )?;

        set_header_values(&mut message, file);
        self.index_terms(&mut message, file);
        self.store.sync(&mut message)?;

        Ok(AddOutcome {
            status: AddStatus::Added,
            message_id: message_id.to_string(),
            thread_id,
        })
    }

    fn index_terms(&self, message: &mut Document, file: &MessageFile) {
        let text = match file.header("subject") {
            Some(subject) => format!("{subject}\n{}", file.body()),
            None => file.body().to_string(),
        };
        for term in extract_terms(&text, self.config.body_term_limit) {
            message.add_term(TermField::Term, &term);
        }
    }
}

/// Message-Id header parsed, else verbatim, else a content hash of the file.
fn message_id_for(file: &MessageFile) -> String {
    match file.header("message-id").filter(|raw| !raw.is_empty()) {
        Some(raw) => parse_identifier(raw).unwrap_or_else(|| raw.to_string()),
        None => format!("{HASHED_ID_PREFIX}{}", file.content_hash()),
    }
}

fn filename_term(path: &Path) -> String {
    fs::canonicalize(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .to_string_lossy()
        .into_owned()
}

fn set_header_values(message: &mut Document, file: &MessageFile) {
    let timestamp = file
        .header("date")
        .and_then(|raw| DateTime::parse_from_rfc2822(raw).ok())
        .map_or(0, |date| date.timestamp());
    message.set_value(ValueSlot::Date, &timestamp.to_string());
    message.set_value(ValueSlot::From, file.header("from").unwrap_or_default());
    message.set_value(ValueSlot::Subject, file.header("subject").unwrap_or_default());
}

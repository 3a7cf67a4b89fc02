use std::collections::HashSet;

use tracing::debug;

use crate::error::Result;
use crate::models::TermField;
use crate::references::parse_reference_list;
use crate::store::Document;

use super::MailIndex;

impl MailIndex {
    /// Thread id for `message_id`, creating a ghost (or, without ghost
    /// support, a stash entry) when the message has not been seen.
    pub(crate) fn resolve_thread_for(&self, message_id: &str) -> Result<String> {
        if !self.features.ghosts {
            return self.resolve_thread_for_legacy(message_id);
        }

        let (mut doc, created) = self.find_or_create(message_id)?;
        if !created {
            return Ok(doc.thread_id()?.to_string());
        }
        let thread_id = self.generate_thread_id()?;
        self.initialize_ghost(&mut doc, &thread_id)?;
        Ok(thread_id)
    }

    fn resolve_thread_for_legacy(&self, message_id: &str) -> Result<String> {
        if let Some(doc) = self.store.find_document(message_id)? {
            return Ok(doc.thread_id()?.to_string());
        }
        if let Some(thread_id) = self.peek_legacy_stash(message_id)? {
            return Ok(thread_id);
        }
        let thread_id = self.generate_thread_id()?;
        self.stash_legacy_thread_id(message_id, &thread_id)?;
        Ok(thread_id)
    }

    /// Moves every document of thread `loser` into thread `winner`. Returns
    /// the number of rewritten documents.
    pub(crate) fn merge_threads(&self, winner: &str, loser: &str) -> Result<usize> {
        if winner == loser {
            return Ok(0);
        }
        let doc_ids = self.store.postings(TermField::Thread, loser)?;
        for doc_id in &doc_ids {
            let mut doc = self.store.load_document(*doc_id)?;
            doc.remove_term(TermField::Thread, loser);
            doc.add_term(TermField::Thread, winner);
            self.store.sync(&mut doc)?;
        }
        debug!(winner = %winner, loser = %loser, rewritten = doc_ids.len(), "merged threads");
        Ok(doc_ids.len())
    }

    /// Links `message` to the parents named in its References and In-Reply-To
    /// headers, References first, left to right.
    pub(crate) fn link_to_parents(
        &self,
        message: &mut Document,
        references: Option<&str>,
        in_reply_to: Option<&str>,
        thread_id: &mut Option<String>,
    ) -> Result<()> {
        let self_id = message.message_id().to_string();
        let refs = parse_reference_list(&self_id, references);
        let replies = parse_reference_list(&self_id, in_reply_to);

        if let Some(reply_to) = refs.last_reference.as_deref().or_else(|| replies.first()) {
            message.add_term(TermField::ReplyTo, reply_to);
        }

        let mut seen = HashSet::new();
        for parent in refs.parents.iter().chain(&replies.parents) {
            if !seen.insert(parent.as_str()) {
                continue;
            }
            let parent_thread = self.resolve_thread_for(parent)?;
            message.add_term(TermField::Reference, parent);
            match thread_id {
                Some(current) => {
                    if *current != parent_thread {
                        self.merge_threads(current, &parent_thread)?;
                    }
                }
                None => {
                    message.add_term(TermField::Thread, &parent_thread);
                    *thread_id = Some(parent_thread);
                }
            }
        }
        Ok(())
    }

    /// Pulls earlier-indexed children of `message` back into its thread.
    /// Only needed without ghost documents, where stashed ids are never
    /// rewritten by merges.
    pub(crate) fn link_to_children(
        &self,
        message: &mut Document,
        thread_id: &mut Option<String>,
    ) -> Result<()> {
        let message_id = message.message_id().to_string();
        for doc_id in self.store.postings(TermField::Reference, &message_id)? {
            let mut child = self.store.load_document(doc_id)?;
            let child_thread = child.thread_id()?.to_string();
            match thread_id {
                Some(current) => {
                    if *current != child_thread {
                        child.remove_term(TermField::Reference, &message_id);
                        self.store.sync(&mut child)?;
                        self.merge_threads(current, &child_thread)?;
                    }
                }
                None => {
                    message.add_term(TermField::Thread, &child_thread);
                    *thread_id = Some(child_thread);
                }
            }
        }
        Ok(())
    }

    /// Assigns `message` its thread id, merging any threads it bridges.
    /// Never leaves the message without a thread.
    pub(crate) fn link_message(
        &self,
        message: &mut Document,
        is_ghost: bool,
        references: Option<&str>,
        in_reply_to: Option<&str>,
    ) -> Result<String> {
        let mut thread_id = if self.features.ghosts {
            if is_ghost {
                Some(message.thread_id()?.to_string())
            } else {
                None
            }
        } else {
            let stashed = self.consume_legacy_stash(message.message_id())?;
            if let Some(stashed) = stashed.as_deref() {
                message.add_term(TermField::Thread, stashed);
            }
            stashed
        };

        self.link_to_parents(message, references, in_reply_to, &mut thread_id)?;

        if !self.features.ghosts {
            self.link_to_children(message, &mut thread_id)?;
        }

        match thread_id {
            Some(thread_id) => Ok(thread_id),
            None => {
                let thread_id = self.generate_thread_id()?;
                message.add_term(TermField::Thread, &thread_id);
                Ok(thread_id)
            }
        }
    }
}

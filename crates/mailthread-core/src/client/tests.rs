use tempfile::tempdir;

use crate::config::IndexConfig;
use crate::models::{MessageKind, TermField};
use crate::store::{Document, OpenMode};

use super::ghost_service::{HASHED_ID_PREFIX, THREAD_ID_STASH_PREFIX};
use super::*;

fn open_index(root: &Path, config: IndexConfig) -> MailIndex {
    MailIndex::open(root, OpenMode::ReadWrite, config).expect("open index")
}

#[test]
fn thread_ids_are_fixed_width_hex_and_increase() {
    let temp = tempdir().expect("tempdir");
    let index = open_index(temp.path(), IndexConfig::default());

    let mut previous = 0;
    for _ in 0..20 {
        let thread_id = index.generate_thread_id().expect("generate");
        assert_eq!(thread_id.len(), 16);
        assert!(
            thread_id
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
        );
        let value = parse_thread_id(&thread_id).expect("parse");
        assert!(value > previous);
        previous = value;
    }
    assert_eq!(
        index.last_thread_id().expect("last").as_deref(),
        Some(format_thread_id(previous).as_str())
    );
}

#[test]
fn thread_counter_survives_reopen() {
    let temp = tempdir().expect("tempdir");
    let first = {
        let index = open_index(temp.path(), IndexConfig::default());
        index.generate_thread_id().expect("generate")
    };
    let index = open_index(temp.path(), IndexConfig::default());
    let second = index.generate_thread_id().expect("generate");
    assert!(parse_thread_id(&second) > parse_thread_id(&first));
}

#[test]
fn parse_thread_id_rejects_malformed_values() {
    assert_eq!(parse_thread_id("000000000000000a"), Some(10));
    assert_eq!(parse_thread_id("000000000000000A"), None);
    assert_eq!(parse_thread_id("a"), None);
    assert_eq!(parse_thread_id("00000000000000zz"), None);
}

#[test]
fn corrupt_counter_is_an_invariant_violation() {
    let temp = tempdir().expect("tempdir");
    let index = open_index(temp.path(), IndexConfig::default());
    index
        .store
        .set_metadata(super::ghost_service::LAST_THREAD_ID_KEY, "not-hex")
        .expect("set");
    assert!(matches!(
        index.generate_thread_id(),
        Err(MailIndexError::InvariantViolation(_))
    ));
}

#[test]
fn resolve_creates_one_ghost_per_unseen_id() {
    let temp = tempdir().expect("tempdir");
    let index = open_index(temp.path(), IndexConfig::default());

    let first = index.resolve_thread_for("parent@x").expect("resolve");
    let again = index.resolve_thread_for("parent@x").expect("resolve again");
    assert_eq!(first, again);

    let ghost = index
        .store
        .find_document("parent@x")
        .expect("find")
        .expect("ghost missing");
    assert_eq!(ghost.kind(), Some(MessageKind::Ghost));
    assert!(ghost.terms(TermField::File).is_empty());
    assert_eq!(ghost.thread_id().expect("thread"), first);
    assert_eq!(index.store.document_count().expect("count"), 1);
}

#[test]
fn merge_rewrites_loser_and_is_idempotent() {
    let temp = tempdir().expect("tempdir");
    let index = open_index(temp.path(), IndexConfig::default());

    for (id, thread) in [("a@x", "t-win"), ("b@x", "t-lose"), ("c@x", "t-lose")] {
        let mut doc = Document::blank(id);
        doc.add_term(TermField::Thread, thread);
        index.store.sync(&mut doc).expect("sync");
    }

    assert_eq!(index.merge_threads("t-win", "t-lose").expect("merge"), 2);
    assert_eq!(index.merge_threads("t-win", "t-lose").expect("merge again"), 0);
    assert_eq!(index.merge_threads("t-win", "t-win").expect("self merge"), 0);
    assert_eq!(
        index.thread_members("t-win").expect("members"),
        vec!["a@x", "b@x", "c@x"]
    );
}

#[test]
fn stash_keys_compress_long_message_ids() {
    let temp = tempdir().expect("tempdir");
    let config = IndexConfig {
        message_id_max: 16,
        ..IndexConfig::legacy()
    };
    let index = open_index(temp.path(), config);

    assert_eq!(index.stash_key("short@x"), format!("{THREAD_ID_STASH_PREFIX}short@x"));
    let long = "a-very-long-message-identifier@example.com";
    let key = index.stash_key(long);
    assert!(key.starts_with(&format!("{THREAD_ID_STASH_PREFIX}{HASHED_ID_PREFIX}")));
    assert_eq!(key, index.stash_key(long));
}

#[test]
fn legacy_stash_is_consumed_exactly_once() {
    let temp = tempdir().expect("tempdir");
    let index = open_index(temp.path(), IndexConfig::legacy());
    assert!(!index.features().ghosts);

    let thread_id = index.resolve_thread_for("unseen@x").expect("resolve");
    assert_eq!(index.store.document_count().expect("count"), 0);
    assert_eq!(
        index.resolve_thread_for("unseen@x").expect("resolve again"),
        thread_id
    );

    assert_eq!(
        index.consume_legacy_stash("unseen@x").expect("consume"),
        Some(thread_id)
    );
    assert_eq!(index.consume_legacy_stash("unseen@x").expect("consume again"), None);
}

#[test]
fn features_are_fixed_at_creation() {
    let temp = tempdir().expect("tempdir");
    {
        let index = open_index(temp.path(), IndexConfig::legacy());
        assert!(!index.features().ghosts);
    }
    let reopened = open_index(temp.path(), IndexConfig::default());
    assert!(!reopened.features().ghosts);
}

#[test]
fn link_message_generates_thread_for_root_message() {
    let temp = tempdir().expect("tempdir");
    let index = open_index(temp.path(), IndexConfig::default());

    let mut message = Document::blank("root@x");
    let thread_id = index
        .link_message(&mut message, false, None, None)
        .expect("link");
    assert_eq!(message.thread_id().expect("thread"), thread_id);
    assert_eq!(index.last_thread_id().expect("last"), Some(thread_id));
}

#[test]
fn link_to_parents_records_reply_to_hint() {
    let temp = tempdir().expect("tempdir");
    let index = open_index(temp.path(), IndexConfig::default());

    let mut message = Document::blank("child@x");
    let mut thread_id = None;
    index
        .link_to_parents(&mut message, Some("<a@x> <b@x>"), Some("<c@x>"), &mut thread_id)
        .expect("link");
    assert_eq!(message.terms(TermField::ReplyTo), vec!["b@x"]);
    assert_eq!(message.terms(TermField::Reference), vec!["a@x", "b@x", "c@x"]);

    let mut reply = Document::blank("reply@x");
    let mut reply_thread = None;
    index
        .link_to_parents(&mut reply, None, Some("<c@x> <a@x>"), &mut reply_thread)
        .expect("link reply");
    assert_eq!(reply.terms(TermField::ReplyTo), vec!["c@x"]);
    assert_eq!(reply_thread, thread_id);
}

fn write_reply(dir: &Path, message_id: &str, parent_id: &str) -> PathBuf {
    let path = dir.join(message_id);
    std::fs::write(
        &path,
        format!(
            "From: a@example.com\nSubject: re\nMessage-Id: <{message_id}>\nReferences: <{parent_id}>\n\nbody\n"
        ),
    )
    .expect("write message");
    path
}

#[test]
fn corrupt_counter_during_linking_closes_scope() {
    let temp = tempdir().expect("tempdir");
    let index = open_index(&temp.path().join("index"), IndexConfig::default());
    index
        .store
        .set_metadata(super::ghost_service::LAST_THREAD_ID_KEY, "not-hex")
        .expect("set");

    let path = write_reply(temp.path(), "child@x", "parent@x");
    assert!(matches!(
        index.add_message(&path),
        Err(MailIndexError::InvariantViolation(_))
    ));
    assert_eq!(index.store.atomic_depth(), 0);
    assert_eq!(index.store.document_count().expect("count"), 0);
}

#[test]
fn engine_failure_during_admission_is_a_store_fault() {
    let temp = tempdir().expect("tempdir");
    let root = temp.path().join("index");
    let index = open_index(&root, IndexConfig::default());

    {
        let conn =
            rusqlite::Connection::open(root.join(INDEX_FILE_NAME)).expect("second connection");
        conn.execute_batch("DROP TABLE document_values")
            .expect("drop values table");
    }

    let path = write_reply(temp.path(), "child@x", "parent@x");
    let err = index.add_message(&path).expect_err("must fail");
    assert!(matches!(err, MailIndexError::StoreFault(_)), "got {err:?}");
    assert_eq!(index.store.atomic_depth(), 0);

    // the ghost resolved before the failure is kept; the message itself is not
    assert_eq!(
        index
            .store
            .message_ids_with_term(TermField::Type, MessageKind::Ghost.as_str())
            .expect("ghosts"),
        vec!["parent@x".to_string()]
    );
    assert_eq!(index.store.document_count().expect("count"), 1);
}

use serde::Serialize;

/// Field names of the terms attached to a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TermField {
    Thread,
    Type,
    Reference,
    ReplyTo,
    File,
    Term,
}

impl TermField {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Thread => "thread",
            Self::Type => "type",
            Self::Reference => "reference",
            Self::ReplyTo => "replyto",
            Self::File => "file",
            Self::Term => "term",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "thread" => Some(Self::Thread),
            "type" => Some(Self::Type),
            "reference" => Some(Self::Reference),
            "replyto" => Some(Self::ReplyTo),
            "file" => Some(Self::File),
            "term" => Some(Self::Term),
            _ => None,
        }
    }
}

/// Single-valued per-document slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueSlot {
    Date,
    From,
    Subject,
}

impl ValueSlot {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::From => "from",
            Self::Subject => "subject",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "date" => Some(Self::Date),
            "from" => Some(Self::From),
            "subject" => Some(Self::Subject),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Ghost,
    Mail,
}

impl MessageKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ghost => "ghost",
            Self::Mail => "mail",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "ghost" => Some(Self::Ghost),
            "mail" => Some(Self::Mail),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IndexFeatures {
    pub ghosts: bool,
}

impl IndexFeatures {
    const GHOSTS: &'static str = "ghosts";

    #[must_use]
    pub fn parse(raw: &str) -> Self {
        Self {
            ghosts: raw.split_whitespace().any(|name| name == Self::GHOSTS),
        }
    }

    #[must_use]
    pub fn render(self) -> String {
        if self.ghosts {
            Self::GHOSTS.to_string()
        } else {
            String::new()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AddStatus {
    Added,
    /// The message id was already indexed as mail; only the filename was recorded.
    DuplicateMessageId,
}

/// Result of a successful add. The stored message is already synced when
/// this is returned; `MailIndex::find_message(&outcome.message_id)` reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddOutcome {
    pub status: AddStatus,
    pub message_id: String,
    pub thread_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageSummary {
    pub message_id: String,
    pub thread_id: Option<String>,
    pub kind: Option<MessageKind>,
    pub filenames: Vec<String>,
    pub references: Vec<String>,
    pub reply_to: Option<String>,
    pub from: Option<String>,
    pub subject: Option<String>,
    pub date: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexStatus {
    pub features: IndexFeatures,
    pub last_thread_id: Option<String>,
    pub document_count: usize,
}

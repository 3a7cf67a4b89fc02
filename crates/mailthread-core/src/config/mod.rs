mod env;

use self::env::{parse_env_bool, read_env_usize, read_non_empty_env};

pub const LEGACY_THREADING_ENV: &str = "MAILTHREAD_LEGACY_THREADING";
pub const MESSAGE_ID_MAX_ENV: &str = "MAILTHREAD_MESSAGE_ID_MAX";
pub const BODY_TERM_LIMIT_ENV: &str = "MAILTHREAD_BODY_TERM_LIMIT";

pub const DEFAULT_MESSAGE_ID_MAX: usize = 243;
pub const DEFAULT_BODY_TERM_LIMIT: usize = 4096;
const MIN_MESSAGE_ID_MAX: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexConfig {
    /// Create new indexes without ghost documents (stash-based threading).
    pub legacy_threading: bool,
    /// Longest message id used verbatim inside a metadata key.
    pub message_id_max: usize,
    /// Distinct words indexed per message.
    pub body_term_limit: usize,
}

impl IndexConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            legacy_threading: parse_env_bool(read_non_empty_env(LEGACY_THREADING_ENV).as_deref()),
            message_id_max: read_env_usize(
                MESSAGE_ID_MAX_ENV,
                DEFAULT_MESSAGE_ID_MAX,
                MIN_MESSAGE_ID_MAX,
            ),
            body_term_limit: read_env_usize(BODY_TERM_LIMIT_ENV, DEFAULT_BODY_TERM_LIMIT, 0),
        }
    }

    #[must_use]
    pub const fn legacy() -> Self {
        Self {
            legacy_threading: true,
            message_id_max: DEFAULT_MESSAGE_ID_MAX,
            body_term_limit: DEFAULT_BODY_TERM_LIMIT,
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            legacy_threading: false,
            message_id_max: DEFAULT_MESSAGE_ID_MAX,
            body_term_limit: DEFAULT_BODY_TERM_LIMIT,
        }
    }
}

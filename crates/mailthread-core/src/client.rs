use std::path::{Path, PathBuf};

use crate::config::IndexConfig;
use crate::error::{MailIndexError, Result};
use crate::models::IndexFeatures;
use crate::store::{OpenMode, SqliteIndexStore};

mod add_message_service;
mod ghost_service;
mod query_service;
mod thread_service;

#[cfg(test)]
mod tests;

pub use ghost_service::{format_thread_id, parse_thread_id};

pub const INDEX_FILE_NAME: &str = "index.sqlite3";
pub(crate) const FEATURES_KEY: &str = "features";

/// A mail index rooted at one directory.
#[derive(Clone)]
pub struct MailIndex {
    root: PathBuf,
    store: SqliteIndexStore,
    config: IndexConfig,
    features: IndexFeatures,
}

impl std::fmt::Debug for MailIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailIndex")
            .field("root", &self.root)
            .field("features", &self.features)
            .finish_non_exhaustive()
    }
}

impl MailIndex {
    /// Opens (creating if needed) a writable index with configuration from the environment.
    pub fn new(root_dir: impl Into<PathBuf>) -> Result<Self> {
        Self::open(root_dir, OpenMode::ReadWrite, IndexConfig::from_env())
    }

    pub fn open(root_dir: impl Into<PathBuf>, mode: OpenMode, config: IndexConfig) -> Result<Self> {
        let root = root_dir.into();
        let store = SqliteIndexStore::open(root.join(INDEX_FILE_NAME), mode)?;
        let features = match (store.get_metadata(FEATURES_KEY)?, mode) {
            (Some(raw), _) => IndexFeatures::parse(&raw),
            (None, OpenMode::ReadWrite) => {
                let features = IndexFeatures {
                    ghosts: !config.legacy_threading,
                };
                store.set_metadata(FEATURES_KEY, &features.render())?;
                features
            }
            (None, OpenMode::ReadOnly) => {
                return Err(MailIndexError::Validation(format!(
                    "index at {} was never initialized",
                    root.display()
                )));
            }
        };

        Ok(Self {
            root,
            store,
            config,
            features,
        })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub const fn features(&self) -> IndexFeatures {
        self.features
    }

    #[must_use]
    pub const fn config(&self) -> IndexConfig {
        self.config
    }

    #[must_use]
    pub const fn store(&self) -> &SqliteIndexStore {
        &self.store
    }
}

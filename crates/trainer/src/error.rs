//! Training errors

use std::path::PathBuf;

use cognate_ldsl_ast::Name;
use thiserror::Error;

/// An error raised while training a learner
///
/// A training error marks the whole run as failed but does not interrupt
/// tasks that are already running.
#[derive(Debug, Error)]
pub enum TrainError {
    #[error("training of '{name}' failed: {message}")]
    Backend { name: Name, message: String },

    #[error("parameter search for '{name}' produced no candidates")]
    EmptySearch { name: Name },

    #[error("can't write '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl TrainError {
    pub fn backend(name: &Name, message: impl Into<String>) -> Self {
        Self::Backend {
            name: name.clone(),
            message: message.into(),
        }
    }
}

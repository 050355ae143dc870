//! Learner artifact layout
//!
//! Each learner exclusively owns its persisted file set; no two tasks ever
//! write the same artifact.

use std::path::PathBuf;

use cognate_ldsl_ast::{LearnerDecl, Name};
use cognate_revision::FingerprintStore;

/// Filesystem locations of one learner's persisted outputs
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    /// Generated source file carrying the fingerprint header
    pub source: PathBuf,
    /// Serialized model
    pub model: PathBuf,
    /// Feature/label lexicon
    pub lexicon: PathBuf,
    /// Pre-extracted training vectors
    pub examples: PathBuf,
    /// Pre-extracted test vectors
    pub test_examples: PathBuf,
    /// Best-found parameters from a search
    pub parameters: PathBuf,
    /// Whether example files are written compressed
    pub compressed: bool,
}

impl ArtifactPaths {
    pub fn new(store: &FingerprintStore, name: &Name, learner: &LearnerDecl) -> Self {
        Self {
            source: store.source_path(name),
            model: store.model_path(name),
            lexicon: store.lexicon_path(name),
            examples: store.examples_path(name),
            test_examples: store.test_examples_path(name),
            parameters: store.parameters_path(name),
            compressed: learner.pre_extract_compressed(),
        }
    }
}

//! Fingerprint store
//!
//! Locates the persisted outputs of previous runs: generated sources (and
//! the fingerprints embedded in their headers) under the generated-source
//! directory, and trained model files under the model directory.

use std::path::{Path, PathBuf};

use cognate_ldsl_ast::{LearnerDecl, Name};

use crate::fingerprint::{Fingerprint, FingerprintError};

/// Which of a learner's persisted artifact files exist on disk
#[derive(Debug, Clone, Copy, Default)]
pub struct ArtifactPresence {
    pub model: bool,
    pub lexicon: bool,
    pub examples: bool,
    pub test_examples: bool,
}

/// Read-side view of previously compiled artifacts
#[derive(Debug, Clone)]
pub struct FingerprintStore {
    generated_dir: PathBuf,
    model_dir: PathBuf,
}

impl FingerprintStore {
    pub fn new(generated_dir: impl Into<PathBuf>, model_dir: impl Into<PathBuf>) -> Self {
        Self {
            generated_dir: generated_dir.into(),
            model_dir: model_dir.into(),
        }
    }

    pub fn generated_dir(&self) -> &Path {
        &self.generated_dir
    }

    pub fn model_dir(&self) -> &Path {
        &self.model_dir
    }

    /// Path of the generated source file for a declaration
    pub fn source_path(&self, name: &Name) -> PathBuf {
        self.generated_dir.join(format!("{name}.rs"))
    }

    pub fn model_path(&self, name: &Name) -> PathBuf {
        self.model_dir.join(format!("{name}.lc"))
    }

    pub fn lexicon_path(&self, name: &Name) -> PathBuf {
        self.model_dir.join(format!("{name}.lex"))
    }

    pub fn examples_path(&self, name: &Name) -> PathBuf {
        self.generated_dir.join(format!("{name}.ex"))
    }

    pub fn test_examples_path(&self, name: &Name) -> PathBuf {
        self.generated_dir.join(format!("{name}.test.ex"))
    }

    pub fn parameters_path(&self, name: &Name) -> PathBuf {
        self.model_dir.join(format!("{name}.p"))
    }

    /// Fingerprint stored for a declaration, if its generated source
    /// exists
    pub fn read(&self, name: &Name) -> Result<Option<Fingerprint>, FingerprintError> {
        Fingerprint::read_from(&self.source_path(name))
    }

    /// Presence of a learner's trained artifact files
    pub fn artifacts(&self, name: &Name) -> ArtifactPresence {
        ArtifactPresence {
            model: self.model_path(name).exists(),
            lexicon: self.lexicon_path(name).exists(),
            examples: self.examples_path(name).exists(),
            test_examples: self.test_examples_path(name).exists(),
        }
    }

    /// Whether the artifact a learner trains from scratch into is missing.
    ///
    /// With disk pre-extraction the cached example file stands in for the
    /// model as the thing whose absence forces a full rebuild.
    pub fn training_artifact_missing(&self, name: &Name, learner: &LearnerDecl) -> bool {
        let arts = self.artifacts(name);
        let primary_missing = if learner.pre_extract_to_disk() {
            !arts.examples
        } else {
            !arts.model
        };
        primary_missing || !arts.lexicon
    }
}

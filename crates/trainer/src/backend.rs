//! Training backend interface
//!
//! The compiler does not implement learning algorithms, feature
//! extraction, or dataset I/O; it decides whether and in what order they
//! run. These traits are the seam to the numerical machinery supplied by
//! the surrounding project.

use cognate_ldsl_ast::{CountPolicy, LearnerDecl, Name, PruningPolicy};
use cognate_revision::LearnerRevision;

use crate::artifacts::ArtifactPaths;
use crate::error::TrainError;
use crate::params::ParameterAssignment;

/// How a learner's model is initialized before training
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelStart {
    /// Load the previous model and continue at `starting_round`
    Resume { starting_round: u32 },
    /// Fresh parameters over the existing lexicon; features on disk are
    /// still valid
    WarmStart,
    /// Start from nothing
    Fresh,
}

/// Which example set an extraction pass targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractTarget {
    Train,
    Test,
}

/// Everything a backend needs to open a session for one learner
#[derive(Debug)]
pub struct TaskSpec<'a> {
    pub name: &'a Name,
    pub learner: &'a LearnerDecl,
    pub revision: &'a LearnerRevision,
    pub artifacts: &'a ArtifactPaths,
    /// Progress output is printed every this many examples
    pub progress_every: usize,
}

/// Factory for per-learner training sessions
pub trait TrainingBackend: Send + Sync {
    fn open(&self, task: &TaskSpec<'_>) -> Result<Box<dyn LearnerSession>, TrainError>;
}

/// The training procedure of a single learner, step by step
///
/// The scheduler calls these in a fixed order driven by the learner's
/// facet statuses; each method owns its own I/O against the task's
/// artifact paths.
pub trait LearnerSession: Send {
    /// Initialize the model according to the revision verdict
    fn begin(&mut self, start: ModelStart) -> Result<(), TrainError>;

    /// Extract example vectors to disk, counting feature occurrences
    /// under `counts` if pruning needs them
    fn pre_extract(
        &mut self,
        target: ExtractTarget,
        counts: Option<CountPolicy>,
    ) -> Result<(), TrainError>;

    /// Convert existing feature counts between counting policies without
    /// re-extraction
    fn recount(&mut self, from: CountPolicy, to: CountPolicy) -> Result<(), TrainError>;

    /// Discard features per the pruning policy; `None` clears a previously
    /// applied policy
    fn prune(&mut self, policy: Option<&PruningPolicy>) -> Result<(), TrainError>;

    /// Score one parameter assignment, by cross-validation or held-out
    /// testing per the learner's configuration. Higher is better.
    fn evaluate(&mut self, candidate: &ParameterAssignment) -> Result<f64, TrainError>;

    /// Fix the parameters used by the final training pass
    fn apply(&mut self, candidate: &ParameterAssignment) -> Result<(), TrainError>;

    /// The core iterative training loop
    fn train(&mut self, starting_round: u32, rounds: u32) -> Result<(), TrainError>;

    /// Score the trained model on the test set, if one is configured
    fn test(&mut self) -> Result<Option<f64>, TrainError>;

    /// Persist model and lexicon
    fn save(&mut self) -> Result<(), TrainError>;
}

/// Produces the body of a learner's regenerated source file
///
/// Translation of declarations to target-language statements is outside
/// this compiler's scope; the trainer only prepends the disclaimer and
/// fingerprint header to whatever the emitter returns.
pub trait SourceEmitter: Send + Sync {
    fn learner_source(&self, name: &Name, learner: &LearnerDecl) -> String;
}

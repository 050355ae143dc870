//! Training tasks

use cognate_ldsl_ast::{LearnerDecl, Name};
use cognate_revision::LearnerRevision;

/// Lifecycle of a training task
///
/// `Pending → Ready → Running → Done`; a task becomes ready when its
/// unresolved-dependency count reaches zero, running when dispatched, and
/// done when its training procedure returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Pending,
    Ready,
    Running,
    Done,
}

/// One learner requiring work this run
#[derive(Debug, Clone)]
pub struct TrainingTask {
    pub name: Name,
    /// Source line of the learner declaration; the cycle tie-break prefers
    /// the earlier declaration
    pub line: u32,
    /// Canonical specification, as it will be fingerprinted after training
    pub spec: LearnerDecl,
    /// Facet statuses driving which training steps actually run
    pub revision: LearnerRevision,
}

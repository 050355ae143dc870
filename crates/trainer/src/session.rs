//! Per-task training procedure
//!
//! Runs one learner's work end to end: model acquisition, pre-extraction
//! and pruning, parameter search, the core training loop, testing, and
//! artifact persistence, each step gated by the learner's facet statuses
//! so that nothing provably unaffected is recomputed.

use cognate_ldsl_ast::{CanonicalSpec, CountPolicy, LearnerDecl, Name, Rounds};
use cognate_revision::{RevisionStatus, write_generated_source};
use tracing::{debug, info};

use crate::artifacts::ArtifactPaths;
use crate::backend::{ExtractTarget, LearnerSession, ModelStart, TaskSpec};
use crate::error::TrainError;
use crate::params::{ParameterAssignment, combinations, round_candidates};
use crate::scheduler::TrainContext;
use crate::task::TrainingTask;

/// Execute one training task and regenerate its source file
pub fn run(task: &TrainingTask, ctx: &TrainContext<'_>) -> Result<(), TrainError> {
    let name = &task.name;
    let learner = &task.spec;
    let revision = &task.revision;
    let artifacts = ArtifactPaths::new(ctx.store, name, learner);

    if revision.code_only {
        info!(learner = %name, "generating code");
    } else if learner.dataset.is_some() {
        info!(learner = %name, "training");
        let spec = TaskSpec {
            name,
            learner,
            revision,
            artifacts: &artifacts,
            progress_every: ctx.progress_every,
        };
        let mut session = ctx.backend.open(&spec)?;

        let start = if revision.starting_round > 1 {
            ModelStart::Resume {
                starting_round: revision.starting_round,
            }
        } else if revision.features == RevisionStatus::Unaffected {
            ModelStart::WarmStart
        } else {
            ModelStart::Fresh
        };
        session.begin(start)?;

        if learner.pre_extract != cognate_ldsl_ast::PreExtract::None {
            pre_extract_and_prune(session.as_mut(), learner, revision, &artifacts)?;
        }

        let mut rounds = learner.fixed_rounds().unwrap_or(1);

        let searching = !learner.parameter_sets.is_empty()
            || matches!(learner.rounds, Some(Rounds::Search(_)));
        if searching {
            let best = tune(session.as_mut(), name, learner)?;
            rounds = best.rounds;
            write_parameters(&artifacts, &best)?;
            session.apply(&best)?;
            info!(learner = %name, "training on entire training set");
        } else if learner.cross_validation.is_some() {
            // No search, but fold scores are still reported
            let score = session.evaluate(&ParameterAssignment {
                values: Vec::new(),
                rounds,
            })?;
            info!(learner = %name, score, "cross validation");
        }

        session.train(revision.starting_round, rounds)?;

        if learner.test_dataset.is_some()
            && let Some(score) = session.test()?
        {
            info!(learner = %name, score, "test");
        }

        info!(learner = %name, "writing");
        session.save()?;
    } else {
        // No dataset: nothing to train, but the lexicon and model files
        // must exist for dependors to load
        let spec = TaskSpec {
            name,
            learner,
            revision,
            artifacts: &artifacts,
            progress_every: ctx.progress_every,
        };
        let mut session = ctx.backend.open(&spec)?;
        session.begin(ModelStart::Fresh)?;
        session.save()?;
    }

    let body = ctx.emitter.learner_source(name, learner);
    write_generated_source(
        &artifacts.source,
        &CanonicalSpec::Learner(learner.clone()),
        &body,
    )
    .map_err(|e| TrainError::Io {
        path: artifacts.source.clone(),
        source: e,
    })?;

    Ok(())
}

/// Pre-extraction and pruning go hand in hand: feature counts are only
/// computed during extraction when a pruning policy needs them.
///
/// The decision table keys off the features and pruning facets plus the
/// previous run's count policy: a facet that is provably unaffected keeps
/// its cached artifacts, and a count-policy change recounts without
/// re-extraction when the old counts can be collapsed.
fn pre_extract_and_prune(
    session: &mut dyn LearnerSession,
    learner: &LearnerDecl,
    revision: &cognate_revision::LearnerRevision,
    artifacts: &ArtifactPaths,
) -> Result<(), TrainError> {
    let unaffected = RevisionStatus::Unaffected;

    match &learner.pruning {
        None => {
            if revision.features != unaffected {
                session.pre_extract(ExtractTarget::Train, None)?;
            }
        }
        Some(policy) => {
            if revision.features != unaffected
                || (revision.pruning != unaffected && revision.previous_counts.is_none())
            {
                session.pre_extract(ExtractTarget::Train, Some(policy.counts))?;
            } else if let Some(previous) = revision.previous_counts
                && previous != policy.counts
            {
                match previous {
                    // Global counts cannot be split back out per class
                    CountPolicy::Global => {
                        session.pre_extract(ExtractTarget::Train, Some(policy.counts))?;
                    }
                    CountPolicy::PerClass => {
                        session.recount(CountPolicy::PerClass, CountPolicy::Global)?;
                    }
                }
            }
            // Only the threshold changed: existing counts remain valid
        }
    }

    let should_prune = if revision.features == unaffected {
        revision.pruning != unaffected
    } else {
        learner.pruning.is_some()
    };
    if should_prune {
        session.prune(learner.pruning.as_ref())?;
    }

    // Pruning rearranges the lexicon, so the cached test vectors are only
    // reusable when the pruning facet is untouched
    if learner.test_dataset.is_some()
        && (revision.pruning != unaffected || !artifacts.test_examples.exists())
    {
        session.pre_extract(ExtractTarget::Test, None)?;
    }

    Ok(())
}

/// Evaluate the cross product of parameter sets and round candidates;
/// return the best-scoring assignment.
fn tune(
    session: &mut dyn LearnerSession,
    name: &Name,
    learner: &LearnerDecl,
) -> Result<ParameterAssignment, TrainError> {
    let combos = combinations(&learner.parameter_sets);
    let rounds = round_candidates(&learner.rounds);

    let mut best: Option<(f64, ParameterAssignment)> = None;
    for combo in &combos {
        for &r in &rounds {
            let candidate = ParameterAssignment {
                values: combo.clone(),
                rounds: r,
            };
            let score = session.evaluate(&candidate)?;
            debug!(learner = %name, ?candidate, score, "search candidate");
            if best.as_ref().is_none_or(|(s, _)| score > *s) {
                best = Some((score, candidate));
            }
        }
    }

    best.map(|(_, c)| c)
        .ok_or_else(|| TrainError::EmptySearch { name: name.clone() })
}

fn write_parameters(
    artifacts: &ArtifactPaths,
    best: &ParameterAssignment,
) -> Result<(), TrainError> {
    let encoded =
        serde_json::to_string_pretty(best).map_err(|e| TrainError::Io {
            path: artifacts.parameters.clone(),
            source: e.into(),
        })?;
    std::fs::write(&artifacts.parameters, encoded).map_err(|e| TrainError::Io {
        path: artifacts.parameters.clone(),
        source: e,
    })
}

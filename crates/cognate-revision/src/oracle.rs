//! Revision oracle
//!
//! Classifies every declaration as unaffected, affected, or revised:
//!
//! 1. **Local staleness**: each declaration's canonical specification is
//!    compared against the fingerprint stored in its generated source.
//!    Learners are refined facet by facet, since changing the number of
//!    training rounds must not force re-extraction of features.
//! 2. **Propagation**: every revision is pushed forward through the
//!    dependor graph; propagation is a monotonic join and is idempotent.
//! 3. **Fill**: anything unreached is unaffected. The report carries the
//!    "no changes since last run" fast-path signal.

use cognate_ldsl_ast::{CanonicalSpec, Declaration, DeclarationKind, Name, Program};
use cognate_ldsl_resolve::DependorGraph;
use indexmap::IndexSet;
use thiserror::Error;
use tracing::debug;

use crate::fingerprint::FingerprintError;
use crate::status::{RevisionReport, RevisionStatus};
use crate::store::FingerprintStore;

/// A fingerprint-integrity problem attributed to a declaration
///
/// Reported once per distinct message; fatal to the run before scheduling
/// begins.
#[derive(Debug, Clone, Error)]
#[error("line {line}: {message}")]
pub struct RevisionError {
    pub name: Name,
    pub line: u32,
    pub message: String,
}

/// Classify every declaration of the program.
///
/// The returned report has exactly one status entry per declaration.
/// Integrity errors do not stop classification; the caller treats any
/// collected error as fatal before scheduling.
pub fn classify(
    program: &Program,
    graph: &DependorGraph,
    store: &FingerprintStore,
) -> (RevisionReport, Vec<RevisionError>) {
    let mut report = RevisionReport::new();
    let mut errors = Vec::new();
    let mut seen_messages: IndexSet<String> = IndexSet::new();

    // Step 1: local staleness
    for decl in program.iter() {
        match &decl.kind {
            DeclarationKind::Learner(_) => {
                classify_learner(decl, store, &mut report, &mut errors, &mut seen_messages);
            }
            _ => {
                if code_revised(decl, store, &mut errors, &mut seen_messages) {
                    report.set_status(&decl.name, RevisionStatus::Revised);
                }
            }
        }
    }

    let no_changes = report.statuses().next().is_none();
    report.no_changes = no_changes;

    // Step 2: propagation
    let sources: Vec<Name> = report.statuses().map(|(n, _)| n.clone()).collect();
    for source in &sources {
        propagate(source, program, graph, &mut report);
    }

    // Step 3: fill
    for name in graph.names() {
        if !report.has_status(name) {
            report.set_status(name, RevisionStatus::Unaffected);
        }
        if program.get(name).is_some_and(Declaration::is_learner) {
            report.learner_mut(name);
        }
    }

    debug!(
        revised = report
            .statuses()
            .filter(|(_, s)| *s == RevisionStatus::Revised)
            .count(),
        affected = report
            .statuses()
            .filter(|(_, s)| *s == RevisionStatus::Affected)
            .count(),
        no_changes = report.no_changes,
        "revision analysis complete"
    );

    (report, errors)
}

/// Whether a non-learner declaration's generated code is out of date
fn code_revised(
    decl: &Declaration,
    store: &FingerprintStore,
    errors: &mut Vec<RevisionError>,
    seen: &mut IndexSet<String>,
) -> bool {
    match store.read(&decl.name) {
        Ok(Some(stored)) => stored.spec() != &decl.canonical(),
        Ok(None) => true,
        Err(e) => {
            record(errors, seen, decl, e);
            true
        }
    }
}

/// Facet-level staleness cascade for a learner.
///
/// The checks run most-invasive first; each branch fully determines the
/// facet statuses and returns, so later branches may assume everything the
/// earlier ones compared is equal.
fn classify_learner(
    decl: &Declaration,
    store: &FingerprintStore,
    report: &mut RevisionReport,
    errors: &mut Vec<RevisionError>,
    seen: &mut IndexSet<String>,
) {
    let name = &decl.name;
    let CanonicalSpec::Learner(new) = decl.canonical() else {
        return;
    };
    let new = &new;

    let stored = match store.read(name) {
        Ok(s) => s,
        Err(e) => {
            record(errors, seen, decl, e);
            None
        }
    };

    // First compilation, unreadable header, or the name previously
    // compiled as a different kind: rebuild everything.
    let Some(old) = stored
        .as_ref()
        .and_then(|fp| fp.spec().as_learner())
    else {
        report.set_status(name, RevisionStatus::Revised);
        report.learner_mut(name).force_affected();
        return;
    };

    let to_disk = new.pre_extract_to_disk();
    let was_to_disk = old.pre_extract_to_disk();
    // Feature re-extraction can be skipped only when vectors are cached on
    // disk from the previous run.
    let cached = if to_disk {
        RevisionStatus::Unaffected
    } else {
        RevisionStatus::Revised
    };

    // Identity facet: anything here invalidates the extracted features
    // themselves, so the learner is revised outright.
    if old.input != new.input
        || old.output != new.output
        || old.labeler != new.labeler
        || old.extractor != new.extractor
        || old.dataset != new.dataset
        || old.encoding != new.encoding
        || (to_disk && !was_to_disk)
        || store.training_artifact_missing(name, new)
    {
        report.set_status(name, RevisionStatus::Revised);
        report.learner_mut(name).force_affected();
        return;
    }

    // Pruning facet
    if old.pruning != new.pruning {
        let facets = report.learner_mut(name);
        facets.features = cached;
        facets.pruning = RevisionStatus::Revised;
        facets.learning = RevisionStatus::Affected;
        facets.previous_counts = old.pruning.as_ref().map(|p| p.counts);
        report.set_status(name, RevisionStatus::Affected);
        return;
    }

    // Learning facet
    if old.algorithm != new.algorithm
        || old.cross_validation != new.cross_validation
        || old.metric != new.metric
        || old.parameter_sets != new.parameter_sets
        || !store.artifacts(name).model
    {
        let facets = report.learner_mut(name);
        facets.features = cached;
        facets.pruning = cached;
        facets.learning = RevisionStatus::Revised;
        report.set_status(name, RevisionStatus::Affected);
        return;
    }

    // Round count alone: training can resume where the last run stopped,
    // provided no parameter search or cross-validation is in effect and
    // both counts are fixed constants.
    if old.rounds != new.rounds {
        let facets = report.learner_mut(name);
        facets.features = cached;
        facets.pruning = cached;
        facets.learning = RevisionStatus::Revised;

        if new.parameter_sets.is_empty()
            && new.cross_validation.is_none()
            && let (Some(old_rounds), Some(new_rounds)) = (old.fixed_rounds(), new.fixed_rounds())
            && new_rounds > old_rounds
        {
            facets.starting_round = old_rounds + 1;
        }

        report.set_status(name, RevisionStatus::Affected);
        return;
    }

    // Code-generation-only facets: the generated source changes but the
    // trained model remains valid.
    if old.comment != new.comment
        || old.evaluation != new.evaluation
        || old.test_dataset != new.test_dataset
    {
        report.learner_mut(name).code_only = true;
        report.set_status(name, RevisionStatus::Revised);
    }
}

/// Push a node's revision forward through the dependor graph.
///
/// Every learner reached through an edge has its facets forced to at
/// least affected and its resume round reset: an upstream change
/// invalidates incremental resumption. A learner that depends on a
/// revised composite generator is itself revised, since the generator's
/// feature layout feeds it directly.
fn propagate(
    source: &Name,
    program: &Program,
    graph: &DependorGraph,
    report: &mut RevisionReport,
) {
    let mut work = vec![source.clone()];

    while let Some(current) = work.pop() {
        let revised_generator = report.status(&current) == RevisionStatus::Revised
            && matches!(
                program.get(&current).map(|d| &d.kind),
                Some(DeclarationKind::Generator(_))
            );

        let dependors: Vec<Name> = graph.dependors_of(&current).cloned().collect();
        for dependor in dependors {
            let dependor_is_learner = program.get(&dependor).is_some_and(Declaration::is_learner);

            if dependor_is_learner {
                report.learner_mut(&dependor).force_affected();
            }

            if !report.has_status(&dependor) {
                let status = if revised_generator && dependor_is_learner {
                    RevisionStatus::Revised
                } else {
                    RevisionStatus::Affected
                };
                report.set_status(&dependor, status);
                work.push(dependor);
            }
        }
    }
}

fn record(
    errors: &mut Vec<RevisionError>,
    seen: &mut IndexSet<String>,
    decl: &Declaration,
    err: FingerprintError,
) {
    let message = err.to_string();
    if seen.insert(message.clone()) {
        errors.push(RevisionError {
            name: decl.name.clone(),
            line: decl.line,
            message,
        });
    }
}

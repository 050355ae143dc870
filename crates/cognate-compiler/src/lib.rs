//! Cognate compiler driver
//!
//! Unified entry point for the incremental compile-and-train pipeline:
//!
//! 1. **Resolve**: build the symbol table and dependor graph.
//! 2. **Classify**: compare fingerprints, propagate revisions.
//! 3. **Fail fast**: unresolved references and fingerprint-integrity
//!    problems are all reported together, sorted by source line, and stop
//!    the run before any artifact is touched.
//! 4. **Fast path**: when nothing changed, skip regeneration and training
//!    entirely.
//! 5. **Regenerate** revised sources and **train** the scheduled learners.
//!
//! Translation of declaration bodies and the learning algorithms live
//! behind the [`Translator`] and [`cognate_trainer::TrainingBackend`]
//! seams; this crate owns what runs and in what order.

use std::path::PathBuf;

use cognate_ldsl_ast::{Declaration, Name, Program};
use cognate_ldsl_resolve::DependorGraph;
use cognate_revision::{FingerprintStore, RevisionReport, RevisionStatus, write_generated_source};
use cognate_trainer::{ExecutionPolicy, SourceEmitter, TrainContext, TrainOutcome, TrainingBackend};
use tracing::{info, warn};

/// Driver configuration, owned by the caller; no ambient state
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Directory receiving generated sources and pre-extracted examples
    pub generated_dir: PathBuf,
    /// Directory receiving models, lexicons and search parameters
    pub model_dir: PathBuf,
    /// Train independent learners concurrently
    pub concurrent: bool,
    /// Stop after regeneration; do not train
    pub compile_only: bool,
    /// Progress output granularity, in examples
    pub progress_every: usize,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            generated_dir: PathBuf::from("generated"),
            model_dir: PathBuf::from("generated"),
            concurrent: false,
            compile_only: false,
            progress_every: 0,
        }
    }
}

/// Produces the body of a declaration's generated source file.
///
/// The mechanical translation of declaration bodies into target-language
/// statements is outside this compiler's scope; the driver writes the
/// disclaimer and fingerprint header and delegates the rest.
pub trait Translator: Send + Sync {
    fn declaration_source(&self, decl: &Declaration) -> String;
}

/// A user-facing problem found before scheduling
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub name: Name,
    pub line: u32,
    pub message: String,
}

/// Outcome of a full pipeline run
#[derive(Debug)]
pub struct CompileReport {
    pub graph: DependorGraph,
    pub revision: RevisionReport,
    /// Fatal diagnostics, sorted by source line; non-empty means nothing
    /// was regenerated or trained
    pub errors: Vec<Diagnostic>,
    /// Training results; `None` when training was skipped (fast path,
    /// compile-only, or errors)
    pub outcome: Option<TrainOutcome>,
}

impl CompileReport {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty() && self.outcome.as_ref().is_none_or(TrainOutcome::is_success)
    }

    pub fn no_changes(&self) -> bool {
        self.revision.no_changes
    }
}

/// Bridges the trainer's emitter seam onto the caller's translator
struct EmitterAdapter<'a> {
    program: &'a Program,
    translator: &'a dyn Translator,
}

impl SourceEmitter for EmitterAdapter<'_> {
    fn learner_source(&self, name: &Name, _learner: &cognate_ldsl_ast::LearnerDecl) -> String {
        self.program
            .get(name)
            .map(|decl| self.translator.declaration_source(decl))
            .unwrap_or_default()
    }
}

/// Run the full compile-and-train pipeline
pub fn compile(
    program: &Program,
    options: &CompileOptions,
    translator: &dyn Translator,
    backend: &dyn TrainingBackend,
) -> CompileReport {
    let resolved = cognate_ldsl_resolve::build(program);
    let store = FingerprintStore::new(&options.generated_dir, &options.model_dir);
    let (revision, revision_errors) = cognate_revision::classify(program, &resolved.graph, &store);

    let mut errors: Vec<Diagnostic> = Vec::new();
    for e in &resolved.errors {
        errors.push(Diagnostic {
            name: e.name.clone(),
            line: e.line,
            message: e.message.clone(),
        });
    }
    for e in &revision_errors {
        errors.push(Diagnostic {
            name: e.name.clone(),
            line: e.line,
            message: e.message.clone(),
        });
    }
    errors.sort_by_key(|d| d.line);

    if !errors.is_empty() {
        warn!(count = errors.len(), "compilation failed");
        return CompileReport {
            graph: resolved.graph,
            revision,
            errors,
            outcome: None,
        };
    }

    if revision.no_changes {
        info!("no changes since last run");
        return CompileReport {
            graph: resolved.graph,
            revision,
            errors,
            outcome: None,
        };
    }

    // Regenerate revised non-learner sources; learner sources are written
    // by their training tasks
    for decl in program.iter() {
        if decl.is_learner() || revision.status(&decl.name) != RevisionStatus::Revised {
            continue;
        }
        info!(declaration = %decl.name, "generating code");
        let body = translator.declaration_source(decl);
        if let Err(e) =
            write_generated_source(&store.source_path(&decl.name), &decl.canonical(), &body)
        {
            errors.push(Diagnostic {
                name: decl.name.clone(),
                line: decl.line,
                message: format!("can't write '{}': {e}", store.source_path(&decl.name).display()),
            });
        }
    }

    if !errors.is_empty() || options.compile_only {
        return CompileReport {
            graph: resolved.graph,
            revision,
            errors,
            outcome: None,
        };
    }

    let schedule = cognate_trainer::plan(program, &resolved.graph, &revision);
    let emitter = EmitterAdapter {
        program,
        translator,
    };
    let ctx = TrainContext {
        store: &store,
        backend,
        emitter: &emitter,
        progress_every: options.progress_every,
    };
    let policy = if options.concurrent {
        ExecutionPolicy::Concurrent
    } else {
        ExecutionPolicy::Sequential
    };
    let outcome = cognate_trainer::execute(schedule, policy, &ctx);

    CompileReport {
        graph: resolved.graph,
        revision,
        errors,
        outcome: Some(outcome),
    }
}

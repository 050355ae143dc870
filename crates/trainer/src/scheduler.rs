//! Dependency-ordered task dispatch
//!
//! Builds a precedence relation over the learners requiring work via
//! transitive reachability on the dependor graph, then executes each task
//! once its unresolved-dependency count reaches zero. Bookkeeping runs
//! under a mutual-exclusion lock since multiple finishing tasks can race
//! to update the shared maps; no lock is held during a training call.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;

use cognate_ldsl_ast::{CanonicalSpec, Name, Program};
use cognate_ldsl_resolve::DependorGraph;
use cognate_revision::{FingerprintStore, RevisionReport, RevisionStatus};
use indexmap::{IndexMap, IndexSet};
use tracing::{error, info};

use crate::backend::{SourceEmitter, TrainingBackend};
use crate::error::TrainError;
use crate::session;
use crate::task::{TaskState, TrainingTask};

/// Whether independent tasks run on their own threads or one at a time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionPolicy {
    Sequential,
    Concurrent,
}

/// Shared collaborators for a training run
pub struct TrainContext<'a> {
    pub store: &'a FingerprintStore,
    pub backend: &'a dyn TrainingBackend,
    pub emitter: &'a dyn SourceEmitter,
    /// Progress output is printed every this many examples
    pub progress_every: usize,
}

/// The tasks of one run and the precedence relation between them
#[derive(Debug)]
pub struct Schedule {
    tasks: Vec<TrainingTask>,
    /// task name → names of scheduled learners it must wait for
    dependencies: IndexMap<Name, IndexSet<Name>>,
}

impl Schedule {
    pub fn tasks(&self) -> &[TrainingTask] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Number of precedence edges into a task
    pub fn dependency_count(&self, name: &Name) -> usize {
        self.dependencies.get(name).map_or(0, IndexSet::len)
    }
}

/// Select the learners requiring work this run and compute precedence.
///
/// A learner with a dataset needs a task when its learning facet is not
/// unaffected or only its generated code changed; a learner without one
/// only when it is revised outright. When two scheduled learners are
/// mutually reachable through the reference graph (a cycle mediated by
/// non-learner declarations), the learner declared earlier in the source
/// trains first and the opposite edge is simply not recorded.
pub fn plan(program: &Program, graph: &DependorGraph, report: &RevisionReport) -> Schedule {
    let mut tasks = Vec::new();

    for (decl, learner) in program.learners() {
        let revision = report.learner(&decl.name).cloned().unwrap_or_default();
        let needed = if learner.dataset.is_none() {
            report.status(&decl.name) == RevisionStatus::Revised
        } else {
            revision.learning != RevisionStatus::Unaffected || revision.code_only
        };
        if !needed {
            continue;
        }
        let CanonicalSpec::Learner(spec) = decl.canonical() else {
            continue;
        };
        tasks.push(TrainingTask {
            name: decl.name.clone(),
            line: decl.line,
            spec,
            revision,
        });
    }

    // Later declarations first, so the pairwise walk checks the
    // later-depends-on-earlier direction before its reverse and the
    // earlier declaration wins when both directions are reachable.
    tasks.sort_by(|a, b| b.line.cmp(&a.line));

    let mut dependencies: IndexMap<Name, IndexSet<Name>> = tasks
        .iter()
        .map(|t| (t.name.clone(), IndexSet::new()))
        .collect();

    for i in 0..tasks.len() {
        for j in (i + 1)..tasks.len() {
            let later = &tasks[i].name;
            let earlier = &tasks[j].name;
            if graph.is_dependent_on(later, earlier) {
                if let Some(deps) = dependencies.get_mut(later) {
                    deps.insert(earlier.clone());
                }
            } else if graph.is_dependent_on(earlier, later) {
                if let Some(deps) = dependencies.get_mut(earlier) {
                    deps.insert(later.clone());
                }
            }
        }
    }

    Schedule {
        tasks,
        dependencies,
    }
}

/// Result of a training run
#[derive(Debug, Default)]
pub struct TrainOutcome {
    /// Successfully trained learners, in completion order
    pub trained: Vec<Name>,
    pub failed: Vec<(Name, TrainError)>,
    pub states: IndexMap<Name, TaskState>,
}

impl TrainOutcome {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

struct SchedulerState {
    dependencies: IndexMap<Name, IndexSet<Name>>,
    pending: IndexMap<Name, TrainingTask>,
    outcome: TrainOutcome,
    /// Set by a failing task; stops new dispatches without interrupting
    /// tasks already running
    abort: bool,
}

fn lock(state: &Mutex<SchedulerState>) -> MutexGuard<'_, SchedulerState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Run every task of the schedule to completion.
///
/// A learner never begins before every learner it depends on has
/// finished; among tasks with no mutual dependency no ordering is
/// guaranteed. The call returns once every dispatched task is done.
pub fn execute(
    schedule: Schedule,
    policy: ExecutionPolicy,
    ctx: &TrainContext<'_>,
) -> TrainOutcome {
    let Schedule {
        tasks,
        dependencies,
    } = schedule;

    if tasks.is_empty() {
        return TrainOutcome::default();
    }
    info!(tasks = tasks.len(), ?policy, "dispatching training tasks");

    let mut outcome = TrainOutcome::default();
    for task in &tasks {
        outcome.states.insert(task.name.clone(), TaskState::Pending);
    }
    let pending: IndexMap<Name, TrainingTask> =
        tasks.into_iter().map(|t| (t.name.clone(), t)).collect();

    let state = Mutex::new(SchedulerState {
        dependencies,
        pending,
        outcome,
        abort: false,
    });

    thread::scope(|scope| {
        dispatch_ready(None, &state, scope, policy, ctx);
        // Concurrent mode: the scope join waits for every spawned task.
    });

    state
        .into_inner()
        .unwrap_or_else(PoisonError::into_inner)
        .outcome
}

/// Remove a completed task from every dependency list, then dispatch
/// every pending task whose count reached zero.
fn dispatch_ready<'scope, 'env>(
    completed: Option<&Name>,
    state: &'scope Mutex<SchedulerState>,
    scope: &'scope thread::Scope<'scope, 'env>,
    policy: ExecutionPolicy,
    ctx: &'scope TrainContext<'scope>,
) {
    let ready: Vec<TrainingTask> = {
        let mut st = lock(state);

        if let Some(name) = completed {
            for deps in st.dependencies.values_mut() {
                deps.shift_remove(name);
            }
        }
        if st.abort {
            return;
        }

        let ready_names: Vec<Name> = st
            .dependencies
            .iter()
            .filter(|(name, deps)| deps.is_empty() && st.pending.contains_key(*name))
            .map(|(name, _)| name.clone())
            .collect();

        let mut ready = Vec::new();
        for name in ready_names {
            if let Some(task) = st.pending.shift_remove(&name) {
                st.outcome.states.insert(name, TaskState::Ready);
                ready.push(task);
            }
        }
        ready
    };

    for task in ready {
        match policy {
            ExecutionPolicy::Sequential => {
                let name = task.name.clone();
                run_task(task, state, ctx);
                dispatch_ready(Some(&name), state, scope, policy, ctx);
            }
            ExecutionPolicy::Concurrent => {
                scope.spawn(move || {
                    let name = task.name.clone();
                    run_task(task, state, ctx);
                    dispatch_ready(Some(&name), state, scope, policy, ctx);
                });
            }
        }
    }
}

fn run_task(task: TrainingTask, state: &Mutex<SchedulerState>, ctx: &TrainContext<'_>) {
    let name = task.name.clone();
    lock(state)
        .outcome
        .states
        .insert(name.clone(), TaskState::Running);

    let result = session::run(&task, ctx);

    let mut st = lock(state);
    st.outcome.states.insert(name.clone(), TaskState::Done);
    match result {
        Ok(()) => st.outcome.trained.push(name),
        Err(e) => {
            error!(learner = %name, error = %e, "training failed");
            st.outcome.failed.push((name, e));
            st.abort = true;
        }
    }
}

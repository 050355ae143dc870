//! Shared fixtures for scheduler and session tests

use std::sync::{Arc, Mutex};

use cognate_ldsl_ast::{
    Algorithm, ClassifierDecl, CodeBlock, CountPolicy, DatasetSource, Declaration,
    DeclarationKind, LearnerDecl, Name, PreExtract, Program, PruningPolicy,
};
use cognate_revision::{RevisionReport, RevisionStatus};

use crate::backend::{
    ExtractTarget, LearnerSession, ModelStart, SourceEmitter, TaskSpec, TrainingBackend,
};
use crate::error::TrainError;
use crate::params::ParameterAssignment;

pub fn classifier(name: &str, line: u32, refs: &[&str]) -> Declaration {
    Declaration {
        name: Name::from(name),
        line,
        kind: DeclarationKind::Classifier(ClassifierDecl {
            input: "Token".to_string(),
            output: "discrete".to_string(),
            body: CodeBlock {
                source: String::new(),
                references: refs.iter().map(|r| Name::from(*r)).collect(),
            },
        }),
    }
}

pub fn learner_decl(extractor: &str) -> LearnerDecl {
    LearnerDecl {
        input: "Token".to_string(),
        output: "discrete".to_string(),
        labeler: None,
        extractor: Name::from(extractor),
        dataset: Some(DatasetSource {
            parser: "ColumnParser".to_string(),
            arguments: "\"train.txt\"".to_string(),
        }),
        test_dataset: None,
        algorithm: Algorithm {
            name: "SparsePerceptron".to_string(),
            parameters: String::new(),
        },
        rounds: None,
        pruning: None,
        cross_validation: None,
        metric: None,
        parameter_sets: Vec::new(),
        pre_extract: PreExtract::None,
        encoding: None,
        evaluation: None,
        comment: None,
    }
}

pub fn learner(name: &str, line: u32, extractor: &str) -> Declaration {
    Declaration {
        name: Name::from(name),
        line,
        kind: DeclarationKind::Learner(learner_decl(extractor)),
    }
}

/// A program with one plain classifier "base" and the given learners,
/// each `(name, line, extractor)`
pub fn fixture_program(learners: &[(&str, u32, &str)]) -> Program {
    let mut declarations = vec![classifier("base", 0, &[])];
    for (name, line, extractor) in learners {
        declarations.push(learner(name, *line, extractor));
    }
    Program::new(declarations)
}

/// Two learners that reach each other through an intermediate classifier:
/// l1 uses mid, mid references l2, l2 uses l1
pub fn cyclic_program() -> Program {
    Program::new(vec![
        learner("l1", 1, "mid"),
        classifier("mid", 3, &["l2"]),
        learner("l2", 5, "l1"),
    ])
}

/// A report marking every declaration revised, with all learner facets
/// revised
pub fn revised_report(program: &Program) -> RevisionReport {
    let mut report = RevisionReport::new();
    for decl in program.iter() {
        report.set_status(&decl.name, RevisionStatus::Revised);
        if decl.is_learner() {
            let facets = report.learner_mut(&decl.name);
            facets.features = RevisionStatus::Revised;
            facets.pruning = RevisionStatus::Revised;
            facets.learning = RevisionStatus::Revised;
        }
    }
    report
}

/// Backend that records every session call in order
pub struct RecordingBackend {
    log: Arc<Mutex<Vec<String>>>,
    fail: Option<Name>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self {
            log: Arc::new(Mutex::new(Vec::new())),
            fail: None,
        }
    }

    /// A backend whose named learner fails during training
    pub fn failing(name: &str) -> Self {
        Self {
            log: Arc::new(Mutex::new(Vec::new())),
            fail: Some(Name::from(name)),
        }
    }

    pub fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }
}

impl TrainingBackend for RecordingBackend {
    fn open(&self, task: &TaskSpec<'_>) -> Result<Box<dyn LearnerSession>, TrainError> {
        Ok(Box::new(RecordingSession {
            name: task.name.clone(),
            log: self.log.clone(),
            fail: self.fail.as_ref() == Some(task.name),
        }))
    }
}

struct RecordingSession {
    name: Name,
    log: Arc<Mutex<Vec<String>>>,
    fail: bool,
}

impl RecordingSession {
    fn push(&self, event: impl AsRef<str>) {
        self.log
            .lock()
            .unwrap()
            .push(format!("{}:{}", self.name, event.as_ref()));
    }
}

impl LearnerSession for RecordingSession {
    fn begin(&mut self, start: ModelStart) -> Result<(), TrainError> {
        match start {
            ModelStart::Fresh => self.push("begin:fresh"),
            ModelStart::WarmStart => self.push("begin:warm"),
            ModelStart::Resume { starting_round } => {
                self.push(format!("begin:resume@{starting_round}"))
            }
        }
        Ok(())
    }

    fn pre_extract(
        &mut self,
        target: ExtractTarget,
        counts: Option<CountPolicy>,
    ) -> Result<(), TrainError> {
        self.push(format!("pre_extract:{target:?}:{counts:?}"));
        Ok(())
    }

    fn recount(&mut self, from: CountPolicy, to: CountPolicy) -> Result<(), TrainError> {
        self.push(format!("recount:{from:?}->{to:?}"));
        Ok(())
    }

    fn prune(&mut self, _policy: Option<&PruningPolicy>) -> Result<(), TrainError> {
        self.push("prune");
        Ok(())
    }

    fn evaluate(&mut self, candidate: &ParameterAssignment) -> Result<f64, TrainError> {
        self.push(format!("evaluate:{:?}", candidate.values));
        // Score a candidate by its first value so tests can steer the
        // search winner
        let score = candidate
            .values
            .first()
            .and_then(|(_, v)| v.parse().ok())
            .unwrap_or(candidate.rounds as f64);
        Ok(score)
    }

    fn apply(&mut self, _candidate: &ParameterAssignment) -> Result<(), TrainError> {
        self.push("apply");
        Ok(())
    }

    fn train(&mut self, starting_round: u32, rounds: u32) -> Result<(), TrainError> {
        if self.fail {
            return Err(TrainError::backend(&self.name, "synthetic failure"));
        }
        self.push(format!("train:{starting_round}..{rounds}"));
        Ok(())
    }

    fn test(&mut self) -> Result<Option<f64>, TrainError> {
        self.push("test");
        Ok(None)
    }

    fn save(&mut self) -> Result<(), TrainError> {
        self.push("save");
        Ok(())
    }
}

/// Emitter producing empty bodies
pub struct NullEmitter;

impl SourceEmitter for NullEmitter {
    fn learner_source(&self, _name: &Name, _learner: &LearnerDecl) -> String {
        String::new()
    }
}

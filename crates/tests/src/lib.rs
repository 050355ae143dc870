//! Integration test harness for Cognate.
//!
//! Drives the full pipeline (resolve, classify, regenerate, train)
//! against a temporary artifact directory, with a stub backend that
//! persists artifact files the way a real training backend would, so that
//! consecutive runs exercise the fingerprint store and the fast path.

use std::path::Path;
use std::sync::{Arc, Mutex};

use tempfile::TempDir;

use cognate_compiler::{CompileOptions, CompileReport, Translator, compile};
use cognate_ldsl_ast::{
    Algorithm, ClassifierDecl, CodeBlock, CountPolicy, DatasetSource, Declaration,
    DeclarationKind, LearnerDecl, Name, PreExtract, Program, PruningPolicy,
};
use cognate_revision::FingerprintStore;
use cognate_trainer::{
    ExtractTarget, LearnerSession, ModelStart, ParameterAssignment, TaskSpec, TrainError,
    TrainingBackend,
};

/// Build a primitive classifier declaration
pub fn classifier(name: &str, line: u32, body: &str, refs: &[&str]) -> Declaration {
    Declaration {
        name: Name::from(name),
        line,
        kind: DeclarationKind::Classifier(ClassifierDecl {
            input: "Token".to_string(),
            output: "discrete".to_string(),
            body: CodeBlock {
                source: body.to_string(),
                references: refs.iter().map(|r| Name::from(*r)).collect(),
            },
        }),
    }
}

/// Build a learner declaration with a training dataset
pub fn learner(name: &str, line: u32, extractor: &str) -> Declaration {
    Declaration {
        name: Name::from(name),
        line,
        kind: DeclarationKind::Learner(LearnerDecl {
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
        }),
    }
}

/// Mutate a program's learner declaration in place
pub fn with_learner(program: &mut Program, name: &str, mut edit: impl FnMut(&mut LearnerDecl)) {
    for decl in &mut program.declarations {
        if decl.name.as_str() == name
            && let DeclarationKind::Learner(l) = &mut decl.kind
        {
            edit(l);
        }
    }
}

/// End-to-end pipeline driver over a temporary artifact directory
pub struct TestHarness {
    dir: TempDir,
    backend: StubBackend,
    options: CompileOptions,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_concurrency(false)
    }

    pub fn concurrent() -> Self {
        Self::with_concurrency(true)
    }

    fn with_concurrency(concurrent: bool) -> Self {
        let dir = tempfile::tempdir().expect("temp dir");
        let options = CompileOptions {
            generated_dir: dir.path().to_path_buf(),
            model_dir: dir.path().to_path_buf(),
            concurrent,
            ..Default::default()
        };
        Self {
            dir,
            backend: StubBackend::new(),
            options,
        }
    }

    /// Run the full pipeline on a program
    pub fn compile(&self, program: &Program) -> CompileReport {
        compile(program, &self.options, &StubTranslator, &self.backend)
    }

    pub fn store(&self) -> FingerprintStore {
        FingerprintStore::new(self.dir.path(), self.dir.path())
    }

    pub fn artifact_dir(&self) -> &Path {
        self.dir.path()
    }

    /// Backend events recorded since the last clear, in order
    pub fn events(&self) -> Vec<String> {
        self.backend.log.lock().unwrap().clone()
    }

    pub fn clear_events(&self) {
        self.backend.log.lock().unwrap().clear();
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

struct StubTranslator;

impl Translator for StubTranslator {
    fn declaration_source(&self, decl: &Declaration) -> String {
        format!("// generated implementation of {}\n", decl.name)
    }
}

/// Backend that records calls and persists artifact files like a real
/// training run would
struct StubBackend {
    log: Arc<Mutex<Vec<String>>>,
}

impl StubBackend {
    fn new() -> Self {
        Self {
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl TrainingBackend for StubBackend {
    fn open(&self, task: &TaskSpec<'_>) -> Result<Box<dyn LearnerSession>, TrainError> {
        Ok(Box::new(StubSession {
            name: task.name.clone(),
            artifacts: task.artifacts.clone(),
            log: self.log.clone(),
        }))
    }
}

struct StubSession {
    name: Name,
    artifacts: cognate_trainer::ArtifactPaths,
    log: Arc<Mutex<Vec<String>>>,
}

impl StubSession {
    fn push(&self, event: impl AsRef<str>) {
        self.log
            .lock()
            .unwrap()
            .push(format!("{}:{}", self.name, event.as_ref()));
    }

    fn write(&self, path: &Path, contents: &str) -> Result<(), TrainError> {
        std::fs::write(path, contents).map_err(|e| TrainError::Io {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

impl LearnerSession for StubSession {
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
        _counts: Option<CountPolicy>,
    ) -> Result<(), TrainError> {
        match target {
            ExtractTarget::Train => {
                self.push("pre_extract:train");
                self.write(&self.artifacts.examples, "examples")?;
            }
            ExtractTarget::Test => {
                self.push("pre_extract:test");
                self.write(&self.artifacts.test_examples, "test examples")?;
            }
        }
        Ok(())
    }

    fn recount(&mut self, _from: CountPolicy, _to: CountPolicy) -> Result<(), TrainError> {
        self.push("recount");
        Ok(())
    }

    fn prune(&mut self, _policy: Option<&PruningPolicy>) -> Result<(), TrainError> {
        self.push("prune");
        Ok(())
    }

    fn evaluate(&mut self, candidate: &ParameterAssignment) -> Result<f64, TrainError> {
        self.push(format!("evaluate:{:?}", candidate.values));
        Ok(candidate.rounds as f64)
    }

    fn apply(&mut self, _candidate: &ParameterAssignment) -> Result<(), TrainError> {
        self.push("apply");
        Ok(())
    }

    fn train(&mut self, starting_round: u32, rounds: u32) -> Result<(), TrainError> {
        self.push(format!("train:{starting_round}..{rounds}"));
        Ok(())
    }

    fn test(&mut self) -> Result<Option<f64>, TrainError> {
        self.push("test");
        Ok(Some(1.0))
    }

    fn save(&mut self) -> Result<(), TrainError> {
        self.push("save");
        self.write(&self.artifacts.model, "model")?;
        self.write(&self.artifacts.lexicon, "lexicon")
    }
}

//! Declarations
//!
//! A program is an ordered list of named, typed declarations. The frontend
//! produces this tree fully type-checked; the fields here carry the semantic
//! content that determines compiled behavior, independent of surface
//! formatting in the original source.

use serde::{Deserialize, Serialize};

use crate::name::Name;

/// A named top-level unit of an LDSL program
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Declaration {
    /// Unique name; the declaration's only cross-run identity
    pub name: Name,
    /// Line at which the declaration appears in the source file
    pub line: u32,
    /// Kind-specific specification
    pub kind: DeclarationKind,
}

impl Declaration {
    /// Names of other declarations referenced by this declaration's
    /// specification, in source order. May contain names that do not
    /// resolve; resolution is the graph builder's concern.
    pub fn references(&self) -> Vec<&Name> {
        match &self.kind {
            DeclarationKind::Classifier(c) => c.body.references.iter().collect(),
            DeclarationKind::Generator(g) => g.components.iter().collect(),
            DeclarationKind::Conjunction(c) => vec![&c.left, &c.right],
            DeclarationKind::Constraint(c) => c.body.references.iter().collect(),
            DeclarationKind::Inference(i) => {
                let mut refs: Vec<&Name> = i.heads.iter().collect();
                refs.push(&i.constraint);
                refs
            }
            DeclarationKind::Learner(l) => {
                let mut refs = Vec::new();
                if let Some(labeler) = &l.labeler {
                    refs.push(labeler);
                }
                refs.push(&l.extractor);
                refs
            }
        }
    }

    /// Whether this declaration specifies a trainable model
    pub fn is_learner(&self) -> bool {
        matches!(self.kind, DeclarationKind::Learner(_))
    }

    pub fn as_learner(&self) -> Option<&LearnerDecl> {
        match &self.kind {
            DeclarationKind::Learner(l) => Some(l),
            _ => None,
        }
    }
}

/// The specification payload of a declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DeclarationKind {
    /// Primitive hand-coded classifier
    Classifier(ClassifierDecl),
    /// Composite generator producing features from an ordered component list
    Generator(GeneratorDecl),
    /// Conjunction of two classifiers
    Conjunction(ConjunctionDecl),
    /// First-order constraint over classifier outputs
    Constraint(ConstraintDecl),
    /// Inference procedure tying constraints to classifiers
    Inference(InferenceDecl),
    /// Trainable classifier
    Learner(LearnerDecl),
}

impl DeclarationKind {
    /// Short kind label used in diagnostics
    pub fn label(&self) -> &'static str {
        match self {
            DeclarationKind::Classifier(_) => "classifier",
            DeclarationKind::Generator(_) => "generator",
            DeclarationKind::Conjunction(_) => "conjunction",
            DeclarationKind::Constraint(_) => "constraint",
            DeclarationKind::Inference(_) => "inference",
            DeclarationKind::Learner(_) => "learner",
        }
    }
}

/// A block of target-language code carried by a declaration body
///
/// The frontend records, alongside the raw text, which names inside the
/// block resolve to other declarations in the same program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeBlock {
    /// Raw body text as written in the source
    pub source: String,
    /// Declaration names referenced inside the body, in occurrence order
    pub references: Vec<Name>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierDecl {
    /// Input type of the classifier
    pub input: String,
    /// Feature return type
    pub output: String,
    pub body: CodeBlock,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorDecl {
    pub input: String,
    pub output: String,
    /// Component classifiers in declaration order
    pub components: Vec<Name>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConjunctionDecl {
    pub input: String,
    pub output: String,
    pub left: Name,
    pub right: Name,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintDecl {
    pub input: String,
    pub body: CodeBlock,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceDecl {
    /// Type over which inference is performed
    pub input: String,
    /// Constraint declaration governing this inference
    pub constraint: Name,
    /// Classifiers whose outputs the inference arbitrates
    pub heads: Vec<Name>,
    /// Optional normalizer expression, canonical text
    pub normalizer: Option<String>,
}

/// A trainable classifier declaration
///
/// The expensive steps of a learner's build are separable: feature
/// extraction, dataset pruning, and the learning algorithm itself are
/// independently revisable facets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnerDecl {
    pub input: String,
    pub output: String,
    /// Classifier providing training labels, if training is supervised
    pub labeler: Option<Name>,
    /// Classifier providing features
    pub extractor: Name,
    /// Training dataset; absent for learners that are only loaded, not
    /// trained, by this compilation
    pub dataset: Option<DatasetSource>,
    /// Held-out test dataset
    pub test_dataset: Option<DatasetSource>,
    pub algorithm: Algorithm,
    pub rounds: Option<Rounds>,
    pub pruning: Option<PruningPolicy>,
    pub cross_validation: Option<CrossValidation>,
    /// Testing metric used to score tuning candidates
    pub metric: Option<String>,
    /// Parameter value sets searched over during tuning
    pub parameter_sets: Vec<ParameterSet>,
    pub pre_extract: PreExtract,
    /// Feature encoding override
    pub encoding: Option<String>,
    /// Testing metric override; affects generated code only
    pub evaluation: Option<String>,
    /// Documentation comment carried into generated code only
    pub comment: Option<String>,
}

impl LearnerDecl {
    /// Whether example vectors are pre-extracted to disk (as opposed to
    /// held in memory or not pre-extracted at all)
    pub fn pre_extract_to_disk(&self) -> bool {
        matches!(self.pre_extract, PreExtract::Disk { .. })
    }

    pub fn pre_extract_compressed(&self) -> bool {
        matches!(self.pre_extract, PreExtract::Disk { compressed: true })
    }

    /// Whether a parameter search is in effect. A search invalidates
    /// incremental round resumption.
    pub fn has_search(&self) -> bool {
        !self.parameter_sets.is_empty()
            || matches!(self.rounds, Some(Rounds::Search(_)))
            || self.cross_validation.is_some()
    }

    /// Round count when it is a fixed constant
    pub fn fixed_rounds(&self) -> Option<u32> {
        match self.rounds {
            Some(Rounds::Fixed(n)) => Some(n),
            _ => None,
        }
    }
}

/// Where a learner's training examples come from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSource {
    /// Parser type name supplied by the surrounding project
    pub parser: String,
    /// Canonical constructor argument text
    pub arguments: String,
}

/// Learning algorithm choice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Algorithm {
    /// Algorithm type name
    pub name: String,
    /// Canonical text of the parameter block
    pub parameters: String,
}

/// Training round specification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Rounds {
    Fixed(u32),
    /// Candidate round counts searched over during tuning
    Search(Vec<u32>),
}

/// Feature pruning configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PruningPolicy {
    pub counts: CountPolicy,
    pub threshold: PruneThreshold,
}

/// How feature occurrences are counted for pruning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CountPolicy {
    Global,
    PerClass,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PruneThreshold {
    /// Features seen fewer than this many times are discarded
    Count(u64),
    /// Features in the bottom fraction of the count distribution are
    /// discarded
    Percent(f64),
}

/// Cross-validation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossValidation {
    pub folds: u32,
    pub split: SplitPolicy,
    /// Confidence interval parameter
    pub alpha: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SplitPolicy {
    Sequential,
    Random,
    KthExample,
}

/// One tunable parameter and its candidate values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSet {
    pub parameter: String,
    pub values: Vec<String>,
}

/// Example vector pre-extraction policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PreExtract {
    None,
    Memory,
    Disk { compressed: bool },
}

/// A fully type-checked LDSL program
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub declarations: Vec<Declaration>,
}

impl Program {
    pub fn new(declarations: Vec<Declaration>) -> Self {
        Self { declarations }
    }

    pub fn get(&self, name: &Name) -> Option<&Declaration> {
        self.declarations.iter().find(|d| &d.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Declaration> {
        self.declarations.iter()
    }

    /// Learner declarations in source order
    pub fn learners(&self) -> impl Iterator<Item = (&Declaration, &LearnerDecl)> {
        self.declarations.iter().filter_map(|d| match &d.kind {
            DeclarationKind::Learner(l) => Some((d, l)),
            _ => None,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }
}

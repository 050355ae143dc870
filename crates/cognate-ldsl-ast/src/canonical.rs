//! Canonical specification forms
//!
//! A declaration's canonical specification is the whitespace- and
//! comment-independent encoding of its semantic content. Equality of
//! canonical forms is the sole staleness test: reformatting or
//! re-commenting a declaration's source must not change its canonical
//! form.

use serde::{Deserialize, Serialize};

use crate::decl::{Declaration, DeclarationKind, LearnerDecl};
use crate::name::Name;

/// Canonical encoding of a declaration's specification
///
/// This is the value embedded (hex-encoded) in the header of every
/// generated artifact and compared against on the next run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CanonicalSpec {
    Classifier {
        input: String,
        output: String,
        body: String,
    },
    Generator {
        input: String,
        output: String,
        components: Vec<Name>,
    },
    Conjunction {
        input: String,
        output: String,
        left: Name,
        right: Name,
    },
    Constraint {
        input: String,
        body: String,
    },
    Inference {
        input: String,
        constraint: Name,
        heads: Vec<Name>,
        normalizer: Option<String>,
    },
    Learner(LearnerDecl),
}

impl Declaration {
    /// Canonical form of this declaration's specification
    pub fn canonical(&self) -> CanonicalSpec {
        match &self.kind {
            DeclarationKind::Classifier(c) => CanonicalSpec::Classifier {
                input: c.input.clone(),
                output: c.output.clone(),
                body: normalize_source(&c.body.source),
            },
            DeclarationKind::Generator(g) => CanonicalSpec::Generator {
                input: g.input.clone(),
                output: g.output.clone(),
                components: g.components.clone(),
            },
            DeclarationKind::Conjunction(c) => CanonicalSpec::Conjunction {
                input: c.input.clone(),
                output: c.output.clone(),
                left: c.left.clone(),
                right: c.right.clone(),
            },
            DeclarationKind::Constraint(c) => CanonicalSpec::Constraint {
                input: c.input.clone(),
                body: normalize_source(&c.body.source),
            },
            DeclarationKind::Inference(i) => CanonicalSpec::Inference {
                input: i.input.clone(),
                constraint: i.constraint.clone(),
                heads: i.heads.clone(),
                normalizer: i.normalizer.as_deref().map(normalize_source),
            },
            DeclarationKind::Learner(l) => {
                let mut canon = l.clone();
                canon.algorithm.parameters = normalize_source(&l.algorithm.parameters);
                if let Some(ds) = &mut canon.dataset {
                    ds.arguments = normalize_source(&ds.arguments);
                }
                if let Some(ds) = &mut canon.test_dataset {
                    ds.arguments = normalize_source(&ds.arguments);
                }
                CanonicalSpec::Learner(canon)
            }
        }
    }
}

impl CanonicalSpec {
    pub fn as_learner(&self) -> Option<&LearnerDecl> {
        match self {
            CanonicalSpec::Learner(l) => Some(l),
            _ => None,
        }
    }
}

/// Normalize a code fragment: strip comments, collapse whitespace.
///
/// Comments (`//` to end of line, `/* */` blocks) are removed except
/// inside string or character literals. All remaining whitespace runs
/// collapse to a single space.
pub fn normalize_source(source: &str) -> String {
    let stripped = strip_comments(source);
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn strip_comments(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();
    let mut in_string = false;
    let mut in_char = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            if c == '\\' {
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        if in_char {
            out.push(c);
            if c == '\\' {
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            } else if c == '\'' {
                in_char = false;
            }
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            '\'' => {
                in_char = true;
                out.push(c);
            }
            '/' if chars.peek() == Some(&'/') => {
                for next in chars.by_ref() {
                    if next == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for next in chars.by_ref() {
                    if prev == '*' && next == '/' {
                        break;
                    }
                    prev = next;
                }
                // Block comments separate tokens
                out.push(' ');
            }
            _ => out.push(c),
        }
    }

    out
}

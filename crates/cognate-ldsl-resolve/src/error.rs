//! Semantic errors

use cognate_ldsl_ast::Name;
use thiserror::Error;

/// What went wrong, independent of location
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    UnresolvedReference,
    DuplicateName,
}

/// An error found during semantic analysis
///
/// Errors are collected, not raised: a single run reports as many
/// independent problems as possible, sorted by source line.
#[derive(Debug, Clone, Error)]
#[error("line {line}: {message}")]
pub struct SemanticError {
    pub kind: ErrorKind,
    /// Declaration in which the error occurred
    pub name: Name,
    pub line: u32,
    pub message: String,
}

impl SemanticError {
    pub fn unresolved(name: &Name, line: u32, referenced: &Name) -> Self {
        Self {
            kind: ErrorKind::UnresolvedReference,
            name: name.clone(),
            line,
            message: format!("'{name}' references undefined name '{referenced}'"),
        }
    }

    pub fn duplicate(name: &Name, line: u32) -> Self {
        Self {
            kind: ErrorKind::DuplicateName,
            name: name.clone(),
            line,
            message: format!("duplicate declaration of '{name}'"),
        }
    }
}

//! Cognate LDSL semantic analysis
//!
//! Builds the global symbol table and the dependor graph from a
//! type-checked program. The dependor graph maps every declaration name to
//! the set of names that reference it; it is built once here and consumed
//! read-only by the revision oracle and the training scheduler.

pub mod build;
pub mod error;
pub mod graph;
pub mod symbols;

pub use build::{Resolved, build};
pub use error::{ErrorKind, SemanticError};
pub use graph::DependorGraph;
pub use symbols::SymbolTable;

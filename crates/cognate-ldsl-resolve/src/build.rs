//! Graph construction pass
//!
//! Walks the declaration tree exactly once. Phase one registers every name
//! in the symbol table (forward references are legal); phase two records,
//! for every resolvable reference R inside declaration D, the edge R → D.
//! Unresolved references are collected as semantic errors without stopping
//! the build, so independent errors are all reported in one run.

use cognate_ldsl_ast::Program;
use tracing::debug;

use crate::error::SemanticError;
use crate::graph::DependorGraph;
use crate::symbols::SymbolTable;

/// Output of semantic analysis
#[derive(Debug)]
pub struct Resolved {
    pub graph: DependorGraph,
    pub symbols: SymbolTable,
    pub errors: Vec<SemanticError>,
}

impl Resolved {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Build the dependor graph and symbol table for a program
pub fn build(program: &Program) -> Resolved {
    let mut symbols = SymbolTable::new();
    let mut graph = DependorGraph::new();
    let mut errors = Vec::new();

    for duplicate in symbols.register_program(program) {
        let line = program.get(&duplicate).map(|d| d.line).unwrap_or(0);
        errors.push(SemanticError::duplicate(&duplicate, line));
    }

    for decl in program.iter() {
        graph.add_entry(&decl.name);
    }

    for decl in program.iter() {
        for referenced in decl.references() {
            if symbols.contains(referenced) {
                graph.add_dependor(referenced, &decl.name);
            } else {
                errors.push(SemanticError::unresolved(&decl.name, decl.line, referenced));
            }
        }
    }

    debug!(
        declarations = symbols.len(),
        errors = errors.len(),
        "dependor graph built"
    );

    Resolved {
        graph,
        symbols,
        errors,
    }
}

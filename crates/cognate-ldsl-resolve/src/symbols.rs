//! Global symbol table
//!
//! Maps every declared name to its kind. Populated in the same pass that
//! builds the dependor graph, before any references are checked, so
//! forward references are legal.

use cognate_ldsl_ast::{DeclarationKind, Name, Program};
use indexmap::IndexMap;

/// Kind of a declared symbol, without its specification payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Classifier,
    Generator,
    Conjunction,
    Constraint,
    Inference,
    Learner,
}

impl From<&DeclarationKind> for SymbolKind {
    fn from(kind: &DeclarationKind) -> Self {
        match kind {
            DeclarationKind::Classifier(_) => SymbolKind::Classifier,
            DeclarationKind::Generator(_) => SymbolKind::Generator,
            DeclarationKind::Conjunction(_) => SymbolKind::Conjunction,
            DeclarationKind::Constraint(_) => SymbolKind::Constraint,
            DeclarationKind::Inference(_) => SymbolKind::Inference,
            DeclarationKind::Learner(_) => SymbolKind::Learner,
        }
    }
}

/// Symbol table over all declarations of a program
#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: IndexMap<Name, SymbolKind>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every declaration of the program. Returns the names that
    /// were already present (duplicates).
    pub fn register_program(&mut self, program: &Program) -> Vec<Name> {
        let mut duplicates = Vec::new();
        for decl in program.iter() {
            if self
                .symbols
                .insert(decl.name.clone(), SymbolKind::from(&decl.kind))
                .is_some()
            {
                duplicates.push(decl.name.clone());
            }
        }
        duplicates
    }

    pub fn contains(&self, name: &Name) -> bool {
        self.symbols.contains_key(name)
    }

    pub fn kind(&self, name: &Name) -> Option<SymbolKind> {
        self.symbols.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cognate_ldsl_ast::{ClassifierDecl, CodeBlock, Declaration};

    fn classifier(name: &str, line: u32) -> Declaration {
        Declaration {
            name: Name::from(name),
            line,
            kind: DeclarationKind::Classifier(ClassifierDecl {
                input: "Token".to_string(),
                output: "discrete".to_string(),
                body: CodeBlock {
                    source: String::new(),
                    references: Vec::new(),
                },
            }),
        }
    }

    #[test]
    fn test_register_program() {
        let program = Program::new(vec![classifier("word", 1), classifier("shape", 2)]);
        let mut table = SymbolTable::new();
        let duplicates = table.register_program(&program);

        assert!(duplicates.is_empty());
        assert!(table.contains(&Name::from("word")));
        assert_eq!(table.kind(&Name::from("shape")), Some(SymbolKind::Classifier));
        assert!(!table.contains(&Name::from("missing")));
    }

    #[test]
    fn test_duplicate_names_reported() {
        let program = Program::new(vec![classifier("word", 1), classifier("word", 5)]);
        let mut table = SymbolTable::new();
        let duplicates = table.register_program(&program);
        assert_eq!(duplicates, vec![Name::from("word")]);
    }
}

//! Node classifier: maps raw grammar kind tags to construct kinds.
//!
//! The vocabulary follows tree-sitter-style Python grammars, which is what
//! the parser collaborator produces for the fixture languages. Kinds the
//! classifier does not recognize are counted and skipped, never fatal: a
//! grammar evolving ahead of the indexer degrades to skipped nodes while
//! the walk keeps making forward progress.

use symdex_core::tree::SyntaxNode;
use tracing::debug;

/// What a parse-tree node means to the indexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Construct {
    /// File root.
    Module,
    /// Class-like definition (classes, protocols, enums before analysis).
    ClassDef,
    /// Function or method definition.
    FunctionDef,
    /// A definition wrapped with one or more decorators.
    DecoratedDef,
    /// A single decorator line.
    Decorator,
    /// A bare string expression statement (docstring position).
    DocString,
    /// An assignment statement (fields, enum members, module variables).
    Assignment,
    /// `import module`-shaped statement.
    Import,
    /// `from module import name`-shaped statement.
    ImportFrom,
    /// A comment line.
    Comment,
    /// Known compound statement whose children may contain declarations.
    Compound,
    /// Known simple statement with nothing to index.
    Statement,
    /// Unrecognized kind: counted, then skipped.
    Unknown,
}

/// Classifies nodes and tracks the unclassified count for the manifest.
#[derive(Debug, Default)]
pub struct Classifier {
    unclassified: u32,
}

impl Classifier {
    /// Create a classifier with a zeroed counter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify one node.
    pub fn classify(&mut self, node: &SyntaxNode) -> Construct {
        match node.kind.as_str() {
            "module" => Construct::Module,
            "class_definition" => Construct::ClassDef,
            "function_definition" | "async_function_definition" => Construct::FunctionDef,
            "decorated_definition" => Construct::DecoratedDef,
            "decorator" => Construct::Decorator,
            "comment" => Construct::Comment,
            "import_statement" => Construct::Import,
            "import_from_statement" => Construct::ImportFrom,
            "assignment" => Construct::Assignment,
            "expression_statement" => match node.children.first() {
                Some(first) if first.kind == "string" => Construct::DocString,
                _ if node.has_child_kind("assignment") => Construct::Assignment,
                _ => Construct::Statement,
            },
            "if_statement" | "for_statement" | "while_statement" | "try_statement"
            | "with_statement" | "match_statement" | "block" | "else_clause" | "elif_clause"
            | "except_clause" | "finally_clause" | "case_clause" => Construct::Compound,
            "return_statement" | "pass_statement" | "raise_statement" | "break_statement"
            | "continue_statement" | "global_statement" | "nonlocal_statement"
            | "delete_statement" | "assert_statement" | "print_statement" => Construct::Statement,
            other => {
                self.unclassified += 1;
                debug!("unclassified node kind '{}', skipping", other);
                Construct::Unknown
            }
        }
    }

    /// Record a node whose shape violated expected invariants (e.g. a class
    /// definition with no name child). Counted with the unclassified nodes.
    pub fn note_malformed(&mut self, node: &SyntaxNode) {
        self.unclassified += 1;
        debug!("malformed '{}' node, skipping", node.kind);
    }

    /// Number of nodes skipped so far.
    pub fn unclassified(&self) -> u32 {
        self.unclassified
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use symdex_core::span::{Point, Span};

    fn node(kind: &str) -> SyntaxNode {
        SyntaxNode::new(kind, "", Span::new(0, 0), Point::new(1, 1), Point::new(1, 1))
    }

    #[test]
    fn declaration_kinds_classify() {
        let mut c = Classifier::new();
        assert_eq!(c.classify(&node("class_definition")), Construct::ClassDef);
        assert_eq!(c.classify(&node("function_definition")), Construct::FunctionDef);
        assert_eq!(c.classify(&node("decorated_definition")), Construct::DecoratedDef);
        assert_eq!(c.unclassified(), 0);
    }

    #[test]
    fn expression_statement_splits_on_first_child() {
        let mut c = Classifier::new();
        let doc = node("expression_statement").with_children(vec![node("string")]);
        assert_eq!(c.classify(&doc), Construct::DocString);

        let assign = node("expression_statement").with_children(vec![node("assignment")]);
        assert_eq!(c.classify(&assign), Construct::Assignment);

        let call = node("expression_statement").with_children(vec![node("call")]);
        assert_eq!(c.classify(&call), Construct::Statement);
    }

    #[test]
    fn unknown_kinds_are_counted_not_fatal() {
        let mut c = Classifier::new();
        assert_eq!(c.classify(&node("future_syntax")), Construct::Unknown);
        assert_eq!(c.classify(&node("other_future_syntax")), Construct::Unknown);
        assert_eq!(c.unclassified(), 2);
    }

    #[test]
    fn malformed_nodes_count_with_unclassified() {
        let mut c = Classifier::new();
        c.note_malformed(&node("class_definition"));
        assert_eq!(c.unclassified(), 1);
    }
}

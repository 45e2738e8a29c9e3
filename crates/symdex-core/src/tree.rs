//! Parse-tree input interface.
//!
//! The indexer never tokenizes or parses text itself. A per-language parser
//! collaborator hands over one [`ParseTree`] per source file, exposing the
//! node-visitation capability the engine needs: a kind tag, child nodes, a
//! source span, and raw text.
//!
//! Kind tags are raw grammar strings owned by the parser's grammar (e.g.
//! `"class_definition"`, `"function_definition"` for a Python-style
//! grammar). The engine's node classifier maps them to construct kinds and
//! counts everything it does not recognize, so a grammar evolving ahead of
//! the indexer degrades to skipped nodes rather than failed files.

use crate::span::{ContentHash, Point, Span};

// ============================================================================
// Syntax Node
// ============================================================================

/// A node in a parse tree supplied by the parser collaborator.
///
/// Nodes own their children; a tree is immutable once handed to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxNode {
    /// Raw grammar kind tag (e.g. `"class_definition"`).
    pub kind: String,
    /// Raw source text covered by this node.
    pub text: String,
    /// Byte span of the node in file content.
    pub span: Span,
    /// Start position (1-indexed line/column).
    pub start: Point,
    /// End position (1-indexed line/column).
    pub end: Point,
    /// Child nodes, in source order.
    pub children: Vec<SyntaxNode>,
}

impl SyntaxNode {
    /// Create a leaf node.
    pub fn new(
        kind: impl Into<String>,
        text: impl Into<String>,
        span: Span,
        start: Point,
        end: Point,
    ) -> Self {
        SyntaxNode {
            kind: kind.into(),
            text: text.into(),
            span,
            start,
            end,
            children: Vec::new(),
        }
    }

    /// Attach children, preserving source order.
    pub fn with_children(mut self, children: Vec<SyntaxNode>) -> Self {
        self.children = children;
        self
    }

    /// First child with the given kind tag.
    pub fn child_by_kind(&self, kind: &str) -> Option<&SyntaxNode> {
        self.children.iter().find(|c| c.kind == kind)
    }

    /// All children with the given kind tag, in source order.
    pub fn children_by_kind<'a>(
        &'a self,
        kind: &'a str,
    ) -> impl Iterator<Item = &'a SyntaxNode> + 'a {
        self.children.iter().filter(move |c| c.kind == kind)
    }

    /// Check if any direct child has the given kind tag.
    pub fn has_child_kind(&self, kind: &str) -> bool {
        self.children.iter().any(|c| c.kind == kind)
    }

    /// Total node count of this subtree, including self.
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(SyntaxNode::subtree_len).sum::<usize>()
    }
}

// ============================================================================
// Parse Tree
// ============================================================================

/// One parsed source file, as delivered by the parser collaborator.
#[derive(Debug, Clone)]
pub struct ParseTree {
    /// Workspace-relative path of the source file.
    pub path: String,
    /// Hash of the file content, for change detection.
    pub source_hash: ContentHash,
    /// Root node (kind tag `"module"` for Python-style grammars).
    pub root: SyntaxNode,
}

impl ParseTree {
    /// Create a parse tree, hashing the root node's raw text.
    pub fn new(path: impl Into<String>, root: SyntaxNode) -> Self {
        let source_hash = ContentHash::compute(root.text.as_bytes());
        ParseTree {
            path: path.into(),
            source_hash,
            root,
        }
    }

    /// Create a parse tree with a pre-computed source hash.
    ///
    /// Use when the collaborator hashes full file content rather than the
    /// root node text (they differ when the parser trims trailing trivia).
    pub fn with_source_hash(mut self, hash: ContentHash) -> Self {
        self.source_hash = hash;
        self
    }
}

/// Derive a dotted module name from a file path.
///
/// `pkg/util/io.py` becomes `pkg.util.io`; a trailing `__init__` segment is
/// dropped so `pkg/__init__.py` names the package `pkg` itself.
pub fn module_name_for_path(path: &str) -> String {
    let trimmed = path
        .rsplit_once('.')
        .map(|(stem, _ext)| stem)
        .unwrap_or(path);
    let dotted = trimmed.replace(['/', '\\'], ".");
    dotted
        .strip_suffix(".__init__")
        .unwrap_or(&dotted)
        .to_string()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(kind: &str, text: &str) -> SyntaxNode {
        SyntaxNode::new(
            kind,
            text,
            Span::new(0, text.len() as u64),
            Point::new(1, 1),
            Point::new(1, 1 + text.len() as u32),
        )
    }

    #[test]
    fn child_lookup_by_kind() {
        let root = leaf("module", "x").with_children(vec![
            leaf("comment", "# a"),
            leaf("identifier", "x"),
            leaf("comment", "# b"),
        ]);
        assert_eq!(root.child_by_kind("identifier").unwrap().text, "x");
        assert_eq!(root.children_by_kind("comment").count(), 2);
        assert!(!root.has_child_kind("decorator"));
    }

    #[test]
    fn subtree_len_counts_all_nodes() {
        let root = leaf("module", "")
            .with_children(vec![leaf("a", "").with_children(vec![leaf("b", "")])]);
        assert_eq!(root.subtree_len(), 3);
    }

    #[test]
    fn parse_tree_hashes_root_text() {
        let tree = ParseTree::new("m.py", leaf("module", "x = 1"));
        assert_eq!(tree.source_hash, ContentHash::compute(b"x = 1"));
    }

    mod module_names {
        use super::*;

        #[test]
        fn plain_file() {
            assert_eq!(module_name_for_path("service.py"), "service");
        }

        #[test]
        fn nested_path() {
            assert_eq!(module_name_for_path("pkg/util/io.py"), "pkg.util.io");
        }

        #[test]
        fn package_init() {
            assert_eq!(module_name_for_path("pkg/__init__.py"), "pkg");
        }
    }
}

//! Lexical scope stack used during a file walk.
//!
//! Scopes form a tree per file: the module scope is the root, entered
//! before the first node is visited and exited after the last. The stack
//! tracks the active chain; exited scopes stay in the arena until the
//! file's walk is torn down, so declaration order and ownership can be
//! read back when the walk completes.
//!
//! A mismatched enter/exit is a walker defect, not an input error: it is
//! reported through [`ScopeError`] and the caller marks the file degraded
//! instead of propagating a failure to other files.

use symdex_core::graph::{ScopeKind, SymbolId};
use thiserror::Error;

/// Defect in scope nesting, fatal to the current file only.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScopeError {
    /// `exit` called with no scope on the stack.
    #[error("scope exit without matching enter")]
    ExitWithoutEnter,

    /// Walk finished with scopes still open.
    #[error("walk finished with {depth} unclosed scopes")]
    Unbalanced { depth: usize },
}

/// Handle to a scope in the stack's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeHandle(usize);

/// One lexical scope.
#[derive(Debug)]
pub struct Scope {
    /// Scope kind.
    pub kind: ScopeKind,
    /// Scope name (class/function name; the module name for the root).
    pub name: Option<String>,
    /// Parent scope in the arena (None for the module root).
    pub parent: Option<usize>,
    /// Symbols declared directly in this scope, in declaration order.
    /// The last entry with a given name is the active binding.
    pub entries: Vec<(String, SymbolId)>,
}

/// Stack of nested lexical scopes over an arena.
#[derive(Debug)]
pub struct ScopeStack {
    scopes: Vec<Scope>,
    stack: Vec<usize>,
}

impl ScopeStack {
    /// Create a stack with the module root scope already entered.
    pub fn new(module_name: impl Into<String>) -> Self {
        ScopeStack {
            scopes: vec![Scope {
                kind: ScopeKind::Module,
                name: Some(module_name.into()),
                parent: None,
                entries: Vec::new(),
            }],
            stack: vec![0],
        }
    }

    /// Push a new scope as a child of the current top.
    pub fn enter(&mut self, kind: ScopeKind, name: Option<String>) -> ScopeHandle {
        let parent = self.stack.last().copied();
        let index = self.scopes.len();
        self.scopes.push(Scope {
            kind,
            name,
            parent,
            entries: Vec::new(),
        });
        self.stack.push(index);
        ScopeHandle(index)
    }

    /// Pop the current scope.
    pub fn exit(&mut self) -> Result<(), ScopeError> {
        self.stack.pop().map(|_| ()).ok_or(ScopeError::ExitWithoutEnter)
    }

    /// The active scope, or None when everything has been exited.
    pub fn current(&self) -> Option<ScopeHandle> {
        self.stack.last().copied().map(ScopeHandle)
    }

    /// Kind of the active scope.
    pub fn current_kind(&self) -> Option<ScopeKind> {
        self.stack.last().map(|&i| self.scopes[i].kind)
    }

    /// Append a symbol to the current scope's ordered declaration list.
    pub fn declare(&mut self, name: impl Into<String>, id: SymbolId) {
        if let Some(&top) = self.stack.last() {
            self.scopes[top].entries.push((name.into(), id));
        }
    }

    /// Dot-joined qualified name for a declaration in the current scope.
    ///
    /// Walks the active chain from the module root through named scopes.
    pub fn qualified_name(&self, name: &str) -> String {
        let mut parts: Vec<&str> = self
            .stack
            .iter()
            .filter_map(|&i| self.scopes[i].name.as_deref())
            .collect();
        parts.push(name);
        parts.join(".")
    }

    /// Resolve a name against the active scope chain.
    ///
    /// Each scope is scanned last-declaration-first, so a re-declared name
    /// resolves to its most recent binding.
    pub fn lookup(&self, name: &str) -> Option<SymbolId> {
        for &index in self.stack.iter().rev() {
            let hit = self.scopes[index]
                .entries
                .iter()
                .rev()
                .find(|(entry_name, _)| entry_name == name);
            if let Some((_, id)) = hit {
                return Some(*id);
            }
        }
        None
    }

    /// Current nesting depth (1 while only the module scope is open).
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Read a scope from the arena.
    pub fn scope(&self, handle: ScopeHandle) -> &Scope {
        &self.scopes[handle.0]
    }

    /// The module root scope.
    pub fn module_scope(&self) -> &Scope {
        &self.scopes[0]
    }

    /// Tear down after the module scope has been exited.
    ///
    /// Returns the arena, or a defect if scopes are still open.
    pub fn finish(self) -> Result<Vec<Scope>, ScopeError> {
        if self.stack.is_empty() {
            Ok(self.scopes)
        } else {
            Err(ScopeError::Unbalanced {
                depth: self.stack.len(),
            })
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u64) -> SymbolId {
        SymbolId(n)
    }

    #[test]
    fn module_scope_is_root() {
        let scopes = ScopeStack::new("pkg.mod");
        assert_eq!(scopes.depth(), 1);
        assert_eq!(scopes.current_kind(), Some(ScopeKind::Module));
        assert_eq!(scopes.module_scope().name.as_deref(), Some("pkg.mod"));
    }

    #[test]
    fn qualified_name_walks_named_scopes() {
        let mut scopes = ScopeStack::new("m");
        scopes.enter(ScopeKind::Class, Some("Token".to_string()));
        assert_eq!(scopes.qualified_name("value"), "m.Token.value");
        scopes.enter(ScopeKind::Function, Some("parse".to_string()));
        assert_eq!(scopes.qualified_name("inner"), "m.Token.parse.inner");
    }

    #[test]
    fn declare_preserves_order_and_lookup_prefers_last() {
        let mut scopes = ScopeStack::new("m");
        scopes.declare("helper", id(1));
        scopes.declare("other", id(2));
        scopes.declare("helper", id(3));
        assert_eq!(scopes.lookup("helper"), Some(id(3)));
        let entries: Vec<_> = scopes
            .module_scope()
            .entries
            .iter()
            .map(|(_, i)| *i)
            .collect();
        assert_eq!(entries, vec![id(1), id(2), id(3)]);
    }

    #[test]
    fn lookup_falls_back_to_outer_scopes() {
        let mut scopes = ScopeStack::new("m");
        scopes.declare("shared", id(1));
        scopes.enter(ScopeKind::Function, Some("f".to_string()));
        assert_eq!(scopes.lookup("shared"), Some(id(1)));
        scopes.declare("shared", id(2));
        assert_eq!(scopes.lookup("shared"), Some(id(2)));
        scopes.exit().unwrap();
        assert_eq!(scopes.lookup("shared"), Some(id(1)));
    }

    #[test]
    fn exit_without_enter_is_a_defect() {
        let mut scopes = ScopeStack::new("m");
        scopes.exit().unwrap();
        assert_eq!(scopes.exit(), Err(ScopeError::ExitWithoutEnter));
    }

    #[test]
    fn finish_requires_balanced_stack() {
        let mut scopes = ScopeStack::new("m");
        scopes.enter(ScopeKind::Class, Some("C".to_string()));
        let err = scopes.finish().unwrap_err();
        assert_eq!(err, ScopeError::Unbalanced { depth: 2 });

        let mut scopes = ScopeStack::new("m");
        scopes.exit().unwrap();
        assert!(scopes.finish().is_ok());
    }
}

//! Symbol table builder.
//!
//! Turns classified declaration nodes into [`Symbol`] records: allocates
//! the stable id, computes the qualified name from the scope chain, and
//! appends the declaration to the current scope's ordered list. One parse
//! node may fan out into several effective declarations (an enum plus its
//! members, a tuple assignment declaring several fields); each gets its own
//! declaration ordinal so re-declared names keep distinct identities.

use symdex_core::graph::{FileId, Modifier, Symbol, SymbolId, SymbolKind};
use symdex_core::span::Location;
use tracing::debug;

use crate::scope::ScopeStack;

/// Per-file symbol table under construction.
#[derive(Debug)]
pub struct SymbolTable {
    path: String,
    file_id: FileId,
    symbols: Vec<Symbol>,
    ordinal: u32,
}

impl SymbolTable {
    /// Create an empty table for one file.
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        let file_id = FileId::derive(&path);
        SymbolTable {
            path,
            file_id,
            symbols: Vec::new(),
            ordinal: 0,
        }
    }

    /// The file id symbols are created under.
    pub fn file_id(&self) -> FileId {
        self.file_id
    }

    /// Create a symbol in the current scope and declare it there.
    ///
    /// The qualified name is derived from the scope chain; the id from
    /// `(path, qualified name, ordinal)`. Names with a leading underscore
    /// get the `Private` modifier, following the fixture languages' naming
    /// convention.
    pub fn declare(
        &mut self,
        scopes: &mut ScopeStack,
        kind: SymbolKind,
        name: &str,
        location: Location,
    ) -> SymbolId {
        let qualified_name = scopes.qualified_name(name);
        let id = SymbolId::derive(&self.path, &qualified_name, self.ordinal);
        self.ordinal += 1;

        debug!("declare {} {} as {}", kind.as_str(), qualified_name, id);
        let mut symbol = Symbol::new(id, kind, name, qualified_name, self.file_id, location);
        if name.starts_with('_') && !name.starts_with("__") {
            symbol = symbol.with_modifier(Modifier::Private);
        }
        self.symbols.push(symbol);
        scopes.declare(name, id);
        id
    }

    /// Create the file's Module symbol.
    ///
    /// The module is the root owner: its qualified name is the module name
    /// itself and it is not listed in any scope's declarations.
    pub fn declare_module(&mut self, module_name: &str, location: Location) -> SymbolId {
        let id = SymbolId::derive(&self.path, module_name, self.ordinal);
        self.ordinal += 1;
        self.symbols.push(Symbol::new(
            id,
            SymbolKind::Module,
            module_name.rsplit('.').next().unwrap_or(module_name),
            module_name,
            self.file_id,
            location,
        ));
        id
    }

    /// Mutable access to a created symbol (for attaching documentation,
    /// signatures, decorators, and modifiers after creation).
    pub fn symbol_mut(&mut self, id: SymbolId) -> Option<&mut Symbol> {
        self.symbols.iter_mut().find(|s| s.symbol_id == id)
    }

    /// Read access to a created symbol.
    pub fn symbol(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.iter().find(|s| s.symbol_id == id)
    }

    /// Number of symbols created so far.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Whether no symbols were created.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Finish the table, returning symbols in declaration order.
    pub fn into_symbols(self) -> Vec<Symbol> {
        self.symbols
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use symdex_core::graph::ScopeKind;
    use symdex_core::span::Point;

    fn loc(line: u32) -> Location {
        Location::new("m.py", Point::new(line, 1), Point::new(line, 20))
    }

    #[test]
    fn declare_computes_qualified_name_from_scope_chain() {
        let mut scopes = ScopeStack::new("m");
        let mut table = SymbolTable::new("m.py");
        let class_id = table.declare(&mut scopes, SymbolKind::Class, "Token", loc(1));
        scopes.enter(ScopeKind::Class, Some("Token".to_string()));
        let field_id = table.declare(&mut scopes, SymbolKind::Field, "value", loc(2));

        assert_eq!(table.symbol(class_id).unwrap().qualified_name, "m.Token");
        assert_eq!(
            table.symbol(field_id).unwrap().qualified_name,
            "m.Token.value"
        );
    }

    #[test]
    fn redeclaration_gets_a_fresh_identity() {
        let mut scopes = ScopeStack::new("m");
        let mut table = SymbolTable::new("m.py");
        let first = table.declare(&mut scopes, SymbolKind::Function, "helper", loc(1));
        let second = table.declare(&mut scopes, SymbolKind::Function, "helper", loc(5));
        assert_ne!(first, second);
        // Both persist; the scope's active binding is the later one.
        assert_eq!(table.len(), 2);
        assert_eq!(scopes.lookup("helper"), Some(second));
    }

    #[test]
    fn leading_underscore_marks_private() {
        let mut scopes = ScopeStack::new("m");
        let mut table = SymbolTable::new("m.py");
        let id = table.declare(&mut scopes, SymbolKind::Function, "_internal", loc(1));
        assert!(table.symbol(id).unwrap().has_modifier(Modifier::Private));

        let dunder = table.declare(&mut scopes, SymbolKind::Method, "__init__", loc(2));
        assert!(!table.symbol(dunder).unwrap().has_modifier(Modifier::Private));
    }

    #[test]
    fn module_symbol_owns_the_module_name() {
        let mut table = SymbolTable::new("pkg/util.py");
        let id = table.declare_module("pkg.util", loc(1));
        let module = table.symbol(id).unwrap();
        assert_eq!(module.kind, SymbolKind::Module);
        assert_eq!(module.name, "util");
        assert_eq!(module.qualified_name, "pkg.util");
    }

    #[test]
    fn ids_are_stable_for_identical_declaration_sequences() {
        let build = || {
            let mut scopes = ScopeStack::new("m");
            let mut table = SymbolTable::new("m.py");
            let id = table.declare(&mut scopes, SymbolKind::Class, "Token", loc(1));
            id
        };
        assert_eq!(build(), build());
    }
}

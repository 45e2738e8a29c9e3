//! Relationship resolver.
//!
//! Runs in two stages. The per-file stage ([`resolve_file`]) links base,
//! decorator, and annotation names against the file's own module scope
//! once its walk is complete. The project stage ([`resolve_project`]) runs
//! after all files are merged: it re-resolves unresolved targets through
//! each file's import table and the module-resolution collaborator, and
//! computes advisory structural-protocol satisfaction.
//!
//! Resolution never fails: a name no visible scope can supply stays an
//! `Unresolved(name)` placeholder, surfaced as a warning at emission.

use std::collections::{BTreeSet, HashMap, HashSet};

use symdex_core::graph::{
    ImportRecord, ProjectIndex, Relation, RelationKind, RelationTarget, SymbolId, SymbolKind,
};
use symdex_core::resolve::ModuleResolver;
use tracing::debug;

use crate::walker::WalkOutcome;

/// Decorators that are language machinery rather than project symbols.
/// They stay in a symbol's decorator list but produce no `Decorates` edge.
const BUILTIN_DECORATORS: &[&str] = &[
    "property",
    "staticmethod",
    "classmethod",
    "abstractmethod",
    "abc.abstractmethod",
    "dataclass",
    "runtime_checkable",
    "override",
    "final",
    "cached_property",
    "functools.cache",
    "functools.lru_cache",
    "functools.wraps",
    "wraps",
];

fn is_builtin_decorator(name: &str) -> bool {
    BUILTIN_DECORATORS.contains(&name)
        || name.ends_with(".setter")
        || name.ends_with(".deleter")
        || name.ends_with(".getter")
}

/// Base identifier of a possibly-subscripted reference.
fn base_name(text: &str) -> &str {
    text.split('[').next().unwrap_or(text).trim()
}

// ============================================================================
// Per-file pass
// ============================================================================

/// Resolve one file's pending references against its own module scope and
/// fill `outcome.graph.relations`.
///
/// Names this pass cannot see (imported or absolute references) become
/// `Unresolved` placeholders for the project stage to revisit.
pub fn resolve_file(outcome: &mut WalkOutcome) {
    let mut relations: Vec<Relation> = Vec::new();
    {
        let graph = &outcome.graph;
        let symbols_by_id: HashMap<SymbolId, (&str, SymbolKind)> = graph
            .symbols
            .iter()
            .map(|s| (s.symbol_id, (s.name.as_str(), s.kind)))
            .collect();
        // Active module bindings: later declarations win.
        let mut local: HashMap<&str, (SymbolId, SymbolKind)> = HashMap::new();
        for id in &graph.top_level {
            if let Some((name, kind)) = symbols_by_id.get(id) {
                local.insert(*name, (*id, *kind));
            }
        }

        // Base lists: first non-protocol base extends, the rest compose.
        for (class_id, bases) in &outcome.class_bases {
            let mut primary_assigned = false;
            for b in bases {
                let bare = base_name(b);
                match local.get(bare) {
                    Some((target, SymbolKind::Protocol)) => relations.push(Relation::new(
                        RelationKind::Implements,
                        *class_id,
                        RelationTarget::Resolved(*target),
                    )),
                    resolved => {
                        let kind = if primary_assigned {
                            RelationKind::Composes
                        } else {
                            primary_assigned = true;
                            RelationKind::Extends
                        };
                        let to = match resolved {
                            Some((target, _)) => RelationTarget::Resolved(*target),
                            None => RelationTarget::Unresolved(bare.to_string()),
                        };
                        relations.push(Relation::new(kind, *class_id, to));
                    }
                }
            }
        }

        // Decorator edges, one per applied decorator, in source order.
        for symbol in &graph.symbols {
            for decorator in &symbol.decorators {
                if is_builtin_decorator(&decorator.name) {
                    continue;
                }
                let to = match local.get(decorator.name.as_str()) {
                    Some((target, _)) => RelationTarget::Resolved(*target),
                    None => RelationTarget::Unresolved(decorator.name.clone()),
                };
                relations.push(Relation::new(RelationKind::Decorates, symbol.symbol_id, to));
            }
        }

        // Advisory annotation references: intra-module resolutions only.
        for (symbol_id, name) in &outcome.annotations {
            if let Some((target, _)) = local.get(name.as_str()) {
                if target != symbol_id {
                    relations.push(Relation::new(
                        RelationKind::References,
                        *symbol_id,
                        RelationTarget::Resolved(*target),
                    ));
                }
            }
        }
    }
    debug!(
        "resolved {}: {} relations",
        outcome.graph.path,
        relations.len()
    );
    outcome.graph.relations = relations;
}

// ============================================================================
// Project pass
// ============================================================================

/// Re-resolve unresolved targets across the whole index and compute
/// structural-protocol satisfaction. Idempotent.
pub fn resolve_project(index: &mut ProjectIndex, resolver: &dyn ModuleResolver) {
    let paths: Vec<String> = index.files().map(|f| f.path.clone()).collect();
    resolve_files(index, &paths, resolver);
}

/// Re-resolve unresolved targets for the given files, then refresh the
/// structural-protocol pass over the whole index.
///
/// This is the relationship-resolution re-pass behind the file-change
/// interface: the driver hands it the changed files plus the files that
/// reference them.
pub fn resolve_files(index: &mut ProjectIndex, paths: &[String], resolver: &dyn ModuleResolver) {
    // Phase 1: collect replacements against the immutable index.
    let mut replacements: Vec<(String, usize, RelationTarget, Option<RelationKind>)> = Vec::new();
    for path in paths {
        let Some(relations) = index.relations_of(path) else {
            continue;
        };
        let imports: Vec<ImportRecord> = index
            .imports_of(path)
            .map(<[ImportRecord]>::to_vec)
            .unwrap_or_default();
        for (pos, relation) in relations.iter().enumerate() {
            let RelationTarget::Unresolved(name) = &relation.to else {
                continue;
            };
            let Some((target, target_kind)) = resolve_name(index, path, name, &imports, resolver)
            else {
                continue;
            };
            // A base that turns out to be a protocol is satisfaction, not
            // inheritance.
            let new_kind = (target_kind == SymbolKind::Protocol
                && matches!(relation.kind, RelationKind::Extends | RelationKind::Composes))
            .then_some(RelationKind::Implements);
            replacements.push((path.clone(), pos, RelationTarget::Resolved(target), new_kind));
        }
    }

    // Phase 2: apply.
    for (path, pos, to, kind) in replacements {
        if let Some(relations) = index.relations_of_mut(&path) {
            if let Some(relation) = relations.get_mut(pos) {
                relation.to = to;
                if let Some(kind) = kind {
                    relation.kind = kind;
                }
            }
        }
    }

    structural_implements(index);
}

/// Resolve a name visible in `path` to a symbol elsewhere in the index.
///
/// Lookup order: the file's own module scope, then import bindings
/// (including aliases and glob imports), then absolute dotted module paths.
/// Alias resolution happens here; the collaborator only maps module paths
/// to files.
fn resolve_name(
    index: &ProjectIndex,
    path: &str,
    name: &str,
    imports: &[ImportRecord],
    resolver: &dyn ModuleResolver,
) -> Option<(SymbolId, SymbolKind)> {
    // Own module scope (covers downgraded intra-file edges after re-index).
    if let Some(symbol) = index.top_level_symbol(path, name) {
        return Some((symbol.symbol_id, symbol.kind));
    }

    if let Some((head, rest)) = name.split_once('.') {
        let target_name = rest.rsplit('.').next().unwrap_or(rest);

        // `import pkg.util [as head]` then `head.Target`.
        for import in imports {
            if import.imported_name.is_some() || import.local_name() != head {
                continue;
            }
            if let Some(file) = resolver.resolve_module(&import.module_path, path) {
                if let Some(symbol) = index.top_level_symbol(&file, target_name) {
                    return Some((symbol.symbol_id, symbol.kind));
                }
            }
        }

        // `from pkg import util [as head]` then `head.Target`: the binding
        // names a submodule.
        for import in imports {
            let Some(original) = import.imported_name.as_deref() else {
                continue;
            };
            if original == "*" || import.local_name() != head {
                continue;
            }
            let submodule = format!("{}.{}", import.module_path, original);
            if let Some(file) = resolver.resolve_module(&submodule, path) {
                if let Some(symbol) = index.top_level_symbol(&file, target_name) {
                    return Some((symbol.symbol_id, symbol.kind));
                }
            }
        }

        // Absolute dotted reference: everything before the last segment is
        // a module path.
        if let Some(split) = name.rfind('.') {
            let module_path = &name[..split];
            if let Some(file) = resolver.resolve_module(module_path, path) {
                if let Some(symbol) = index.top_level_symbol(&file, target_name) {
                    return Some((symbol.symbol_id, symbol.kind));
                }
            }
        }
        return None;
    }

    // Plain name through from-imports, aliases first-class.
    for import in imports {
        match import.imported_name.as_deref() {
            Some("*") => {
                if let Some(file) = resolver.resolve_module(&import.module_path, path) {
                    if let Some(symbol) = index.top_level_symbol(&file, name) {
                        return Some((symbol.symbol_id, symbol.kind));
                    }
                }
            }
            Some(original) if import.local_name() == name => {
                if let Some(file) = resolver.resolve_module(&import.module_path, path) {
                    if let Some(symbol) = index.top_level_symbol(&file, original) {
                        return Some((symbol.symbol_id, symbol.kind));
                    }
                }
            }
            _ => {}
        }
    }
    None
}

// ============================================================================
// Structural protocol satisfaction
// ============================================================================

/// Member kinds that count toward a protocol's required capability set.
fn is_capability(kind: SymbolKind) -> bool {
    matches!(
        kind,
        SymbolKind::Method | SymbolKind::Property | SymbolKind::Field
    )
}

/// Add advisory `Implements` edges for every class whose member names are a
/// superset of a protocol's required members.
///
/// Opportunistic and advisory: conformance is computed from member shape,
/// never declared, and an existing explicit edge suppresses the structural
/// one. Protocols with no required members match nothing.
fn structural_implements(index: &mut ProjectIndex) {
    let mut protocols: Vec<(SymbolId, String, BTreeSet<String>)> = Vec::new();
    let mut classes: Vec<(SymbolId, String, BTreeSet<String>)> = Vec::new();
    for symbol in index.symbols() {
        if !matches!(symbol.kind, SymbolKind::Protocol | SymbolKind::Class) {
            continue;
        }
        let members: BTreeSet<String> = index
            .members_of(symbol)
            .iter()
            .filter(|m| is_capability(m.kind))
            .map(|m| m.name.clone())
            .collect();
        match symbol.kind {
            SymbolKind::Protocol if !members.is_empty() => {
                protocols.push((symbol.symbol_id, symbol.qualified_name.clone(), members));
            }
            SymbolKind::Class => {
                classes.push((symbol.symbol_id, symbol.qualified_name.clone(), members));
            }
            _ => {}
        }
    }
    protocols.sort_by(|a, b| a.1.cmp(&b.1));
    classes.sort_by(|a, b| a.1.cmp(&b.1));

    let existing: HashSet<(SymbolId, SymbolId)> = index
        .relations()
        .filter_map(|r| r.to.symbol_id().map(|to| (r.from, to)))
        .collect();

    let mut additions: Vec<(String, Relation)> = Vec::new();
    for (class_id, class_name, class_members) in &classes {
        for (protocol_id, protocol_name, required) in &protocols {
            if !required.is_subset(class_members) || existing.contains(&(*class_id, *protocol_id))
            {
                continue;
            }
            let Some(path) = index.path_of(*class_id) else {
                continue;
            };
            debug!("{} structurally satisfies {}", class_name, protocol_name);
            additions.push((
                path.to_string(),
                Relation::new(
                    RelationKind::Implements,
                    *class_id,
                    RelationTarget::Resolved(*protocol_id),
                ),
            ));
        }
    }
    for (path, relation) in additions {
        if let Some(relations) = index.relations_of_mut(&path) {
            relations.push(relation);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_decorators_are_filtered() {
        assert!(is_builtin_decorator("property"));
        assert!(is_builtin_decorator("value.setter"));
        assert!(is_builtin_decorator("functools.lru_cache"));
        assert!(!is_builtin_decorator("retry"));
        assert!(!is_builtin_decorator("app.route"));
    }

    #[test]
    fn base_name_strips_generics() {
        assert_eq!(base_name("LoggerMixin[int]"), "LoggerMixin");
        assert_eq!(base_name("pkg.Base"), "pkg.Base");
    }
}

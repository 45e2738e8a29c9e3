//! Symbol graph model: normalized symbol, relation, and per-file tables.
//!
//! This module provides the language-agnostic data model the engine emits:
//! - [`Symbol`]: declared entities (classes, functions, fields, etc.)
//! - [`Relation`]: typed edges between symbols (inheritance, decoration, ...)
//! - [`FileGraph`]: the per-file merge unit produced by one walk
//! - [`ProjectIndex`]: the aggregate store queried by downstream tooling
//!
//! The [`ProjectIndex`] keeps primary storage in `BTreeMap`s for
//! deterministic iteration and maintains postings lists for per-file
//! queries. Re-inserting a file replaces all of its prior symbols and
//! relations; inbound edges from other files are downgraded to unresolved
//! placeholders so a later resolution pass can re-link them.
//!
//! # Identity
//!
//! Ids are derived, not allocated: a [`SymbolId`] is the truncated SHA-256
//! of `(file path, qualified name, declaration ordinal)`. Two runs over the
//! same input produce identical ids, and concurrent workers never contend
//! for a shared counter. The declaration ordinal disambiguates a name
//! re-declared in the same scope.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::span::{ContentHash, Location, Span};

// ============================================================================
// Schema Version
// ============================================================================

/// Schema version for the symbol graph model.
///
/// Increment on breaking changes to serialized structs or enum variants.
/// Field evolution in the exchange format is additive-only; this constant
/// exists so consumers can detect a truly incompatible index.
pub const GRAPH_SCHEMA_VERSION: u32 = 1;

// ============================================================================
// ID Types
// ============================================================================

fn derive_id(parts: &[&str]) -> u64 {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_bytes());
        hasher.update([0u8]);
    }
    let digest = hasher.finalize();
    u64::from_be_bytes(digest[..8].try_into().expect("digest shorter than 8 bytes"))
}

/// Unique identifier for a symbol within a project index.
///
/// Derived from `(file path, qualified name, declaration ordinal)`, so it is
/// stable across runs over unchanged input. Never reused: removing a file
/// retires its ids until the same declarations reappear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct SymbolId(pub u64);

impl SymbolId {
    /// Derive the id for a declaration.
    pub fn derive(file_path: &str, qualified_name: &str, ordinal: u32) -> Self {
        SymbolId(derive_id(&[file_path, qualified_name, &ordinal.to_string()]))
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sym_{:016x}", self.0)
    }
}

/// Unique identifier for an indexed file, derived from its path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct FileId(pub u64);

impl FileId {
    /// Derive the id for a file path.
    pub fn derive(path: &str) -> Self {
        FileId(derive_id(&[path]))
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "file_{:016x}", self.0)
    }
}

// ============================================================================
// Enums
// ============================================================================

/// Kind of declared symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Module,
    Class,
    /// Structural protocol / interface type.
    Protocol,
    Function,
    Method,
    Field,
    Property,
    Enum,
    EnumMember,
    TypeParameter,
}

impl SymbolKind {
    /// Whether symbols of this kind carry a callable signature.
    pub fn is_callable(&self) -> bool {
        matches!(
            self,
            SymbolKind::Function | SymbolKind::Method | SymbolKind::Property
        )
    }

    /// Stable output kind string for the exchange format.
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Module => "module",
            SymbolKind::Class => "class",
            SymbolKind::Protocol => "protocol",
            SymbolKind::Function => "function",
            SymbolKind::Method => "method",
            SymbolKind::Field => "field",
            SymbolKind::Property => "property",
            SymbolKind::Enum => "enum",
            SymbolKind::EnumMember => "enum_member",
            SymbolKind::TypeParameter => "type_parameter",
        }
    }
}

/// Semantic modifier on a symbol.
///
/// This enum is `#[non_exhaustive]` to allow adding language-specific
/// variants without breaking downstream code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum Modifier {
    /// Abstract class or method (`ABC` base, `@abstractmethod`).
    Abstract,
    /// Static binding (`@staticmethod` and equivalents).
    Static,
    /// Async function/method (`async def`).
    Async,
    /// Generic declaration (type parameters or `Generic[...]` base).
    Generic,
    /// Private by naming convention (leading underscore).
    Private,
    /// Class-level method receiving the type (`@classmethod`).
    #[serde(rename = "classmethod")]
    ClassMethod,
}

impl Modifier {
    /// Stable output flag string for the exchange format.
    pub fn as_str(&self) -> &'static str {
        match self {
            Modifier::Abstract => "abstract",
            Modifier::Static => "static",
            Modifier::Async => "async",
            Modifier::Generic => "generic",
            Modifier::Private => "private",
            Modifier::ClassMethod => "classmethod",
        }
    }
}

/// Kind of lexical scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeKind {
    Module,
    Class,
    Function,
    Block,
}

/// Kind of relation between two symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    /// Primary inheritance edge (first listed base).
    Extends,
    /// Structural-protocol satisfaction (advisory, not declared).
    Implements,
    /// Declaration-to-decorator edge, one per applied decorator.
    Decorates,
    /// Mixin composition (secondary bases beyond the first).
    Composes,
    /// Named reference (e.g. a type annotation naming an indexed symbol).
    References,
}

impl RelationKind {
    /// Stable output kind string for the exchange format.
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationKind::Extends => "extends",
            RelationKind::Implements => "implements",
            RelationKind::Decorates => "decorates",
            RelationKind::Composes => "composes",
            RelationKind::References => "references",
        }
    }
}

/// How a file fared during an indexing run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexStatus {
    /// Indexed without defects. Unresolved references are warnings and do
    /// not affect this status.
    Clean,
    /// Partial results emitted (scope imbalance or similar walker defect).
    Degraded,
    /// Excluded from the merge entirely (e.g. per-file timeout).
    Skipped,
}

impl IndexStatus {
    /// Stable output string for the manifest.
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexStatus::Clean => "clean",
            IndexStatus::Degraded => "degraded",
            IndexStatus::Skipped => "skipped",
        }
    }
}

// ============================================================================
// Signature / Decorator
// ============================================================================

/// One parameter of a callable symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    /// Parameter name.
    pub name: String,
    /// Type annotation as source text, if present. Never inferred.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotation: Option<String>,
    /// Whether a default value is present.
    pub has_default: bool,
}

/// Signature of a callable symbol: ordered parameters plus return type text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Signature {
    /// Parameters in declaration order.
    pub params: Vec<Param>,
    /// Return type annotation as source text, if present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub returns: Option<String>,
}

/// A decorator applied to a declaration.
///
/// Order among a symbol's decorators is source order (top to bottom), which
/// corresponds to innermost-applied-last; it must round-trip exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decorator {
    /// Decorator name as written (possibly dotted).
    pub name: String,
    /// Argument text inside the call parentheses, if parameterized.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<String>,
    /// Byte span of the decorator in source.
    pub span: Span,
}

impl Decorator {
    /// Parse a decorator from its raw source text (e.g. `@retry(times=3)`).
    pub fn from_source(text: &str, span: Span) -> Self {
        let trimmed = text.trim().trim_start_matches('@');
        match trimmed.split_once('(') {
            Some((name, rest)) => Decorator {
                name: name.trim().to_string(),
                arguments: Some(rest.strip_suffix(')').unwrap_or(rest).to_string()),
                span,
            },
            None => Decorator {
                name: trimmed.to_string(),
                arguments: None,
                span,
            },
        }
    }
}

// ============================================================================
// Symbol
// ============================================================================

/// A declared entity in the symbol graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    /// Stable identifier, unique within the project index.
    pub symbol_id: SymbolId,
    /// Kind of symbol.
    pub kind: SymbolKind,
    /// Simple name.
    pub name: String,
    /// Dot-joined path from module root through enclosing scopes.
    pub qualified_name: String,
    /// File this symbol was declared in.
    pub file_id: FileId,
    /// Declaration location.
    pub location: Location,
    /// Modifier flags, deduplicated, in a fixed canonical order.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub modifiers: Vec<Modifier>,
    /// Signature, for callable kinds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<Signature>,
    /// Associated documentation block.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
    /// Applied decorators, in source order.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub decorators: Vec<Decorator>,
}

impl Symbol {
    /// Create a new symbol entry.
    pub fn new(
        symbol_id: SymbolId,
        kind: SymbolKind,
        name: impl Into<String>,
        qualified_name: impl Into<String>,
        file_id: FileId,
        location: Location,
    ) -> Self {
        Symbol {
            symbol_id,
            kind,
            name: name.into(),
            qualified_name: qualified_name.into(),
            file_id,
            location,
            modifiers: Vec::new(),
            signature: None,
            documentation: None,
            decorators: Vec::new(),
        }
    }

    /// Add a modifier flag; duplicates are ignored and order is canonical.
    pub fn with_modifier(mut self, modifier: Modifier) -> Self {
        if !self.modifiers.contains(&modifier) {
            self.modifiers.push(modifier);
            self.modifiers.sort();
        }
        self
    }

    /// Set the signature.
    pub fn with_signature(mut self, signature: Signature) -> Self {
        self.signature = Some(signature);
        self
    }

    /// Set the documentation block.
    pub fn with_documentation(mut self, doc: impl Into<String>) -> Self {
        self.documentation = Some(doc.into());
        self
    }

    /// Set the decorator list (source order).
    pub fn with_decorators(mut self, decorators: Vec<Decorator>) -> Self {
        self.decorators = decorators;
        self
    }

    /// Add a modifier flag in place; duplicates are ignored.
    pub fn add_modifier(&mut self, modifier: Modifier) {
        if !self.modifiers.contains(&modifier) {
            self.modifiers.push(modifier);
            self.modifiers.sort();
        }
    }

    /// Check a modifier flag.
    pub fn has_modifier(&self, modifier: Modifier) -> bool {
        self.modifiers.contains(&modifier)
    }
}

// ============================================================================
// Relation
// ============================================================================

/// Target of a relation edge.
///
/// Targets outside the indexed set resolve to [`RelationTarget::Unresolved`]
/// placeholders rather than errors; they are surfaced as warnings in the
/// emitted index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationTarget {
    /// Edge to a symbol present in the index.
    Resolved(SymbolId),
    /// Edge to a name no visible scope could resolve.
    Unresolved(String),
}

impl RelationTarget {
    /// The resolved symbol id, if any.
    pub fn symbol_id(&self) -> Option<SymbolId> {
        match self {
            RelationTarget::Resolved(id) => Some(*id),
            RelationTarget::Unresolved(_) => None,
        }
    }

    /// Whether this target is unresolved.
    pub fn is_unresolved(&self) -> bool {
        matches!(self, RelationTarget::Unresolved(_))
    }
}

/// A typed edge between two symbols.
///
/// Edges are immutable once emitted in a snapshot; re-indexing a file
/// replaces every edge whose `from` symbol belongs to that file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    /// Edge kind.
    pub kind: RelationKind,
    /// Source symbol.
    pub from: SymbolId,
    /// Target symbol or unresolved placeholder.
    pub to: RelationTarget,
}

impl Relation {
    /// Create a new relation edge.
    pub fn new(kind: RelationKind, from: SymbolId, to: RelationTarget) -> Self {
        Relation { kind, from, to }
    }
}

// ============================================================================
// Imports
// ============================================================================

/// An import recorded for a file, feeding name resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRecord {
    /// The module path being imported (e.g. `pkg.util`).
    pub module_path: String,
    /// Imported name for `from module import name` (None for `import module`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imported_name: Option<String>,
    /// Local alias (`as alias`), if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// Byte span of the import statement.
    pub span: Span,
}

impl ImportRecord {
    /// Create a whole-module import (`import pkg.util`).
    pub fn module(module_path: impl Into<String>, span: Span) -> Self {
        ImportRecord {
            module_path: module_path.into(),
            imported_name: None,
            alias: None,
            span,
        }
    }

    /// Create a named import (`from pkg.util import name`).
    pub fn named(module_path: impl Into<String>, name: impl Into<String>, span: Span) -> Self {
        ImportRecord {
            module_path: module_path.into(),
            imported_name: Some(name.into()),
            alias: None,
            span,
        }
    }

    /// Set the local alias.
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// The name this import binds locally.
    ///
    /// Precedence: alias, then imported name, then the final segment of the
    /// module path.
    pub fn local_name(&self) -> &str {
        if let Some(alias) = &self.alias {
            return alias;
        }
        if let Some(name) = &self.imported_name {
            return name;
        }
        self.module_path
            .rsplit('.')
            .next()
            .unwrap_or(&self.module_path)
    }
}

// ============================================================================
// Per-File Graph
// ============================================================================

/// The per-file merge unit: everything one walk produced for one file.
///
/// A `FileGraph` is built on private per-worker state and handed to the
/// [`ProjectIndex`] in a single merge, so readers never observe a
/// half-replaced file.
#[derive(Debug, Clone)]
pub struct FileGraph {
    /// Workspace-relative path.
    pub path: String,
    /// Dotted module name derived from the path.
    pub module_name: String,
    /// Content hash at walk time.
    pub content_hash: ContentHash,
    /// Outcome status for the manifest.
    pub status: IndexStatus,
    /// Reason for a non-clean status.
    pub reason: Option<String>,
    /// Count of skipped unclassifiable nodes.
    pub unclassified_nodes: u32,
    /// Symbols in declaration order.
    pub symbols: Vec<Symbol>,
    /// Relation edges whose `from` symbol belongs to this file.
    pub relations: Vec<Relation>,
    /// Ids of symbols declared directly in the module scope.
    pub top_level: Vec<SymbolId>,
    /// Imports recorded for this file.
    pub imports: Vec<ImportRecord>,
}

impl FileGraph {
    /// Create an empty graph for a skipped file.
    pub fn skipped(
        path: impl Into<String>,
        module_name: impl Into<String>,
        content_hash: ContentHash,
        reason: impl Into<String>,
    ) -> Self {
        FileGraph {
            path: path.into(),
            module_name: module_name.into(),
            content_hash,
            status: IndexStatus::Skipped,
            reason: Some(reason.into()),
            unclassified_nodes: 0,
            symbols: Vec::new(),
            relations: Vec::new(),
            top_level: Vec::new(),
            imports: Vec::new(),
        }
    }
}

/// Per-file manifest entry kept in the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSummary {
    /// File id derived from the path.
    pub file_id: FileId,
    /// Workspace-relative path.
    pub path: String,
    /// Dotted module name.
    pub module_name: String,
    /// Content hash at index time.
    pub content_hash: ContentHash,
    /// Outcome status.
    pub status: IndexStatus,
    /// Reason for a non-clean status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Count of skipped unclassifiable nodes.
    pub unclassified_nodes: u32,
    /// Ids of the file's top-level (module-scope) symbols.
    pub top_level: Vec<SymbolId>,
}

// ============================================================================
// Project Index
// ============================================================================

/// The aggregate symbol graph for a project.
///
/// Built incrementally per file during an indexing run; a full run produces
/// one snapshot via the exchange format. Primary tables are `BTreeMap`s so
/// iteration order is deterministic regardless of merge order.
#[derive(Debug, Default)]
pub struct ProjectIndex {
    /// Symbol table keyed by id.
    symbols: BTreeMap<SymbolId, Symbol>,
    /// Per-file manifest entries keyed by file id.
    files: BTreeMap<FileId, FileSummary>,
    /// Relations grouped by owning (from-side) file, file order deterministic.
    relations_by_file: BTreeMap<FileId, Vec<Relation>>,

    // Secondary indexes
    /// Map from file path to FileId.
    file_by_path: HashMap<String, FileId>,
    /// symbol ids declared in each file, in declaration order.
    symbols_by_file: HashMap<FileId, Vec<SymbolId>>,
    /// qualified name → symbol id (active binding: last declaration wins).
    symbol_by_qualified_name: HashMap<String, SymbolId>,
    /// Imports recorded per file.
    imports_by_file: HashMap<FileId, Vec<ImportRecord>>,
}

impl ProjectIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one file's graph, replacing any prior entries for its path.
    ///
    /// The replacement is atomic from a reader's point of view when the
    /// caller holds exclusive access for the duration of this call, which
    /// the driver guarantees.
    pub fn insert_file(&mut self, graph: FileGraph) {
        self.remove_file(&graph.path);

        let file_id = FileId::derive(&graph.path);
        let mut ids = Vec::with_capacity(graph.symbols.len());
        for symbol in graph.symbols {
            if self.symbols.contains_key(&symbol.symbol_id) {
                // Id collision across files would corrupt postings; keep the
                // first owner and drop the duplicate.
                warn!(
                    "duplicate symbol id {} for {} in {}; dropping",
                    symbol.symbol_id, symbol.qualified_name, graph.path
                );
                continue;
            }
            ids.push(symbol.symbol_id);
            self.symbol_by_qualified_name
                .insert(symbol.qualified_name.clone(), symbol.symbol_id);
            self.symbols.insert(symbol.symbol_id, symbol);
        }

        self.symbols_by_file.insert(file_id, ids);
        self.relations_by_file.insert(file_id, graph.relations);
        self.imports_by_file.insert(file_id, graph.imports);
        self.file_by_path.insert(graph.path.clone(), file_id);
        self.files.insert(
            file_id,
            FileSummary {
                file_id,
                path: graph.path,
                module_name: graph.module_name,
                content_hash: graph.content_hash,
                status: graph.status,
                reason: graph.reason,
                unclassified_nodes: graph.unclassified_nodes,
                top_level: graph.top_level,
            },
        );
    }

    /// Remove a file's symbols, relations, and manifest entry.
    ///
    /// Edges from *other* files that pointed into the removed file are
    /// downgraded to `Unresolved(name)` placeholders so the next relation
    /// resolution pass can re-link them. Returns false if the path was not
    /// indexed.
    pub fn remove_file(&mut self, path: &str) -> bool {
        let Some(file_id) = self.file_by_path.remove(path) else {
            return false;
        };

        let removed_ids = self.symbols_by_file.remove(&file_id).unwrap_or_default();
        let mut removed_names: HashMap<SymbolId, String> = HashMap::new();
        for id in &removed_ids {
            if let Some(symbol) = self.symbols.remove(id) {
                if self.symbol_by_qualified_name.get(&symbol.qualified_name) == Some(id) {
                    self.symbol_by_qualified_name.remove(&symbol.qualified_name);
                }
                removed_names.insert(*id, symbol.name);
            }
        }

        self.relations_by_file.remove(&file_id);
        self.imports_by_file.remove(&file_id);
        self.files.remove(&file_id);

        for relations in self.relations_by_file.values_mut() {
            for relation in relations.iter_mut() {
                if let RelationTarget::Resolved(id) = relation.to {
                    if let Some(name) = removed_names.get(&id) {
                        relation.to = RelationTarget::Unresolved(name.clone());
                    }
                }
            }
        }

        true
    }

    /// Paths of files holding at least one resolved edge into `path`.
    ///
    /// Computed against current state, so call before [`Self::remove_file`].
    pub fn dependents_of(&self, path: &str) -> Vec<String> {
        let Some(file_id) = self.file_by_path.get(path) else {
            return Vec::new();
        };
        let owned: HashSet<SymbolId> = self
            .symbols_by_file
            .get(file_id)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default();

        let mut dependents = Vec::new();
        for (other_id, relations) in &self.relations_by_file {
            if other_id == file_id {
                continue;
            }
            let hit = relations
                .iter()
                .any(|r| r.to.symbol_id().is_some_and(|id| owned.contains(&id)));
            if hit {
                if let Some(summary) = self.files.get(other_id) {
                    dependents.push(summary.path.clone());
                }
            }
        }
        dependents.sort();
        dependents
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Look up a symbol by id.
    pub fn symbol(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.get(&id)
    }

    /// Look up the active binding for a qualified name.
    pub fn symbol_by_qualified_name(&self, qualified_name: &str) -> Option<&Symbol> {
        self.symbol_by_qualified_name
            .get(qualified_name)
            .and_then(|id| self.symbols.get(id))
    }

    /// All symbols, in id order.
    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.values()
    }

    /// All relations, grouped by owning file in file-id order.
    pub fn relations(&self) -> impl Iterator<Item = &Relation> {
        self.relations_by_file.values().flatten()
    }

    /// Relations owned by one file.
    pub fn relations_of(&self, path: &str) -> Option<&[Relation]> {
        let file_id = self.file_by_path.get(path)?;
        self.relations_by_file.get(file_id).map(Vec::as_slice)
    }

    /// Mutable relations owned by one file (for the resolution re-pass).
    pub fn relations_of_mut(&mut self, path: &str) -> Option<&mut Vec<Relation>> {
        let file_id = self.file_by_path.get(path)?;
        self.relations_by_file.get_mut(file_id)
    }

    /// Per-file manifest entries, in file-id order.
    pub fn files(&self) -> impl Iterator<Item = &FileSummary> {
        self.files.values()
    }

    /// Manifest entry for a path.
    pub fn file_by_path(&self, path: &str) -> Option<&FileSummary> {
        self.file_by_path
            .get(path)
            .and_then(|id| self.files.get(id))
    }

    /// Imports recorded for a path.
    pub fn imports_of(&self, path: &str) -> Option<&[ImportRecord]> {
        let file_id = self.file_by_path.get(path)?;
        self.imports_by_file.get(file_id).map(Vec::as_slice)
    }

    /// Top-level (module-scope) symbols of a file, in declaration order.
    pub fn module_symbols<'a>(&'a self, path: &str) -> Vec<&'a Symbol> {
        self.file_by_path
            .get(path)
            .and_then(|id| self.files.get(id))
            .map(|summary| {
                summary
                    .top_level
                    .iter()
                    .filter_map(|id| self.symbols.get(id))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Active top-level binding for a name in a file (last declaration wins).
    pub fn top_level_symbol<'a>(&'a self, path: &str, name: &str) -> Option<&'a Symbol> {
        self.file_by_path
            .get(path)
            .and_then(|id| self.files.get(id))
            .and_then(|summary| {
                summary
                    .top_level
                    .iter()
                    .rev()
                    .filter_map(|id| self.symbols.get(id))
                    .find(|symbol| symbol.name == name)
            })
    }

    /// Path of the file declaring a symbol.
    pub fn path_of(&self, id: SymbolId) -> Option<&str> {
        let symbol = self.symbols.get(&id)?;
        self.files
            .get(&symbol.file_id)
            .map(|summary| summary.path.as_str())
    }

    /// Symbols declared directly inside an owner symbol's scope.
    ///
    /// Ownership is derived from qualified names: `owner.child` with no
    /// further dots. Returned in declaration order.
    pub fn members_of<'a>(&'a self, owner: &Symbol) -> Vec<&'a Symbol> {
        let prefix = format!("{}.", owner.qualified_name);
        self.symbols_by_file
            .get(&owner.file_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| self.symbols.get(id))
                    .filter(|s| {
                        s.qualified_name
                            .strip_prefix(&prefix)
                            .is_some_and(|rest| !rest.contains('.'))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of symbols in the index.
    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }

    /// Number of relation edges in the index.
    pub fn relation_count(&self) -> usize {
        self.relations_by_file.values().map(Vec::len).sum()
    }

    /// Number of indexed files (including degraded and skipped entries).
    pub fn file_count(&self) -> usize {
        self.files.len()
    }
}

// ============================================================================
// Tests
// ============================================================================
